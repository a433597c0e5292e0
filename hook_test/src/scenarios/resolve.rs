use std::sync::atomic::Ordering;

use srx_intercept::{
    ClassDef, ConstructorFinder, Errno, MethodDef, MethodFinder, NamePattern, ParamShape,
    Registry, Value, clear, global, install, invoke, resolve,
};

use crate::test_ctx::{
    ACTIVITY, ALERT_DIALOG, HOOK_A_COUNT, MAIN_ACTIVITY, ORIGIN_COUNT, activity_catalog,
    call_on_create, counting_spec, ensure_ok, find_on_create, reset_counters,
};

pub fn scenario_resolve_super() {
    clear();
    reset_counters();
    let catalog = activity_catalog();

    let target = ensure_ok(find_on_create(&catalog), "find onCreate via super");
    assert_eq!(target.class_name(), ACTIVITY);
    assert_eq!(target.signature(), "android.app.Activity#onCreate(android.os.Bundle)");

    let attach = ensure_ok(
        resolve(
            &catalog,
            MAIN_ACTIVITY,
            NamePattern::Suffix("BaseContext".to_string()),
            ParamShape::types(&[Some("Context")]),
        ),
        "resolve attachBaseContext",
    );
    assert_eq!(attach.class_name(), "android.content.ContextWrapper");

    // 停止条件命中 ContextWrapper，其方法不可见
    let hidden = MethodFinder::from_class(&catalog, MAIN_ACTIVITY).and_then(|finder| {
        finder
            .find_super_until(|name| name.ends_with("ContextWrapper"))
            .filter_by_name("attachBaseContext")
            .single()
    });
    assert_eq!(hidden.err(), Some(Errno::NotFound));

    let regex = ensure_ok(NamePattern::regex("^on(Create|Resume)$"), "compile regex");
    let found = ensure_ok(MethodFinder::from_class(&catalog, MAIN_ACTIVITY), "finder")
        .find_super()
        .filter_name(regex)
        .all();
    let names: Vec<&str> = found.iter().map(|target| target.name()).collect();
    assert_eq!(names, vec!["onResume", "onCreate"]);
    clear();
}

pub fn scenario_resolve_ambiguous() {
    clear();
    let catalog = activity_catalog();
    catalog.load(
        ClassDef::new(ACTIVITY)
            .extends("android.view.ContextThemeWrapper")
            .method(
                MethodDef::new("onCreate", |_| Ok(Value::Null)).params(["android.os.Bundle"]),
            )
            .method(
                MethodDef::new("onCreate", |_| Ok(Value::Null))
                    .params(["android.os.Bundle", "android.os.PersistableBundle"]),
            ),
    );
    assert_eq!(find_on_create(&catalog).err(), Some(Errno::AmbiguousMatch));

    let first = ensure_ok(MethodFinder::from_class(&catalog, MAIN_ACTIVITY), "finder")
        .find_super()
        .filter_by_name("onCreate")
        .first();
    let first = ensure_ok(first, "first onCreate");
    assert_eq!(first.method().param_types().len(), 1);

    let narrowed = ensure_ok(
        resolve(
            &catalog,
            MAIN_ACTIVITY,
            NamePattern::exact("onCreate"),
            ParamShape::any().containing("Persistable"),
        ),
        "resolve persistable onCreate",
    );
    assert_eq!(narrowed.method().param_types().len(), 2);
    clear();
}

pub fn scenario_install_all() {
    clear();
    reset_counters();
    let catalog = activity_catalog();
    let targets = ensure_ok(MethodFinder::from_class(&catalog, MAIN_ACTIVITY), "finder")
        .find_super()
        .filter_name(NamePattern::Prefix("on".to_string()))
        .all();
    assert_eq!(targets.len(), 2);

    let handles = ensure_ok(
        global().install_all(&targets, counting_spec(&HOOK_A_COUNT)),
        "install all",
    );
    assert_eq!(handles.len(), 2);
    let on_create = ensure_ok(find_on_create(&catalog), "find onCreate");
    ensure_ok(call_on_create(&on_create), "call onCreate");
    assert_eq!(HOOK_A_COUNT.load(Ordering::Relaxed), 1);
    assert_eq!(global().unhook_all(&handles), 2);
    assert_eq!(global().unhook_all(&handles), 0);

    // 独立注册表与默认注册表互不影响
    let registry = Registry::default();
    let local = ensure_ok(
        registry.install(&on_create, counting_spec(&HOOK_A_COUNT)),
        "install local",
    );
    ensure_ok(call_on_create(&on_create), "call via global");
    assert_eq!(HOOK_A_COUNT.load(Ordering::Relaxed), 1);
    ensure_ok(
        registry.invoke(&on_create, Value::Null, vec![Value::Null]),
        "call via local",
    );
    assert_eq!(HOOK_A_COUNT.load(Ordering::Relaxed), 2);
    assert_eq!(global().uninstall(&local), Err(Errno::InvalidArg));
    ensure_ok(registry.uninstall(&local), "uninstall local");

    clear();
}

// 查找 AlertDialog(Context) 构造函数，挂钩后立即卸载
pub fn scenario_constructor_hook() {
    clear();
    reset_counters();
    let catalog = activity_catalog();

    let ctor = ensure_ok(
        ConstructorFinder::from_class(&catalog, ALERT_DIALOG).and_then(|finder| {
            finder
                .filter_param_count(0..=1)
                .filter_param_types(&["android.content.Context"])
                .first()
        }),
        "find AlertDialog constructor",
    );
    assert!(ctor.is_constructor());

    let handle = ensure_ok(install(&ctor, counting_spec(&HOOK_A_COUNT)), "hook constructor");
    let dialog = ensure_ok(
        invoke(&ctor, Value::Null, vec![Value::from("context")]),
        "construct dialog",
    );
    assert_eq!(dialog, Value::from("AlertDialog(theme=0)"));
    assert_eq!(HOOK_A_COUNT.load(Ordering::Relaxed), 1);
    ensure_ok(handle.unhook(), "unhook constructor");

    ensure_ok(
        invoke(&ctor, Value::Null, vec![Value::from("context")]),
        "construct unhooked",
    );
    assert_eq!(HOOK_A_COUNT.load(Ordering::Relaxed), 1);
    assert_eq!(ORIGIN_COUNT.load(Ordering::Relaxed), 2);

    // 其余构造函数一并挂钩
    let all = ensure_ok(ConstructorFinder::from_class(&catalog, ALERT_DIALOG), "finder").all();
    let handles = ensure_ok(
        global().install_all(&all, counting_spec(&HOOK_A_COUNT)),
        "hook all constructors",
    );
    let themed = ensure_ok(
        invoke(&all[1], Value::Null, vec![Value::from("context"), Value::Int(3)]),
        "construct themed dialog",
    );
    assert_eq!(themed, Value::from("AlertDialog(theme=3)"));
    assert_eq!(global().unhook_all(&handles), 3);
    clear();
}
