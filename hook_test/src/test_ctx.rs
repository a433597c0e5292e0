use std::sync::atomic::{AtomicUsize, Ordering};

use srx_intercept::{
    Catalog, ClassDef, ConstructorDef, Errno, Flow, InterceptionSpec, InvokeError, MethodDef,
    MethodFinder, TargetHandle, Value, invoke,
};

pub static HOOK_A_COUNT: AtomicUsize = AtomicUsize::new(0);
pub static HOOK_B_COUNT: AtomicUsize = AtomicUsize::new(0);
pub static HOOK_C_COUNT: AtomicUsize = AtomicUsize::new(0);
pub static ORIGIN_COUNT: AtomicUsize = AtomicUsize::new(0);

pub const MAIN_ACTIVITY: &str = "com.example.MainActivity";
pub const ACTIVITY: &str = "android.app.Activity";
pub const ALERT_DIALOG: &str = "android.app.AlertDialog";

pub fn reset_counters() {
    for counter in [&HOOK_A_COUNT, &HOOK_B_COUNT, &HOOK_C_COUNT, &ORIGIN_COUNT] {
        counter.store(0, Ordering::Relaxed);
    }
}

pub fn activity_def() -> ClassDef {
    ClassDef::new(ACTIVITY)
        .extends("android.view.ContextThemeWrapper")
        .method(
            MethodDef::new("onCreate", |_| {
                ORIGIN_COUNT.fetch_add(1, Ordering::Relaxed);
                Ok(Value::Null)
            })
            .params(["android.os.Bundle"]),
        )
        .method(
            MethodDef::new("getTitle", |frame| {
                ORIGIN_COUNT.fetch_add(1, Ordering::Relaxed);
                let title = frame.this_object().as_str().unwrap_or("untitled");
                Ok(Value::from(title))
            })
            .returns("java.lang.CharSequence"),
        )
}

// MainActivity -> Activity -> ContextThemeWrapper -> ContextWrapper
pub fn activity_catalog() -> Catalog {
    let catalog = Catalog::new();
    catalog.load(
        ClassDef::new("android.content.ContextWrapper").method(
            MethodDef::new("attachBaseContext", |_| Ok(Value::Null))
                .params(["android.content.Context"]),
        ),
    );
    catalog.load(
        ClassDef::new("android.view.ContextThemeWrapper")
            .extends("android.content.ContextWrapper")
            .method(MethodDef::new("setTheme", |_| Ok(Value::Null)).params(["int"])),
    );
    catalog.load(activity_def());
    catalog.load(alert_dialog_def());
    catalog.load(
        ClassDef::new(MAIN_ACTIVITY)
            .extends(ACTIVITY)
            .method(MethodDef::new("onResume", |_| Ok(Value::Null))),
    );
    catalog
}

// 构造函数体返回以主题号标记的对话框实例
pub fn alert_dialog_def() -> ClassDef {
    let dialog = |params: &[&str]| {
        ConstructorDef::new(|frame| {
            ORIGIN_COUNT.fetch_add(1, Ordering::Relaxed);
            let theme = frame.arg(1).and_then(Value::as_int).unwrap_or(0);
            Ok(Value::from(format!("AlertDialog(theme={theme})")))
        })
        .params(params.iter().copied())
    };
    ClassDef::new(ALERT_DIALOG)
        .extends("android.app.Dialog")
        .constructor(dialog(&["android.content.Context"]))
        .constructor(dialog(&["android.content.Context", "int"]))
        .constructor(dialog(&[
            "android.content.Context",
            "boolean",
            "android.content.DialogInterface$OnCancelListener",
        ]))
}

pub fn find_on_create(catalog: &Catalog) -> Result<TargetHandle, Errno> {
    MethodFinder::from_class(catalog, MAIN_ACTIVITY)?
        .find_super_until(|name| name.ends_with("ContextWrapper"))
        .filter_by_name("onCreate")
        .filter_param_count(0..=2)
        .single()
}

pub fn find_get_title(catalog: &Catalog) -> TargetHandle {
    MethodFinder::from_class(catalog, MAIN_ACTIVITY)
        .and_then(|finder| finder.find_super().filter_by_name("getTitle").single())
        .expect("getTitle resolves")
}

pub fn counting_spec(counter: &'static AtomicUsize) -> InterceptionSpec {
    InterceptionSpec::new()
        .before(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(Flow::Continue)
        })
        .after(|_, _| Ok(Flow::Continue))
}

pub fn call_on_create(target: &TargetHandle) -> Result<Value, InvokeError> {
    invoke(target, Value::from("main"), vec![Value::Null])
}

pub fn call_get_title(target: &TargetHandle, title: &str) -> Result<Value, InvokeError> {
    invoke(target, Value::from(title), Vec::new())
}

pub fn ensure_ok<T, E: std::fmt::Debug>(result: Result<T, E>, op: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{op} failed: {err:?}"),
    }
}

pub fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}
