use std::sync::atomic::Ordering;

#[cfg(unix)]
use srx_intercept::dump_records;
use srx_intercept::{
    Errno, InterceptionSpec, InvokeError, RECORD_ITEM_ALL, RECORD_ITEM_OP, RECORD_ITEM_TARGET,
    Value, clear, get_records, install, invoke, set_recordable, uninstall,
};

use crate::test_ctx::{
    ACTIVITY, HOOK_A_COUNT, ORIGIN_COUNT, activity_catalog, activity_def, call_get_title,
    call_on_create, counting_spec, ensure_ok, find_get_title, find_on_create, reset_counters,
};

// 安装后立即卸载，期间无调用
pub fn scenario_install_then_unhook() {
    clear();
    reset_counters();
    let catalog = activity_catalog();
    let target = ensure_ok(find_on_create(&catalog), "find onCreate");

    let handle = ensure_ok(install(&target, counting_spec(&HOOK_A_COUNT)), "install onCreate");
    ensure_ok(handle.unhook(), "unhook onCreate");
    assert!(!handle.is_active(), "handle still active after unhook");

    ensure_ok(call_on_create(&target), "call onCreate");
    assert_eq!(HOOK_A_COUNT.load(Ordering::Relaxed), 0, "removed hook was hit");
    assert_eq!(ORIGIN_COUNT.load(Ordering::Relaxed), 1, "original body not run");
    clear();
}

pub fn scenario_single_hook_unhook() {
    clear();
    reset_counters();
    let catalog = activity_catalog();
    let target = ensure_ok(find_on_create(&catalog), "find onCreate");

    let handle = ensure_ok(install(&target, counting_spec(&HOOK_A_COUNT)), "install single");
    ensure_ok(call_on_create(&target), "call single");
    let count = HOOK_A_COUNT.load(Ordering::Relaxed);
    assert!(count >= 1, "single hook not hit");

    ensure_ok(uninstall(&handle), "uninstall single");
    let before = HOOK_A_COUNT.load(Ordering::Relaxed);
    ensure_ok(call_on_create(&target), "call after uninstall");
    let after = HOOK_A_COUNT.load(Ordering::Relaxed);
    assert_eq!(before, after, "single hook still active after uninstall");
    clear();
}

pub fn scenario_double_unhook() {
    clear();
    reset_counters();
    let catalog = activity_catalog();
    let target = find_get_title(&catalog);

    let handle = ensure_ok(install(&target, counting_spec(&HOOK_A_COUNT)), "install");
    ensure_ok(uninstall(&handle), "first uninstall");
    assert_eq!(uninstall(&handle), Err(Errno::AlreadyRemoved));
    assert_eq!(handle.unhook(), Err(Errno::AlreadyRemoved));

    let title = ensure_ok(call_get_title(&target, "Main"), "call after double unhook");
    assert_eq!(title, Value::from("Main"));
    assert_eq!(HOOK_A_COUNT.load(Ordering::Relaxed), 0);
    clear();
}

pub fn scenario_returning_constant() {
    clear();
    reset_counters();
    let catalog = activity_catalog();
    let target = find_get_title(&catalog);

    let handle = ensure_ok(
        install(
            &target,
            InterceptionSpec::new().returning_constant(Value::from("hooked")),
        ),
        "install constant",
    );
    let title = ensure_ok(call_get_title(&target, "Main"), "call constant");
    assert_eq!(title, Value::from("hooked"));
    assert_eq!(ORIGIN_COUNT.load(Ordering::Relaxed), 0, "original body ran");
    ensure_ok(handle.unhook(), "unhook constant");

    let interrupt = ensure_ok(
        install(&target, InterceptionSpec::new().interrupt()),
        "install interrupt",
    );
    assert_eq!(ensure_ok(call_get_title(&target, "Main"), "call interrupt"), Value::Null);
    ensure_ok(interrupt.unhook(), "unhook interrupt");
    clear();
}

pub fn scenario_unloaded_target() {
    clear();
    let catalog = activity_catalog();
    let target = find_get_title(&catalog);
    let handle = ensure_ok(install(&target, counting_spec(&HOOK_A_COUNT)), "install");

    catalog.unload(ACTIVITY);
    assert!(!target.is_available());
    assert!(matches!(
        call_get_title(&target, "Main"),
        Err(InvokeError::TargetUnavailable)
    ));
    assert_eq!(
        install(&target, counting_spec(&HOOK_A_COUNT)).err(),
        Some(Errno::TargetUnavailable)
    );
    // 卸载类不影响已有 handle 的移除
    ensure_ok(handle.unhook(), "unhook after class unload");

    catalog.load(activity_def());
    let reloaded = find_get_title(&catalog);
    assert_ne!(reloaded.id(), target.id());
    let title = ensure_ok(invoke(&reloaded, Value::from("Again"), Vec::new()), "call reloaded");
    assert_eq!(title, Value::from("Again"));
    clear();
}

pub fn scenario_records() {
    clear();
    set_recordable(true);
    let catalog = activity_catalog();
    let target = find_get_title(&catalog);

    let handle = ensure_ok(install(&target, counting_spec(&HOOK_A_COUNT)), "install records");
    ensure_ok(uninstall(&handle), "uninstall records");
    let _ = uninstall(&handle);

    let text = get_records(RECORD_ITEM_OP | RECORD_ITEM_TARGET).expect("records present");
    let signature = target.signature();
    assert!(text.contains(&format!("INSTALL,{signature},")));
    assert!(text.contains(&format!("UNINSTALL,{signature},")));
    assert!(text.lines().any(|line| line == "UNINSTALL,,"));

    set_recordable(false);
    assert!(get_records(RECORD_ITEM_ALL).is_none());
    clear();
}

// 写到标准输出
#[cfg(unix)]
pub fn scenario_dump_records() {
    clear();
    set_recordable(true);
    let catalog = activity_catalog();
    let target = find_get_title(&catalog);

    let handle = ensure_ok(install(&target, counting_spec(&HOOK_A_COUNT)), "install dump");
    ensure_ok(uninstall(&handle), "uninstall dump");
    ensure_ok(dump_records(1, RECORD_ITEM_ALL), "dump records");

    set_recordable(false);
    assert_eq!(dump_records(1, RECORD_ITEM_ALL), Err(Errno::NoRecords));
    clear();
}
