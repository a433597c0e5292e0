use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use srx_intercept::{
    Flow, InterceptionSpec, InvokeError, Stage, Thrown, Value, clear, global, install, invoke,
    uninstall,
};

use crate::test_ctx::{
    HOOK_A_COUNT, HOOK_B_COUNT, HOOK_C_COUNT, ORIGIN_COUNT, activity_catalog, call_get_title,
    counting_spec, ensure_ok, find_get_title, reset_counters,
};

fn tagging_spec(trace: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> InterceptionSpec {
    let before_trace = Arc::clone(trace);
    let after_trace = Arc::clone(trace);
    InterceptionSpec::new()
        .before(move |_| {
            before_trace.lock().unwrap().push(format!("before:{tag}"));
            Ok(Flow::Continue)
        })
        .after(move |_, _| {
            after_trace.lock().unwrap().push(format!("after:{tag}"));
            Ok(Flow::Continue)
        })
}

pub fn scenario_multi_chain_unhook() {
    clear();
    reset_counters();
    let catalog = activity_catalog();
    let target = find_get_title(&catalog);

    let hook_a = ensure_ok(install(&target, counting_spec(&HOOK_A_COUNT)), "install A");
    let hook_b = ensure_ok(install(&target, counting_spec(&HOOK_B_COUNT)), "install B");
    let hook_c = ensure_ok(install(&target, counting_spec(&HOOK_C_COUNT)), "install C");
    assert_eq!(global().hooks_on(&target), 3);

    ensure_ok(call_get_title(&target, "Main"), "call chain");
    assert_eq!(HOOK_A_COUNT.load(Ordering::Relaxed), 1);
    assert_eq!(HOOK_B_COUNT.load(Ordering::Relaxed), 1);
    assert_eq!(HOOK_C_COUNT.load(Ordering::Relaxed), 1);

    // 移除中间一环，其余仍按序生效
    ensure_ok(uninstall(&hook_b), "uninstall B");
    ensure_ok(call_get_title(&target, "Main"), "call without B");
    assert_eq!(HOOK_A_COUNT.load(Ordering::Relaxed), 2);
    assert_eq!(HOOK_B_COUNT.load(Ordering::Relaxed), 1);
    assert_eq!(HOOK_C_COUNT.load(Ordering::Relaxed), 2);

    ensure_ok(uninstall(&hook_a), "uninstall A");
    ensure_ok(uninstall(&hook_c), "uninstall C");
    assert_eq!(global().hooks_on(&target), 0);
    ensure_ok(call_get_title(&target, "Main"), "call unhooked");
    assert_eq!(ORIGIN_COUNT.load(Ordering::Relaxed), 3);
    clear();
}

pub fn scenario_substitute_short_circuit() {
    clear();
    reset_counters();
    let catalog = activity_catalog();
    let target = find_get_title(&catalog);
    let trace = Arc::new(Mutex::new(Vec::new()));

    let _first = ensure_ok(install(&target, tagging_spec(&trace, "a")), "install a");
    let _substitute = ensure_ok(
        install(
            &target,
            InterceptionSpec::new()
                .before(|_| Ok(Flow::SubstituteWith(Value::from("cached"))))
                .replace(|_| Ok(Value::from("replaced"))),
        ),
        "install substitute",
    );
    let _rewrite = ensure_ok(
        install(
            &target,
            InterceptionSpec::new().after(|_, outcome| match outcome {
                Ok(value) => Ok(Flow::SubstituteWith(Value::from(format!(
                    "{}!",
                    value.as_str().unwrap_or_default()
                )))),
                Err(_) => Ok(Flow::Continue),
            }),
        ),
        "install rewrite",
    );

    let title = ensure_ok(call_get_title(&target, "Main"), "call substitute");
    assert_eq!(title, Value::from("cached!"));
    assert_eq!(ORIGIN_COUNT.load(Ordering::Relaxed), 0, "original body ran");
    assert_eq!(*trace.lock().unwrap(), vec!["before:a", "after:a"]);
    clear();
}

pub fn scenario_replace_stack() {
    clear();
    reset_counters();
    let catalog = activity_catalog();
    let target = find_get_title(&catalog);

    let older = ensure_ok(
        install(&target, InterceptionSpec::new().replace(|_| Ok(Value::from("older")))),
        "install older replace",
    );
    let newer = ensure_ok(
        install(&target, InterceptionSpec::new().replace(|frame| {
            let title = frame.this_object().as_str().unwrap_or_default();
            Ok(Value::from(format!("newer:{title}")))
        })),
        "install newer replace",
    );
    assert_eq!(
        ensure_ok(call_get_title(&target, "Main"), "call newer"),
        Value::from("newer:Main")
    );

    ensure_ok(newer.unhook(), "unhook newer");
    assert_eq!(
        ensure_ok(call_get_title(&target, "Main"), "call older"),
        Value::from("older")
    );
    ensure_ok(older.unhook(), "unhook older");
    assert_eq!(
        ensure_ok(call_get_title(&target, "Main"), "call original"),
        Value::from("Main")
    );
    assert_eq!(ORIGIN_COUNT.load(Ordering::Relaxed), 1);
    clear();
}

pub fn scenario_callback_failure() {
    clear();
    reset_counters();
    let catalog = activity_catalog();
    let target = find_get_title(&catalog);

    let failing = ensure_ok(
        install(
            &target,
            InterceptionSpec::new().before(|_| Err(Thrown::new("IllegalStateException"))),
        ),
        "install failing",
    );
    match call_get_title(&target, "Main") {
        Err(InvokeError::Callback { stub, stage, source }) => {
            assert_eq!(stub, failing.stub());
            assert_eq!(stage, Stage::Before);
            assert_eq!(source.message, "IllegalStateException");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(ORIGIN_COUNT.load(Ordering::Relaxed), 0);
    ensure_ok(failing.unhook(), "unhook failing");

    let panicking = ensure_ok(
        install(
            &target,
            InterceptionSpec::new().after(|_, _| panic!("after callback exploded")),
        ),
        "install panicking",
    );
    assert!(matches!(
        call_get_title(&target, "Main"),
        Err(InvokeError::Panicked {
            stage: Stage::After,
            ..
        })
    ));
    ensure_ok(panicking.unhook(), "unhook panicking");

    // 失败不影响分发表
    assert_eq!(
        ensure_ok(call_get_title(&target, "Main"), "call after failures"),
        Value::from("Main")
    );
    clear();
}

// 回调内再次调用目标与卸载自身
pub fn scenario_reentrant_invoke() {
    clear();
    reset_counters();
    let catalog = activity_catalog();
    let target = find_get_title(&catalog);
    let inner_target = target.clone();

    let handle = ensure_ok(
        install(
            &target,
            InterceptionSpec::new().before(move |frame| {
                if frame.this_object().as_str() == Some("outer") {
                    let inner = invoke(&inner_target, Value::from("inner"), Vec::new())
                        .map_err(|err| Thrown::new(err.to_string()))?;
                    return Ok(Flow::SubstituteWith(inner));
                }
                Ok(Flow::Continue)
            }),
        ),
        "install reentrant",
    );
    assert_eq!(
        ensure_ok(call_get_title(&target, "outer"), "call reentrant"),
        Value::from("inner")
    );

    let slot: Arc<Mutex<Option<srx_intercept::HookHandle>>> = Arc::default();
    let self_slot = Arc::clone(&slot);
    let once = ensure_ok(
        install(
            &target,
            InterceptionSpec::new().after(move |_, _| {
                if let Some(handle) = self_slot.lock().unwrap().take() {
                    handle.unhook().map_err(|err| Thrown::new(err.to_string()))?;
                }
                Ok(Flow::SubstituteWith(Value::from("once")))
            }),
        ),
        "install self-removing",
    );
    let once_stub = once.stub();
    *slot.lock().unwrap() = Some(once);

    assert_eq!(
        ensure_ok(call_get_title(&target, "Main"), "call self-removing"),
        Value::from("once")
    );
    assert_eq!(
        ensure_ok(call_get_title(&target, "Main"), "call after self-removal"),
        Value::from("Main")
    );
    assert_eq!(global().hooks_on(&target), 1);
    assert!(once_stub > handle.stub());
    ensure_ok(handle.unhook(), "unhook reentrant");
    clear();
}
