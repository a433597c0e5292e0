// 注册表行为测试：回调顺序、替代结果、卸载与并发
use super::Registry;
use crate::api::{Flow, InterceptionSpec};
use crate::catalog::{Catalog, ClassDef, ConstructorDef, MethodDef, TargetHandle};
use crate::config::{Config, UnhookPolicy};
use crate::errno::{Errno, InvokeError, Stage, Thrown};
use crate::resolve::{ConstructorFinder, MethodFinder};
use crate::value::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex, mpsc};
use std::time::Duration;

type Trace = Arc<Mutex<Vec<String>>>;

fn push(trace: &Trace, item: impl Into<String>) {
    trace.lock().unwrap_or_else(|e| e.into_inner()).push(item.into());
}

fn take(trace: &Trace) -> Vec<String> {
    std::mem::take(&mut *trace.lock().unwrap_or_else(|e| e.into_inner()))
}

// demo.Calc#add(int,int)，原函数体记录 "orig"
fn calc_target(trace: &Trace) -> (Catalog, TargetHandle) {
    let catalog = Catalog::new();
    let body_trace = Arc::clone(trace);
    catalog.load(
        ClassDef::new("demo.Calc").method(
            MethodDef::new("add", move |frame| {
                push(&body_trace, "orig");
                let a = frame.arg(0).and_then(Value::as_int).unwrap_or(0);
                let b = frame.arg(1).and_then(Value::as_int).unwrap_or(0);
                Ok(Value::Int(a + b))
            })
            .params(["int", "int"])
            .returns("int"),
        ),
    );
    let target = MethodFinder::from_class(&catalog, "demo.Calc")
        .and_then(|finder| finder.filter_by_name("add").single())
        .expect("add resolves");
    (catalog, target)
}

fn traced_spec(trace: &Trace, tag: &'static str) -> InterceptionSpec {
    let before_trace = Arc::clone(trace);
    let after_trace = Arc::clone(trace);
    InterceptionSpec::new()
        .before(move |_| {
            push(&before_trace, format!("before:{tag}"));
            Ok(Flow::Continue)
        })
        .after(move |_, _| {
            push(&after_trace, format!("after:{tag}"));
            Ok(Flow::Continue)
        })
}

fn add(registry: &Registry, target: &TargetHandle, a: i64, b: i64) -> Result<Value, InvokeError> {
    registry.invoke(target, Value::Null, vec![Value::Int(a), Value::Int(b)])
}

#[test]
fn stacked_specs_run_in_registration_order() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();

    let _a = registry.install(&target, traced_spec(&trace, "a")).expect("install a");
    let _b = registry.install(&target, traced_spec(&trace, "b")).expect("install b");
    let _c = registry.install(&target, traced_spec(&trace, "c")).expect("install c");

    assert_eq!(add(&registry, &target, 2, 3).expect("invoke"), Value::Int(5));
    assert_eq!(
        take(&trace),
        vec!["before:a", "before:b", "before:c", "orig", "after:a", "after:b", "after:c"]
    );
    assert_eq!(registry.hooks_on(&target), 3);
}

#[test]
fn before_substitute_skips_body_and_replace_but_not_after() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();

    let replace_trace = Arc::clone(&trace);
    let _replace = registry
        .install(
            &target,
            InterceptionSpec::new().replace(move |_| {
                push(&replace_trace, "replace");
                Ok(Value::Int(-1))
            }),
        )
        .expect("install replace");
    let _constant = registry
        .install(&target, InterceptionSpec::new().returning_constant(Value::Int(42)))
        .expect("install constant");
    let seen = Arc::new(Mutex::new(None));
    let seen_in_after = Arc::clone(&seen);
    let _after = registry
        .install(
            &target,
            InterceptionSpec::new().after(move |_, outcome| {
                *seen_in_after.lock().unwrap_or_else(|e| e.into_inner()) = Some(outcome.clone());
                Ok(Flow::SubstituteWith(Value::Int(43)))
            }),
        )
        .expect("install after");

    assert_eq!(add(&registry, &target, 1, 1).expect("invoke"), Value::Int(43));
    assert!(take(&trace).is_empty());
    assert_eq!(
        *seen.lock().unwrap_or_else(|e| e.into_inner()),
        Some(Ok(Value::Int(42)))
    );
}

#[test]
fn later_before_observes_and_overrides_pending_result() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();

    let _first = registry
        .install(&target, InterceptionSpec::new().returning_constant(Value::Int(1)))
        .expect("install first");
    let _second = registry
        .install(
            &target,
            InterceptionSpec::new().before(|frame| {
                let pending = frame.pending_result().and_then(Value::as_int).unwrap_or(0);
                Ok(Flow::SubstituteWith(Value::Int(pending + 10)))
            }),
        )
        .expect("install second");

    assert_eq!(add(&registry, &target, 5, 5).expect("invoke"), Value::Int(11));
}

#[test]
fn latest_replace_wins_and_uninstall_restores_previous() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();

    let older = registry
        .install(&target, InterceptionSpec::new().replace(|_| Ok(Value::Int(100))))
        .expect("install older");
    let newer = registry
        .install(&target, InterceptionSpec::new().replace(|_| Ok(Value::Int(200))))
        .expect("install newer");
    assert_eq!(add(&registry, &target, 1, 2).expect("invoke"), Value::Int(200));

    registry.uninstall(&newer).expect("uninstall newer");
    assert_eq!(add(&registry, &target, 1, 2).expect("invoke"), Value::Int(100));

    registry.uninstall(&older).expect("uninstall older");
    assert_eq!(add(&registry, &target, 1, 2).expect("invoke"), Value::Int(3));
    assert_eq!(take(&trace), vec!["orig"]);
}

#[test]
fn before_can_rewrite_arguments() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();

    let _hook = registry
        .install(
            &target,
            InterceptionSpec::new().before(|frame| {
                frame.set_arg(1, Value::Int(40)).map_err(|err| Thrown::new(err.to_string()))?;
                Ok(Flow::Continue)
            }),
        )
        .expect("install");

    assert_eq!(add(&registry, &target, 2, 0).expect("invoke"), Value::Int(42));
}

#[test]
fn uninstall_right_after_install_restores_original() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();

    let handle = registry
        .install(&target, InterceptionSpec::new().interrupt())
        .expect("install");
    registry.uninstall(&handle).expect("uninstall");

    assert_eq!(registry.hooks_on(&target), 0);
    assert_eq!(registry.active_hooks(), 0);
    assert_eq!(add(&registry, &target, 4, 4).expect("invoke"), Value::Int(8));
    assert_eq!(take(&trace), vec!["orig"]);
}

#[test]
fn double_uninstall_reports_already_removed() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();

    let keep = registry
        .install(&target, traced_spec(&trace, "keep"))
        .expect("install keep");
    let handle = registry
        .install(&target, InterceptionSpec::new().interrupt())
        .expect("install");

    assert_eq!(registry.uninstall(&handle), Ok(()));
    assert_eq!(registry.uninstall(&handle), Err(Errno::AlreadyRemoved));
    assert_eq!(handle.unhook(), Err(Errno::AlreadyRemoved));
    assert!(!handle.is_active());
    assert!(keep.is_active());

    assert_eq!(add(&registry, &target, 1, 2).expect("invoke"), Value::Int(3));
    assert_eq!(take(&trace), vec!["before:keep", "orig", "after:keep"]);
    assert_eq!(registry.hooks_on(&target), 1);
}

#[test]
fn ignore_policy_accepts_double_uninstall() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::new(Config {
        unhook_policy: UnhookPolicy::Ignore,
        ..Config::default()
    });

    let handle = registry
        .install(&target, InterceptionSpec::new().interrupt())
        .expect("install");
    assert_eq!(handle.unhook(), Ok(()));
    assert_eq!(handle.unhook(), Ok(()));
}

#[test]
fn handle_from_other_registry_is_rejected() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let first = Registry::default();
    let second = Registry::default();

    let handle = first
        .install(&target, InterceptionSpec::new().interrupt())
        .expect("install");
    assert_eq!(second.uninstall(&handle), Err(Errno::InvalidArg));
    assert!(!second.is_active(&handle));
    assert!(first.is_active(&handle));
}

#[test]
fn dropped_registry_reports_already_removed() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();
    let handle = registry
        .install(&target, InterceptionSpec::new().interrupt())
        .expect("install");
    drop(registry);
    assert_eq!(handle.unhook(), Err(Errno::AlreadyRemoved));
}

#[test]
fn empty_spec_and_unloaded_target_are_rejected() {
    let trace = Trace::default();
    let (catalog, target) = calc_target(&trace);
    let registry = Registry::default();

    assert_eq!(
        registry.install(&target, InterceptionSpec::new()).map(|h| h.stub()),
        Err(Errno::InvalidArg)
    );

    let handle = registry
        .install(&target, InterceptionSpec::new().interrupt())
        .expect("install");
    assert!(catalog.unload("demo.Calc"));
    assert_eq!(
        registry.install(&target, InterceptionSpec::new().interrupt()).map(|h| h.stub()),
        Err(Errno::TargetUnavailable)
    );
    assert!(matches!(
        add(&registry, &target, 1, 1),
        Err(InvokeError::TargetUnavailable)
    ));
    // 卸载类后已有的安装仍可正常移除
    assert_eq!(registry.uninstall(&handle), Ok(()));
}

#[test]
fn callback_error_propagates_and_keeps_chain_intact() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();

    let failing = registry
        .install(
            &target,
            InterceptionSpec::new().before(|_| Err(Thrown::new("boom"))),
        )
        .expect("install");
    let _tail = registry
        .install(&target, traced_spec(&trace, "tail"))
        .expect("install tail");

    match add(&registry, &target, 1, 1) {
        Err(InvokeError::Callback {
            stub,
            stage,
            source,
        }) => {
            assert_eq!(stub, failing.stub());
            assert_eq!(stage, Stage::Before);
            assert_eq!(source.message, "boom");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(take(&trace).is_empty());
    assert_eq!(registry.hooks_on(&target), 2);

    registry.uninstall(&failing).expect("uninstall failing");
    assert_eq!(add(&registry, &target, 1, 1).expect("invoke"), Value::Int(2));
    assert_eq!(take(&trace), vec!["before:tail", "orig", "after:tail"]);
}

#[test]
fn panicking_callback_is_contained() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();

    let hook = registry
        .install(
            &target,
            InterceptionSpec::new().after(|_, _| panic!("after callback panic")),
        )
        .expect("install");

    match add(&registry, &target, 1, 1) {
        Err(InvokeError::Panicked { stub, stage }) => {
            assert_eq!(stub, hook.stub());
            assert_eq!(stage, Stage::After);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    registry.uninstall(&hook).expect("uninstall");
    assert_eq!(add(&registry, &target, 1, 1).expect("invoke"), Value::Int(2));
}

#[test]
fn after_can_recover_thrown_body() {
    let catalog = Catalog::new();
    catalog.load(
        ClassDef::new("demo.Io").method(MethodDef::new("read", |_| Err(Thrown::new("eof")))),
    );
    let target = MethodFinder::from_class(&catalog, "demo.Io")
        .and_then(|finder| finder.filter_by_name("read").single())
        .expect("read resolves");
    let registry = Registry::default();

    assert!(matches!(
        registry.invoke(&target, Value::Null, Vec::new()),
        Err(InvokeError::Thrown(_))
    ));

    let _hook = registry
        .install(
            &target,
            InterceptionSpec::new().after(|_, outcome| match outcome {
                Err(_) => Ok(Flow::SubstituteWith(Value::from("fallback"))),
                Ok(_) => Ok(Flow::Continue),
            }),
        )
        .expect("install");
    assert_eq!(
        registry.invoke(&target, Value::Null, Vec::new()).expect("recovered"),
        Value::from("fallback")
    );
}

#[test]
fn install_all_rolls_back_on_failure() {
    let trace = Trace::default();
    let (catalog, target) = calc_target(&trace);
    catalog.load(
        ClassDef::new("demo.Other").method(MethodDef::new("run", |_| Ok(Value::Null))),
    );
    let other = MethodFinder::from_class(&catalog, "demo.Other")
        .and_then(|finder| finder.first())
        .expect("run resolves");
    let registry = Registry::default();

    let handles = registry
        .install_all([&target, &other], InterceptionSpec::new().interrupt())
        .expect("install all");
    assert_eq!(handles.len(), 2);
    assert_eq!(registry.unhook_all(&handles), 2);

    assert!(catalog.unload("demo.Other"));
    assert_eq!(
        registry
            .install_all([&target, &other], InterceptionSpec::new().interrupt())
            .map(|handles| handles.len()),
        Err(Errno::TargetUnavailable)
    );
    assert_eq!(registry.hooks_on(&target), 0);
    assert_eq!(registry.active_hooks(), 0);
}

#[test]
fn clear_removes_everything() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();

    let first = registry.install(&target, InterceptionSpec::new().interrupt()).expect("a");
    let _second = registry.install(&target, InterceptionSpec::new().interrupt()).expect("b");
    assert_eq!(registry.clear(), 2);
    assert_eq!(registry.hooks_on(&target), 0);
    assert_eq!(registry.uninstall(&first), Err(Errno::AlreadyRemoved));
    assert_eq!(add(&registry, &target, 2, 2).expect("invoke"), Value::Int(4));
}

#[test]
fn callback_may_uninstall_its_own_hook() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();

    let slot: Arc<Mutex<Option<super::HookHandle>>> = Arc::new(Mutex::new(None));
    let slot_in_cb = Arc::clone(&slot);
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in_cb = Arc::clone(&hits);
    let handle = registry
        .install(
            &target,
            InterceptionSpec::new().before(move |_| {
                hits_in_cb.fetch_add(1, Ordering::Relaxed);
                if let Some(handle) = slot_in_cb.lock().unwrap_or_else(|e| e.into_inner()).take() {
                    handle.unhook().map_err(|err| Thrown::new(err.to_string()))?;
                }
                Ok(Flow::Continue)
            }),
        )
        .expect("install");
    *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);

    add(&registry, &target, 1, 1).expect("first call");
    add(&registry, &target, 1, 1).expect("second call");
    assert_eq!(hits.load(Ordering::Relaxed), 1);
    assert_eq!(registry.active_hooks(), 0);
}

#[test]
fn constructors_are_hookable_targets() {
    let catalog = Catalog::new();
    catalog.load(
        ClassDef::new("demo.Point")
            .constructor(
                ConstructorDef::new(|frame| {
                    let x = frame.arg(0).and_then(Value::as_int).unwrap_or(0);
                    let y = frame.arg(1).and_then(Value::as_int).unwrap_or(0);
                    Ok(Value::List(vec![Value::Int(x), Value::Int(y)]))
                })
                .params(["int", "int"]),
            )
            .constructor(ConstructorDef::new(|_| Ok(Value::List(Vec::new())))),
    );
    let ctor = ConstructorFinder::from_class(&catalog, "demo.Point")
        .and_then(|finder| finder.filter_param_count(2..=2).single())
        .expect("two-arg constructor");
    let registry = Registry::default();
    let trace = Trace::default();

    let handle = registry.install(&ctor, traced_spec(&trace, "ctor")).expect("install");
    let point = registry
        .invoke(&ctor, Value::Null, vec![Value::Int(1), Value::Int(2)])
        .expect("construct");
    assert_eq!(point, Value::List(vec![Value::Int(1), Value::Int(2)]));
    assert_eq!(take(&trace), vec!["before:ctor", "after:ctor"]);

    handle.unhook().expect("unhook");
    registry
        .invoke(&ctor, Value::Null, vec![Value::Int(3), Value::Int(4)])
        .expect("construct unhooked");
    assert!(take(&trace).is_empty());

    // 对全部构造函数批量安装
    let all = ConstructorFinder::from_class(&catalog, "demo.Point")
        .expect("class")
        .all();
    let handles = registry
        .install_all(&all, InterceptionSpec::new().returning_constant(Value::Null))
        .expect("install all");
    assert_eq!(handles.len(), 2);
    assert_eq!(registry.invoke(&all[1], Value::Null, Vec::new()).expect("invoke"), Value::Null);
    assert_eq!(registry.unhook_all(&handles), 2);
}

#[test]
fn uninstall_waits_for_in_flight_call() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();

    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let started_tx = Mutex::new(started_tx);
    let release_rx = Mutex::new(release_rx);
    let after_hits = Arc::new(AtomicUsize::new(0));
    let after_in_cb = Arc::clone(&after_hits);
    let handle = registry
        .install(
            &target,
            InterceptionSpec::new()
                .before(move |_| {
                    let _ = started_tx.lock().unwrap_or_else(|e| e.into_inner()).send(());
                    let _ = release_rx.lock().unwrap_or_else(|e| e.into_inner()).recv();
                    Ok(Flow::Continue)
                })
                .after(move |_, _| {
                    after_in_cb.fetch_add(1, Ordering::SeqCst);
                    Ok(Flow::Continue)
                }),
        )
        .expect("install");

    let caller = {
        let registry = registry.clone();
        let target = target.clone();
        std::thread::spawn(move || add(&registry, &target, 1, 2))
    };
    started_rx.recv().expect("before started");

    let (done_tx, done_rx) = mpsc::channel();
    let remover = {
        let registry = registry.clone();
        let after_hits = Arc::clone(&after_hits);
        std::thread::spawn(move || {
            let result = registry.uninstall(&handle);
            let _ = done_tx.send(after_hits.load(Ordering::SeqCst));
            result
        })
    };

    assert!(
        done_rx.recv_timeout(Duration::from_millis(300)).is_err(),
        "uninstall returned while the call was still running"
    );
    assert_eq!(after_hits.load(Ordering::SeqCst), 0);

    release_tx.send(()).expect("release before");
    assert_eq!(caller.join().expect("caller panic").expect("invoke"), Value::Int(3));
    assert_eq!(done_rx.recv().expect("uninstall finished"), 1);
    remover.join().expect("remover panic").expect("uninstall");

    assert_eq!(add(&registry, &target, 1, 2).expect("invoke"), Value::Int(3));
    assert_eq!(after_hits.load(Ordering::SeqCst), 1);
}

#[test]
fn clear_waits_for_in_flight_call() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();

    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let started_tx = Mutex::new(started_tx);
    let release_rx = Mutex::new(release_rx);
    registry
        .install(
            &target,
            InterceptionSpec::new().replace(move |_| {
                let _ = started_tx.lock().unwrap_or_else(|e| e.into_inner()).send(());
                let _ = release_rx.lock().unwrap_or_else(|e| e.into_inner()).recv();
                Ok(Value::Int(-1))
            }),
        )
        .expect("install");

    let caller = {
        let registry = registry.clone();
        let target = target.clone();
        std::thread::spawn(move || add(&registry, &target, 1, 2))
    };
    started_rx.recv().expect("replace started");

    let (done_tx, done_rx) = mpsc::channel();
    let clearer = {
        let registry = registry.clone();
        std::thread::spawn(move || {
            let removed = registry.clear();
            let _ = done_tx.send(());
            removed
        })
    };
    assert!(done_rx.recv_timeout(Duration::from_millis(300)).is_err());

    release_tx.send(()).expect("release replace");
    assert_eq!(caller.join().expect("caller panic").expect("invoke"), Value::Int(-1));
    assert_eq!(clearer.join().expect("clearer panic"), 1);
    assert_eq!(add(&registry, &target, 1, 2).expect("invoke"), Value::Int(3));
}

#[test]
fn registry_config_leaves_log_level_alone() {
    let before = crate::log::debug_enabled();
    let _registry = Registry::new(Config::from_lookup(|_| Some("1".to_string())));
    assert_eq!(crate::log::debug_enabled(), before);
}

#[test]
fn records_track_install_and_uninstall() {
    use crate::api::{RECORD_ITEM_ERRNO, RECORD_ITEM_OP, RECORD_ITEM_TARGET};

    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::new(Config {
        recordable: true,
        ..Config::default()
    });

    let handle = registry.install(&target, InterceptionSpec::new().interrupt()).expect("install");
    registry.uninstall(&handle).expect("uninstall");
    let _ = registry.uninstall(&handle);

    let text = registry
        .records(RECORD_ITEM_OP | RECORD_ITEM_TARGET | RECORD_ITEM_ERRNO)
        .expect("records enabled");
    assert_eq!(
        text,
        "INSTALL,demo.Calc#add(int,int),0,\n\
         UNINSTALL,demo.Calc#add(int,int),0,\n\
         UNINSTALL,,33,\n"
    );
}

// before 把参数 0 加一，after 把结果列表第二项加一；完整链上两者相等
fn counting_spec() -> InterceptionSpec {
    InterceptionSpec::new()
        .before(|frame| {
            let count = frame.arg(0).and_then(Value::as_int).unwrap_or(0);
            frame
                .set_arg(0, Value::Int(count + 1))
                .map_err(|err| Thrown::new(err.to_string()))?;
            Ok(Flow::Continue)
        })
        .after(|frame, outcome| {
            let befores = frame.arg(0).and_then(Value::as_int).unwrap_or(0);
            let afters = match outcome {
                Ok(Value::List(items)) => items.get(1).and_then(Value::as_int).unwrap_or(0) + 1,
                _ => 1,
            };
            Ok(Flow::SubstituteWith(Value::List(vec![
                Value::Int(befores),
                Value::Int(afters),
            ])))
        })
}

#[test]
fn concurrent_invocations_see_complete_chains() {
    let trace = Trace::default();
    let (_catalog, target) = calc_target(&trace);
    let registry = Registry::default();
    let base = registry.install(&target, counting_spec()).expect("install base");

    let worker_count = 8;
    let calls_per_worker = 400;
    let start = Arc::new(Barrier::new(worker_count + 1));
    let mut workers = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let registry = registry.clone();
        let target = target.clone();
        let start = Arc::clone(&start);
        workers.push(std::thread::spawn(move || {
            start.wait();
            for _ in 0..calls_per_worker {
                let value = registry
                    .invoke(&target, Value::Null, vec![Value::Int(0), Value::Int(0)])
                    .expect("invoke");
                let Some([Value::Int(befores), Value::Int(afters)]) = value.as_list() else {
                    panic!("unexpected result: {value:?}");
                };
                assert!(*befores == 1 || *befores == 2, "chain length {befores}");
                assert_eq!(befores, afters, "partial chain observed");
            }
        }));
    }

    start.wait();
    for _ in 0..200 {
        let handle = registry.install(&target, counting_spec()).expect("install");
        registry.uninstall(&handle).expect("uninstall");
    }

    for worker in workers {
        worker.join().expect("worker panic");
    }
    registry.uninstall(&base).expect("uninstall base");
    assert_eq!(registry.active_hooks(), 0);
}
