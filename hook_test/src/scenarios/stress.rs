use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

use srx_intercept::{Flow, InterceptionSpec, Value, clear, global, install, invoke, uninstall};

use crate::test_ctx::{
    HOOK_A_COUNT, activity_catalog, counting_spec, ensure_ok, env_usize, find_get_title,
    reset_counters,
};

static BEFORE_HITS: AtomicUsize = AtomicUsize::new(0);
static AFTER_HITS: AtomicUsize = AtomicUsize::new(0);

// before/after 成对计数，用于检测调用是否观察到半安装的链
fn paired_spec() -> InterceptionSpec {
    InterceptionSpec::new()
        .before(|_| {
            BEFORE_HITS.fetch_add(1, Ordering::Relaxed);
            Ok(Flow::Continue)
        })
        .after(|_, _| {
            AFTER_HITS.fetch_add(1, Ordering::Relaxed);
            Ok(Flow::Continue)
        })
}

pub fn scenario_concurrent_hooking_stress() {
    clear();
    BEFORE_HITS.store(0, Ordering::Relaxed);
    AFTER_HITS.store(0, Ordering::Relaxed);
    let catalog = activity_catalog();
    let target = find_get_title(&catalog);

    let worker_count = env_usize("HOOK_TEST_CONCURRENT_WORKERS", 16);
    let worker_calls = env_usize("HOOK_TEST_CONCURRENT_CALLS", 400);
    let hook_rounds = env_usize("HOOK_TEST_CONCURRENT_ROUNDS", 80);

    let base = ensure_ok(install(&target, paired_spec()), "install base");
    let start_barrier = Arc::new(Barrier::new(worker_count + 1));
    let mut workers = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let barrier = Arc::clone(&start_barrier);
        let worker_target = target.clone();
        workers.push(std::thread::spawn(move || {
            barrier.wait();
            for _ in 0..worker_calls {
                let title = invoke(&worker_target, Value::from("Main"), Vec::new())
                    .expect("concurrent invoke failed");
                assert_eq!(title, Value::from("Main"));
            }
        }));
    }

    start_barrier.wait();
    for _ in 0..hook_rounds {
        let handle = ensure_ok(install(&target, paired_spec()), "install concurrent");
        std::thread::sleep(Duration::from_micros(200));
        ensure_ok(uninstall(&handle), "uninstall concurrent");
    }

    for worker in workers {
        worker.join().expect("concurrent worker panic");
    }

    let befores = BEFORE_HITS.load(Ordering::Relaxed);
    let afters = AFTER_HITS.load(Ordering::Relaxed);
    println!("concurrent stress: before={befores} after={afters}");
    assert_eq!(befores, afters, "invocation observed a partial chain");
    assert!(befores >= worker_count * worker_calls);
    assert_eq!(global().hooks_on(&target), 1);
    ensure_ok(uninstall(&base), "uninstall base");
    clear();
}

pub fn scenario_persistent_hook_parallel_stress() {
    clear();
    reset_counters();
    let catalog = activity_catalog();
    let target = find_get_title(&catalog);
    let handle = ensure_ok(
        install(&target, counting_spec(&HOOK_A_COUNT)),
        "install persistent stress",
    );

    let worker_count = env_usize("HOOK_TEST_PERSISTENT_WORKERS", 16);
    let worker_calls = env_usize("HOOK_TEST_PERSISTENT_CALLS", 1000);
    let expected = worker_count * worker_calls;
    let start_barrier = Arc::new(Barrier::new(worker_count));

    let mut workers = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let barrier = Arc::clone(&start_barrier);
        let worker_target = target.clone();
        workers.push(std::thread::spawn(move || {
            barrier.wait();
            for _ in 0..worker_calls {
                invoke(&worker_target, Value::Null, Vec::new()).expect("persistent invoke failed");
            }
        }));
    }
    for worker in workers {
        worker.join().expect("persistent worker panic");
    }

    let hit_count = HOOK_A_COUNT.load(Ordering::Relaxed);
    println!("persistent stress: expected={expected} actual={hit_count}");
    assert_eq!(hit_count, expected, "persistent stress lost calls");

    ensure_ok(uninstall(&handle), "uninstall persistent stress");
    clear();
}

pub fn scenario_perf_smoke() {
    clear();
    let catalog = activity_catalog();
    let target = find_get_title(&catalog);
    let calls = env_usize("HOOK_TEST_PERF_CALLS", 100_000);

    let started = Instant::now();
    for _ in 0..calls {
        invoke(&target, Value::Null, Vec::new()).expect("plain invoke failed");
    }
    let plain = started.elapsed();

    let handle = ensure_ok(install(&target, counting_spec(&HOOK_A_COUNT)), "install perf");
    let started = Instant::now();
    for _ in 0..calls {
        invoke(&target, Value::Null, Vec::new()).expect("hooked invoke failed");
    }
    let hooked = started.elapsed();
    ensure_ok(uninstall(&handle), "uninstall perf");

    println!(
        "perf: calls={calls} plain={:.1}ns/call hooked={:.1}ns/call",
        plain.as_nanos() as f64 / calls as f64,
        hooked.as_nanos() as f64 / calls as f64
    );
    clear();
}

pub fn scenario_manual_churn_marathon() {
    clear();
    let catalog = activity_catalog();
    let target = find_get_title(&catalog);
    let rounds = env_usize("HOOK_TEST_MARATHON_ROUNDS", 100_000);

    for round in 0..rounds {
        let handle = ensure_ok(install(&target, counting_spec(&HOOK_A_COUNT)), "install churn");
        if round % 2 == 0 {
            invoke(&target, Value::Null, Vec::new()).expect("churn invoke failed");
        }
        ensure_ok(uninstall(&handle), "uninstall churn");
    }
    assert_eq!(global().hooks_on(&target), 0);
    assert_eq!(global().active_hooks(), 0);
    clear();
}
