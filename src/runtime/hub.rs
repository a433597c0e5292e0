// 拦截调度中心（Hub）
// 每个被拦截的目标对应一个 Hub，按注册顺序持有回调链
// 写者（install/uninstall）整体替换链，读者（invoke）在读锁下登记到当前链后释放锁
// 写者发布新链后等待旧链上的在途调用全部结束
use crate::api::{Flow, HookStub, InterceptionSpec, Outcome};
use crate::catalog::MethodBody;
use crate::errno::{InvokeError, Stage, Thrown};
use crate::log;
use crate::value::Value;
use std::cell::RefCell;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, RwLock};

use super::frame::CallFrame;
use super::state::{MutexPoisonRecover, RwLockPoisonRecover};

thread_local! {
    // 当前线程正在其中分发的链（按地址），可重入
    static ENTERED: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

pub(super) struct ChainEntry {
    pub(super) stub: HookStub,
    pub(super) spec: Arc<InterceptionSpec>,
}

#[derive(Default)]
struct Drain {
    inflight: usize,
    waiters: usize,
}

// 注册顺序排列，发布后条目不可变
#[derive(Default)]
pub(super) struct Chain {
    entries: Vec<ChainEntry>,
    drain: Mutex<Drain>,
    drained: Condvar,
}

impl Chain {
    fn new(entries: Vec<ChainEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    fn key(chain: &Arc<Chain>) -> usize {
        Arc::as_ptr(chain) as usize
    }

    fn leave(&self) {
        let mut drain = self.drain.lock_or_poison();
        drain.inflight -= 1;
        if drain.waiters > 0 {
            self.drained.notify_all();
        }
    }
}

impl Deref for Chain {
    type Target = [ChainEntry];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

// 一次在途调用对链的持有；析构时注销
pub(super) struct ActiveChain {
    chain: Arc<Chain>,
}

impl Deref for ActiveChain {
    type Target = Chain;

    fn deref(&self) -> &Self::Target {
        &self.chain
    }
}

impl Drop for ActiveChain {
    fn drop(&mut self) {
        let key = Chain::key(&self.chain);
        ENTERED.with(|entered| {
            let mut entered = entered.borrow_mut();
            if let Some(pos) = entered.iter().rposition(|&k| k == key) {
                entered.remove(pos);
            }
        });
        self.chain.leave();
    }
}

// 等待旧链上其他线程的在途调用结束；本线程自身的嵌套调用不计入
pub(super) fn wait_drained(chain: &Arc<Chain>) {
    let key = Chain::key(chain);
    let own = ENTERED.with(|entered| entered.borrow().iter().filter(|&&k| k == key).count());
    let mut drain = chain.drain.lock_or_poison();
    if drain.inflight <= own {
        return;
    }
    log::debug(format_args!(
        "waiting for {} in-flight calls",
        drain.inflight - own
    ));
    drain.waiters += 1;
    while drain.inflight > own {
        drain = chain
            .drained
            .wait(drain)
            .unwrap_or_else(|e| e.into_inner());
    }
    drain.waiters -= 1;
}

pub(super) struct Hub {
    chain: RwLock<Arc<Chain>>,
}

impl Hub {
    pub(super) fn new() -> Self {
        Self {
            chain: RwLock::new(Arc::new(Chain::default())),
        }
    }

    // 在读锁内登记，写者换链后不会漏掉已取得旧链的调用
    pub(super) fn enter(&self) -> ActiveChain {
        let current = self.chain.read_or_poison();
        let chain = Arc::clone(&current);
        chain.drain.lock_or_poison().inflight += 1;
        drop(current);
        let key = Chain::key(&chain);
        ENTERED.with(|entered| entered.borrow_mut().push(key));
        ActiveChain { chain }
    }

    pub(super) fn current(&self) -> Arc<Chain> {
        Arc::clone(&self.chain.read_or_poison())
    }

    pub(super) fn len(&self) -> usize {
        self.chain.read_or_poison().len()
    }

    // 返回被替换的旧链
    pub(super) fn attach(&self, stub: HookStub, spec: Arc<InterceptionSpec>) -> Arc<Chain> {
        let mut chain = self.chain.write_or_poison();
        let mut next = Vec::with_capacity(chain.len() + 1);
        next.extend(chain.iter().map(|entry| ChainEntry {
            stub: entry.stub,
            spec: Arc::clone(&entry.spec),
        }));
        next.push(ChainEntry { stub, spec });
        std::mem::replace(&mut *chain, Arc::new(Chain::new(next)))
    }

    // 返回 (被替换的旧链, 剩余条目数)；stub 不在链上时不换链
    pub(super) fn detach(&self, stub: HookStub) -> (Option<Arc<Chain>>, usize) {
        let mut chain = self.chain.write_or_poison();
        if !chain.iter().any(|entry| entry.stub == stub) {
            return (None, chain.len());
        }
        let next: Vec<ChainEntry> = chain
            .iter()
            .filter(|entry| entry.stub != stub)
            .map(|entry| ChainEntry {
                stub: entry.stub,
                spec: Arc::clone(&entry.spec),
            })
            .collect();
        let remaining = next.len();
        let previous = std::mem::replace(&mut *chain, Arc::new(Chain::new(next)));
        (Some(previous), remaining)
    }
}

// 在 panic 边界内执行单个回调，错误归因到 stub 与阶段
fn guarded<T, F>(stub: HookStub, stage: Stage, f: F) -> Result<T, InvokeError>
where
    F: FnOnce() -> Result<T, Thrown>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => {
            log::warn(format_args!(
                "hook {stub} {} callback failed: {source}",
                stage.name()
            ));
            Err(InvokeError::Callback {
                stub,
                stage,
                source,
            })
        }
        Err(_) => {
            log::error(format_args!("hook {stub} {} callback panicked", stage.name()));
            Err(InvokeError::Panicked { stub, stage })
        }
    }
}

// 顺序：全部 before -> (替代结果 | 最新 replace | 原函数体) -> 全部 after
pub(super) fn dispatch(
    chain: &Chain,
    frame: &mut CallFrame,
    original: &MethodBody,
) -> Result<Value, InvokeError> {
    for entry in chain.iter() {
        let Some(before) = entry.spec.before_callback() else {
            continue;
        };
        let flow = guarded(entry.stub, Stage::Before, || before(&mut *frame))?;
        if let Flow::SubstituteWith(value) = flow {
            frame.set_pending(value);
        }
    }

    let mut outcome: Outcome = match frame.take_pending() {
        Some(value) => Ok(value),
        None => {
            let replace = chain.iter().rev().find_map(|entry| {
                entry
                    .spec
                    .replace_callback()
                    .map(|callback| (entry.stub, callback))
            });
            match replace {
                Some((stub, callback)) => {
                    Ok(guarded(stub, Stage::Replace, || callback(&mut *frame))?)
                }
                None => original(&*frame),
            }
        }
    };

    for entry in chain.iter() {
        let Some(after) = entry.spec.after_callback() else {
            continue;
        };
        let flow = guarded(entry.stub, Stage::After, || after(&*frame, &outcome))?;
        if let Flow::SubstituteWith(value) = flow {
            outcome = Ok(value);
        }
    }

    outcome.map_err(InvokeError::Thrown)
}
