// 注册表核心可变状态与同步原语扩展
use crate::api::HookStub;
use crate::catalog::TargetId;
use crate::config::Config;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

// Mutex/RwLock poison 恢复扩展，避免持锁线程 panic 后引发连锁 panic
pub(crate) trait MutexPoisonRecover<T> {
    fn lock_or_poison(&self) -> MutexGuard<'_, T>;
}

pub(crate) trait RwLockPoisonRecover<T> {
    fn read_or_poison(&self) -> RwLockReadGuard<'_, T>;
    fn write_or_poison(&self) -> RwLockWriteGuard<'_, T>;
}

impl<T> MutexPoisonRecover<T> for Mutex<T> {
    fn lock_or_poison(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T> RwLockPoisonRecover<T> for RwLock<T> {
    fn read_or_poison(&self) -> RwLockReadGuard<'_, T> {
        self.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_or_poison(&self) -> RwLockWriteGuard<'_, T> {
        self.write().unwrap_or_else(|e| e.into_inner())
    }
}

// 已安装的拦截任务，hub 内的 spec 由 stub 关联
#[derive(Clone, Debug)]
pub(super) struct Task {
    pub(super) target: TargetId,
    pub(super) signature: String,
}

// install/uninstall 操作类型，用于审计记录
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum RecordOp {
    Install,
    Uninstall,
}

// 单条操作审计记录
#[derive(Clone, Debug)]
pub(super) struct RecordEntry {
    pub(super) op: RecordOp,
    pub(super) ts_ms: u64,
    pub(super) status_code: i32,
    pub(super) target: String,
    pub(super) stub: HookStub,
}

// 由 RegistryInner::state 互斥锁保护
pub(super) struct CoreState {
    pub(super) config: Config,
    // 单调递增，卸载后不复用，保证重复卸载可被识别
    pub(super) next_stub: HookStub,
    pub(super) tasks: BTreeMap<HookStub, Task>,
    pub(super) records: VecDeque<RecordEntry>,
}

impl CoreState {
    pub(super) fn new(config: Config) -> Self {
        Self {
            config,
            next_stub: 1,
            tasks: BTreeMap::new(),
            records: VecDeque::new(),
        }
    }

    pub(super) fn alloc_stub(&mut self) -> HookStub {
        let stub = self.next_stub;
        self.next_stub = self.next_stub.saturating_add(1);
        stub
    }
}
