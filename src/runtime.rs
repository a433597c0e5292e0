// 拦截注册表：安装、卸载与调用分发
// Registry 是显式对象，可在测试中独立构造；global() 提供进程级默认实例
use crate::api::{HookStub, InterceptionSpec};
use crate::catalog::{TargetHandle, TargetId};
use crate::config::{Config, UnhookPolicy};
use crate::errno::{Errno, InvokeError};
use crate::log;
use crate::value::Value;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock, Weak};

mod frame;
mod hub;
mod record;
pub(crate) mod state;

pub use frame::CallFrame;

use hub::Hub;
use state::{CoreState, MutexPoisonRecover, RwLockPoisonRecover, Task};

static GLOBAL: Lazy<Registry> = Lazy::new(|| {
    if let Some(debug) = crate::config::debug_from_env() {
        log::set_debug_enabled(debug);
    }
    Registry::new(Config::from_env())
});

// 进程级默认注册表，首次访问时按环境变量配置初始化（含进程级日志级别）
pub fn global() -> &'static Registry {
    &GLOBAL
}

// state 串行化 install/uninstall；hubs 为目标 -> 回调链的分发表
pub(crate) struct RegistryInner {
    state: Mutex<CoreState>,
    hubs: RwLock<BTreeMap<TargetId, Arc<Hub>>>,
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        if !state.tasks.is_empty() {
            log::debug(format_args!(
                "registry torn down with {} active hooks",
                state.tasks.len()
            ));
        }
    }
}

#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

// 一次成功安装；移除后进入终态，不会再次生效
pub struct HookHandle {
    stub: HookStub,
    target: TargetId,
    registry: Weak<RegistryInner>,
}

impl HookHandle {
    pub fn stub(&self) -> HookStub {
        self.stub
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    // 注册表已销毁时视为已移除
    pub fn unhook(&self) -> Result<(), Errno> {
        match self.registry.upgrade() {
            Some(inner) => Registry { inner }.uninstall(self),
            None => Err(Errno::AlreadyRemoved),
        }
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|inner| inner.state.lock_or_poison().tasks.contains_key(&self.stub))
    }
}

impl fmt::Debug for HookHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookHandle")
            .field("stub", &self.stub)
            .field("target", &self.target)
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Registry {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                state: Mutex::new(CoreState::new(config)),
                hubs: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    pub fn config(&self) -> Config {
        self.inner.state.lock_or_poison().config.clone()
    }

    pub fn set_recordable(&self, recordable: bool) {
        self.inner.state.lock_or_poison().config.recordable = recordable;
    }

    pub fn set_unhook_policy(&self, policy: UnhookPolicy) {
        self.inner.state.lock_or_poison().config.unhook_policy = policy;
    }

    // 追加到目标回调链末尾；同一目标上的多个 spec 串联而非覆盖
    pub fn install(
        &self,
        target: &TargetHandle,
        spec: InterceptionSpec,
    ) -> Result<HookHandle, Errno> {
        let signature = target.signature();
        let mut state = self.inner.state.lock_or_poison();

        let status = if spec.is_empty() {
            Err(Errno::InvalidArg)
        } else if !target.is_available() {
            Err(Errno::TargetUnavailable)
        } else {
            Ok(())
        };
        if let Err(err) = status {
            record::add_install_record(&mut state, Err(err), &signature, 0);
            log::warn(format_args!("install on {signature} rejected: {err}"));
            return Err(err);
        }

        let stub = state.alloc_stub();
        let id = target.id();
        let hub = {
            let mut hubs = self.inner.hubs.write_or_poison();
            Arc::clone(hubs.entry(id).or_insert_with(|| Arc::new(Hub::new())))
        };
        let previous = hub.attach(stub, Arc::new(spec));
        state.tasks.insert(
            stub,
            Task {
                target: id,
                signature: signature.clone(),
            },
        );
        record::add_install_record(&mut state, Ok(()), &signature, stub);
        log::debug(format_args!(
            "hook {stub} installed on {signature}, chain={}",
            hub.len()
        ));
        drop(state);
        hub::wait_drained(&previous);

        Ok(HookHandle {
            stub,
            target: id,
            registry: Arc::downgrade(&self.inner),
        })
    }

    // 批量安装同一组回调；任一失败则回滚已安装部分
    pub fn install_all<'a, I>(
        &self,
        targets: I,
        spec: InterceptionSpec,
    ) -> Result<Vec<HookHandle>, Errno>
    where
        I: IntoIterator<Item = &'a TargetHandle>,
    {
        let mut handles = Vec::new();
        for target in targets {
            match self.install(target, spec.clone()) {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    self.unhook_all(&handles);
                    return Err(err);
                }
            }
        }
        Ok(handles)
    }

    // 恢复到该次安装之前的分发状态；链为空时移除整个 hub
    pub fn uninstall(&self, handle: &HookHandle) -> Result<(), Errno> {
        if !Weak::ptr_eq(&handle.registry, &Arc::downgrade(&self.inner)) {
            return Err(Errno::InvalidArg);
        }

        let mut state = self.inner.state.lock_or_poison();
        let Some(task) = state.tasks.remove(&handle.stub) else {
            let policy = state.config.unhook_policy;
            record::add_uninstall_record(
                &mut state,
                Err(Errno::AlreadyRemoved),
                "",
                handle.stub,
            );
            return match policy {
                UnhookPolicy::Report => {
                    log::warn(format_args!("hook {} already removed", handle.stub));
                    Err(Errno::AlreadyRemoved)
                }
                UnhookPolicy::Ignore => Ok(()),
            };
        };

        let mut hubs = self.inner.hubs.write_or_poison();
        let mut previous = None;
        if let Some(hub) = hubs.get(&task.target) {
            let (replaced, remaining) = hub.detach(handle.stub);
            if replaced.is_none() {
                log::error(format_args!(
                    "hook {} missing from chain of {}",
                    handle.stub, task.signature
                ));
            }
            previous = replaced;
            if remaining == 0 {
                hubs.remove(&task.target);
            }
        }
        drop(hubs);

        record::add_uninstall_record(&mut state, Ok(()), &task.signature, handle.stub);
        log::debug(format_args!(
            "hook {} removed from {}",
            handle.stub, task.signature
        ));
        // 释放锁后再等待，在途回调仍可安装或卸载
        drop(state);
        if let Some(previous) = previous {
            hub::wait_drained(&previous);
        }
        Ok(())
    }

    // 逐个卸载，返回成功数；失败只记录日志
    pub fn unhook_all(&self, handles: &[HookHandle]) -> usize {
        handles
            .iter()
            .filter(|handle| match self.uninstall(handle) {
                Ok(()) => true,
                Err(err) => {
                    log::warn(format_args!("unhook {} failed: {err}", handle.stub));
                    false
                }
            })
            .count()
    }

    pub fn is_active(&self, handle: &HookHandle) -> bool {
        Weak::ptr_eq(&handle.registry, &Arc::downgrade(&self.inner))
            && self.inner.state.lock_or_poison().tasks.contains_key(&handle.stub)
    }

    pub fn hooks_on(&self, target: &TargetHandle) -> usize {
        self.inner
            .hubs
            .read_or_poison()
            .get(&target.id())
            .map_or(0, |hub| hub.len())
    }

    pub fn active_hooks(&self) -> usize {
        self.inner.state.lock_or_poison().tasks.len()
    }

    // 分发入口：宿主对目标的每次调用经由此处
    // 在读锁下登记到当前链，回调执行期间不持有任何注册表锁
    // install/uninstall 会等待已登记的调用结束后才返回
    pub fn invoke(
        &self,
        target: &TargetHandle,
        this: Value,
        args: Vec<Value>,
    ) -> Result<Value, InvokeError> {
        if !target.is_available() {
            return Err(InvokeError::TargetUnavailable);
        }
        let chain = self
            .inner
            .hubs
            .read_or_poison()
            .get(&target.id())
            .map(|hub| hub.enter());

        let mut frame = CallFrame::new(target.clone(), this, args);
        let original = target.method().body();
        match chain {
            Some(chain) => hub::dispatch(&chain, &mut frame, original),
            None => original(&frame).map_err(InvokeError::Thrown),
        }
    }

    // 移除全部拦截，返回移除数量
    pub fn clear(&self) -> usize {
        let mut state = self.inner.state.lock_or_poison();
        let tasks = std::mem::take(&mut state.tasks);
        let hubs = std::mem::take(&mut *self.inner.hubs.write_or_poison());
        for (stub, task) in &tasks {
            record::add_uninstall_record(&mut state, Ok(()), &task.signature, *stub);
        }
        if !tasks.is_empty() {
            log::info(format_args!("cleared {} hooks", tasks.len()));
        }
        drop(state);
        for hub in hubs.values() {
            hub::wait_drained(&hub.current());
        }
        tasks.len()
    }

    // 按字段掩码导出操作记录文本
    pub fn records(&self, item_flags: u32) -> Option<String> {
        let state = self.inner.state.lock_or_poison();
        record::get_records_text(&state, item_flags)
    }

    // 按字段掩码将操作记录写入文件描述符
    #[cfg(unix)]
    pub fn dump_records(&self, fd: i32, item_flags: u32) -> Result<(), Errno> {
        let text = self.records(item_flags).ok_or(Errno::NoRecords)?;
        record::dump_records_text(fd, &text)
    }
}

#[cfg(test)]
mod tests;
