use crate::catalog::TargetHandle;
use crate::errno::{Errno, InvokeError, Thrown};
use crate::runtime::{self, CallFrame, HookHandle};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

// 拦截任务的唯一标识，由注册表分配
pub type HookStub = u64;

// 原函数体、replace 回调或 after 回调产生的调用结果
pub type Outcome = Result<Value, Thrown>;

// before/after 回调的控制流结果，逐个回调函数式传递
#[derive(Clone, Debug, PartialEq)]
pub enum Flow {
    Continue,
    SubstituteWith(Value),
}

pub type BeforeCallback = Arc<dyn Fn(&mut CallFrame) -> Result<Flow, Thrown> + Send + Sync>;
pub type ReplaceCallback = Arc<dyn Fn(&mut CallFrame) -> Result<Value, Thrown> + Send + Sync>;
pub type AfterCallback = Arc<dyn Fn(&CallFrame, &Outcome) -> Result<Flow, Thrown> + Send + Sync>;

// 操作记录字段掩码
pub const RECORD_ITEM_ALL: u32 = 0xFF;
pub const RECORD_ITEM_TIMESTAMP: u32 = 1 << 0;
pub const RECORD_ITEM_OP: u32 = 1 << 1;
pub const RECORD_ITEM_TARGET: u32 = 1 << 2;
pub const RECORD_ITEM_ERRNO: u32 = 1 << 3;
pub const RECORD_ITEM_STUB: u32 = 1 << 4;

// 一组拦截回调，before/after/replace 各至多一个
#[derive(Clone, Default)]
pub struct InterceptionSpec {
    before: Option<BeforeCallback>,
    after: Option<AfterCallback>,
    replace: Option<ReplaceCallback>,
}

impl InterceptionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut CallFrame) -> Result<Flow, Thrown> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(callback));
        self
    }

    pub fn after<F>(mut self, callback: F) -> Self
    where
        F: Fn(&CallFrame, &Outcome) -> Result<Flow, Thrown> + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(callback));
        self
    }

    pub fn replace<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut CallFrame) -> Result<Value, Thrown> + Send + Sync + 'static,
    {
        self.replace = Some(Arc::new(callback));
        self
    }

    // 以常量作为结果，跳过原函数体；实现为 before 回调
    pub fn returning_constant(self, value: Value) -> Self {
        self.before(move |_| Ok(Flow::SubstituteWith(value.clone())))
    }

    // 使目标直接返回 Null
    pub fn interrupt(self) -> Self {
        self.returning_constant(Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_none() && self.after.is_none() && self.replace.is_none()
    }

    pub(crate) fn before_callback(&self) -> Option<&BeforeCallback> {
        self.before.as_ref()
    }

    pub(crate) fn after_callback(&self) -> Option<&AfterCallback> {
        self.after.as_ref()
    }

    pub(crate) fn replace_callback(&self) -> Option<&ReplaceCallback> {
        self.replace.as_ref()
    }
}

impl fmt::Debug for InterceptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptionSpec")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("replace", &self.replace.is_some())
            .finish()
    }
}

// 以下为进程级默认注册表的便捷入口

pub fn get_version() -> String {
    crate::version::version_str_full()
}

// major << 16 | minor << 8 | patch
pub fn get_version_code() -> u32 {
    crate::version::version()
}

pub fn install(target: &TargetHandle, spec: InterceptionSpec) -> Result<HookHandle, Errno> {
    runtime::global().install(target, spec)
}

pub fn uninstall(handle: &HookHandle) -> Result<(), Errno> {
    runtime::global().uninstall(handle)
}

pub fn invoke(target: &TargetHandle, this: Value, args: Vec<Value>) -> Result<Value, InvokeError> {
    runtime::global().invoke(target, this, args)
}

// 移除默认注册表上的全部拦截
pub fn clear() -> usize {
    runtime::global().clear()
}

pub fn get_debug() -> bool {
    crate::log::debug_enabled()
}

pub fn set_debug(debug: bool) {
    crate::log::set_debug_enabled(debug);
}

pub fn get_recordable() -> bool {
    runtime::global().config().recordable
}

pub fn set_recordable(recordable: bool) {
    runtime::global().set_recordable(recordable);
}

pub fn get_records(item_flags: u32) -> Option<String> {
    runtime::global().records(item_flags)
}

#[cfg(unix)]
pub fn dump_records(fd: i32, item_flags: u32) -> Result<(), Errno> {
    runtime::global().dump_records(fd, item_flags)
}
