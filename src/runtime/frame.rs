// 单次调用的帧状态，仅属于当前 invoke，不在调用之间共享
use crate::catalog::{MethodDef, TargetHandle};
use crate::errno::Errno;
use crate::value::Value;

pub struct CallFrame {
    target: TargetHandle,
    this: Value,
    args: Vec<Value>,
    // before 回调给出的替代结果，后续 before 可观察并覆盖
    pending: Option<Value>,
}

impl CallFrame {
    pub(crate) fn new(target: TargetHandle, this: Value, args: Vec<Value>) -> Self {
        Self {
            target,
            this,
            args,
            pending: None,
        }
    }

    pub fn target(&self) -> &TargetHandle {
        &self.target
    }

    pub fn method(&self) -> &MethodDef {
        self.target.method()
    }

    pub fn this_object(&self) -> &Value {
        &self.this
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    // 参数个数固定，只允许改值
    pub fn args_mut(&mut self) -> &mut [Value] {
        &mut self.args
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    pub fn set_arg(&mut self, index: usize, value: Value) -> Result<(), Errno> {
        let slot = self.args.get_mut(index).ok_or(Errno::InvalidArg)?;
        *slot = value;
        Ok(())
    }

    pub fn pending_result(&self) -> Option<&Value> {
        self.pending.as_ref()
    }

    pub(super) fn set_pending(&mut self, value: Value) {
        self.pending = Some(value);
    }

    pub(super) fn take_pending(&mut self) -> Option<Value> {
        self.pending.take()
    }
}
