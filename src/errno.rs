// 拦截操作错误码与调用期错误
use crate::api::HookStub;
use thiserror::Error;

// 解析/安装/卸载错误码，数值对外稳定
#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum Errno {
    #[error("invalid argument")]
    InvalidArg = 11, // 参数无效
    #[error("no matching method")]
    NotFound = 30, // 未找到目标
    #[error("more than one method matches")]
    AmbiguousMatch = 31, // 匹配结果不唯一
    #[error("target is no longer available")]
    TargetUnavailable = 32, // 目标所在类已卸载
    #[error("hook already removed")]
    AlreadyRemoved = 33, // 重复卸载
    #[error("records are empty or disabled")]
    NoRecords = 34, // 无可导出的记录
    #[error("invalid operation")]
    Invalid = 1002, // 写出失败或重复设置
}

impl Errno {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<Errno> for i32 {
    fn from(value: Errno) -> Self {
        value as i32
    }
}

// 原函数体或回调抛出的异常，类比宿主运行时的 throwable
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{message}")]
pub struct Thrown {
    pub message: String,
}

impl Thrown {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// 回调所处阶段，用于错误归因
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Stage {
    Before,
    Replace,
    After,
}

impl Stage {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::Replace => "replace",
            Self::After => "after",
        }
    }
}

// invoke 的失败结果；回调失败会中止本次调用的剩余链路
#[derive(Clone, Debug, Error)]
pub enum InvokeError {
    #[error("target is no longer available")]
    TargetUnavailable,
    #[error("thrown: {0}")]
    Thrown(Thrown),
    #[error("{} callback of hook {stub} failed: {source}", .stage.name())]
    Callback {
        stub: HookStub,
        stage: Stage,
        source: Thrown,
    },
    #[error("{} callback of hook {stub} panicked", .stage.name())]
    Panicked { stub: HookStub, stage: Stage },
}

impl InvokeError {
    // 调用方统一取出异常信息，panic 时为 None
    pub fn thrown(&self) -> Option<&Thrown> {
        match self {
            Self::Thrown(thrown) => Some(thrown),
            Self::Callback { source, .. } => Some(source),
            Self::TargetUnavailable | Self::Panicked { .. } => None,
        }
    }
}
