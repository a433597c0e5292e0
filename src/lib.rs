#[cfg(not(any(target_arch = "aarch64", target_arch = "x86_64")))]
compile_error!("srx_intercept supports only 64-bit architectures: aarch64 and x86_64");

// 公共 API 层，提供拦截规格定义与默认注册表便捷入口
mod api;
// 宿主方法目录：类、方法、构造函数与原始函数体
mod catalog;
// 注册表配置与环境变量解析
mod config;
// 错误码与调用错误定义
mod errno;
// 日志输出，Android 上使用 logcat，其余平台走 tracing
mod log;
// 目标解析：按名称、参数形态与继承链查找方法，以及构造函数查找
mod resolve;
// 运行时：注册表、回调链分发与操作记录
mod runtime;
// 动态值模型
mod value;
// 版本信息
mod version;

pub use api::{
    AfterCallback, BeforeCallback, Flow, HookStub, InterceptionSpec, Outcome, RECORD_ITEM_ALL,
    RECORD_ITEM_ERRNO, RECORD_ITEM_OP, RECORD_ITEM_STUB, RECORD_ITEM_TARGET,
    RECORD_ITEM_TIMESTAMP, ReplaceCallback, clear, get_debug, get_records, get_recordable,
    get_version, get_version_code, install, invoke, set_debug, set_recordable, uninstall,
};
#[cfg(unix)]
pub use api::dump_records;
pub use catalog::{
    CONSTRUCTOR_NAME, Catalog, ClassDef, ConstructorDef, MODIFIER_ABSTRACT, MODIFIER_FINAL,
    MODIFIER_NATIVE, MODIFIER_PRIVATE, MODIFIER_PROTECTED, MODIFIER_PUBLIC, MODIFIER_STATIC,
    MODIFIER_SYNCHRONIZED, Member, MethodBody, MethodDef, RETURN_VOID, TargetHandle, TargetId,
};
pub use config::{Config, UnhookPolicy};
pub use errno::{Errno, InvokeError, Stage, Thrown};
pub use errno::Errno as SrxInterceptErrno;
pub use log::{
    ANDROID_LOG_DEBUG, ANDROID_LOG_ERROR, ANDROID_LOG_INFO, ANDROID_LOG_WARN, LogSink, Logger,
    set_log_sink,
};
pub use resolve::{
    ConstructorFinder, MethodFinder, NameMatcher, NamePattern, ParamShape, ParamShapeMatcher,
    resolve,
};
pub use runtime::{CallFrame, HookHandle, Registry, global};
pub use value::Value;
