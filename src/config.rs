// 注册表配置，支持从环境变量覆盖默认值
pub const ENV_DEBUG: &str = "SRX_INTERCEPT_DEBUG";
pub const ENV_RECORDABLE: &str = "SRX_INTERCEPT_RECORDABLE";
pub const ENV_MAX_RECORDS: &str = "SRX_INTERCEPT_MAX_RECORDS";
pub const ENV_UNHOOK_POLICY: &str = "SRX_INTERCEPT_UNHOOK_POLICY";

// 环形记录缓冲区默认上限，超出后淘汰最早的记录
pub const DEFAULT_MAX_RECORDS: usize = 4096;

// 重复卸载的处理策略
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum UnhookPolicy {
    // 返回 AlreadyRemoved
    #[default]
    Report,
    // 视为成功
    Ignore,
}

// 单个注册表的配置；日志级别是进程级的，不在此处，见 debug_from_lookup
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub recordable: bool,
    pub max_records: usize,
    pub unhook_policy: UnhookPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recordable: false,
            max_records: DEFAULT_MAX_RECORDS,
            unhook_policy: UnhookPolicy::Report,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    // 无法解析的值保留默认
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(recordable) =
            lookup(ENV_RECORDABLE).and_then(|value| parse_bool_env_value(&value))
        {
            config.recordable = recordable;
        }
        if let Some(max_records) =
            lookup(ENV_MAX_RECORDS).and_then(|value| value.trim().parse::<usize>().ok())
        {
            config.max_records = max_records;
        }
        if let Some(policy) =
            lookup(ENV_UNHOOK_POLICY).and_then(|value| parse_unhook_policy(&value))
        {
            config.unhook_policy = policy;
        }
        config
    }
}

// 进程级调试日志开关，仅在默认注册表初始化时应用
pub fn debug_from_env() -> Option<bool> {
    debug_from_lookup(|name| std::env::var(name).ok())
}

pub fn debug_from_lookup<F>(lookup: F) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(ENV_DEBUG).and_then(|value| parse_bool_env_value(&value))
}

fn parse_bool_env_value(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_unhook_policy(value: &str) -> Option<UnhookPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "report" | "strict" => Some(UnhookPolicy::Report),
        "ignore" | "lenient" => Some(UnhookPolicy::Ignore),
        _ => None,
    }
}
