use crate::errno::Errno;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

pub const ANDROID_LOG_DEBUG: i32 = 3;
pub const ANDROID_LOG_INFO: i32 = 4;
pub const ANDROID_LOG_WARN: i32 = 5;
pub const ANDROID_LOG_ERROR: i32 = 6;

const LOG_TAG: &str = "srx_intercept";

static LOG_PRIORITY: AtomicI32 = AtomicI32::new(ANDROID_LOG_WARN);
static LOG_SINK: OnceCell<Box<dyn LogSink>> = OnceCell::new();

// 日志输出端：接收 (优先级, tag, 消息)
pub trait LogSink: Send + Sync {
    fn write(&self, priority: i32, tag: &str, message: &str);
}

impl<F> LogSink for F
where
    F: Fn(i32, &str, &str) + Send + Sync,
{
    fn write(&self, priority: i32, tag: &str, message: &str) {
        self(priority, tag, message)
    }
}

// 进程内只能设置一次，之后的调用返回 Invalid
pub fn set_log_sink<S>(sink: S) -> Result<(), Errno>
where
    S: LogSink + 'static,
{
    LOG_SINK.set(Box::new(sink)).map_err(|_| Errno::Invalid)
}

// 设置日志级别，启用时输出 DEBUG 及以上，禁用时仅输出 WARN 及以上
pub fn set_debug_enabled(enabled: bool) {
    let priority = if enabled {
        ANDROID_LOG_DEBUG
    } else {
        ANDROID_LOG_WARN
    };
    LOG_PRIORITY.store(priority, Ordering::SeqCst);
}

pub fn debug_enabled() -> bool {
    LOG_PRIORITY.load(Ordering::Relaxed) <= ANDROID_LOG_DEBUG
}

fn enabled(priority: i32) -> bool {
    LOG_PRIORITY.load(Ordering::Relaxed) <= priority
}

#[cfg(target_os = "android")]
#[link(name = "log")]
unsafe extern "C" {
    fn __android_log_write(prio: i32, tag: *const i8, text: *const i8) -> i32;
}

#[cfg(target_os = "android")]
fn backend_write(priority: i32, tag: &str, message: &str) {
    let to_c = |s: &str| {
        let mut bytes = s.as_bytes().to_vec();
        for byte in &mut bytes {
            if *byte == 0 {
                *byte = b' ';
            }
        }
        bytes.push(0);
        bytes
    };
    let tag = to_c(tag);
    let text = to_c(message);
    unsafe {
        __android_log_write(
            priority,
            tag.as_ptr() as *const i8,
            text.as_ptr() as *const i8,
        );
    }
}

#[cfg(not(target_os = "android"))]
fn backend_write(priority: i32, tag: &str, message: &str) {
    match priority {
        p if p >= ANDROID_LOG_ERROR => tracing::error!(tag = tag, "{message}"),
        ANDROID_LOG_WARN => tracing::warn!(tag = tag, "{message}"),
        ANDROID_LOG_INFO => tracing::info!(tag = tag, "{message}"),
        _ => tracing::debug!(tag = tag, "{message}"),
    }
}

fn emit(priority: i32, tag: &str, message: &str) {
    match LOG_SINK.get() {
        Some(sink) => sink.write(priority, tag, message),
        None => backend_write(priority, tag, message),
    }
}

fn write_log(priority: i32, args: fmt::Arguments) {
    if !enabled(priority) {
        return;
    }
    emit(priority, LOG_TAG, &args.to_string());
}

pub(crate) fn info(args: fmt::Arguments) {
    write_log(ANDROID_LOG_INFO, args);
}

pub(crate) fn debug(args: fmt::Arguments) {
    write_log(ANDROID_LOG_DEBUG, args);
}

pub(crate) fn warn(args: fmt::Arguments) {
    write_log(ANDROID_LOG_WARN, args);
}

pub(crate) fn error(args: fmt::Arguments) {
    write_log(ANDROID_LOG_ERROR, args);
}

/// 供拦截模块使用的带 tag 日志器。
///
/// 与库内部日志共用输出端，但级别过滤独立于 `set_debug`。
#[derive(Clone, Debug)]
pub struct Logger {
    tag: String,
    min_priority: i32,
}

impl Logger {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            min_priority: ANDROID_LOG_DEBUG,
        }
    }

    pub fn with_min_priority(mut self, priority: i32) -> Self {
        self.min_priority = priority;
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_enabled(&self, priority: i32) -> bool {
        priority >= self.min_priority
    }

    pub fn log(&self, priority: i32, message: impl fmt::Display) {
        if self.is_enabled(priority) {
            emit(priority, &self.tag, &message.to_string());
        }
    }

    pub fn d(&self, message: impl fmt::Display) {
        self.log(ANDROID_LOG_DEBUG, message);
    }

    pub fn i(&self, message: impl fmt::Display) {
        self.log(ANDROID_LOG_INFO, message);
    }

    pub fn w(&self, message: impl fmt::Display) {
        self.log(ANDROID_LOG_WARN, message);
    }

    pub fn e(&self, message: impl fmt::Display) {
        self.log(ANDROID_LOG_ERROR, message);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ANDROID_LOG_DEBUG, ANDROID_LOG_ERROR, ANDROID_LOG_INFO, ANDROID_LOG_WARN, Logger,
        set_log_sink,
    };
    use std::sync::{Arc, Mutex};

    #[test]
    fn logger_routes_to_sink_with_own_tag_and_level() {
        let captured: Arc<Mutex<Vec<(i32, String, String)>>> = Arc::default();
        let sink_store = Arc::clone(&captured);
        set_log_sink(move |priority: i32, tag: &str, message: &str| {
            sink_store
                .lock()
                .unwrap()
                .push((priority, tag.to_string(), message.to_string()));
        })
        .expect("first sink");
        assert!(set_log_sink(|_: i32, _: &str, _: &str| {}).is_err());

        let logger = Logger::new("LogSinkTest").with_min_priority(ANDROID_LOG_INFO);
        logger.d("hidden");
        logger.i("hello");
        logger.w(format_args!("count={}", 2));
        logger.e("boom");

        let entries: Vec<_> = captured
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, tag, _)| tag == "LogSinkTest")
            .cloned()
            .collect();
        assert_eq!(
            entries,
            vec![
                (ANDROID_LOG_INFO, "LogSinkTest".to_string(), "hello".to_string()),
                (ANDROID_LOG_WARN, "LogSinkTest".to_string(), "count=2".to_string()),
                (ANDROID_LOG_ERROR, "LogSinkTest".to_string(), "boom".to_string()),
            ]
        );
    }

    #[test]
    fn logger_level_filter() {
        let logger = Logger::new("Filter");
        assert_eq!(logger.tag(), "Filter");
        assert!(logger.is_enabled(ANDROID_LOG_DEBUG));
        let logger = logger.with_min_priority(ANDROID_LOG_ERROR);
        assert!(!logger.is_enabled(ANDROID_LOG_WARN));
        assert!(logger.is_enabled(ANDROID_LOG_ERROR));
    }
}
