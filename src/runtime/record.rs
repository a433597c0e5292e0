// install/uninstall 审计记录的写入、格式化与导出
use crate::api::{
    HookStub, RECORD_ITEM_ERRNO, RECORD_ITEM_OP, RECORD_ITEM_STUB, RECORD_ITEM_TARGET,
    RECORD_ITEM_TIMESTAMP,
};
use crate::errno::Errno;
use std::fmt::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use super::state::{CoreState, RecordEntry, RecordOp};

#[inline]
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

fn status_code(status: Result<(), Errno>) -> i32 {
    match status {
        Ok(()) => 0,
        Err(err) => err.as_i32(),
    }
}

// recordable 关闭时静默丢弃，满时淘汰队首
fn push_record(state: &mut CoreState, entry: RecordEntry) {
    if !state.config.recordable || state.config.max_records == 0 {
        return;
    }
    while state.records.len() >= state.config.max_records {
        state.records.pop_front();
    }
    state.records.push_back(entry);
}

pub(super) fn add_install_record(
    state: &mut CoreState,
    status: Result<(), Errno>,
    target: &str,
    stub: HookStub,
) {
    push_record(
        state,
        RecordEntry {
            op: RecordOp::Install,
            ts_ms: now_ms(),
            status_code: status_code(status),
            target: target.to_string(),
            stub,
        },
    );
}

pub(super) fn add_uninstall_record(
    state: &mut CoreState,
    status: Result<(), Errno>,
    target: &str,
    stub: HookStub,
) {
    push_record(
        state,
        RecordEntry {
            op: RecordOp::Uninstall,
            ts_ms: now_ms(),
            status_code: status_code(status),
            target: target.to_string(),
            stub,
        },
    );
}

fn op_name(op: RecordOp) -> &'static str {
    match op {
        RecordOp::Install => "INSTALL",
        RecordOp::Uninstall => "UNINSTALL",
    }
}

// 按 item_flags 位掩码选择性输出字段，CSV 格式
fn format_entry(entry: &RecordEntry, item_flags: u32) -> String {
    let mut line = String::new();
    if item_flags & RECORD_ITEM_TIMESTAMP != 0 {
        let _ = write!(line, "{},", entry.ts_ms);
    }
    if item_flags & RECORD_ITEM_OP != 0 {
        let _ = write!(line, "{},", op_name(entry.op));
    }
    if item_flags & RECORD_ITEM_TARGET != 0 {
        let _ = write!(line, "{},", entry.target);
    }
    if item_flags & RECORD_ITEM_ERRNO != 0 {
        let _ = write!(line, "{},", entry.status_code);
    }
    if item_flags & RECORD_ITEM_STUB != 0 {
        let _ = write!(line, "0x{:x},", entry.stub);
    }
    line.push('\n');
    line
}

pub(super) fn get_records_text(state: &CoreState, item_flags: u32) -> Option<String> {
    if !state.config.recordable || state.records.is_empty() {
        return None;
    }
    let mut output = String::new();
    for entry in &state.records {
        output.push_str(&format_entry(entry, item_flags));
    }
    Some(output)
}

// 循环写入直到全部字节落盘，处理 short write
#[cfg(unix)]
pub(super) fn dump_records_text(fd: i32, text: &str) -> Result<(), Errno> {
    if fd < 0 {
        return Err(Errno::InvalidArg);
    }
    let bytes = text.as_bytes();
    let mut offset = 0usize;
    while offset < bytes.len() {
        let written = unsafe {
            libc::write(
                fd,
                bytes[offset..].as_ptr() as *const libc::c_void,
                bytes.len() - offset,
            )
        };
        if written <= 0 {
            return Err(Errno::Invalid);
        }
        offset += written as usize;
    }
    Ok(())
}
