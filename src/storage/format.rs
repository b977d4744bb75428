//! Byte layout of the ledger file.
//!
//! ```text
//! offset 0       : 8 bytes  counter, number of allocated xids
//! offset 8       : 1 byte   status of xid 1
//! offset 8+(n-1) : 1 byte   status of xid n
//! ```

use std::path::{Path, PathBuf};

use super::codec::COUNTER_SIZE;

/// Extension appended to the caller's base path.
pub const LEDGER_EXTENSION: &str = "xid";

/// Size of the counter header in bytes.
pub const HEADER_SIZE: u64 = COUNTER_SIZE as u64;

/// Size of one status record in bytes.
pub const RECORD_SIZE: u64 = 1;

/// Returns the ledger file location for a base path, i.e. `<base>.xid`.
///
/// The extension is appended, never substituted, so `data/tm` and
/// `data/tm.v2` map to distinct files.
pub fn ledger_path(base: &Path) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(LEDGER_EXTENSION);
    PathBuf::from(name)
}

/// Returns the file offset of the status record for `xid`.
///
/// `xid` must be at least 1; the super transaction has no record.
pub fn record_offset(xid: u64) -> u64 {
    debug_assert!(xid >= 1, "xid 0 has no status record");
    HEADER_SIZE + (xid - 1) * RECORD_SIZE
}

/// Returns the file length implied by a header counter.
pub fn ledger_len(counter: u64) -> u64 {
    counter.saturating_mul(RECORD_SIZE).saturating_add(HEADER_SIZE)
}
