//! Storage layer for the transaction ledger.
//!
//! The ledger is a single flat file, not a paged heap. Key components:
//!
//! - **codec**: fixed-width big-endian encoding of the header counter
//! - **format**: byte layout of the ledger file (header + status array)
//! - **LedgerFile**: positioned reads/writes and durability barriers on the file
//!
//! Nothing here knows about transaction semantics; the transaction layer
//! decides what bytes to write and when to force them to disk.

pub mod codec;
pub mod disk;
pub mod format;

pub use disk::{LedgerFile, SyncMode};
pub use format::{ledger_len, ledger_path, record_offset, HEADER_SIZE, LEDGER_EXTENSION, RECORD_SIZE};
