//! Transaction ledger module.
//!
//! This module records, for every transaction ID, whether the transaction is
//! active, committed or aborted, and keeps that record durable on disk:
//! - Transaction ID allocation (begin)
//! - Terminal state changes (commit, abort)
//! - State queries used by visibility and rollback decisions
//! - Fail-fast handling when the ledger can no longer be trusted

pub mod error;
pub mod fatal;
pub mod id;
pub mod ledger;
pub mod manager;
pub mod state;

// Re-export commonly used types
pub use error::{LedgerError, LedgerResult};
pub use fatal::{FatalHandler, ProcessExit, RecordErrors};
pub use id::{TransactionId, SUPER_XID};
pub use ledger::{FileLedger, LedgerConfig};
pub use manager::{create, open, Transaction, TransactionManager};
pub use state::TransactionState;
