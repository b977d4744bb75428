pub mod storage;
pub mod transaction;

pub use storage::SyncMode;
pub use transaction::{
    create, open, FileLedger, LedgerConfig, LedgerError, LedgerResult, Transaction,
    TransactionId, TransactionManager, TransactionState,
};
