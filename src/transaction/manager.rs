//! The transaction manager contract consumed by data and version managers.

use std::path::Path;
use std::sync::Arc;

use super::error::LedgerResult;
use super::id::TransactionId;
use super::ledger::{FileLedger, LedgerConfig};
use super::state::TransactionState;

/// Lifecycle operations on the transaction ledger.
///
/// Mutations are durable once they return. Fatal failures are routed to the
/// ledger's fatal handler, so with the default wiring an `Err` from these
/// methods is always a recoverable caller mistake.
pub trait TransactionManager: Send + Sync {
    /// Allocates the next transaction ID and records it as active.
    fn begin(&self) -> LedgerResult<TransactionId>;

    /// Marks an active transaction as committed.
    fn commit(&self, xid: TransactionId) -> LedgerResult<()>;

    /// Marks an active transaction as aborted.
    fn abort(&self, xid: TransactionId) -> LedgerResult<()>;

    /// Gets the recorded state of a transaction.
    ///
    /// The super transaction is always `Committed` and never touches disk.
    fn state(&self, xid: TransactionId) -> LedgerResult<TransactionState>;

    fn is_active(&self, xid: TransactionId) -> LedgerResult<bool> {
        Ok(self.state(xid)?.is_active())
    }

    fn is_committed(&self, xid: TransactionId) -> LedgerResult<bool> {
        Ok(self.state(xid)?.is_committed())
    }

    fn is_aborted(&self, xid: TransactionId) -> LedgerResult<bool> {
        Ok(self.state(xid)?.is_aborted())
    }

    /// Releases the underlying file. Later operations fail with `Closed`.
    fn close(&self) -> LedgerResult<()>;
}

/// Creates a new ledger at `<path>.xid` with default configuration.
pub fn create(path: impl AsRef<Path>) -> LedgerResult<FileLedger> {
    FileLedger::create_with(path, LedgerConfig::default())
}

/// Opens the existing ledger at `<path>.xid` with default configuration.
pub fn open(path: impl AsRef<Path>) -> LedgerResult<FileLedger> {
    FileLedger::open_with(path, LedgerConfig::default())
}

/// A handle to a transaction that automatically aborts on drop if still active.
pub struct Transaction<M: TransactionManager + ?Sized> {
    id: TransactionId,
    manager: Arc<M>,
    finished: bool,
}

impl<M: TransactionManager + ?Sized> Transaction<M> {
    /// Begins a new transaction on `manager`.
    pub fn begin(manager: Arc<M>) -> LedgerResult<Self> {
        let id = manager.begin()?;
        Ok(Self {
            id,
            manager,
            finished: false,
        })
    }

    /// Gets the transaction ID.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Commits the transaction.
    ///
    /// A failed commit is not retried as an abort when the handle drops.
    pub fn commit(mut self) -> LedgerResult<()> {
        self.finished = true;
        self.manager.commit(self.id)
    }

    /// Aborts the transaction.
    pub fn abort(mut self) -> LedgerResult<()> {
        self.finished = true; // Mark as handled to prevent double abort
        self.manager.abort(self.id)
    }
}

impl<M: TransactionManager + ?Sized> Drop for Transaction<M> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.manager.abort(self.id) {
                log::warn!("Failed to abort dropped {}: {}", self.id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::error::LedgerError;
    use crate::transaction::fatal::RecordErrors;
    use anyhow::Result;
    use tempfile::tempdir;

    fn recording_config() -> (Arc<RecordErrors>, LedgerConfig) {
        let recorder = Arc::new(RecordErrors::new());
        let config = LedgerConfig::default().with_fatal_handler(recorder.clone());
        (recorder, config)
    }

    #[test]
    fn test_create_and_open() -> Result<()> {
        let dir = tempdir()?;
        let base = dir.path().join("tm");

        let ledger = create(&base)?;
        assert_eq!(ledger.begin()?, TransactionId::new(1));
        ledger.close()?;

        let ledger = open(&base)?;
        assert!(ledger.is_active(TransactionId::new(1))?);
        assert_eq!(ledger.begin()?, TransactionId::new(2));

        Ok(())
    }

    #[test]
    fn test_open_missing_ledger() -> Result<()> {
        let dir = tempdir()?;
        let (recorder, config) = recording_config();

        let result = FileLedger::open_with(dir.path().join("missing"), config);
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));
        assert_eq!(recorder.count(), 1);

        Ok(())
    }

    #[test]
    fn test_transaction_handle() -> Result<()> {
        let dir = tempdir()?;
        let manager = Arc::new(create(dir.path().join("tm"))?);

        let txn = Transaction::begin(Arc::clone(&manager))?;
        let id = txn.id();
        assert!(manager.is_active(id)?);

        txn.commit()?;
        assert_eq!(manager.state(id)?, TransactionState::Committed);

        Ok(())
    }

    #[test]
    fn test_transaction_handle_auto_abort() -> Result<()> {
        let dir = tempdir()?;
        let manager = Arc::new(create(dir.path().join("tm"))?);

        let id = {
            let txn = Transaction::begin(Arc::clone(&manager))?;
            txn.id()
            // txn drops here without commit
        };

        assert_eq!(manager.state(id)?, TransactionState::Aborted);

        Ok(())
    }

    #[test]
    fn test_transaction_handle_explicit_abort() -> Result<()> {
        let dir = tempdir()?;
        let manager = Arc::new(create(dir.path().join("tm"))?);

        let txn = Transaction::begin(Arc::clone(&manager))?;
        let id = txn.id();

        txn.abort()?;
        assert!(manager.is_aborted(id)?);

        Ok(())
    }

    #[test]
    fn test_transaction_handle_over_trait_object() -> Result<()> {
        let dir = tempdir()?;
        let manager: Arc<dyn TransactionManager> = Arc::new(create(dir.path().join("tm"))?);

        let txn = Transaction::begin(Arc::clone(&manager))?;
        let id = txn.id();
        txn.commit()?;

        assert!(manager.is_committed(id)?);
        assert!(!manager.is_active(id)?);

        Ok(())
    }

    /// Manager whose commits always fail; counts abort calls.
    #[derive(Default)]
    struct FailingCommits {
        aborts: parking_lot::Mutex<Vec<TransactionId>>,
    }

    impl TransactionManager for FailingCommits {
        fn begin(&self) -> LedgerResult<TransactionId> {
            Ok(TransactionId::new(1))
        }

        fn commit(&self, _xid: TransactionId) -> LedgerResult<()> {
            Err(LedgerError::Closed)
        }

        fn abort(&self, xid: TransactionId) -> LedgerResult<()> {
            self.aborts.lock().push(xid);
            Ok(())
        }

        fn state(&self, _xid: TransactionId) -> LedgerResult<TransactionState> {
            Ok(TransactionState::Active)
        }

        fn close(&self) -> LedgerResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_commit_is_not_aborted_on_drop() {
        let manager = Arc::new(FailingCommits::default());

        let txn = Transaction::begin(Arc::clone(&manager)).unwrap();
        assert!(matches!(txn.commit(), Err(LedgerError::Closed)));

        assert!(manager.aborts.lock().is_empty());
    }
}
