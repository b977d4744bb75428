//! File-backed transaction ledger.
//!
//! The ledger file holds an 8-byte counter of allocated transactions
//! followed by one status byte per transaction. Its length is therefore
//! fully determined by the counter, and that relation is checked every time
//! a ledger is constructed.
//!
//! Allocation writes the new status byte and forces it to disk before the
//! counter is advanced and forced in turn. A crash between the two leaves a
//! file one byte longer than its counter claims, which the startup check
//! rejects instead of resuming with a half-allocated transaction.
//!
//! Concurrency: `begin` is serialized by an allocation lock. Status reads
//! and writes take no lock beyond a shared guard on the file handle; they
//! are single-byte positioned I/O, so a reader racing a commit observes the
//! old or the new byte and never a torn one. Callers guarantee at most one
//! commit or abort per transaction. The handle guard exists only so that
//! `close` can wait for in-flight I/O.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};

use super::error::{LedgerError, LedgerResult};
use super::fatal::{escalate, FatalHandler, ProcessExit};
use super::id::TransactionId;
use super::manager::TransactionManager;
use super::state::TransactionState;
use crate::storage::{ledger_len, ledger_path, record_offset, LedgerFile, SyncMode, HEADER_SIZE};

/// Ledger configuration.
#[derive(Clone)]
pub struct LedgerConfig {
    /// How durability barriers are forced to disk.
    pub sync_mode: SyncMode,
    /// Reaction to unrecoverable errors.
    pub fatal_handler: Arc<dyn FatalHandler>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            sync_mode: SyncMode::default(),
            fatal_handler: Arc::new(ProcessExit),
        }
    }
}

impl LedgerConfig {
    pub fn with_sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    pub fn with_fatal_handler(mut self, handler: Arc<dyn FatalHandler>) -> Self {
        self.fatal_handler = handler;
        self
    }
}

impl fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("sync_mode", &self.sync_mode)
            .finish_non_exhaustive()
    }
}

/// Transaction ledger persisted in a single `.xid` file.
pub struct FileLedger {
    /// Location of the ledger file.
    path: PathBuf,
    /// Open file, `None` once closed.
    file: RwLock<Option<LedgerFile>>,
    /// Number of allocated transactions, mirrored from the header.
    counter: AtomicU64,
    /// Serializes allocation.
    alloc_lock: Mutex<()>,
    sync_mode: SyncMode,
    fatal_handler: Arc<dyn FatalHandler>,
}

impl FileLedger {
    /// Creates a new, empty ledger at `<base>.xid`.
    ///
    /// Fails with `AlreadyExists` without touching an existing file.
    pub fn create_with(base: impl AsRef<Path>, config: LedgerConfig) -> LedgerResult<Self> {
        let path = ledger_path(base.as_ref());
        let handler = Arc::clone(&config.fatal_handler);
        Self::create_inner(path, config).map_err(|e| escalate(handler.as_ref(), e))
    }

    /// Opens the existing ledger at `<base>.xid` and validates it.
    pub fn open_with(base: impl AsRef<Path>, config: LedgerConfig) -> LedgerResult<Self> {
        let path = ledger_path(base.as_ref());
        let handler = Arc::clone(&config.fatal_handler);
        Self::open_inner(path, config).map_err(|e| escalate(handler.as_ref(), e))
    }

    fn create_inner(path: PathBuf, config: LedgerConfig) -> LedgerResult<Self> {
        let file = LedgerFile::create(&path).map_err(|source| match source.kind() {
            io::ErrorKind::AlreadyExists => LedgerError::AlreadyExists { path: path.clone() },
            io::ErrorKind::PermissionDenied => LedgerError::PermissionDenied {
                path: path.clone(),
                source,
            },
            _ => LedgerError::io("creating ledger file", source),
        })?;

        file.write_counter(0)
            .map_err(|e| LedgerError::io("writing ledger header", e))?;
        file.sync(config.sync_mode)
            .map_err(|e| LedgerError::io("syncing ledger header", e))?;

        info!("Created transaction ledger at {}", path.display());
        Self::load(path, file, config)
    }

    fn open_inner(path: PathBuf, config: LedgerConfig) -> LedgerResult<Self> {
        let file = LedgerFile::open(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LedgerError::NotFound { path: path.clone() },
            io::ErrorKind::PermissionDenied => LedgerError::PermissionDenied {
                path: path.clone(),
                source,
            },
            _ => LedgerError::io("opening ledger file", source),
        })?;

        let ledger = Self::load(path, file, config)?;
        info!(
            "Opened transaction ledger at {} with {} transactions",
            ledger.path.display(),
            ledger.counter()
        );
        Ok(ledger)
    }

    fn load(path: PathBuf, file: LedgerFile, config: LedgerConfig) -> LedgerResult<Self> {
        let counter = check_counter(&file)?;

        Ok(FileLedger {
            path,
            file: RwLock::new(Some(file)),
            counter: AtomicU64::new(counter),
            alloc_lock: Mutex::new(()),
            sync_mode: config.sync_mode,
            fatal_handler: config.fatal_handler,
        })
    }

    /// Location of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of transactions allocated so far.
    pub fn counter(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.file.read().is_none()
    }

    /// Reads the state of every allocated transaction, in xid order.
    pub fn snapshot(&self) -> LedgerResult<Vec<(TransactionId, TransactionState)>> {
        let counter = self.counter();

        self.with_file(|file| {
            let len = usize::try_from(counter).map_err(|_| {
                LedgerError::io(
                    "reading status array",
                    io::Error::new(io::ErrorKind::OutOfMemory, "status array exceeds address space"),
                )
            })?;
            let mut codes = vec![0u8; len];
            file.read_at(&mut codes, HEADER_SIZE)
                .map_err(|e| LedgerError::io("reading status array", e))?;

            codes
                .into_iter()
                .zip(1..)
                .map(|(byte, xid)| {
                    let xid = TransactionId::new(xid);
                    TransactionState::from_code(byte)
                        .map(|state| (xid, state))
                        .ok_or(LedgerError::InvalidStatus { xid, byte })
                })
                .collect()
        })
    }

    /// Runs `f` against the open file, escalating fatal errors.
    fn with_file<T>(&self, f: impl FnOnce(&LedgerFile) -> LedgerResult<T>) -> LedgerResult<T> {
        let guard = self.file.read();
        let file = guard.as_ref().ok_or(LedgerError::Closed)?;
        f(file).map_err(|e| escalate(self.fatal_handler.as_ref(), e))
    }

    /// Rejects xids that have no status record.
    fn check_range(&self, xid: TransactionId) -> LedgerResult<()> {
        let counter = self.counter();
        if xid.is_super() || xid.value() > counter {
            warn!("{} is out of range ({} allocated)", xid, counter);
            return Err(LedgerError::OutOfRange { xid, counter });
        }
        Ok(())
    }

    fn read_state(&self, xid: TransactionId) -> LedgerResult<TransactionState> {
        self.with_file(|file| {
            let mut buf = [0u8; 1];
            file.read_at(&mut buf, record_offset(xid.value()))
                .map_err(|e| LedgerError::io("reading status record", e))?;
            TransactionState::from_code(buf[0]).ok_or(LedgerError::InvalidStatus { xid, byte: buf[0] })
        })
    }

    fn write_state(&self, file: &LedgerFile, xid: TransactionId, state: TransactionState) -> LedgerResult<()> {
        file.write_at(&[state.code()], record_offset(xid.value()))
            .map_err(|e| LedgerError::io("writing status record", e))?;
        file.sync(self.sync_mode)
            .map_err(|e| LedgerError::io("syncing status record", e))
    }

    /// Moves an active transaction to a terminal state.
    fn finish(&self, xid: TransactionId, state: TransactionState) -> LedgerResult<()> {
        self.check_range(xid)?;

        let current = self.read_state(xid)?;
        if !current.is_active() {
            warn!("Refusing to mark {} {}: already {}", xid, state, current);
            return Err(LedgerError::NotActive { xid, state: current });
        }

        self.with_file(|file| self.write_state(file, xid, state))?;
        debug!("{} {}", xid, state);
        Ok(())
    }
}

impl TransactionManager for FileLedger {
    fn begin(&self) -> LedgerResult<TransactionId> {
        let _alloc = self.alloc_lock.lock();
        let xid = TransactionId::new(self.counter() + 1);

        self.with_file(|file| {
            // Status first: the counter must never cover an unwritten record.
            self.write_state(file, xid, TransactionState::Active)?;
            file.write_counter(xid.value())
                .map_err(|e| LedgerError::io("writing ledger header", e))?;
            file.sync(self.sync_mode)
                .map_err(|e| LedgerError::io("syncing ledger header", e))
        })?;

        self.counter.store(xid.value(), Ordering::Release);
        debug!("Began {}", xid);
        Ok(xid)
    }

    fn commit(&self, xid: TransactionId) -> LedgerResult<()> {
        self.finish(xid, TransactionState::Committed)
    }

    fn abort(&self, xid: TransactionId) -> LedgerResult<()> {
        self.finish(xid, TransactionState::Aborted)
    }

    fn state(&self, xid: TransactionId) -> LedgerResult<TransactionState> {
        if xid.is_super() {
            return Ok(TransactionState::Committed);
        }
        self.check_range(xid)?;
        self.read_state(xid)
    }

    fn close(&self) -> LedgerResult<()> {
        let mut guard = self.file.write();
        if let Some(file) = guard.take() {
            file.sync(self.sync_mode)
                .map_err(|e| escalate(self.fatal_handler.as_ref(), LedgerError::io("syncing ledger on close", e)))?;
            info!("Closed transaction ledger at {}", self.path.display());
        }
        Ok(())
    }
}

impl fmt::Debug for FileLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLedger")
            .field("path", &self.path)
            .field("counter", &self.counter())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Validates the file length against the stored counter and returns the counter.
fn check_counter(file: &LedgerFile) -> LedgerResult<u64> {
    let actual_len = file
        .file_len()
        .map_err(|e| LedgerError::io("reading ledger length", e))?;

    // Not even a full header.
    if actual_len < HEADER_SIZE {
        return Err(LedgerError::CorruptLedger {
            counter: 0,
            expected_len: HEADER_SIZE,
            actual_len,
        });
    }

    let counter = file
        .read_counter()
        .map_err(|e| LedgerError::io("reading ledger header", e))?;
    let expected_len = ledger_len(counter);
    if expected_len != actual_len {
        return Err(LedgerError::CorruptLedger {
            counter,
            expected_len,
            actual_len,
        });
    }

    Ok(counter)
}
