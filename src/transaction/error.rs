//! Ledger error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::id::TransactionId;
use super::state::TransactionState;

/// Errors that can occur while operating the transaction ledger.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger file already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Ledger file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Ledger file cannot be read and written: {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt ledger: counter {counter} implies {expected_len} bytes, file has {actual_len}")]
    CorruptLedger {
        counter: u64,
        expected_len: u64,
        actual_len: u64,
    },

    #[error("Invalid status byte {byte:#04x} recorded for {xid}")]
    InvalidStatus { xid: TransactionId, byte: u8 },

    #[error("IO error while {context}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{xid} is out of range: {counter} transactions allocated")]
    OutOfRange { xid: TransactionId, counter: u64 },

    #[error("{xid} is not active: already {state}")]
    NotActive {
        xid: TransactionId,
        state: TransactionState,
    },

    #[error("Ledger is closed")]
    Closed,
}

impl LedgerError {
    pub(crate) fn io(context: &'static str, source: io::Error) -> Self {
        Self::Io { context, source }
    }

    /// Returns true if the ledger can no longer be trusted after this error.
    ///
    /// Fatal errors are routed to the configured
    /// [`FatalHandler`](super::fatal::FatalHandler); the rest are caller
    /// mistakes and are returned as-is.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::OutOfRange { .. } | Self::NotActive { .. } | Self::Closed
        )
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
