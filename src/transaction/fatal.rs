//! Fail-fast handling of unrecoverable ledger errors.
//!
//! The ledger is the only record of which transactions committed. Once it
//! reports corruption or an I/O failure nothing it says can be trusted, so
//! by default the process is terminated. The reaction is injected through
//! [`FatalHandler`] so tests can observe fatal paths without exiting.

use std::error::Error as _;

use parking_lot::Mutex;

use super::error::LedgerError;

/// Reaction to an unrecoverable ledger error.
pub trait FatalHandler: Send + Sync {
    /// Receives a fatal error. Implementations either never return or hand
    /// the error back to be propagated to the caller.
    fn handle(&self, error: LedgerError) -> LedgerError;
}

/// Logs the diagnostic and exits the process with status 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExit;

impl FatalHandler for ProcessExit {
    fn handle(&self, error: LedgerError) -> LedgerError {
        let diagnostic = render(&error);
        log::error!("{}", diagnostic);
        eprintln!("fatal: {}", diagnostic);
        std::process::exit(1)
    }
}

/// Records every fatal error and returns it to the caller.
#[derive(Debug, Default)]
pub struct RecordErrors {
    errors: Mutex<Vec<String>>,
}

impl RecordErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics received so far, oldest first.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.errors.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.errors.lock().len()
    }
}

impl FatalHandler for RecordErrors {
    fn handle(&self, error: LedgerError) -> LedgerError {
        let diagnostic = render(&error);
        log::warn!("intercepted fatal ledger error: {}", diagnostic);
        self.errors.lock().push(diagnostic);
        error
    }
}

/// Routes fatal errors to `handler` and passes the rest through.
pub(crate) fn escalate(handler: &dyn FatalHandler, error: LedgerError) -> LedgerError {
    if error.is_fatal() {
        handler.handle(error)
    } else {
        error
    }
}

/// Formats an error together with its chain of causes.
pub fn render(error: &LedgerError) -> String {
    let mut diagnostic = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        diagnostic.push_str(": ");
        diagnostic.push_str(&cause.to_string());
        source = cause.source();
    }
    diagnostic
}
