//! Transaction identifiers.

use serde::{Deserialize, Serialize};

/// Identifier of a transaction recorded in the ledger.
///
/// Identifiers are assigned by the ledger in strictly increasing order
/// starting at 1. The value 0 is reserved for the super transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

/// Raw value of the super transaction.
pub const SUPER_XID: u64 = 0;

impl TransactionId {
    /// The super transaction: always committed, never stored on disk.
    /// Collaborators use it for system-level work that belongs to no
    /// user transaction.
    pub const SUPER: TransactionId = TransactionId(SUPER_XID);

    /// Creates a new transaction ID with the given value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the inner u64 value.
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_super(&self) -> bool {
        self.0 == SUPER_XID
    }
}

impl From<u64> for TransactionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Txn{}", self.0)
    }
}
