//! Transaction status as stored in the ledger.

use serde::{Deserialize, Serialize};

/// The possible states of a transaction.
///
/// Each state has a one-byte code used in the ledger's status array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionState {
    /// The transaction has begun and has not finished yet.
    Active,
    /// The transaction has been successfully committed.
    Committed,
    /// The transaction has been aborted (rolled back).
    Aborted,
}

const CODE_ACTIVE: u8 = 0;
const CODE_COMMITTED: u8 = 1;
const CODE_ABORTED: u8 = 2;

impl TransactionState {
    /// Returns the status byte written to disk.
    pub fn code(self) -> u8 {
        match self {
            Self::Active => CODE_ACTIVE,
            Self::Committed => CODE_COMMITTED,
            Self::Aborted => CODE_ABORTED,
        }
    }

    /// Decodes a status byte, returning `None` for unknown codes.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            CODE_ACTIVE => Some(Self::Active),
            CODE_COMMITTED => Some(Self::Committed),
            CODE_ABORTED => Some(Self::Aborted),
            _ => None,
        }
    }

    /// Returns true if the transaction is active.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns true if the transaction is committed.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }

    /// Returns true if the transaction is aborted.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Returns true if the transaction is finished (committed or aborted).
    /// Finished states are terminal.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Committed | Self::Aborted)
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Committed => write!(f, "Committed"),
            Self::Aborted => write!(f, "Aborted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_state() {
        let active = TransactionState::Active;
        let committed = TransactionState::Committed;
        let aborted = TransactionState::Aborted;

        assert!(active.is_active());
        assert!(!active.is_committed());
        assert!(!active.is_aborted());
        assert!(!active.is_finished());

        assert!(!committed.is_active());
        assert!(committed.is_committed());
        assert!(!committed.is_aborted());
        assert!(committed.is_finished());

        assert!(!aborted.is_active());
        assert!(!aborted.is_committed());
        assert!(aborted.is_aborted());
        assert!(aborted.is_finished());
    }

    #[test]
    fn test_transaction_state_display() {
        assert_eq!(format!("{}", TransactionState::Active), "Active");
        assert_eq!(format!("{}", TransactionState::Committed), "Committed");
        assert_eq!(format!("{}", TransactionState::Aborted), "Aborted");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(TransactionState::Active.code(), 0);
        assert_eq!(TransactionState::Committed.code(), 1);
        assert_eq!(TransactionState::Aborted.code(), 2);

        assert_eq!(TransactionState::from_code(1), Some(TransactionState::Committed));
        assert_eq!(TransactionState::from_code(3), None);
        assert_eq!(TransactionState::from_code(0xff), None);
    }
}
