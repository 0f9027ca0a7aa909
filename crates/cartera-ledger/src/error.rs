//! Error types for ledger operations.

use cartera_core::error::CoreError;
use cartera_core::types::AccountId;
use cartera_storage::StorageError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors raised by the ledger engine, batch transfers and date migration.
///
/// Any of these aborts the surrounding transaction.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Input rejected before any write.
    #[error("Validation failed: {reason}")]
    Validation {
        /// Why the input was rejected.
        reason: String,
    },

    /// Referenced record does not exist.
    #[error("{entity_type} not found: '{key}'")]
    NotFound {
        /// Kind of record.
        entity_type: &'static str,
        /// Identifier that was looked up.
        key: String,
    },

    /// Source account cannot cover the requested amount.
    #[error("Insufficient funds in account '{account_id}': available {available}, requested {requested}")]
    InsufficientFunds {
        /// Account being debited.
        account_id: AccountId,
        /// Current balance.
        available: Decimal,
        /// Amount requested.
        requested: Decimal,
    },

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),

    /// Core value construction failure.
    #[error("Core error: {0}")]
    Core(#[source] CoreError),
}

impl LedgerError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            key: key.into(),
        }
    }
}

impl From<StorageError> for LedgerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity_type, key } => Self::NotFound { entity_type, key },
            other => Self::Storage(other),
        }
    }
}

impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { reason } => Self::Validation { reason },
            err @ (CoreError::NegativeAmount { .. } | CoreError::InvalidDateRange { .. }) => {
                Self::validation(err.to_string())
            }
            other => Self::Core(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_storage_not_found_is_lifted() {
        let err: LedgerError = StorageError::not_found("Account", "acc-1").into();
        assert!(matches!(
            err,
            LedgerError::NotFound { entity_type: "Account", ref key } if key == "acc-1"
        ));
    }

    #[test]
    fn test_core_validation_is_lifted() {
        let err: LedgerError = CoreError::NegativeAmount { value: dec!(-1) }.into();
        assert!(matches!(err, LedgerError::Validation { .. }));

        let err: LedgerError = CoreError::invalid_date("2024-13").into();
        assert!(matches!(err, LedgerError::Core(_)));
    }

    #[test]
    fn test_display() {
        let err = LedgerError::InsufficientFunds {
            account_id: AccountId::from("bank"),
            available: dec!(100),
            requested: dec!(150),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds in account 'bank': available 100, requested 150"
        );
    }
}
