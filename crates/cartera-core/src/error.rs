//! Error types for core value construction.

use rust_decimal::Decimal;
use thiserror::Error;

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while constructing core values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A value failed validation.
    #[error("Validation failed: {reason}")]
    Validation {
        /// Why the value was rejected.
        reason: String,
    },

    /// A money amount was negative.
    #[error("Negative amount: {value} (sign is carried by entry direction)")]
    NegativeAmount {
        /// The rejected value.
        value: Decimal,
    },

    /// A date could not be built or parsed.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },

    /// A range whose start is after its end.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// Range start.
        start: String,
        /// Range end.
        end: String,
    },

    /// Unknown enumeration label.
    #[error("Unknown {kind}: '{value}'")]
    UnknownVariant {
        /// Enumeration name.
        kind: &'static str,
        /// The label that did not match.
        value: String,
    },
}

impl CoreError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Creates an invalid date error.
    #[must_use]
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Creates an unknown variant error.
    #[must_use]
    pub fn unknown_variant(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_display() {
        let err = CoreError::NegativeAmount { value: dec!(-5) };
        assert!(err.to_string().contains("-5"));

        let err = CoreError::validation("amount must be positive");
        assert!(err.to_string().contains("amount must be positive"));

        let err = CoreError::unknown_variant("source type", "FOO");
        assert_eq!(err.to_string(), "Unknown source type: 'FOO'");
    }
}
