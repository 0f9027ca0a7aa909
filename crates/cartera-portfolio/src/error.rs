//! Error types for portfolio reports.
//!
//! Classifier functions are total and never fail; only report builders that
//! take calendar input return [`PortfolioResult`].

use thiserror::Error;

use cartera_core::error::CoreError;

/// Result type for portfolio operations.
pub type PortfolioResult<T> = Result<T, PortfolioError>;

/// Errors that can occur while building portfolio reports.
#[derive(Error, Debug, Clone)]
pub enum PortfolioError {
    /// Reporting period could not be built.
    #[error("Invalid period: {reason}")]
    InvalidPeriod {
        /// Why the period is invalid.
        reason: String,
    },

    /// A previous report does not precede the one being built.
    #[error("Previous report {previous} does not precede {current}")]
    PreviousOutOfOrder {
        /// Period of the supplied previous report.
        previous: String,
        /// Period being built.
        current: String,
    },

    /// Core type error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl PortfolioError {
    /// Create an invalid period error.
    #[must_use]
    pub fn invalid_period(reason: impl Into<String>) -> Self {
        Self::InvalidPeriod {
            reason: reason.into(),
        }
    }
}
