//! CLI error types.

use thiserror::Error;

use cartera_config::ConfigError;
use cartera_ledger::LedgerError;
use cartera_portfolio::PortfolioError;
use cartera_storage::StorageError;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid date format.
    #[error("Invalid date format: {0}. Use YYYY-MM-DD.")]
    InvalidDate(String),

    /// Invalid amount.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid argument combination or value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Ledger error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Portfolio error.
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    /// IO error.
    #[error("IO error on {path}: {source}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Input file could not be parsed.
    #[error("Could not parse {path}: {reason}")]
    Parse {
        /// File involved.
        path: String,
        /// Parser message.
        reason: String,
    },
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
