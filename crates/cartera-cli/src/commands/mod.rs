//! CLI command implementations.

pub mod accounts;
pub mod entries;
pub mod reconcile;
pub mod report;
pub mod transfer;

pub use accounts::{AccountsArgs, OpenAccountArgs};
pub use entries::EntriesArgs;
pub use reconcile::{FixBalanceArgs, ReconcileArgs};
pub use report::ReportArgs;
pub use transfer::{DrainArgs, TransferArgs};

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use cartera_config::CarteraConfig;
use cartera_core::types::{end_of_day, start_of_day};
use cartera_ledger::{Ledger, LedgerSettings};
use cartera_storage::RedbStorage;

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub config: CarteraConfig,
    pub db_path: PathBuf,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl Context {
    /// Builds the context; `--db` wins over `storage.path`.
    pub fn new(config: CarteraConfig, db: Option<PathBuf>, format: OutputFormat, quiet: bool) -> Self {
        let db_path = db.unwrap_or_else(|| PathBuf::from(&config.storage.path));
        Self {
            config,
            db_path,
            format,
            quiet,
        }
    }

    /// Opens the ledger database, creating it on first use.
    pub fn ledger(&self) -> CliResult<Ledger<RedbStorage>> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CliError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        tracing::debug!(path = %self.db_path.display(), "opening ledger database");
        let store = RedbStorage::open(&self.db_path)?;
        Ok(Ledger::with_settings(
            Arc::new(store),
            LedgerSettings::from_config(&self.config),
        ))
    }

    /// Whether to print the decorative table output.
    pub fn is_table(&self) -> bool {
        self.format == OutputFormat::Table
    }
}

/// Parses a date string in YYYY-MM-DD format.
pub fn parse_date(s: &str) -> CliResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| CliError::InvalidDate(s.to_string()))
}

/// Start of the given day, or now when no date was passed.
pub fn parse_entry_date(s: Option<&str>) -> CliResult<DateTime<Utc>> {
    match s {
        Some(s) => Ok(start_of_day(parse_date(s)?)),
        None => Ok(Utc::now()),
    }
}

/// End of the given day, or now when no date was passed.
pub fn parse_now(s: Option<&str>) -> CliResult<DateTime<Utc>> {
    match s {
        Some(s) => Ok(end_of_day(parse_date(s)?)),
        None => Ok(Utc::now()),
    }
}

/// Parses a decimal amount.
pub fn parse_amount(s: &str) -> CliResult<Decimal> {
    Decimal::from_str(s.trim()).map_err(|_| CliError::InvalidAmount(s.to_string()))
}
