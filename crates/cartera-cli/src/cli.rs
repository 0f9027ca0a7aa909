//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::{
    AccountsArgs, DrainArgs, EntriesArgs, FixBalanceArgs, OpenAccountArgs, ReconcileArgs,
    ReportArgs, TransferArgs,
};

/// Cartera - Microloan ledger and portfolio classification CLI
#[derive(Parser)]
#[command(name = "cartera")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "CARTERA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Ledger database path; overrides `storage.path`
    #[arg(long, env = "CARTERA_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// List accounts and balances
    Accounts(AccountsArgs),

    /// Open an account
    OpenAccount(OpenAccountArgs),

    /// Move money between two accounts
    Transfer(TransferArgs),

    /// Sweep route cash funds into one account
    Drain(DrainArgs),

    /// Check stored balances against the entries
    Reconcile(ReconcileArgs),

    /// Book an adjustment so the entries match the stored balance
    FixBalance(FixBalanceArgs),

    /// Show an account's entries
    Entries(EntriesArgs),

    /// Portfolio reports over loan and payment snapshots
    Report(ReportArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}
