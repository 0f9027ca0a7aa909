//! Cartera CLI - Command-line interface for the microloan ledger.
//!
//! # Usage
//!
//! ```bash
//! # Open accounts and move money
//! cartera open-account --name Bank --category BANK --initial-balance 10000
//! cartera transfer --from bank --to cash-r1 --amount 2500
//!
//! # Sweep route cash funds back to the bank
//! cartera drain --route r1 --route r2 --to bank
//!
//! # Check and repair balances
//! cartera reconcile
//! cartera fix-balance --account cash-r1
//!
//! # Portfolio reports
//! cartera report weekly --loans loans.json --payments payments.json --date 2024-12-09
//! cartera report monthly --loans loans.json --year 2024 --month 12
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cartera_config::CarteraConfig;

mod cli;
mod commands;
mod error;
mod output;

use cli::{Cli, Commands};
use commands::Context;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CarteraConfig::load_or_default(cli.config.as_deref())?;

    // Logs go to stderr so stdout stays parseable.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let ctx = Context::new(config, cli.db, cli.format, cli.quiet);

    match cli.command {
        Commands::Accounts(args) => commands::accounts::list(args, &ctx)?,
        Commands::OpenAccount(args) => commands::accounts::open(args, &ctx)?,
        Commands::Transfer(args) => commands::transfer::transfer(args, &ctx)?,
        Commands::Drain(args) => commands::transfer::drain(args, &ctx)?,
        Commands::Reconcile(args) => commands::reconcile::reconcile(args, &ctx)?,
        Commands::FixBalance(args) => commands::reconcile::fix_balance(args, &ctx)?,
        Commands::Entries(args) => commands::entries::execute(args, &ctx)?,
        Commands::Report(args) => commands::report::execute(args, &ctx)?,
    }

    Ok(())
}
