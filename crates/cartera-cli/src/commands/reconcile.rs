//! Balance reconciliation and repair.

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use cartera_core::types::AccountId;
use cartera_ledger::{FixOptions, FixOutcome, ReconciliationReport};

use super::{parse_entry_date, Context};
use crate::cli::OutputFormat;
use crate::output::{format_money, print_header, print_json_value, print_output, print_success, print_warning};

/// Arguments for the reconcile command.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Only this account (all accounts when omitted)
    #[arg(long)]
    pub account: Option<String>,

    /// Exit with an error when any account is inconsistent
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the fix-balance command.
#[derive(Args, Debug)]
pub struct FixBalanceArgs {
    /// Account to repair
    #[arg(long)]
    pub account: String,

    /// Business date of the adjustment (YYYY-MM-DD, defaults to now)
    #[arg(long)]
    pub date: Option<String>,

    /// Description of the adjustment
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
struct ReconcileRow {
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Stored")]
    stored: String,
    #[tabled(rename = "Calculated")]
    calculated: String,
    #[tabled(rename = "Difference")]
    difference: String,
    #[tabled(rename = "Entries")]
    entries: usize,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&ReconciliationReport> for ReconcileRow {
    fn from(report: &ReconciliationReport) -> Self {
        Self {
            account: report.account_id.to_string(),
            stored: format_money(report.stored_balance),
            calculated: format_money(report.calculated_balance),
            difference: format_money(report.difference),
            entries: report.entry_count,
            status: if report.is_consistent { "ok" } else { "MISMATCH" }.to_string(),
        }
    }
}

/// Compares stored balances with the sum of their entries.
pub fn reconcile(args: ReconcileArgs, ctx: &Context) -> Result<()> {
    let ledger = ctx.ledger()?;

    let reports = match args.account {
        Some(id) => vec![ledger.reconcile_account(&AccountId::from(id))?],
        None => ledger.reconcile_all()?,
    };
    let mismatches = reports.iter().filter(|r| !r.is_consistent).count();

    if ctx.format == OutputFormat::Json {
        print_json_value(&reports)?;
    } else {
        if ctx.is_table() && !ctx.quiet {
            print_header("Reconciliation");
        }
        let rows: Vec<ReconcileRow> = reports.iter().map(ReconcileRow::from).collect();
        print_output(&rows, ctx.format)?;

        if ctx.is_table() && !ctx.quiet {
            if mismatches == 0 {
                print_success(&format!("{} accounts consistent", reports.len()));
            } else {
                for report in reports.iter().filter(|r| !r.is_consistent) {
                    print_warning(&format!(
                        "{} differs by {}",
                        report.account_id,
                        format_money(report.difference).red()
                    ));
                }
            }
        }
    }

    if args.strict && mismatches > 0 {
        bail!("{mismatches} account(s) out of balance");
    }
    Ok(())
}

/// Books an adjustment entry so the entries match the stored balance.
pub fn fix_balance(args: FixBalanceArgs, ctx: &Context) -> Result<()> {
    let ledger = ctx.ledger()?;

    let options = FixOptions {
        entry_date: match args.date.as_deref() {
            Some(date) => Some(parse_entry_date(Some(date))?),
            None => None,
        },
        description: args.description,
    };
    let outcome = ledger.fix_balance(&AccountId::from(args.account), options)?;

    if ctx.format == OutputFormat::Json {
        return print_json_value(&outcome);
    }
    if ctx.quiet {
        return Ok(());
    }
    match &outcome {
        FixOutcome::AlreadyConsistent(report) => {
            print_success(&format!("{} already consistent", report.account_id));
        }
        FixOutcome::Adjusted { report, entry } => {
            print_success(&format!(
                "{} adjusted: {} {} booked as {}",
                report.account_id,
                entry.direction,
                format_money(entry.amount.as_decimal()),
                entry.id
            ));
        }
    }
    Ok(())
}
