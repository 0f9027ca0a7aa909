//! Portfolio reports over loan and payment exports.
//!
//! Loans are read as a JSON array of loan snapshots. Payments are a JSON
//! array of `{ "loanId", "id", "receivedAt", "amount" }` rows.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tabled::Tabled;

use cartera_core::types::{LoanId, PaymentId, WeekRange};
use cartera_portfolio::{
    annotate_renewals, monthly_report, weekly_report, ClassifierConfig, ClientBalance,
    ClientStatusCounts, LoanSnapshot, MonthlyPortfolioReport, PaymentSnapshot, PaymentsByLoan,
    RenovationKpis,
};

use super::{parse_date, parse_now, Context};
use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};
use crate::output::{format_percent, print_header, print_json_value, print_output, KeyValue};

/// Arguments for the report command.
#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub command: ReportCommand,
}

/// Report subcommands.
#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Report for the week containing a date
    Weekly(WeeklyArgs),

    /// Report for a calendar month
    Monthly(MonthlyArgs),
}

/// Inputs shared by both reports.
#[derive(Args, Debug)]
pub struct BookArgs {
    /// JSON file with the loans
    #[arg(long)]
    pub loans: PathBuf,

    /// JSON file with the payments
    #[arg(long)]
    pub payments: Option<PathBuf>,

    /// Reference instant: end of this day (YYYY-MM-DD, defaults to now)
    #[arg(long)]
    pub now: Option<String>,
}

/// Arguments for the weekly report.
#[derive(Args, Debug)]
pub struct WeeklyArgs {
    #[command(flatten)]
    pub book: BookArgs,

    /// Any date inside the week (YYYY-MM-DD)
    #[arg(long)]
    pub date: String,
}

/// Arguments for the monthly report.
#[derive(Args, Debug)]
pub struct MonthlyArgs {
    #[command(flatten)]
    pub book: BookArgs,

    /// Year
    #[arg(long)]
    pub year: i32,

    /// Month (1-12)
    #[arg(long)]
    pub month: u32,

    /// JSON file with an earlier monthly report, used for trends
    #[arg(long)]
    pub previous: Option<PathBuf>,
}

/// A payment row of the payments file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentRow {
    loan_id: LoanId,
    id: PaymentId,
    received_at: DateTime<Utc>,
    amount: Decimal,
}

#[derive(Debug, serde::Serialize, Tabled)]
struct WeekRow {
    #[tabled(rename = "Week")]
    week: String,
    #[tabled(rename = "Active")]
    total_activos: usize,
    #[tabled(rename = "En CV")]
    en_cv: usize,
    #[tabled(rename = "Al corriente")]
    al_corriente: usize,
    #[tabled(rename = "Exited CV")]
    salieron_de_cv: usize,
}

impl WeekRow {
    fn new(week: &WeekRange, status: &ClientStatusCounts) -> Self {
        Self {
            week: week.to_string(),
            total_activos: status.total_activos,
            en_cv: status.en_cv,
            al_corriente: status.al_corriente,
            salieron_de_cv: status.salieron_de_cv,
        }
    }
}

/// Executes the report command.
pub fn execute(args: ReportArgs, ctx: &Context) -> Result<()> {
    let config = ClassifierConfig::from(&ctx.config.classifier);
    match args.command {
        ReportCommand::Weekly(args) => weekly(args, ctx, &config),
        ReportCommand::Monthly(args) => monthly(args, ctx, &config),
    }
}

fn weekly(args: WeeklyArgs, ctx: &Context, config: &ClassifierConfig) -> Result<()> {
    let (loans, payments) = load_book(&args.book)?;
    let now = parse_now(args.book.now.as_deref())?;
    let week = WeekRange::for_date(parse_date(&args.date)?);

    let report = weekly_report(&loans, &payments, &week, now, config);

    if ctx.format == OutputFormat::Json {
        return print_json_value(&report);
    }

    if ctx.is_table() && !ctx.quiet {
        let label = if report.is_historical { "historical" } else { "in progress" };
        print_header(&format!("Week {} ({label})", report.week));
    }
    print_output(&[WeekRow::new(&report.week, &report.status)], ctx.format)?;
    print_flow(&report.client_balance, &report.renovation, ctx)
}

fn monthly(args: MonthlyArgs, ctx: &Context, config: &ClassifierConfig) -> Result<()> {
    let (loans, payments) = load_book(&args.book)?;
    let now = parse_now(args.book.now.as_deref())?;
    let previous: Option<MonthlyPortfolioReport> = match &args.previous {
        Some(path) => Some(read_json(path)?),
        None => None,
    };

    let report = monthly_report(
        &loans,
        &payments,
        args.year,
        args.month,
        now,
        previous.as_ref(),
        config,
    )?;

    if ctx.format == OutputFormat::Json {
        return print_json_value(&report);
    }

    if ctx.is_table() && !ctx.quiet {
        print_header(&format!("Portfolio {}-{:02}", report.year, report.month));
    }
    let rows: Vec<WeekRow> = report
        .weeks
        .iter()
        .map(|w| WeekRow::new(&w.week, &w.status))
        .collect();
    print_output(&rows, ctx.format)?;
    print_flow(&report.client_balance, &report.renovation, ctx)
}

fn print_flow(balance: &ClientBalance, kpis: &RenovationKpis, ctx: &Context) -> Result<()> {
    if ctx.is_table() && !ctx.quiet {
        print_header("Client flow");
    }
    let rows = vec![
        KeyValue::new("Nuevos", balance.nuevos),
        KeyValue::new("Renovados", balance.renovados),
        KeyValue::new("Reintegros", balance.reintegros),
        KeyValue::new("Terminados sin renovar", balance.terminados_sin_renovar),
        KeyValue::new("Balance", balance.balance),
        KeyValue::new("Balance trend", balance.trend),
        KeyValue::new("Renovaciones", kpis.total_renovaciones),
        KeyValue::new("Cierres sin renovar", kpis.total_cierres_sin_renovar),
        KeyValue::new("Tasa de renovacion", format_percent(kpis.tasa_renovacion)),
        KeyValue::new("Renovation trend", kpis.trend),
    ];
    print_output(&rows, ctx.format)
}

/// Reads the loan and payment exports and annotates renewals.
fn load_book(args: &BookArgs) -> CliResult<(Vec<LoanSnapshot>, PaymentsByLoan)> {
    let mut loans: Vec<LoanSnapshot> = read_json(&args.loans)?;
    let index = annotate_renewals(&mut loans);

    let mut payments = PaymentsByLoan::new();
    if let Some(path) = &args.payments {
        let rows: Vec<PaymentRow> = read_json(path)?;
        for row in rows {
            payments
                .entry(row.loan_id)
                .or_default()
                .push(PaymentSnapshot::new(row.id, row.received_at, row.amount));
        }
    }

    tracing::info!(
        loans = loans.len(),
        paid_loans = payments.len(),
        renewals = index.len(),
        "Loaded loan book"
    );
    Ok((loans, payments))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| CliError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
