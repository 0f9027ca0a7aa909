//! Account listing and opening.

use std::str::FromStr;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use cartera_core::types::{AccountCategory, RouteId};
use cartera_ledger::NewAccount;
use cartera_storage::{Account, AccountFilter};

use super::{parse_amount, parse_entry_date, Context};
use crate::cli::OutputFormat;
use crate::output::{format_money, print_header, print_json_value, print_output, print_success};

/// Arguments for the accounts command.
#[derive(Args, Debug)]
pub struct AccountsArgs {
    /// Only accounts of this category (e.g. BANK, EMPLOYEE_CASH_FUND)
    #[arg(long, value_parser = AccountCategory::from_str)]
    pub category: Option<AccountCategory>,

    /// Only accounts of this route
    #[arg(long)]
    pub route: Option<String>,
}

/// Arguments for the open-account command.
#[derive(Args, Debug)]
pub struct OpenAccountArgs {
    /// Account name
    #[arg(long)]
    pub name: String,

    /// Account category
    #[arg(long, value_parser = AccountCategory::from_str)]
    pub category: AccountCategory,

    /// Explicit account id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Owning route
    #[arg(long)]
    pub route: Option<String>,

    /// Opening balance
    #[arg(long, default_value = "0")]
    pub initial_balance: String,

    /// Business date of the opening entry (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
}

/// One account line.
#[derive(Debug, Serialize, Tabled)]
struct AccountRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "Balance")]
    balance: String,
}

impl From<&Account> for AccountRow {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            name: account.name.clone(),
            category: account.category.to_string(),
            route: account
                .route_id
                .as_ref()
                .map(RouteId::to_string)
                .unwrap_or_default(),
            balance: format_money(account.balance),
        }
    }
}

/// Lists accounts with their stored balances.
pub fn list(args: AccountsArgs, ctx: &Context) -> Result<()> {
    let ledger = ctx.ledger()?;

    let mut filter = AccountFilter::new();
    if let Some(category) = args.category {
        filter = filter.category(category);
    }
    if let Some(route) = args.route {
        filter = filter.route(route);
    }

    let accounts = ledger.list_accounts(&filter)?;
    let rows: Vec<AccountRow> = accounts.iter().map(AccountRow::from).collect();

    if ctx.is_table() && !ctx.quiet {
        print_header("Accounts");
    }
    print_output(&rows, ctx.format)
}

/// Opens an account, booking the opening balance when positive.
pub fn open(args: OpenAccountArgs, ctx: &Context) -> Result<()> {
    let ledger = ctx.ledger()?;

    let mut request = NewAccount::new(args.name, args.category)
        .with_initial_balance(parse_amount(&args.initial_balance)?)
        .opened_at(parse_entry_date(args.date.as_deref())?);
    if let Some(id) = args.id {
        request = request.with_id(id);
    }
    if let Some(route) = args.route {
        request = request.with_route(route);
    }

    let account = ledger.open_account(request)?;

    match ctx.format {
        OutputFormat::Json => print_json_value(&account)?,
        _ if ctx.quiet => println!("{}", account.id),
        OutputFormat::Table => print_success(&format!(
            "Opened {} '{}' with balance {}",
            account.id,
            account.name,
            format_money(account.balance)
        )),
        OutputFormat::Csv => print_output(&[AccountRow::from(&account)], ctx.format)?,
    }
    Ok(())
}
