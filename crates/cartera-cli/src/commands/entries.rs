//! Entries of one account.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use cartera_core::types::{AccountId, DateRange};
use cartera_storage::AccountEntry;

use super::{parse_date, Context};
use crate::error::CliError;
use crate::output::{format_money, print_header, print_output};

/// Arguments for the entries command.
#[derive(Args, Debug)]
pub struct EntriesArgs {
    /// Account id
    #[arg(long)]
    pub account: String,

    /// First business date, inclusive (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Last business date, inclusive (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    pub to: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
struct EntryRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Source")]
    source_type: String,
    #[tabled(rename = "Dir")]
    direction: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&AccountEntry> for EntryRow {
    fn from(entry: &AccountEntry) -> Self {
        Self {
            date: entry.entry_date.format("%Y-%m-%d %H:%M").to_string(),
            id: entry.id.to_string(),
            source_type: entry.source_type.to_string(),
            direction: entry.direction.to_string(),
            amount: format_money(entry.amount.as_decimal()),
            description: entry.description.clone(),
        }
    }
}

/// Lists an account's entries in business-date order.
pub fn execute(args: EntriesArgs, ctx: &Context) -> Result<()> {
    let ledger = ctx.ledger()?;
    let account_id = AccountId::from(args.account);

    let range = match (args.from.as_deref(), args.to.as_deref()) {
        (Some(from), Some(to)) => Some(
            DateRange::from_dates(parse_date(from)?, parse_date(to)?)
                .map_err(|e| CliError::InvalidArgument(e.to_string()))?,
        ),
        _ => None,
    };

    let entries = ledger.account_entries(&account_id, range.as_ref())?;
    let rows: Vec<EntryRow> = entries.iter().map(EntryRow::from).collect();

    if ctx.is_table() && !ctx.quiet {
        match &range {
            Some(range) => print_header(&format!("Entries of {account_id} ({range})")),
            None => print_header(&format!("Entries of {account_id}")),
        }
    }
    print_output(&rows, ctx.format)
}
