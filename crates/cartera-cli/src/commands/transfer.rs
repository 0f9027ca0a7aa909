//! Single transfers and route drains.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use cartera_core::types::{AccountId, RouteId};
use cartera_ledger::{BatchTransferSummary, DrainRequest, NewTransfer};

use super::{parse_amount, parse_entry_date, Context};
use crate::cli::OutputFormat;
use crate::output::{
    format_money, print_header, print_json_value, print_output, print_success, print_warning,
};

/// Arguments for the transfer command.
#[derive(Args, Debug)]
pub struct TransferArgs {
    /// Source account id
    #[arg(long)]
    pub from: String,

    /// Destination account id
    #[arg(long)]
    pub to: String,

    /// Amount to move
    #[arg(long, allow_hyphen_values = true)]
    pub amount: String,

    /// Business date (YYYY-MM-DD, defaults to now)
    #[arg(long)]
    pub date: Option<String>,

    /// Description
    #[arg(long)]
    pub description: Option<String>,
}

/// Arguments for the drain command.
#[derive(Args, Debug)]
pub struct DrainArgs {
    /// Route whose cash fund is drained (repeatable)
    #[arg(long = "route", required = true)]
    pub routes: Vec<String>,

    /// Account receiving the money
    #[arg(long)]
    pub to: String,

    /// Business date (YYYY-MM-DD, defaults to now)
    #[arg(long)]
    pub date: Option<String>,

    /// Description of the transfers
    #[arg(long)]
    pub description: Option<String>,
}

/// One transfer line of a batch.
#[derive(Debug, Serialize, Tabled)]
struct MovementRow {
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Moves money between two accounts.
pub fn transfer(args: TransferArgs, ctx: &Context) -> Result<()> {
    let ledger = ctx.ledger()?;

    let mut request = NewTransfer::new(
        AccountId::from(args.from),
        AccountId::from(args.to),
        parse_amount(&args.amount)?,
        parse_entry_date(args.date.as_deref())?,
    );
    if let Some(description) = args.description {
        request = request.with_description(description);
    }

    let result = ledger.create_transfer(request)?;

    if ctx.format == OutputFormat::Json {
        return print_json_value(&result);
    }
    if !ctx.quiet {
        print_success(&format!(
            "Transferred {} from {} to {}",
            format_money(result.amount()),
            result.outgoing.account_id,
            result.incoming.account_id
        ));
    }
    Ok(())
}

/// Sweeps route cash funds into one account.
pub fn drain(args: DrainArgs, ctx: &Context) -> Result<()> {
    let ledger = ctx.ledger()?;

    let summary = ledger.drain_routes(DrainRequest {
        route_ids: args.routes.into_iter().map(RouteId::from).collect(),
        destination_account_id: AccountId::from(args.to),
        entry_date: parse_entry_date(args.date.as_deref())?,
        description: args.description,
    })?;

    if ctx.format == OutputFormat::Json {
        return print_json_value(&summary);
    }

    if ctx.is_table() && !ctx.quiet {
        print_header("Drain");
    }
    print_output(&movement_rows(&summary), ctx.format)?;

    if ctx.is_table() && !ctx.quiet {
        for skipped in &summary.skipped {
            print_warning(&format!("{} skipped: {}", skipped.account_id, skipped.reason));
        }
        print_success(&format!("Moved {} in total", format_money(summary.total_moved)));
    }
    Ok(())
}

fn movement_rows(summary: &BatchTransferSummary) -> Vec<MovementRow> {
    let moved = summary.transfers.iter().map(|t| MovementRow {
        from: t.outgoing.account_id.to_string(),
        to: t.incoming.account_id.to_string(),
        amount: format_money(t.amount()),
        status: "moved".to_string(),
    });
    let skipped = summary.skipped.iter().map(|s| MovementRow {
        from: s.account_id.to_string(),
        to: String::new(),
        amount: format_money(s.amount),
        status: "skipped".to_string(),
    });
    moved.chain(skipped).collect()
}
