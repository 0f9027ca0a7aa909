//! Batch transfers between route cash funds and a central account.
//!
//! Both operations take an open transaction, so a failure on any route aborts
//! the whole batch.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use cartera_core::types::{AccountCategory, AccountId, RouteId};
use cartera_storage::{Account, AccountFilter, LedgerTxn, LedgerView};

use crate::engine::{ops, LedgerSettings, NewTransfer, TransferResult};
use crate::error::{LedgerError, LedgerResult};

/// Sweep request: every listed route's cash fund into one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainRequest {
    /// Routes to drain.
    pub route_ids: Vec<RouteId>,
    /// Account receiving the money.
    pub destination_account_id: AccountId,
    /// Business date of the transfers.
    pub entry_date: DateTime<Utc>,
    /// Transfer description; the configured default when absent.
    pub description: Option<String>,
}

/// Distribution request: one account's money spread over routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributeRequest {
    /// Account paying out.
    pub source_account_id: AccountId,
    /// Amount per route.
    pub allocations: Vec<Allocation>,
    /// Business date of the transfers.
    pub entry_date: DateTime<Utc>,
    /// Transfer description; the configured default when absent.
    pub description: Option<String>,
}

/// Amount destined to one route's cash fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// Receiving route.
    pub route_id: RouteId,
    /// Amount to move.
    pub amount: Decimal,
}

impl Allocation {
    /// Creates an allocation.
    pub fn new(route_id: impl Into<RouteId>, amount: Decimal) -> Self {
        Self {
            route_id: route_id.into(),
            amount,
        }
    }
}

/// An account the batch left alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedAccount {
    /// Account not moved.
    pub account_id: AccountId,
    /// Its route.
    pub route_id: Option<RouteId>,
    /// Balance or allocation that caused the skip.
    pub amount: Decimal,
    /// Why it was skipped.
    pub reason: String,
}

/// What a batch did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTransferSummary {
    /// Transfers booked, in request order.
    pub transfers: Vec<TransferResult>,
    /// Accounts not moved.
    pub skipped: Vec<SkippedAccount>,
    /// Sum of the transfers.
    pub total_moved: Decimal,
}

impl BatchTransferSummary {
    fn record(&mut self, transfer: TransferResult) {
        self.total_moved += transfer.amount();
        self.transfers.push(transfer);
    }
}

/// Cash-fund accounts of a route.
fn route_cash_funds(view: &dyn LedgerView, route_id: &RouteId) -> LedgerResult<Vec<Account>> {
    let accounts = view.list_accounts(
        &AccountFilter::new()
            .category(AccountCategory::EmployeeCashFund)
            .route(route_id.clone()),
    )?;
    if accounts.is_empty() {
        return Err(LedgerError::not_found(
            "Cash fund account for route",
            route_id.as_str(),
        ));
    }
    Ok(accounts)
}

/// Transfers each route's whole cash-fund balance to the destination.
///
/// Routes listed twice are drained once. Funds with a zero or negative
/// balance are reported as skipped.
///
/// # Errors
///
/// - `NotFound` if the destination or a route's cash fund does not exist
/// - `Validation` if the destination is one of the drained accounts
pub fn drain_routes(
    txn: &mut dyn LedgerTxn,
    request: DrainRequest,
    settings: &LedgerSettings,
) -> LedgerResult<BatchTransferSummary> {
    txn.require_account(&request.destination_account_id)?;

    let mut seen = BTreeSet::new();
    let mut sources = Vec::new();
    for route_id in &request.route_ids {
        if !seen.insert(route_id.clone()) {
            continue;
        }
        for account in route_cash_funds(txn.as_view(), route_id)? {
            if account.id == request.destination_account_id {
                return Err(LedgerError::validation(format!(
                    "destination '{}' is a cash fund of drained route '{}'",
                    account.id, route_id
                )));
            }
            sources.push(account);
        }
    }

    let description = request
        .description
        .unwrap_or_else(|| settings.transfer_description.clone());
    let mut summary = BatchTransferSummary::default();

    for account in sources {
        // Never move more than the fund holds.
        let amount = account
            .balance
            .round_dp_with_strategy(settings.scale, RoundingStrategy::ToZero);
        if amount <= Decimal::ZERO {
            summary.skipped.push(SkippedAccount {
                account_id: account.id,
                route_id: account.route_id,
                amount: account.balance,
                reason: "no positive balance".to_string(),
            });
            continue;
        }
        let transfer = NewTransfer::new(
            account.id.clone(),
            request.destination_account_id.clone(),
            amount,
            request.entry_date,
        )
        .with_description(description.clone())
        .with_snapshot(None, account.route_id.clone());
        summary.record(ops::create_transfer(txn, transfer, settings.scale)?);
    }

    tracing::info!(
        destination = %request.destination_account_id,
        routes = seen.len(),
        transfers = summary.transfers.len(),
        skipped = summary.skipped.len(),
        total = %summary.total_moved,
        "Routes drained"
    );
    Ok(summary)
}

/// Transfers each allocation from the source into the route's cash fund.
///
/// Zero allocations are skipped. Each route goes to its first cash fund by id.
///
/// # Errors
///
/// - `Validation` for a negative allocation, or a route whose cash fund is the source
/// - `NotFound` if the source or a route's cash fund does not exist
/// - `InsufficientFunds` if overdraft is disabled and the total exceeds the source balance
pub fn distribute_money(
    txn: &mut dyn LedgerTxn,
    request: DistributeRequest,
    settings: &LedgerSettings,
) -> LedgerResult<BatchTransferSummary> {
    let source = txn.require_account(&request.source_account_id)?;

    let mut summary = BatchTransferSummary::default();
    let mut planned = Vec::new();
    let mut requested = Decimal::ZERO;

    for allocation in request.allocations {
        if allocation.amount < Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "allocation for route '{}' is negative: {}",
                allocation.route_id, allocation.amount
            )));
        }
        let destination = route_cash_funds(txn.as_view(), &allocation.route_id)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                LedgerError::not_found("Cash fund account for route", allocation.route_id.as_str())
            })?;
        if destination.id == source.id {
            return Err(LedgerError::validation(format!(
                "route '{}' cash fund is the source account",
                allocation.route_id
            )));
        }
        if allocation.amount.is_zero() {
            summary.skipped.push(SkippedAccount {
                account_id: destination.id,
                route_id: Some(allocation.route_id),
                amount: Decimal::ZERO,
                reason: "zero allocation".to_string(),
            });
            continue;
        }
        requested += allocation
            .amount
            .round_dp_with_strategy(settings.scale, RoundingStrategy::MidpointAwayFromZero);
        planned.push((allocation, destination));
    }

    if !settings.allow_overdraft && requested > source.balance {
        return Err(LedgerError::InsufficientFunds {
            account_id: source.id,
            available: source.balance,
            requested,
        });
    }

    let description = request
        .description
        .unwrap_or_else(|| settings.transfer_description.clone());
    for (allocation, destination) in planned {
        let transfer = NewTransfer::new(
            source.id.clone(),
            destination.id,
            allocation.amount,
            request.entry_date,
        )
        .with_description(description.clone())
        .with_snapshot(None, Some(allocation.route_id));
        summary.record(ops::create_transfer(txn, transfer, settings.scale)?);
    }

    tracing::info!(
        source = %source.id,
        transfers = summary.transfers.len(),
        skipped = summary.skipped.len(),
        total = %summary.total_moved,
        "Money distributed"
    );
    Ok(summary)
}

/// Splits `total` evenly over `route_ids` at `scale`.
///
/// Each share is truncated to `scale`; the remainder goes to the last route
/// so the parts add up to exactly `total`.
///
/// # Errors
///
/// Returns `Validation` for an empty route list or a negative total.
pub fn split_evenly(
    total: Decimal,
    route_ids: &[RouteId],
    scale: u32,
) -> LedgerResult<Vec<Allocation>> {
    let Some((last, rest)) = route_ids.split_last() else {
        return Err(LedgerError::validation("no routes to split across"));
    };
    if total < Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "cannot split a negative total: {total}"
        )));
    }

    let share = (total / Decimal::from(route_ids.len()))
        .round_dp_with_strategy(scale, RoundingStrategy::ToZero);
    let mut allocations: Vec<Allocation> = rest
        .iter()
        .map(|route_id| Allocation::new(route_id.clone(), share))
        .collect();
    let remainder = total - share * Decimal::from(rest.len());
    allocations.push(Allocation::new(last.clone(), remainder));
    Ok(allocations)
}
