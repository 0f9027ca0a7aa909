//! Ledger operations over an open transaction.
//!
//! Every function here works on a [`LedgerTxn`] (or a [`LedgerView`] for the
//! read-only ones) handed in by the caller, so several operations can be
//! composed inside one outer transaction. [`Ledger`](crate::Ledger) wraps each
//! of them in its own transaction for single-operation callers.

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;

use cartera_core::types::{
    AccountId, DateRange, EntryDirection, EntryId, Money, SourceType,
};
use cartera_storage::{Account, AccountEntry, EntryReference, LedgerTxn, LedgerView};

use super::types::{
    DeletionResult, FixOptions, FixOutcome, NewAccount, NewEntry, NewTransfer,
    ReconciliationReport, ReverseOptions, SourceTypeTotals, TransferResult,
};
use crate::error::{LedgerError, LedgerResult};

// =============================================================================
// ENTRY CREATION
// =============================================================================

/// Books one entry and moves the account's materialized balance by its
/// signed amount.
///
/// # Errors
///
/// - `Validation` if the amount is not strictly positive after rounding to `scale`
/// - `NotFound` if the account does not exist
pub fn create_entry(
    txn: &mut dyn LedgerTxn,
    request: NewEntry,
    scale: u32,
) -> LedgerResult<AccountEntry> {
    let amount = Money::positive(request.amount, scale)?;
    let mut account = txn.require_account(&request.account_id)?;

    let (mut snapshot_lead_id, mut snapshot_route_id) =
        (request.snapshot_lead_id, request.snapshot_route_id);
    if snapshot_lead_id.is_none() && snapshot_route_id.is_none() {
        if let Some(ref loan_id) = request.loan_id {
            if let Some(loan) = txn.get_loan(loan_id)? {
                snapshot_lead_id = loan.lead_id;
                snapshot_route_id = loan.route_id;
            }
        }
    }

    let entry = AccountEntry {
        id: EntryId::generate(),
        account_id: request.account_id,
        amount,
        direction: request.direction,
        source_type: request.source_type,
        entry_date: request.entry_date,
        created_at: Utc::now(),
        description: request.description,
        loan_id: request.loan_id,
        loan_payment_id: request.loan_payment_id,
        lead_payment_batch_id: request.lead_payment_batch_id,
        destination_account_id: request.destination_account_id,
        snapshot_lead_id,
        snapshot_route_id,
        reverses_entry_id: None,
    };

    post(txn, &mut account, &entry)?;
    Ok(entry)
}

/// Inserts `entry` and applies its delta to `account` in the same transaction.
fn post(txn: &mut dyn LedgerTxn, account: &mut Account, entry: &AccountEntry) -> LedgerResult<()> {
    txn.insert_entry(entry)?;
    account.balance += entry.signed_amount();
    txn.put_account(account)?;

    tracing::debug!(
        entry_id = %entry.id,
        account_id = %entry.account_id,
        direction = %entry.direction,
        amount = %entry.amount,
        source_type = %entry.source_type,
        balance = %account.balance,
        "Entry posted"
    );
    Ok(())
}

/// Books a `TRANSFER_OUT` debit on the source and a `TRANSFER_IN` credit on
/// the destination.
///
/// # Errors
///
/// - `Validation` if source and destination are the same account or the amount is not positive
/// - `NotFound` if either account does not exist
pub fn create_transfer(
    txn: &mut dyn LedgerTxn,
    request: NewTransfer,
    scale: u32,
) -> LedgerResult<TransferResult> {
    if request.source_account_id == request.destination_account_id {
        return Err(LedgerError::validation(format!(
            "cannot transfer from account '{}' to itself",
            request.source_account_id
        )));
    }
    // Fail on a missing destination before anything is written.
    txn.require_account(&request.destination_account_id)?;

    let mut outgoing = NewEntry::debit(
        request.source_account_id.clone(),
        request.amount,
        SourceType::TransferOut,
        request.entry_date,
    )
    .with_description(request.description.clone())
    .with_destination(request.destination_account_id.clone())
    .with_snapshot(request.snapshot_lead_id.clone(), request.snapshot_route_id.clone());
    outgoing.lead_payment_batch_id = request.lead_payment_batch_id.clone();

    let mut incoming = NewEntry::credit(
        request.destination_account_id.clone(),
        request.amount,
        SourceType::TransferIn,
        request.entry_date,
    )
    .with_description(request.description)
    .with_destination(request.source_account_id.clone())
    .with_snapshot(request.snapshot_lead_id, request.snapshot_route_id);
    incoming.lead_payment_batch_id = request.lead_payment_batch_id;

    let outgoing = create_entry(txn, outgoing, scale)?;
    let incoming = create_entry(txn, incoming, scale)?;

    tracing::info!(
        from = %outgoing.account_id,
        to = %incoming.account_id,
        amount = %outgoing.amount,
        "Transfer booked"
    );

    Ok(TransferResult { outgoing, incoming })
}

/// Books the mirror image of an entry. The original stays untouched.
///
/// # Errors
///
/// - `NotFound` if the entry does not exist
/// - `Validation` if the entry was already reversed
pub fn reverse_entry(
    txn: &mut dyn LedgerTxn,
    entry_id: &EntryId,
    options: ReverseOptions,
) -> LedgerResult<AccountEntry> {
    let original = txn.require_entry(entry_id)?;
    if !txn
        .entries_by_reference(&EntryReference::Reversal(entry_id.clone()))?
        .is_empty()
    {
        return Err(LedgerError::validation(format!(
            "entry '{entry_id}' has already been reversed"
        )));
    }
    let mut account = txn.require_account(&original.account_id)?;

    let description = options.description.unwrap_or_else(|| {
        format!("Reversal of {}: {}", original.id, original.description)
    });
    let reversal = AccountEntry {
        id: EntryId::generate(),
        direction: original.direction.opposite(),
        entry_date: options.entry_date.unwrap_or(original.entry_date),
        created_at: Utc::now(),
        description,
        reverses_entry_id: Some(original.id.clone()),
        ..original
    };

    post(txn, &mut account, &reversal)?;
    tracing::info!(
        original = %entry_id,
        reversal = %reversal.id,
        account_id = %reversal.account_id,
        "Entry reversed"
    );
    Ok(reversal)
}

// =============================================================================
// BULK DELETION
// =============================================================================

/// Hard-deletes every entry carrying `reference` and undoes their balance
/// effect per account.
///
/// Only meant for cancellation flows; corrections go through [`reverse_entry`].
///
/// # Errors
///
/// Returns `NotFound` if a deleted entry's account no longer exists.
pub fn delete_entries_by_reference(
    txn: &mut dyn LedgerTxn,
    reference: &EntryReference,
) -> LedgerResult<DeletionResult> {
    let entries = txn.entries_by_reference(reference)?;
    let mut adjustments: BTreeMap<AccountId, Decimal> = BTreeMap::new();

    for entry in &entries {
        txn.delete_entry(&entry.id)?;
        *adjustments.entry(entry.account_id.clone()).or_default() -= entry.signed_amount();
    }

    for (account_id, delta) in &adjustments {
        let mut account = txn.require_account(account_id)?;
        account.balance += *delta;
        txn.put_account(&account)?;
    }

    if !entries.is_empty() {
        tracing::info!(
            reference = reference.kind(),
            id = reference.id(),
            deleted = entries.len(),
            accounts = adjustments.len(),
            "Entries deleted"
        );
    }

    Ok(DeletionResult {
        deleted_count: entries.len(),
        adjustments,
    })
}

// =============================================================================
// RECONCILIATION
// =============================================================================

/// Signed sum of an account's entries.
///
/// # Errors
///
/// Returns `NotFound` if the account does not exist.
pub fn calculate_balance_from_entries(
    view: &dyn LedgerView,
    account_id: &AccountId,
) -> LedgerResult<Decimal> {
    view.require_account(account_id)?;
    Ok(view
        .entries_for_account(account_id, None)?
        .iter()
        .map(AccountEntry::signed_amount)
        .sum())
}

/// Compares the materialized balance with the entries. Never writes.
///
/// # Errors
///
/// Returns `NotFound` if the account does not exist.
pub fn reconcile_account(
    view: &dyn LedgerView,
    account_id: &AccountId,
) -> LedgerResult<ReconciliationReport> {
    let account = view.require_account(account_id)?;
    let entries = view.entries_for_account(account_id, None)?;
    let calculated_balance: Decimal = entries.iter().map(AccountEntry::signed_amount).sum();
    let difference = account.balance - calculated_balance;

    if !difference.is_zero() {
        tracing::warn!(
            account_id = %account_id,
            stored = %account.balance,
            calculated = %calculated_balance,
            difference = %difference,
            "Balance mismatch"
        );
    }

    Ok(ReconciliationReport {
        account_id: account_id.clone(),
        stored_balance: account.balance,
        calculated_balance,
        difference,
        is_consistent: difference.is_zero(),
        entry_count: entries.len(),
    })
}

/// Reconciles every account.
///
/// # Errors
///
/// Returns an error only on storage failure.
pub fn reconcile_all(view: &dyn LedgerView) -> LedgerResult<Vec<ReconciliationReport>> {
    view.list_accounts(&Default::default())?
        .iter()
        .map(|account| reconcile_account(view, &account.id))
        .collect()
}

/// Makes the entries agree with the stored balance.
///
/// The stored balance is taken as ground truth: a `BALANCE_ADJUSTMENT` entry
/// for the difference is inserted without moving the stored balance again.
///
/// # Errors
///
/// Returns `NotFound` if the account does not exist.
pub fn fix_balance(
    txn: &mut dyn LedgerTxn,
    account_id: &AccountId,
    options: FixOptions,
) -> LedgerResult<FixOutcome> {
    let report = reconcile_account(txn.as_view(), account_id)?;
    if report.is_consistent {
        return Ok(FixOutcome::AlreadyConsistent(report));
    }

    let now = Utc::now();
    let direction = if report.difference > Decimal::ZERO {
        EntryDirection::Credit
    } else {
        EntryDirection::Debit
    };
    let description = options.description.unwrap_or_else(|| {
        format!(
            "Balance adjustment: stored {}, calculated {}",
            report.stored_balance, report.calculated_balance
        )
    });
    let entry = AccountEntry {
        id: EntryId::generate(),
        account_id: account_id.clone(),
        amount: Money::from_abs(report.difference),
        direction,
        source_type: SourceType::BalanceAdjustment,
        entry_date: options.entry_date.unwrap_or(now),
        created_at: now,
        description,
        loan_id: None,
        loan_payment_id: None,
        lead_payment_batch_id: None,
        destination_account_id: None,
        snapshot_lead_id: None,
        snapshot_route_id: None,
        reverses_entry_id: None,
    };
    txn.insert_entry(&entry)?;

    let mut account = txn.require_account(account_id)?;
    account.last_reconciled_at = Some(now);
    txn.put_account(&account)?;

    tracing::info!(
        account_id = %account_id,
        difference = %report.difference,
        entry_id = %entry.id,
        "Balance fixed"
    );
    Ok(FixOutcome::Adjusted { report, entry })
}

// =============================================================================
// ACCOUNTS AND REPORTING
// =============================================================================

/// Creates an account, booking a positive opening balance as `INITIAL_BALANCE`.
///
/// # Errors
///
/// - `Validation` if the id is taken or the opening balance is negative
pub fn open_account(
    txn: &mut dyn LedgerTxn,
    request: NewAccount,
    scale: u32,
) -> LedgerResult<Account> {
    if request.initial_balance < Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "initial balance must not be negative, got {}",
            request.initial_balance
        )));
    }

    let mut account = Account::new(request.name, request.category);
    if let Some(id) = request.id {
        if txn.get_account(&id)?.is_some() {
            return Err(LedgerError::validation(format!(
                "account '{id}' already exists"
            )));
        }
        account.id = id;
    }
    account.route_id = request.route_id;
    txn.put_account(&account)?;

    tracing::info!(
        account_id = %account.id,
        category = %account.category,
        "Account opened"
    );

    if request.initial_balance > Decimal::ZERO {
        let opening = NewEntry::credit(
            account.id.clone(),
            request.initial_balance,
            SourceType::InitialBalance,
            request.opened_at.unwrap_or_else(Utc::now),
        )
        .with_description("Initial balance")
        .with_snapshot(None, account.route_id.clone());
        create_entry(txn, opening, scale)?;
        return Ok(txn.require_account(&account.id)?);
    }
    Ok(account)
}

/// Credits, debits and net per source type for one account over `range`,
/// ordered by source type.
///
/// # Errors
///
/// Returns `NotFound` if the account does not exist.
pub fn source_type_summary(
    view: &dyn LedgerView,
    account_id: &AccountId,
    range: &DateRange,
) -> LedgerResult<Vec<SourceTypeTotals>> {
    view.require_account(account_id)?;
    let mut totals: BTreeMap<SourceType, SourceTypeTotals> = BTreeMap::new();
    for entry in view.entries_for_account(account_id, Some(range))? {
        let row = totals
            .entry(entry.source_type)
            .or_insert_with(|| SourceTypeTotals {
                source_type: entry.source_type,
                credits: Decimal::ZERO,
                debits: Decimal::ZERO,
                net: Decimal::ZERO,
                entry_count: 0,
            });
        match entry.direction {
            EntryDirection::Credit => row.credits += entry.amount.as_decimal(),
            EntryDirection::Debit => row.debits += entry.amount.as_decimal(),
        }
        row.net = row.credits - row.debits;
        row.entry_count += 1;
    }
    Ok(totals.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartera_core::types::{AccountCategory, LoanId, LoanRecord};
    use cartera_storage::{InMemoryStorage, LedgerStore};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn setup() -> InMemoryStorage {
        let storage = InMemoryStorage::new();
        storage
            .write(|txn| -> LedgerResult<()> {
                open_account(
                    txn,
                    NewAccount::new("Bank", AccountCategory::Bank)
                        .with_id("bank")
                        .with_initial_balance(dec!(1000)),
                    2,
                )?;
                open_account(
                    txn,
                    NewAccount::new("Route 1 cash", AccountCategory::EmployeeCashFund)
                        .with_id("cash-r1")
                        .with_route("r1"),
                    2,
                )?;
                Ok(())
            })
            .unwrap();
        storage
    }

    fn day(d: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_entry_rounds_half_up() {
        let storage = setup();
        let entry = storage
            .write(|txn| {
                create_entry(
                    txn,
                    NewEntry::debit("bank", dec!(10.005), SourceType::BankExpense, day(2)),
                    2,
                )
            })
            .unwrap();
        assert_eq!(entry.amount.as_decimal(), dec!(10.01));
    }

    #[test]
    fn test_amount_rounding_to_zero_is_rejected() {
        let storage = setup();
        let err = storage
            .write(|txn| {
                create_entry(
                    txn,
                    NewEntry::debit("bank", dec!(0.004), SourceType::BankExpense, day(2)),
                    2,
                )
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
    }

    #[test]
    fn test_snapshot_filled_from_loan() {
        let storage = setup();
        let loan = LoanRecord::new("loan-1", dec!(500), dec!(500), dec!(700), day(1))
            .with_lead("lead-7", "r1");
        storage.write(|txn| txn.put_loan(&loan)).unwrap();

        let entry = storage
            .write(|txn| {
                create_entry(
                    txn,
                    NewEntry::debit("cash-r1", dec!(500), SourceType::LoanGrant, day(1))
                        .with_loan(LoanId::from("loan-1")),
                    2,
                )
            })
            .unwrap();
        assert_eq!(entry.snapshot_lead_id.as_ref().map(|l| l.as_str()), Some("lead-7"));
        assert_eq!(entry.snapshot_route_id.as_ref().map(|r| r.as_str()), Some("r1"));
    }

    #[test]
    fn test_transfer_to_missing_destination_leaves_nothing() {
        let storage = setup();
        let err = storage
            .write(|txn| {
                create_transfer(txn, NewTransfer::new("bank", "nope", dec!(10), day(3)), 2)
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
        let balance = storage
            .read(|v| v.require_account(&AccountId::from("bank")))
            .unwrap()
            .balance;
        assert_eq!(balance, dec!(1000));
    }

    #[test]
    fn test_double_reversal_rejected() {
        let storage = setup();
        let entry = storage
            .write(|txn| {
                create_entry(
                    txn,
                    NewEntry::debit("bank", dec!(40), SourceType::Gasoline, day(4)),
                    2,
                )
            })
            .unwrap();
        storage
            .write(|txn| reverse_entry(txn, &entry.id, ReverseOptions::default()))
            .unwrap();
        let err = storage
            .write(|txn| reverse_entry(txn, &entry.id, ReverseOptions::default()))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
    }

    #[test]
    fn test_source_type_summary() {
        let storage = setup();
        storage
            .write(|txn| -> LedgerResult<()> {
                create_entry(
                    txn,
                    NewEntry::debit("bank", dec!(40), SourceType::Gasoline, day(4)),
                    2,
                )?;
                create_entry(
                    txn,
                    NewEntry::debit("bank", dec!(60), SourceType::Gasoline, day(5)),
                    2,
                )?;
                Ok(())
            })
            .unwrap();
        let range = DateRange::month(2024, 12).unwrap();
        let rows = storage
            .read(|v| source_type_summary(v, &AccountId::from("bank"), &range))
            .unwrap();
        let gas = rows
            .iter()
            .find(|r| r.source_type == SourceType::Gasoline)
            .unwrap();
        assert_eq!(gas.debits, dec!(100));
        assert_eq!(gas.net, dec!(-100));
        assert_eq!(gas.entry_count, 2);
    }

    #[test]
    fn test_open_account_rejects_duplicate_id() {
        let storage = setup();
        let err = storage
            .write(|txn| open_account(txn, NewAccount::new("Dup", AccountCategory::Bank).with_id("bank"), 2))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
    }
}
