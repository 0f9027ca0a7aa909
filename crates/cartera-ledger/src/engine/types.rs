//! Request and result types of the ledger engine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cartera_core::types::{
    AccountCategory, AccountId, EntryDirection, LeadId, LeadPaymentBatchId, LoanId, PaymentId,
    RouteId, SourceType,
};
use cartera_storage::AccountEntry;

// =============================================================================
// ENTRIES
// =============================================================================

/// A single ledger line to book.
///
/// # Example
///
/// ```rust
/// use cartera_ledger::NewEntry;
/// use cartera_core::types::{EntryDirection, SourceType};
/// use chrono::Utc;
/// use rust_decimal_macros::dec;
///
/// let entry = NewEntry::credit("cash-r1", dec!(300), SourceType::LoanPaymentCash, Utc::now())
///     .with_loan("loan-9")
///     .with_loan_payment("pay-42")
///     .with_description("Weekly installment");
/// assert_eq!(entry.direction, EntryDirection::Credit);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    /// Account to book against.
    pub account_id: AccountId,
    /// Credit or debit.
    pub direction: EntryDirection,
    /// Amount; must be strictly positive after rounding.
    pub amount: Decimal,
    /// Why the money moved.
    pub source_type: SourceType,
    /// Business date.
    pub entry_date: DateTime<Utc>,
    /// Free text.
    pub description: String,
    /// Loan reference.
    pub loan_id: Option<LoanId>,
    /// Installment reference.
    pub loan_payment_id: Option<PaymentId>,
    /// Daily hand-in reference.
    pub lead_payment_batch_id: Option<LeadPaymentBatchId>,
    /// Other side of a transfer.
    pub destination_account_id: Option<AccountId>,
    /// Lead in effect at booking time.
    pub snapshot_lead_id: Option<LeadId>,
    /// Route in effect at booking time.
    pub snapshot_route_id: Option<RouteId>,
}

impl NewEntry {
    /// Creates an entry request with no references.
    pub fn new(
        account_id: impl Into<AccountId>,
        direction: EntryDirection,
        amount: Decimal,
        source_type: SourceType,
        entry_date: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            direction,
            amount,
            source_type,
            entry_date,
            description: String::new(),
            loan_id: None,
            loan_payment_id: None,
            lead_payment_batch_id: None,
            destination_account_id: None,
            snapshot_lead_id: None,
            snapshot_route_id: None,
        }
    }

    /// A credit (balance increase).
    pub fn credit(
        account_id: impl Into<AccountId>,
        amount: Decimal,
        source_type: SourceType,
        entry_date: DateTime<Utc>,
    ) -> Self {
        Self::new(account_id, EntryDirection::Credit, amount, source_type, entry_date)
    }

    /// A debit (balance decrease).
    pub fn debit(
        account_id: impl Into<AccountId>,
        amount: Decimal,
        source_type: SourceType,
        entry_date: DateTime<Utc>,
    ) -> Self {
        Self::new(account_id, EntryDirection::Debit, amount, source_type, entry_date)
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// References a loan.
    #[must_use]
    pub fn with_loan(mut self, loan_id: impl Into<LoanId>) -> Self {
        self.loan_id = Some(loan_id.into());
        self
    }

    /// References an installment.
    #[must_use]
    pub fn with_loan_payment(mut self, payment_id: impl Into<PaymentId>) -> Self {
        self.loan_payment_id = Some(payment_id.into());
        self
    }

    /// References a daily hand-in.
    #[must_use]
    pub fn with_lead_payment_batch(mut self, batch_id: impl Into<LeadPaymentBatchId>) -> Self {
        self.lead_payment_batch_id = Some(batch_id.into());
        self
    }

    /// Sets the other side of a transfer.
    #[must_use]
    pub fn with_destination(mut self, account_id: impl Into<AccountId>) -> Self {
        self.destination_account_id = Some(account_id.into());
        self
    }

    /// Freezes the lead and route in effect.
    #[must_use]
    pub fn with_snapshot(mut self, lead_id: Option<LeadId>, route_id: Option<RouteId>) -> Self {
        self.snapshot_lead_id = lead_id;
        self.snapshot_route_id = route_id;
        self
    }
}

// =============================================================================
// TRANSFERS
// =============================================================================

/// Money moved between two accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransfer {
    /// Account debited.
    pub source_account_id: AccountId,
    /// Account credited.
    pub destination_account_id: AccountId,
    /// Amount moved.
    pub amount: Decimal,
    /// Business date of both entries.
    pub entry_date: DateTime<Utc>,
    /// Description of both entries.
    pub description: String,
    /// Daily hand-in the transfer settles.
    pub lead_payment_batch_id: Option<LeadPaymentBatchId>,
    /// Lead in effect.
    pub snapshot_lead_id: Option<LeadId>,
    /// Route in effect.
    pub snapshot_route_id: Option<RouteId>,
}

impl NewTransfer {
    /// Creates a transfer request.
    pub fn new(
        source_account_id: impl Into<AccountId>,
        destination_account_id: impl Into<AccountId>,
        amount: Decimal,
        entry_date: DateTime<Utc>,
    ) -> Self {
        Self {
            source_account_id: source_account_id.into(),
            destination_account_id: destination_account_id.into(),
            amount,
            entry_date,
            description: String::new(),
            lead_payment_batch_id: None,
            snapshot_lead_id: None,
            snapshot_route_id: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// References a daily hand-in.
    #[must_use]
    pub fn with_lead_payment_batch(mut self, batch_id: impl Into<LeadPaymentBatchId>) -> Self {
        self.lead_payment_batch_id = Some(batch_id.into());
        self
    }

    /// Freezes the lead and route in effect.
    #[must_use]
    pub fn with_snapshot(mut self, lead_id: Option<LeadId>, route_id: Option<RouteId>) -> Self {
        self.snapshot_lead_id = lead_id;
        self.snapshot_route_id = route_id;
        self
    }
}

/// The two halves of a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    /// `TRANSFER_OUT` debit on the source.
    pub outgoing: AccountEntry,
    /// `TRANSFER_IN` credit on the destination.
    pub incoming: AccountEntry,
}

impl TransferResult {
    /// Amount moved.
    pub fn amount(&self) -> Decimal {
        self.outgoing.amount.as_decimal()
    }
}

// =============================================================================
// REVERSAL, DELETION, RECONCILIATION
// =============================================================================

/// Overrides for a reversal entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseOptions {
    /// Business date; defaults to the original entry's.
    pub entry_date: Option<DateTime<Utc>>,
    /// Description; defaults to "Reversal of <id>: <original>".
    pub description: Option<String>,
}

/// Outcome of a bulk deletion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionResult {
    /// Entries removed.
    pub deleted_count: usize,
    /// Signed delta applied to each touched account.
    pub adjustments: BTreeMap<AccountId, Decimal>,
}

/// Stored balance checked against the entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    /// Account checked.
    pub account_id: AccountId,
    /// Materialized balance.
    pub stored_balance: Decimal,
    /// Signed sum of the entries.
    pub calculated_balance: Decimal,
    /// `stored_balance - calculated_balance`.
    pub difference: Decimal,
    /// True when the difference is zero.
    pub is_consistent: bool,
    /// Entries summed.
    pub entry_count: usize,
}

/// Overrides for a balance adjustment entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixOptions {
    /// Business date; defaults to now.
    pub entry_date: Option<DateTime<Utc>>,
    /// Description; defaults to a generated one.
    pub description: Option<String>,
}

/// Result of [`fix_balance`](crate::Ledger::fix_balance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum FixOutcome {
    /// Nothing to do.
    AlreadyConsistent(ReconciliationReport),
    /// An adjustment entry was booked.
    Adjusted {
        /// State before the fix.
        report: ReconciliationReport,
        /// The `BALANCE_ADJUSTMENT` entry.
        entry: AccountEntry,
    },
}

impl FixOutcome {
    /// The pre-fix report.
    pub fn report(&self) -> &ReconciliationReport {
        match self {
            FixOutcome::AlreadyConsistent(report) => report,
            FixOutcome::Adjusted { report, .. } => report,
        }
    }

    /// True when an entry was booked.
    pub fn is_adjusted(&self) -> bool {
        matches!(self, FixOutcome::Adjusted { .. })
    }
}

// =============================================================================
// ACCOUNTS AND REPORTING
// =============================================================================

/// An account to open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    /// Explicit id; generated when absent.
    pub id: Option<AccountId>,
    /// Display name.
    pub name: String,
    /// Kind of money pool.
    pub category: AccountCategory,
    /// Owning route.
    pub route_id: Option<RouteId>,
    /// Opening balance, booked as `INITIAL_BALANCE` when positive.
    pub initial_balance: Decimal,
    /// Business date of the opening entry; defaults to now.
    pub opened_at: Option<DateTime<Utc>>,
}

impl NewAccount {
    /// Creates an account request with a zero opening balance.
    pub fn new(name: impl Into<String>, category: AccountCategory) -> Self {
        Self {
            id: None,
            name: name.into(),
            category,
            route_id: None,
            initial_balance: Decimal::ZERO,
            opened_at: None,
        }
    }

    /// Sets an explicit id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<AccountId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Scopes the account to a route.
    #[must_use]
    pub fn with_route(mut self, route_id: impl Into<RouteId>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    /// Sets the opening balance.
    #[must_use]
    pub fn with_initial_balance(mut self, amount: Decimal) -> Self {
        self.initial_balance = amount;
        self
    }

    /// Sets the business date of the opening entry.
    #[must_use]
    pub fn opened_at(mut self, at: DateTime<Utc>) -> Self {
        self.opened_at = Some(at);
        self
    }
}

/// Totals of one source type over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceTypeTotals {
    /// Category summed.
    pub source_type: SourceType,
    /// Sum of credits.
    pub credits: Decimal,
    /// Sum of debits.
    pub debits: Decimal,
    /// `credits - debits`.
    pub net: Decimal,
    /// Entries summed.
    pub entry_count: usize,
}
