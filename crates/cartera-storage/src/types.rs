//! Ledger persistence types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cartera_core::types::{
    AccountCategory, AccountId, EntryDirection, EntryId, LeadId, LeadPaymentBatchId, LoanId,
    Money, PaymentId, RouteId, SourceType,
};

// =============================================================================
// ACCOUNT
// =============================================================================

/// A named money pool.
///
/// `balance` is a cache of the signed sum of the account's entries. Only the
/// ledger engine writes it, always in the same transaction as the entry that
/// moves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Kind of money pool.
    pub category: AccountCategory,
    /// Route owning the account, for route-scoped pools.
    pub route_id: Option<RouteId>,
    /// Materialized balance.
    pub balance: Decimal,
    /// Last time the balance was checked against the entries and fixed.
    pub last_reconciled_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Creates an account with a generated id and zero balance.
    pub fn new(name: impl Into<String>, category: AccountCategory) -> Self {
        Self {
            id: AccountId::generate(),
            name: name.into(),
            category,
            route_id: None,
            balance: Decimal::ZERO,
            last_reconciled_at: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<AccountId>) -> Self {
        self.id = id.into();
        self
    }

    /// Scopes the account to a route.
    #[must_use]
    pub fn with_route(mut self, route_id: impl Into<RouteId>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }
}

/// Filter for account listings.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Only accounts of this category.
    pub category: Option<AccountCategory>,
    /// Only accounts scoped to this route.
    pub route_id: Option<RouteId>,
}

impl AccountFilter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the category filter.
    #[must_use]
    pub fn category(mut self, category: AccountCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the route filter.
    #[must_use]
    pub fn route(mut self, route_id: impl Into<RouteId>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    /// Returns true if `account` passes the filter.
    pub fn matches(&self, account: &Account) -> bool {
        if let Some(category) = self.category {
            if account.category != category {
                return false;
            }
        }
        if let Some(ref route_id) = self.route_id {
            if account.route_id.as_ref() != Some(route_id) {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// ACCOUNT ENTRY
// =============================================================================

/// An immutable ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountEntry {
    /// Entry identifier.
    pub id: EntryId,
    /// Account the entry belongs to.
    pub account_id: AccountId,
    /// Unsigned amount.
    pub amount: Money,
    /// Credit increases the account, debit decreases it.
    pub direction: EntryDirection,
    /// Why the money moved.
    pub source_type: SourceType,
    /// Business date.
    pub entry_date: DateTime<Utc>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Free text.
    pub description: String,
    /// Loan the movement belongs to.
    pub loan_id: Option<LoanId>,
    /// Installment the movement belongs to.
    pub loan_payment_id: Option<PaymentId>,
    /// Daily hand-in the movement belongs to.
    pub lead_payment_batch_id: Option<LeadPaymentBatchId>,
    /// Other side of a transfer.
    pub destination_account_id: Option<AccountId>,
    /// Lead in effect when the entry was booked.
    pub snapshot_lead_id: Option<LeadId>,
    /// Route in effect when the entry was booked.
    pub snapshot_route_id: Option<RouteId>,
    /// Entry this one reverses.
    pub reverses_entry_id: Option<EntryId>,
}

impl AccountEntry {
    /// Balance delta this entry produced on its account.
    pub fn signed_amount(&self) -> Decimal {
        self.amount.signed(self.direction)
    }

    /// Every reference this entry can be looked up by.
    pub fn references(&self) -> Vec<EntryReference> {
        let mut refs = Vec::new();
        if let Some(ref id) = self.loan_id {
            refs.push(EntryReference::Loan(id.clone()));
        }
        if let Some(ref id) = self.loan_payment_id {
            refs.push(EntryReference::LoanPayment(id.clone()));
        }
        if let Some(ref id) = self.lead_payment_batch_id {
            refs.push(EntryReference::LeadPaymentBatch(id.clone()));
        }
        if let Some(ref id) = self.reverses_entry_id {
            refs.push(EntryReference::Reversal(id.clone()));
        }
        refs
    }

    /// Returns true if this entry carries `reference`.
    pub fn has_reference(&self, reference: &EntryReference) -> bool {
        match reference {
            EntryReference::Loan(id) => self.loan_id.as_ref() == Some(id),
            EntryReference::LoanPayment(id) => self.loan_payment_id.as_ref() == Some(id),
            EntryReference::LeadPaymentBatch(id) => {
                self.lead_payment_batch_id.as_ref() == Some(id)
            }
            EntryReference::Reversal(id) => self.reverses_entry_id.as_ref() == Some(id),
        }
    }
}

/// A foreign reference entries can be looked up by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryReference {
    /// Entries of a loan.
    Loan(LoanId),
    /// Entries of an installment.
    LoanPayment(PaymentId),
    /// Entries of a daily hand-in.
    LeadPaymentBatch(LeadPaymentBatchId),
    /// Reversals of an entry.
    Reversal(EntryId),
}

impl EntryReference {
    /// Short label used in logs and index keys.
    pub fn kind(&self) -> &'static str {
        match self {
            EntryReference::Loan(_) => "loan",
            EntryReference::LoanPayment(_) => "payment",
            EntryReference::LeadPaymentBatch(_) => "batch",
            EntryReference::Reversal(_) => "reversal",
        }
    }

    /// Referenced identifier.
    pub fn id(&self) -> &str {
        match self {
            EntryReference::Loan(id) => id.as_str(),
            EntryReference::LoanPayment(id) => id.as_str(),
            EntryReference::LeadPaymentBatch(id) => id.as_str(),
            EntryReference::Reversal(id) => id.as_str(),
        }
    }
}

/// Orders entries by business date, then by id.
pub(crate) fn sort_entries(entries: &mut [AccountEntry]) {
    entries.sort_by(|a, b| {
        a.entry_date
            .cmp(&b.entry_date)
            .then_with(|| a.id.cmp(&b.id))
    });
}
