//! Loan, payment and lead payment batch records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{LeadId, LeadPaymentBatchId, LoanId, PaymentId, PaymentMethod, RouteId};

/// A credit contract as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    /// Loan identifier.
    pub id: LoanId,
    /// Lead currently responsible for the loan.
    pub lead_id: Option<LeadId>,
    /// Route the loan belongs to.
    pub route_id: Option<RouteId>,
    /// Amount the borrower asked for.
    pub requested_amount: Decimal,
    /// Amount actually handed over (less than requested when prior debt was deducted).
    pub amount_gived: Decimal,
    /// Total debt the borrower took on, interest included.
    pub total_debt_acquired: Decimal,
    /// Expected weekly installment.
    pub expected_weekly_payment: Decimal,
    /// Running total paid.
    pub total_paid: Decimal,
    /// Running pending balance.
    pub pending_amount: Decimal,
    /// Date the contract was signed.
    pub sign_date: DateTime<Utc>,
    /// Date the loan was fully paid or closed.
    pub finished_date: Option<DateTime<Utc>>,
    /// Legacy marker set when a later loan renewed this one.
    pub renewed_date: Option<DateTime<Utc>>,
    /// Date the loan was written off.
    pub bad_debt_date: Option<DateTime<Utc>>,
    /// Portfolio cleanup batch that excluded this loan.
    pub excluded_by_cleanup: Option<String>,
    /// Loan this one renewed.
    pub previous_loan: Option<LoanId>,
}

impl LoanRecord {
    /// Creates a loan with no payments, fully pending.
    pub fn new(
        id: impl Into<LoanId>,
        requested_amount: Decimal,
        amount_gived: Decimal,
        total_debt_acquired: Decimal,
        sign_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            lead_id: None,
            route_id: None,
            requested_amount,
            amount_gived,
            total_debt_acquired,
            expected_weekly_payment: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            pending_amount: total_debt_acquired,
            sign_date,
            finished_date: None,
            renewed_date: None,
            bad_debt_date: None,
            excluded_by_cleanup: None,
            previous_loan: None,
        }
    }

    /// Sets the responsible lead and route.
    #[must_use]
    pub fn with_lead(mut self, lead_id: impl Into<LeadId>, route_id: impl Into<RouteId>) -> Self {
        self.lead_id = Some(lead_id.into());
        self.route_id = Some(route_id.into());
        self
    }

    /// Links the loan this one renews.
    #[must_use]
    pub fn with_previous_loan(mut self, previous: impl Into<LoanId>) -> Self {
        self.previous_loan = Some(previous.into());
        self
    }
}

/// A received installment as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Payment identifier.
    pub id: PaymentId,
    /// Loan the installment was paid against.
    pub loan_id: LoanId,
    /// Amount received.
    pub amount: Decimal,
    /// Lead commission earned on this installment.
    pub commission: Decimal,
    /// Cash or bank.
    pub method: PaymentMethod,
    /// When the money was received.
    pub received_at: DateTime<Utc>,
    /// Daily hand-in this payment was part of.
    pub lead_payment_batch_id: Option<LeadPaymentBatchId>,
}

/// One lead's daily hand-in of collected installments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPaymentBatchRecord {
    /// Batch identifier.
    pub id: LeadPaymentBatchId,
    /// Lead who handed in the money.
    pub lead_id: LeadId,
    /// Route of the lead.
    pub route_id: Option<RouteId>,
    /// Business date of the hand-in.
    pub date: DateTime<Utc>,
    /// Sum of installments due.
    pub expected_amount: Decimal,
    /// Sum of installments collected.
    pub paid_amount: Decimal,
    /// Portion collected in cash.
    pub cash_amount: Decimal,
    /// Portion deposited to the bank.
    pub bank_amount: Decimal,
}
