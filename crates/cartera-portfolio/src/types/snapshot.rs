//! Loan and payment projections the classifier works on.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cartera_core::types::{LoanId, LoanRecord, PaymentId, PaymentRecord};

/// Payments grouped by the loan they were paid against.
pub type PaymentsByLoan = HashMap<LoanId, Vec<PaymentSnapshot>>;

/// The slice of a loan the classifier needs.
///
/// `was_renewed`, when present, is authoritative over `renewed_date`. It is
/// filled by [`annotate_renewals`](crate::annotate_renewals) or upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSnapshot {
    /// Loan identifier.
    pub id: LoanId,
    /// Remaining debt.
    pub pending_amount: Decimal,
    /// Date the contract was signed.
    pub sign_date: DateTime<Utc>,
    /// Date the loan was paid off or closed.
    #[serde(default)]
    pub finished_date: Option<DateTime<Utc>>,
    /// Legacy renewal marker.
    #[serde(default)]
    pub renewed_date: Option<DateTime<Utc>>,
    /// Write-off date.
    #[serde(default)]
    pub bad_debt_date: Option<DateTime<Utc>>,
    /// Cleanup batch that excluded the loan.
    #[serde(default)]
    pub excluded_by_cleanup: Option<String>,
    /// Loan this one renewed.
    #[serde(default)]
    pub previous_loan: Option<LoanId>,
    /// Whether a later loan renewed this one.
    #[serde(default)]
    pub was_renewed: Option<bool>,
    /// Amount the borrower asked for.
    #[serde(default)]
    pub requested_amount: Option<Decimal>,
    /// Amount handed over.
    #[serde(default)]
    pub amount_gived: Option<Decimal>,
}

impl LoanSnapshot {
    /// A live loan with no history and no amounts.
    pub fn new(id: impl Into<LoanId>, pending_amount: Decimal, sign_date: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            pending_amount,
            sign_date,
            finished_date: None,
            renewed_date: None,
            bad_debt_date: None,
            excluded_by_cleanup: None,
            previous_loan: None,
            was_renewed: None,
            requested_amount: None,
            amount_gived: None,
        }
    }

    /// Sets the predecessor.
    #[must_use]
    pub fn with_previous_loan(mut self, previous: impl Into<LoanId>) -> Self {
        self.previous_loan = Some(previous.into());
        self
    }

    /// Sets requested and disbursed amounts.
    #[must_use]
    pub fn with_amounts(mut self, requested: Decimal, gived: Decimal) -> Self {
        self.requested_amount = Some(requested);
        self.amount_gived = Some(gived);
        self
    }

    /// Marks the loan finished.
    #[must_use]
    pub fn finished_on(mut self, date: DateTime<Utc>) -> Self {
        self.finished_date = Some(date);
        self
    }

    /// Sets the explicit renewal flag.
    #[must_use]
    pub fn with_was_renewed(mut self, renewed: bool) -> Self {
        self.was_renewed = Some(renewed);
        self
    }
}

impl From<&LoanRecord> for LoanSnapshot {
    fn from(loan: &LoanRecord) -> Self {
        Self {
            id: loan.id.clone(),
            pending_amount: loan.pending_amount,
            sign_date: loan.sign_date,
            finished_date: loan.finished_date,
            renewed_date: loan.renewed_date,
            bad_debt_date: loan.bad_debt_date,
            excluded_by_cleanup: loan.excluded_by_cleanup.clone(),
            previous_loan: loan.previous_loan.clone(),
            was_renewed: None,
            requested_amount: Some(loan.requested_amount),
            amount_gived: Some(loan.amount_gived),
        }
    }
}

/// A received installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSnapshot {
    /// Payment identifier.
    pub id: PaymentId,
    /// When the money was received.
    pub received_at: DateTime<Utc>,
    /// Amount received.
    pub amount: Decimal,
}

impl PaymentSnapshot {
    /// Creates a payment snapshot.
    pub fn new(id: impl Into<PaymentId>, received_at: DateTime<Utc>, amount: Decimal) -> Self {
        Self {
            id: id.into(),
            received_at,
            amount,
        }
    }
}

impl From<&PaymentRecord> for PaymentSnapshot {
    fn from(payment: &PaymentRecord) -> Self {
        Self {
            id: payment.id.clone(),
            received_at: payment.received_at,
            amount: payment.amount,
        }
    }
}

/// Groups stored payments by loan.
pub fn group_payments<'a>(payments: impl IntoIterator<Item = &'a PaymentRecord>) -> PaymentsByLoan {
    let mut grouped = PaymentsByLoan::new();
    for payment in payments {
        grouped
            .entry(payment.loan_id.clone())
            .or_default()
            .push(PaymentSnapshot::from(payment));
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartera_core::types::PaymentMethod;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_record_carries_amounts() {
        let sign = Utc.with_ymd_and_hms(2024, 12, 10, 9, 0, 0).unwrap();
        let record = LoanRecord::new("l2", dec!(3000), dec!(900), dec!(4200), sign)
            .with_previous_loan("l1");
        let snapshot = LoanSnapshot::from(&record);

        assert_eq!(snapshot.requested_amount, Some(dec!(3000)));
        assert_eq!(snapshot.amount_gived, Some(dec!(900)));
        assert_eq!(snapshot.pending_amount, dec!(4200));
        assert_eq!(snapshot.previous_loan, Some(LoanId::from("l1")));
        assert!(snapshot.was_renewed.is_none());
    }

    #[test]
    fn test_group_payments() {
        let at = Utc.with_ymd_and_hms(2024, 12, 10, 9, 0, 0).unwrap();
        let payment = |id: &str, loan: &str| PaymentRecord {
            id: PaymentId::from(id),
            loan_id: LoanId::from(loan),
            amount: dec!(300),
            commission: dec!(0),
            method: PaymentMethod::Cash,
            received_at: at,
            lead_payment_batch_id: None,
        };
        let records = vec![payment("p1", "a"), payment("p2", "b"), payment("p3", "a")];
        let grouped = group_payments(&records);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&LoanId::from("a")].len(), 2);
    }

    #[test]
    fn test_deserialize_minimal_loan() {
        let json = r#"{"id":"l1","pendingAmount":"1200","signDate":"2024-12-10T09:00:00Z"}"#;
        let loan: LoanSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(loan.pending_amount, dec!(1200));
        assert!(loan.previous_loan.is_none());
    }
}
