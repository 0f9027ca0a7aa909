//! Bulk business-date migration.
//!
//! Moves loans, payments, lead payment batches and ledger entries booked in a
//! date window onto another day, keeping each record's time of day. Entries
//! follow their parent record so reports that join them stay consistent.
//! Amounts and balances are never touched.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use cartera_core::types::{
    DateRange, EntryId, LeadId, LeadPaymentBatchId, LoanId, LoanRecord, PaymentId, RouteId,
};
use cartera_storage::{AccountEntry, EntryReference, LedgerTxn};

use crate::error::{LedgerError, LedgerResult};

/// Which records to move and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateMigrationRequest {
    /// Window whose records move.
    pub source: DateRange,
    /// Day they move to.
    pub target_date: NaiveDate,
    /// Only records of this route.
    pub route_id: Option<RouteId>,
    /// Only records of this lead.
    pub lead_id: Option<LeadId>,
}

impl DateMigrationRequest {
    /// Moves everything in `source` to `target_date`.
    pub fn new(source: DateRange, target_date: NaiveDate) -> Self {
        Self {
            source,
            target_date,
            route_id: None,
            lead_id: None,
        }
    }

    /// Restricts the migration to one route.
    #[must_use]
    pub fn for_route(mut self, route_id: impl Into<RouteId>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    /// Restricts the migration to one lead.
    #[must_use]
    pub fn for_lead(mut self, lead_id: impl Into<LeadId>) -> Self {
        self.lead_id = Some(lead_id.into());
        self
    }

    fn matches(&self, lead_id: Option<&LeadId>, route_id: Option<&RouteId>) -> bool {
        let lead_ok = self.lead_id.as_ref().map_or(true, |l| lead_id == Some(l));
        let route_ok = self.route_id.as_ref().map_or(true, |r| route_id == Some(r));
        lead_ok && route_ok
    }

    fn shift(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        self.target_date.and_time(instant.time()).and_utc()
    }
}

/// Records moved, per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateMigrationSummary {
    /// Loans whose sign date moved.
    pub loans_moved: usize,
    /// Payments whose received date moved.
    pub payments_moved: usize,
    /// Lead payment batches whose date moved.
    pub batches_moved: usize,
    /// Ledger entries whose entry date moved.
    pub entries_moved: usize,
}

/// A parent record that moved, and the day it moved from.
struct MovedParent {
    reference: EntryReference,
    old_day: NaiveDate,
}

/// Moves every matching record in the source window to the target day.
///
/// An entry that references a stored loan, payment or batch moves if and
/// only if that parent moved, and only when it was booked on the parent's
/// original day. Entries without a stored parent are selected by their own
/// lead/route snapshot.
///
/// # Errors
///
/// Returns `Validation` for an inverted source window.
pub fn migrate_dates(
    txn: &mut dyn LedgerTxn,
    request: &DateMigrationRequest,
) -> LedgerResult<DateMigrationSummary> {
    let range = &request.source;
    if range.start > range.end {
        return Err(LedgerError::validation(format!(
            "source range is inverted: {range}"
        )));
    }

    let mut summary = DateMigrationSummary::default();
    let mut parents = Vec::new();

    let loans = txn.list_loans()?;
    let payments = txn.list_payments()?;
    let batches = txn.list_lead_payment_batches()?;
    let loans_by_id: BTreeMap<&LoanId, &LoanRecord> =
        loans.iter().map(|l| (&l.id, l)).collect();
    let payment_ids: BTreeSet<&PaymentId> = payments.iter().map(|p| &p.id).collect();
    let batch_ids: BTreeSet<&LeadPaymentBatchId> = batches.iter().map(|b| &b.id).collect();
    let has_stored_parent = |e: &AccountEntry| {
        e.loan_id.as_ref().map_or(false, |id| loans_by_id.contains_key(id))
            || e.loan_payment_id.as_ref().map_or(false, |id| payment_ids.contains(id))
            || e.lead_payment_batch_id.as_ref().map_or(false, |id| batch_ids.contains(id))
    };

    // Loans
    for mut loan in loans.iter().cloned() {
        if !range.contains(loan.sign_date)
            || !request.matches(loan.lead_id.as_ref(), loan.route_id.as_ref())
        {
            continue;
        }
        parents.push(MovedParent {
            reference: EntryReference::Loan(loan.id.clone()),
            old_day: loan.sign_date.date_naive(),
        });
        loan.sign_date = request.shift(loan.sign_date);
        txn.put_loan(&loan)?;
        summary.loans_moved += 1;
    }

    // Payments are filtered through their loan's lead and route.
    for mut payment in payments.iter().cloned() {
        if !range.contains(payment.received_at) {
            continue;
        }
        let loan = loans_by_id.get(&payment.loan_id).copied();
        if !request.matches(
            loan.and_then(|l| l.lead_id.as_ref()),
            loan.and_then(|l| l.route_id.as_ref()),
        ) {
            continue;
        }
        parents.push(MovedParent {
            reference: EntryReference::LoanPayment(payment.id.clone()),
            old_day: payment.received_at.date_naive(),
        });
        payment.received_at = request.shift(payment.received_at);
        txn.put_payment(&payment)?;
        summary.payments_moved += 1;
    }

    // Lead payment batches
    for mut batch in batches.iter().cloned() {
        if !range.contains(batch.date)
            || !request.matches(Some(&batch.lead_id), batch.route_id.as_ref())
        {
            continue;
        }
        parents.push(MovedParent {
            reference: EntryReference::LeadPaymentBatch(batch.id.clone()),
            old_day: batch.date.date_naive(),
        });
        batch.date = request.shift(batch.date);
        txn.put_lead_payment_batch(&batch)?;
        summary.batches_moved += 1;
    }

    // Entries: parentless ones selected by snapshot, then those following a
    // moved parent.
    let mut moved: BTreeSet<EntryId> = BTreeSet::new();
    let direct: Vec<AccountEntry> = txn
        .entries_in_range(range)?
        .into_iter()
        .filter(|e| {
            !has_stored_parent(e)
                && request.matches(e.snapshot_lead_id.as_ref(), e.snapshot_route_id.as_ref())
        })
        .collect();
    for entry in direct {
        txn.reschedule_entry(&entry.id, request.shift(entry.entry_date))?;
        moved.insert(entry.id);
    }

    for parent in &parents {
        for entry in txn.entries_by_reference(&parent.reference)? {
            if moved.contains(&entry.id) || entry.entry_date.date_naive() != parent.old_day {
                continue;
            }
            txn.reschedule_entry(&entry.id, request.shift(entry.entry_date))?;
            moved.insert(entry.id);
        }
    }
    summary.entries_moved = moved.len();

    tracing::info!(
        source = %range,
        target = %request.target_date,
        loans = summary.loans_moved,
        payments = summary.payments_moved,
        batches = summary.batches_moved,
        entries = summary.entries_moved,
        "Dates migrated"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_shift_keeps_time_of_day() {
        let request = DateMigrationRequest::new(
            DateRange::day(NaiveDate::from_ymd_opt(2024, 12, 10).unwrap()),
            NaiveDate::from_ymd_opt(2024, 12, 12).unwrap(),
        );
        let original = Utc.with_ymd_and_hms(2024, 12, 10, 17, 45, 3).unwrap();
        assert_eq!(
            request.shift(original),
            Utc.with_ymd_and_hms(2024, 12, 12, 17, 45, 3).unwrap()
        );
    }

    #[test]
    fn test_filter_matching() {
        let request = DateMigrationRequest::new(
            DateRange::day(NaiveDate::from_ymd_opt(2024, 12, 10).unwrap()),
            NaiveDate::from_ymd_opt(2024, 12, 12).unwrap(),
        )
        .for_route("r1");
        let r1 = RouteId::from("r1");
        let r2 = RouteId::from("r2");
        assert!(request.matches(None, Some(&r1)));
        assert!(!request.matches(None, Some(&r2)));
        assert!(!request.matches(None, None));

        let unfiltered = DateMigrationRequest::new(request.source, request.target_date);
        assert!(unfiltered.matches(None, None));
    }
}
