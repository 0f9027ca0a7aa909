//! Cartera vencida (delinquency) evaluation.
//!
//! A loan is evaluated one Monday-to-Sunday week at a time. It is delinquent
//! for a week when it is active, was signed before the week started and got no
//! payment in it. The week a loan is signed is a grace week.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use cartera_core::types::WeekRange;

use crate::parallel::maybe_parallel_fold;
use crate::types::{
    ClassifierConfig, ClientStatusCounts, CvState, CvStatus, ExclusionReason, LoanSnapshot,
    PaymentSnapshot, PaymentsByLoan,
};

/// Payments needed in one week to leave cartera vencida.
pub const CV_EXIT_PAYMENTS: usize = 2;

/// Pending debt, not written off, not removed by a cleanup.
pub fn is_active_loan(loan: &LoanSnapshot) -> bool {
    loan.pending_amount > Decimal::ZERO
        && loan.bad_debt_date.is_none()
        && loan.excluded_by_cleanup.is_none()
}

/// Payments received within `week`, both ends inclusive.
pub fn count_payments_in_week(payments: &[PaymentSnapshot], week: &WeekRange) -> usize {
    payments
        .iter()
        .filter(|p| week.contains(p.received_at))
        .count()
}

/// Whether `loan` is in cartera vencida for `week`.
///
/// A loan signed during `week` is never delinquent for it.
pub fn is_in_cartera_vencida(loan: &LoanSnapshot, payments_in_week: usize, week: &WeekRange) -> bool {
    is_active_loan(loan) && loan.sign_date < week.start && payments_in_week == 0
}

/// No payment in the previous week and at least two in the current one.
///
/// A single catch-up payment does not count as leaving.
pub fn exited_cartera_vencida(
    payments: &[PaymentSnapshot],
    previous_week: &WeekRange,
    current_week: &WeekRange,
) -> bool {
    count_payments_in_week(payments, previous_week) == 0
        && count_payments_in_week(payments, current_week) >= CV_EXIT_PAYMENTS
}

/// Labels a loan for `current_week`.
///
/// Exclusions are checked in order: bad debt, cleanup, not active.
///
/// # Example
///
/// ```rust
/// use cartera_core::types::WeekRange;
/// use cartera_portfolio::{calculate_cv_status, CvState, LoanSnapshot};
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use rust_decimal_macros::dec;
///
/// let loan = LoanSnapshot::new("l1", dec!(1500), Utc.with_ymd_and_hms(2024, 11, 4, 9, 0, 0).unwrap());
/// let week = WeekRange::for_date(NaiveDate::from_ymd_opt(2024, 12, 11).unwrap());
///
/// let status = calculate_cv_status(&loan, &[], &week, &week.previous());
/// assert_eq!(status.status, CvState::EnCv);
/// assert_eq!(status.payments_in_week, 0);
/// ```
pub fn calculate_cv_status(
    loan: &LoanSnapshot,
    payments: &[PaymentSnapshot],
    current_week: &WeekRange,
    previous_week: &WeekRange,
) -> CvStatus {
    let payments_in_week = count_payments_in_week(payments, current_week);

    let exclusion = if loan.bad_debt_date.is_some() {
        Some(ExclusionReason::BadDebt)
    } else if loan.excluded_by_cleanup.is_some() {
        Some(ExclusionReason::Cleanup)
    } else if !is_active_loan(loan) {
        Some(ExclusionReason::NotActive)
    } else {
        None
    };
    if let Some(reason) = exclusion {
        return CvStatus {
            status: CvState::Excluido { reason },
            exited_cv_this_week: false,
            payments_in_week,
        };
    }

    if is_in_cartera_vencida(loan, payments_in_week, current_week) {
        return CvStatus {
            status: CvState::EnCv,
            exited_cv_this_week: false,
            payments_in_week,
        };
    }

    CvStatus {
        status: CvState::AlCorriente,
        exited_cv_this_week: exited_cartera_vencida(payments, previous_week, current_week),
        payments_in_week,
    }
}

/// Delinquency counts for `week` as of a reference date.
///
/// The reference date is the end of `week` for historical evaluation and
/// `now` otherwise. Loans signed and payments received after it are ignored.
pub fn count_clients_status(
    loans: &[LoanSnapshot],
    payments_by_loan: &PaymentsByLoan,
    week: &WeekRange,
    is_historical: bool,
    now: DateTime<Utc>,
    config: &ClassifierConfig,
) -> ClientStatusCounts {
    let reference = if is_historical { week.end } else { now };
    let previous_week = week.previous();

    maybe_parallel_fold(
        loans,
        config,
        ClientStatusCounts::default(),
        |counts, loan| {
            if loan.sign_date > reference {
                return counts;
            }
            let payments: Vec<PaymentSnapshot> = payments_by_loan
                .get(&loan.id)
                .map(|all| {
                    all.iter()
                        .filter(|p| p.received_at <= reference)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            counts.record(&calculate_cv_status(loan, &payments, week, &previous_week))
        },
        |a, b| a + b,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0).unwrap()
    }

    fn week_of(month: u32, day: u32) -> WeekRange {
        WeekRange::for_date(NaiveDate::from_ymd_opt(2024, month, day).unwrap())
    }

    fn payments(days: &[u32]) -> Vec<PaymentSnapshot> {
        days.iter()
            .enumerate()
            .map(|(i, d)| PaymentSnapshot::new(format!("p{i}"), at(12, *d), dec!(300)))
            .collect()
    }

    #[test]
    fn test_is_active_loan() {
        let base = LoanSnapshot::new("l", dec!(100), at(11, 1));
        assert!(is_active_loan(&base));

        let mut paid = base.clone();
        paid.pending_amount = dec!(0);
        assert!(!is_active_loan(&paid));
        paid.pending_amount = dec!(-1);
        assert!(!is_active_loan(&paid));

        let mut bad_debt = base.clone();
        bad_debt.bad_debt_date = Some(at(12, 1));
        assert!(!is_active_loan(&bad_debt));

        let mut cleaned = base;
        cleaned.excluded_by_cleanup = Some("cleanup-2024".into());
        assert!(!is_active_loan(&cleaned));
    }

    #[test]
    fn test_week_bounds_inclusive() {
        let week = week_of(12, 11);
        let edge = vec![
            PaymentSnapshot::new("start", week.start, dec!(1)),
            PaymentSnapshot::new("end", week.end, dec!(1)),
            PaymentSnapshot::new("after", week.end + chrono::Duration::milliseconds(1), dec!(1)),
        ];
        assert_eq!(count_payments_in_week(&edge, &week), 2);
    }

    #[test]
    fn test_late_sunday_payment_counts_in_its_week() {
        let week = week_of(12, 9);
        let late = Utc.with_ymd_and_hms(2024, 12, 15, 23, 59, 59).unwrap()
            + chrono::Duration::microseconds(999_500);
        let paid = vec![PaymentSnapshot::new("late", late, dec!(300))];

        assert_eq!(count_payments_in_week(&paid, &week), 1);
        assert_eq!(count_payments_in_week(&paid, &week.next()), 0);

        let loan = LoanSnapshot::new("l", dec!(3000), at(11, 4));
        let status = calculate_cv_status(&loan, &paid, &week, &week.previous());
        assert_eq!(status.status, CvState::AlCorriente);
    }

    #[test]
    fn test_grace_week() {
        let loan = LoanSnapshot::new("l", dec!(3000), at(12, 10));
        assert!(!is_in_cartera_vencida(&loan, 0, &week_of(12, 9)));
        assert!(is_in_cartera_vencida(&loan, 0, &week_of(12, 16)));
        assert!(!is_in_cartera_vencida(&loan, 1, &week_of(12, 16)));
    }

    #[test]
    fn test_exit_needs_two_payments() {
        let current = week_of(12, 9);
        let previous = current.previous();
        assert!(exited_cartera_vencida(&payments(&[10, 11]), &previous, &current));
        assert!(!exited_cartera_vencida(&payments(&[10]), &previous, &current));
        assert!(!exited_cartera_vencida(&payments(&[3, 10, 11]), &previous, &current));
    }

    #[test]
    fn test_exclusion_priority() {
        let mut loan = LoanSnapshot::new("l", dec!(0), at(11, 1));
        loan.bad_debt_date = Some(at(12, 1));
        loan.excluded_by_cleanup = Some("c".into());
        let week = week_of(12, 9);

        let status = calculate_cv_status(&loan, &[], &week, &week.previous());
        assert_eq!(
            status.status,
            CvState::Excluido {
                reason: ExclusionReason::BadDebt
            }
        );

        loan.bad_debt_date = None;
        let status = calculate_cv_status(&loan, &[], &week, &week.previous());
        assert_eq!(
            status.status,
            CvState::Excluido {
                reason: ExclusionReason::Cleanup
            }
        );

        loan.excluded_by_cleanup = None;
        let status = calculate_cv_status(&loan, &payments(&[10]), &week, &week.previous());
        assert_eq!(
            status.status,
            CvState::Excluido {
                reason: ExclusionReason::NotActive
            }
        );
        assert_eq!(status.payments_in_week, 1);
    }

    #[test]
    fn test_al_corriente_with_exit_flag() {
        let loan = LoanSnapshot::new("l", dec!(900), at(11, 1));
        let week = week_of(12, 9);
        let status = calculate_cv_status(&loan, &payments(&[10, 12]), &week, &week.previous());
        assert_eq!(status.status, CvState::AlCorriente);
        assert!(status.exited_cv_this_week);
        assert_eq!(status.payments_in_week, 2);
    }

    #[test]
    fn test_count_clients_status_reference_date() {
        let week = week_of(12, 9);
        let loans = vec![
            LoanSnapshot::new("old", dec!(500), at(11, 1)),
            LoanSnapshot::new("paying", dec!(500), at(11, 1)),
            LoanSnapshot::new("later", dec!(500), at(12, 20)),
        ];
        let mut by_loan = PaymentsByLoan::new();
        by_loan.insert("paying".into(), payments(&[10, 11]));

        let historical = count_clients_status(
            &loans,
            &by_loan,
            &week,
            true,
            at(12, 31),
            &ClassifierConfig::sequential(),
        );
        assert_eq!(historical.total_activos, 2);
        assert_eq!(historical.en_cv, 1);
        assert_eq!(historical.al_corriente, 1);
        assert_eq!(historical.salieron_de_cv, 1);

        // Mid-week: the second payment has not happened yet.
        let live = count_clients_status(
            &loans,
            &by_loan,
            &week,
            false,
            Utc.with_ymd_and_hms(2024, 12, 10, 18, 0, 0).unwrap(),
            &ClassifierConfig::sequential(),
        );
        assert_eq!(live.total_activos, 2);
        assert_eq!(live.al_corriente, 1);
        assert_eq!(live.salieron_de_cv, 0);
    }
}
