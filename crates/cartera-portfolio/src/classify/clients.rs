//! Client flow: new clients, renewals, reintegros and closures.
//!
//! A renewal absorbed the prior loan's remaining debt, so less money was
//! handed over than requested. A reintegro is a returning client whose prior
//! loan was fully settled, so the full request was handed over. When amounts
//! are unknown, renewals fall back to "has a previous loan" and reintegros to
//! false: misreading a renewal as a reintegro would count the client as growth.

use rust_decimal::Decimal;

use cartera_core::types::DateRange;

use crate::parallel::maybe_parallel_fold;
use crate::types::{ClassifierConfig, ClientBalance, LoanSnapshot, RenovationKpis, Trend};

/// No previous loan.
pub fn is_new_client(loan: &LoanSnapshot) -> bool {
    loan.previous_loan.is_none()
}

/// New client signed within `period`.
pub fn is_new_client_in_period(loan: &LoanSnapshot, period: &DateRange) -> bool {
    is_new_client(loan) && period.contains(loan.sign_date)
}

/// Whether a later loan renewed this one.
///
/// An explicit `was_renewed` wins over the legacy `renewed_date`, even when false.
pub fn was_renewed(loan: &LoanSnapshot) -> bool {
    loan.was_renewed.unwrap_or(loan.renewed_date.is_some())
}

/// Finished within `period` and never renewed.
pub fn is_finished_without_renewal(loan: &LoanSnapshot, period: &DateRange) -> bool {
    period.contains_opt(loan.finished_date) && !was_renewed(loan)
}

fn is_returning_in_period(loan: &LoanSnapshot, period: &DateRange) -> bool {
    loan.previous_loan.is_some() && period.contains(loan.sign_date)
}

/// Renewal signed within `period`.
pub fn is_renewal_in_period(loan: &LoanSnapshot, period: &DateRange) -> bool {
    if !is_returning_in_period(loan, period) {
        return false;
    }
    match (loan.requested_amount, loan.amount_gived) {
        (Some(requested), Some(gived)) => gived < requested,
        _ => true,
    }
}

/// Reintegro signed within `period`.
pub fn is_reintegro_in_period(loan: &LoanSnapshot, period: &DateRange) -> bool {
    if !is_returning_in_period(loan, period) {
        return false;
    }
    match (loan.requested_amount, loan.amount_gived) {
        (Some(requested), Some(gived)) => gived == requested,
        _ => false,
    }
}

/// Compares `current` with `previous`.
pub fn calculate_trend<T: PartialOrd>(current: T, previous: T) -> Trend {
    if current > previous {
        Trend::Up
    } else if current < previous {
        Trend::Down
    } else {
        Trend::Stable
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct FlowCounts {
    nuevos: usize,
    renovados: usize,
    reintegros: usize,
    terminados_sin_renovar: usize,
}

impl FlowCounts {
    fn record(mut self, loan: &LoanSnapshot, period: &DateRange) -> Self {
        if is_new_client_in_period(loan, period) {
            self.nuevos += 1;
        }
        if is_renewal_in_period(loan, period) {
            self.renovados += 1;
        }
        if is_reintegro_in_period(loan, period) {
            self.reintegros += 1;
        }
        if is_finished_without_renewal(loan, period) {
            self.terminados_sin_renovar += 1;
        }
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            nuevos: self.nuevos + other.nuevos,
            renovados: self.renovados + other.renovados,
            reintegros: self.reintegros + other.reintegros,
            terminados_sin_renovar: self.terminados_sin_renovar + other.terminados_sin_renovar,
        }
    }
}

fn flow_counts(loans: &[LoanSnapshot], period: &DateRange, config: &ClassifierConfig) -> FlowCounts {
    maybe_parallel_fold(
        loans,
        config,
        FlowCounts::default(),
        |counts, loan| counts.record(loan, period),
        FlowCounts::merge,
    )
}

fn to_i64(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// Client growth over `period`.
///
/// # Example
///
/// ```rust
/// use cartera_core::types::DateRange;
/// use cartera_portfolio::{calculate_client_balance, ClassifierConfig, LoanSnapshot, Trend};
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use rust_decimal_macros::dec;
///
/// let period = DateRange::day(NaiveDate::from_ymd_opt(2024, 12, 10).unwrap());
/// let signed = Utc.with_ymd_and_hms(2024, 12, 10, 9, 0, 0).unwrap();
/// let loans = vec![LoanSnapshot::new("l1", dec!(1000), signed)];
///
/// let balance = calculate_client_balance(&loans, &period, Some(0), &ClassifierConfig::default());
/// assert_eq!(balance.nuevos, 1);
/// assert_eq!(balance.balance, 1);
/// assert_eq!(balance.trend, Trend::Up);
/// ```
pub fn calculate_client_balance(
    loans: &[LoanSnapshot],
    period: &DateRange,
    previous_balance: Option<i64>,
    config: &ClassifierConfig,
) -> ClientBalance {
    let counts = flow_counts(loans, period, config);
    let balance =
        to_i64(counts.nuevos) + to_i64(counts.reintegros) - to_i64(counts.terminados_sin_renovar);

    ClientBalance {
        nuevos: counts.nuevos,
        renovados: counts.renovados,
        reintegros: counts.reintegros,
        terminados_sin_renovar: counts.terminados_sin_renovar,
        balance,
        trend: previous_balance.map_or(Trend::Stable, |prev| calculate_trend(balance, prev)),
    }
}

/// Renewal rate over `period`, zero when nothing renewed or closed.
pub fn calculate_renovation_kpis(
    loans: &[LoanSnapshot],
    period: &DateRange,
    previous_rate: Option<Decimal>,
    config: &ClassifierConfig,
) -> RenovationKpis {
    let counts = flow_counts(loans, period, config);
    let denominator = counts.renovados + counts.terminados_sin_renovar;
    let tasa_renovacion = if denominator == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(counts.renovados) / Decimal::from(denominator)
    };

    RenovationKpis {
        total_renovaciones: counts.renovados,
        total_cierres_sin_renovar: counts.terminados_sin_renovar,
        tasa_renovacion,
        trend: previous_rate.map_or(Trend::Stable, |prev| calculate_trend(tasa_renovacion, prev)),
    }
}
