//! Weekly and monthly portfolio reports.
//!
//! Reports combine the classifier aggregates for one period. They do not
//! annotate renewals; run [`annotate_renewals`](crate::annotate_renewals)
//! first when `was_renewed` is not supplied upstream.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use cartera_core::types::{DateRange, WeekRange};

use crate::classify::{calculate_client_balance, calculate_renovation_kpis, count_clients_status};
use crate::error::{PortfolioError, PortfolioResult};
use crate::types::{
    ClassifierConfig, ClientBalance, ClientStatusCounts, LoanSnapshot, PaymentsByLoan,
    RenovationKpis,
};

/// One week of portfolio activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPortfolioReport {
    /// Evaluated week.
    pub week: WeekRange,
    /// True when the week had ended at report time.
    pub is_historical: bool,
    /// Delinquency counts.
    pub status: ClientStatusCounts,
    /// Client flow, trend against the previous week.
    pub client_balance: ClientBalance,
    /// Renewal rate, trend against the previous week.
    pub renovation: RenovationKpis,
}

/// Delinquency counts of one week inside a monthly report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekStatus {
    /// Evaluated week.
    pub week: WeekRange,
    /// Delinquency counts.
    pub status: ClientStatusCounts,
}

/// One calendar month of portfolio activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPortfolioReport {
    /// Year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
    /// The month as a closed range.
    pub period: DateRange,
    /// Every week whose Monday falls in the month.
    pub weeks: Vec<WeekStatus>,
    /// Client flow, trend against the previous report.
    pub client_balance: ClientBalance,
    /// Renewal rate, trend against the previous report.
    pub renovation: RenovationKpis,
}

impl MonthlyPortfolioReport {
    /// Delinquency counts of the last week that had started by `now`.
    pub fn latest_status(&self, now: DateTime<Utc>) -> Option<&WeekStatus> {
        self.weeks.iter().rev().find(|w| w.week.start <= now)
    }
}

/// Builds the report for `week`.
///
/// The week is historical when it ended before `now`. Trends compare with the
/// previous week computed over the same loans.
pub fn weekly_report(
    loans: &[LoanSnapshot],
    payments_by_loan: &PaymentsByLoan,
    week: &WeekRange,
    now: DateTime<Utc>,
    config: &ClassifierConfig,
) -> WeeklyPortfolioReport {
    let is_historical = week.end < now;
    let period = week.as_range();
    let previous_period = week.previous().as_range();

    let previous_balance = calculate_client_balance(loans, &previous_period, None, config);
    let previous_kpis = calculate_renovation_kpis(loans, &previous_period, None, config);

    let report = WeeklyPortfolioReport {
        week: *week,
        is_historical,
        status: count_clients_status(loans, payments_by_loan, week, is_historical, now, config),
        client_balance: calculate_client_balance(
            loans,
            &period,
            Some(previous_balance.balance),
            config,
        ),
        renovation: calculate_renovation_kpis(
            loans,
            &period,
            Some(previous_kpis.tasa_renovacion),
            config,
        ),
    };

    tracing::debug!(
        week = %week,
        loans = loans.len(),
        en_cv = report.status.en_cv,
        balance = report.client_balance.balance,
        "Weekly report built"
    );
    report
}

/// Builds the report for a calendar month.
///
/// Trends compare with `previous` when supplied and are `Stable` otherwise.
///
/// # Errors
///
/// - `Core` for an impossible year/month
/// - `PreviousOutOfOrder` if `previous` is not an earlier month
pub fn monthly_report(
    loans: &[LoanSnapshot],
    payments_by_loan: &PaymentsByLoan,
    year: i32,
    month: u32,
    now: DateTime<Utc>,
    previous: Option<&MonthlyPortfolioReport>,
    config: &ClassifierConfig,
) -> PortfolioResult<MonthlyPortfolioReport> {
    if !(1..=12).contains(&month) {
        return Err(PortfolioError::invalid_period(format!(
            "month must be 1-12, got {month}"
        )));
    }
    let period = DateRange::month(year, month)?;
    if let Some(prev) = previous {
        if (prev.year, prev.month) >= (year, month) {
            return Err(PortfolioError::PreviousOutOfOrder {
                previous: format!("{}-{:02}", prev.year, prev.month),
                current: format!("{year}-{month:02}"),
            });
        }
    }

    let weeks = WeekRange::weeks_in_month(year, month)?
        .into_iter()
        .map(|week| WeekStatus {
            status: count_clients_status(
                loans,
                payments_by_loan,
                &week,
                week.end < now,
                now,
                config,
            ),
            week,
        })
        .collect::<Vec<_>>();

    let report = MonthlyPortfolioReport {
        year: period.start.year(),
        month: period.start.month(),
        period,
        weeks,
        client_balance: calculate_client_balance(
            loans,
            &period,
            previous.map(|p| p.client_balance.balance),
            config,
        ),
        renovation: calculate_renovation_kpis(
            loans,
            &period,
            previous.map(|p| p.renovation.tasa_renovacion),
            config,
        ),
    };

    tracing::debug!(
        year,
        month,
        loans = loans.len(),
        weeks = report.weeks.len(),
        balance = report.client_balance.balance,
        "Monthly report built"
    );
    Ok(report)
}
