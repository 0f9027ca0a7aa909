//! # Cartera Portfolio
//!
//! Classification of a microloan book: which loans are in cartera vencida
//! (delinquent) each week, and how the client base moves through new loans,
//! renewals, reintegros and closures.
//!
//! ## Design Philosophy
//!
//! - **Pure functions**: no storage handle, no clock reads; "now" is a parameter
//! - **Snapshots in**: callers project stored loans into [`LoanSnapshot`] and
//!   [`PaymentSnapshot`]
//! - **Order-independent**: results never depend on input ordering
//! - **Config-driven parallelism**: optional rayon support with threshold-based switching
//!
//! ## Quick Start
//!
//! ```rust
//! use cartera_core::types::WeekRange;
//! use cartera_portfolio::prelude::*;
//! use chrono::{NaiveDate, TimeZone, Utc};
//! use rust_decimal_macros::dec;
//!
//! let signed = Utc.with_ymd_and_hms(2024, 12, 10, 9, 0, 0).unwrap();
//! let loan = LoanSnapshot::new("l1", dec!(3000), signed);
//! let signing_week = WeekRange::for_date(NaiveDate::from_ymd_opt(2024, 12, 10).unwrap());
//!
//! // Grace week, then delinquent without payments.
//! assert!(!is_in_cartera_vencida(&loan, 0, &signing_week));
//! assert!(is_in_cartera_vencida(&loan, 0, &signing_week.next()));
//! ```
//!
//! ## Module Overview
//!
//! - [`classify`] - Delinquency status and client-flow classification
//! - [`renewals`] - Successor index over renewal chains
//! - [`reports`] - Weekly and monthly reports
//! - [`types`] - Snapshots, labels, aggregates and config
//!
//! ## Feature Flags
//!
//! - `parallel` (default): rayon-based classification for large loan books

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod error;
pub mod parallel;
pub mod renewals;
pub mod reports;
pub mod types;

pub use classify::{
    calculate_client_balance, calculate_cv_status, calculate_renovation_kpis, calculate_trend,
    count_clients_status, count_payments_in_week, exited_cartera_vencida, is_active_loan,
    is_finished_without_renewal, is_in_cartera_vencida, is_new_client, is_new_client_in_period,
    is_reintegro_in_period, is_renewal_in_period, was_renewed,
};
pub use error::{PortfolioError, PortfolioResult};
pub use parallel::{maybe_parallel_fold, maybe_parallel_map};
pub use renewals::{annotate_renewals, SuccessorIndex};
pub use reports::{monthly_report, weekly_report, MonthlyPortfolioReport, WeekStatus, WeeklyPortfolioReport};
pub use types::{
    group_payments, ClassifierConfig, ClientBalance, ClientStatusCounts, CvState, CvStatus,
    ExclusionReason, LoanSnapshot, PaymentSnapshot, PaymentsByLoan, RenovationKpis, Trend,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::classify::*;
    pub use crate::error::{PortfolioError, PortfolioResult};
    pub use crate::renewals::{annotate_renewals, SuccessorIndex};
    pub use crate::reports::{monthly_report, weekly_report};
    pub use crate::types::*;
}
