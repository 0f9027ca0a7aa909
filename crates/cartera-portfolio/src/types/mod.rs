//! Core types for portfolio classification.
//!
//! - [`LoanSnapshot`] / [`PaymentSnapshot`]: Classifier inputs
//! - [`CvStatus`], [`Trend`]: Labels
//! - [`ClientBalance`], [`RenovationKpis`], [`ClientStatusCounts`]: Aggregates
//! - [`ClassifierConfig`]: Parallelism settings

mod config;
mod snapshot;
mod status;

pub use config::ClassifierConfig;
pub use snapshot::{group_payments, LoanSnapshot, PaymentSnapshot, PaymentsByLoan};
pub use status::{
    ClientBalance, ClientStatusCounts, CvState, CvStatus, ExclusionReason, RenovationKpis, Trend,
};
