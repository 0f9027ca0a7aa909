//! Domain types for the microloan ledger.
//!
//! - [`Money`]: Non-negative decimal amount
//! - [`EntryDirection`]: Credit or debit
//! - [`SourceType`]: Closed set of ledger movement categories
//! - [`AccountCategory`]: Kind of money pool an account represents
//! - [`WeekRange`] / [`DateRange`]: Reporting windows
//! - [`LoanRecord`], [`PaymentRecord`], [`LeadPaymentBatchRecord`]: Persisted loan data
//! - Identifier newtypes ([`AccountId`], [`LoanId`], ...)

mod ids;
mod ledger;
mod loan;
mod money;
mod period;

pub use ids::{AccountId, EntryId, LeadId, LeadPaymentBatchId, LoanId, PaymentId, RouteId};
pub use ledger::{AccountCategory, EntryDirection, PaymentMethod, SourceType};
pub use loan::{LeadPaymentBatchRecord, LoanRecord, PaymentRecord};
pub use money::{Money, DEFAULT_SCALE};
pub use period::{end_of_day, start_of_day, DateRange, WeekRange};
