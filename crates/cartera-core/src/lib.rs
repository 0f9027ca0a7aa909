//! # Cartera Core
//!
//! Core types shared by every Cartera crate.
//!
//! - **Money**: non-negative decimal amounts with half-up rounding
//! - **Identifiers**: newtypes for accounts, entries, loans, payments, leads and routes
//! - **Ledger vocabulary**: entry direction, source types, account categories
//! - **Reporting windows**: Monday-to-Sunday [`WeekRange`] and closed [`DateRange`]
//!
//! ## Example
//!
//! ```rust
//! use cartera_core::prelude::*;
//! use rust_decimal_macros::dec;
//!
//! let amount = Money::new(dec!(150.505)).unwrap().round(2);
//! assert_eq!(amount.as_decimal(), dec!(150.51));
//! assert_eq!(amount.signed(EntryDirection::Debit), dec!(-150.51));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::types::{
        AccountCategory, AccountId, DateRange, EntryDirection, EntryId, LeadId,
        LeadPaymentBatchId, LeadPaymentBatchRecord, LoanId, LoanRecord, Money, PaymentId,
        PaymentMethod, PaymentRecord, RouteId, SourceType, WeekRange,
    };
}
