//! # Cartera Ledger
//!
//! The accounting side of Cartera: every change to an account balance goes
//! through this crate.
//!
//! - **Ledger engine** ([`Ledger`], [`ops`]): entries, transfers, reversals,
//!   cancellation deletes, reconciliation and balance fixing
//! - **Batch transfers** ([`batch`]): drain route cash funds into one account,
//!   or distribute one account's money across routes
//! - **Date migration** ([`migration`]): move a window of business dates,
//!   keeping entries in step with their loans, payments and batches
//!
//! ## Balance model
//!
//! Accounts carry a materialized `balance` next to an append-only list of
//! entries. Both are written in the same storage transaction, so
//! `calculate_balance_from_entries(account) == get_balance(account)` holds
//! after every operation. [`Ledger::reconcile_account`] checks it and
//! [`Ledger::fix_balance`] repairs it explicitly.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cartera_core::types::AccountCategory;
//! use cartera_ledger::{Ledger, NewAccount, NewTransfer, ReverseOptions};
//! use cartera_storage::InMemoryStorage;
//! use chrono::Utc;
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::new(Arc::new(InMemoryStorage::new()));
//! let bank = ledger
//!     .open_account(NewAccount::new("Bank", AccountCategory::Bank).with_initial_balance(dec!(1000)))
//!     .unwrap();
//! let cash = ledger
//!     .open_account(NewAccount::new("Route 1", AccountCategory::EmployeeCashFund).with_route("r1"))
//!     .unwrap();
//!
//! let transfer = ledger
//!     .create_transfer(NewTransfer::new(bank.id.clone(), cash.id.clone(), dec!(250), Utc::now()))
//!     .unwrap();
//! assert_eq!(ledger.get_balance(&cash.id).unwrap(), dec!(250));
//!
//! ledger.reverse_entry(&transfer.incoming.id, ReverseOptions::default()).unwrap();
//! assert_eq!(ledger.get_balance(&cash.id).unwrap(), dec!(0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod engine;
pub mod error;
pub mod migration;

pub use batch::{
    split_evenly, Allocation, BatchTransferSummary, DistributeRequest, DrainRequest,
    SkippedAccount,
};
pub use engine::{
    ops, DeletionResult, FixOptions, FixOutcome, Ledger, LedgerSettings, NewAccount, NewEntry,
    NewTransfer, ReconciliationReport, ReverseOptions, SourceTypeTotals, TransferResult,
};
pub use error::{LedgerError, LedgerResult};
pub use migration::{DateMigrationRequest, DateMigrationSummary};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::batch::{Allocation, BatchTransferSummary, DistributeRequest, DrainRequest};
    pub use crate::engine::{
        FixOptions, FixOutcome, Ledger, LedgerSettings, NewAccount, NewEntry, NewTransfer,
        ReconciliationReport, ReverseOptions, TransferResult,
    };
    pub use crate::error::{LedgerError, LedgerResult};
    pub use crate::migration::{DateMigrationRequest, DateMigrationSummary};
}
