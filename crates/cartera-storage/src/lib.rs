//! Cartera Storage Layer
//!
//! Transactional persistence for ledger accounts, ledger entries and the loan
//! records entries point at.
//!
//! # Transactions
//!
//! Every access goes through a closure handed to [`LedgerStore::read`] or
//! [`LedgerStore::write`]. A write closure sees a [`LedgerTxn`]; if it returns
//! `Ok` the whole transaction commits, if it returns `Err` nothing it did is
//! visible to anyone. This is what lets the ledger create an entry and bump the
//! account's materialized balance as one unit.
//!
//! ```rust
//! use cartera_storage::{Account, InMemoryStorage, LedgerStore, StorageError};
//! use cartera_core::types::AccountCategory;
//!
//! let storage = InMemoryStorage::new();
//! let account = Account::new("Bank", AccountCategory::Bank);
//! let id = account.id.clone();
//!
//! storage
//!     .write(|txn| txn.put_account(&account))
//!     .unwrap();
//!
//! let stored = storage
//!     .read(|view| view.get_account(&id))
//!     .unwrap();
//! assert!(stored.is_some());
//!
//! // A failing closure leaves no trace.
//! let other = Account::new("Office", AccountCategory::OfficeCashFund);
//! let result: Result<(), StorageError> = storage.write(|txn| {
//!     txn.put_account(&other)?;
//!     Err(StorageError::Transaction("abort".into()))
//! });
//! assert!(result.is_err());
//! assert!(storage.read(|view| view.get_account(&other.id)).unwrap().is_none());
//! ```
//!
//! # Storage Backends
//!
//! ## RedbStorage (Default)
//!
//! Uses [redb](https://crates.io/crates/redb), a pure-Rust embedded database
//! with ACID transactions. Entries are stored once and reachable through
//! secondary index tables keyed by (account, entry date), (source type, entry
//! date) and by the loan, payment or batch they reference.
//!
//! ## InMemoryStorage
//!
//! Keeps everything in memory. Writers are serialized and work on a copy that
//! replaces the live state only on success.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod adapter;
mod error;
mod memory;
mod redb;
mod types;

pub use adapter::{LedgerStore, LedgerTxn, LedgerView, StorageStats};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStorage;
pub use redb::RedbStorage;
pub use types::{Account, AccountEntry, AccountFilter, EntryReference};

pub use cartera_core::types::{LeadPaymentBatchRecord, LoanRecord, PaymentRecord};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::adapter::{LedgerStore, LedgerTxn, LedgerView, StorageStats};
    pub use crate::error::{StorageError, StorageResult};
    pub use crate::memory::InMemoryStorage;
    pub use crate::redb::RedbStorage;
    pub use crate::types::{Account, AccountEntry, AccountFilter, EntryReference};
}
