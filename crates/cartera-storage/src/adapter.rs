//! Storage contract.
//!
//! [`LedgerView`] is the read surface, [`LedgerTxn`] adds the writes, and
//! [`LedgerStore`] hands out one or the other inside a transaction boundary.

use chrono::{DateTime, Utc};

use cartera_core::types::{
    AccountId, DateRange, EntryId, LeadPaymentBatchId, LeadPaymentBatchRecord, LoanId,
    LoanRecord, PaymentId, PaymentRecord, SourceType,
};

use crate::error::{StorageError, StorageResult};
use crate::types::{Account, AccountEntry, AccountFilter, EntryReference};

/// Read access to ledger state, as seen by one transaction.
pub trait LedgerView {
    // =========================================================================
    // ACCOUNTS
    // =========================================================================

    /// Retrieves an account by id.
    fn get_account(&self, id: &AccountId) -> StorageResult<Option<Account>>;

    /// Lists accounts passing `filter`, ordered by id.
    fn list_accounts(&self, filter: &AccountFilter) -> StorageResult<Vec<Account>>;

    // =========================================================================
    // ENTRIES
    // =========================================================================

    /// Retrieves an entry by id.
    fn get_entry(&self, id: &EntryId) -> StorageResult<Option<AccountEntry>>;

    /// Entries of an account, ordered by entry date, optionally restricted to `range`.
    fn entries_for_account(
        &self,
        account_id: &AccountId,
        range: Option<&DateRange>,
    ) -> StorageResult<Vec<AccountEntry>>;

    /// Entries of one source type, ordered by entry date, optionally restricted to `range`.
    fn entries_by_source_type(
        &self,
        source_type: SourceType,
        range: Option<&DateRange>,
    ) -> StorageResult<Vec<AccountEntry>>;

    /// Entries carrying `reference`.
    fn entries_by_reference(&self, reference: &EntryReference)
        -> StorageResult<Vec<AccountEntry>>;

    /// Every entry whose entry date falls in `range`.
    fn entries_in_range(&self, range: &DateRange) -> StorageResult<Vec<AccountEntry>>;

    // =========================================================================
    // LOAN RECORDS
    // =========================================================================

    /// Retrieves a loan by id.
    fn get_loan(&self, id: &LoanId) -> StorageResult<Option<LoanRecord>>;

    /// Lists every loan.
    fn list_loans(&self) -> StorageResult<Vec<LoanRecord>>;

    /// Retrieves a payment by id.
    fn get_payment(&self, id: &PaymentId) -> StorageResult<Option<PaymentRecord>>;

    /// Lists every payment.
    fn list_payments(&self) -> StorageResult<Vec<PaymentRecord>>;

    /// Retrieves a lead payment batch by id.
    fn get_lead_payment_batch(
        &self,
        id: &LeadPaymentBatchId,
    ) -> StorageResult<Option<LeadPaymentBatchRecord>>;

    /// Lists every lead payment batch.
    fn list_lead_payment_batches(&self) -> StorageResult<Vec<LeadPaymentBatchRecord>>;

    // =========================================================================
    // CONVENIENCE
    // =========================================================================

    /// Retrieves an account, failing if it does not exist.
    fn require_account(&self, id: &AccountId) -> StorageResult<Account> {
        self.get_account(id)?
            .ok_or_else(|| StorageError::not_found("Account", id.as_str()))
    }

    /// Retrieves an entry, failing if it does not exist.
    fn require_entry(&self, id: &EntryId) -> StorageResult<AccountEntry> {
        self.get_entry(id)?
            .ok_or_else(|| StorageError::not_found("Entry", id.as_str()))
    }
}

/// Read-write access inside a write transaction.
///
/// Nothing written through a `LedgerTxn` is visible outside the transaction
/// until the closure that received it returns `Ok`.
pub trait LedgerTxn: LedgerView {
    /// Returns the read surface of this transaction.
    fn as_view(&self) -> &dyn LedgerView;

    /// Inserts or replaces an account.
    fn put_account(&mut self, account: &Account) -> StorageResult<()>;

    /// Appends an entry and its index rows.
    ///
    /// Fails with `DuplicateKey` if the id is taken. Does not touch the
    /// account balance.
    fn insert_entry(&mut self, entry: &AccountEntry) -> StorageResult<()>;

    /// Moves an entry to a new business date, keeping its index rows in step.
    fn reschedule_entry(&mut self, id: &EntryId, entry_date: DateTime<Utc>)
        -> StorageResult<()>;

    /// Removes an entry and its index rows, returning it if it existed.
    ///
    /// Does not touch the account balance.
    fn delete_entry(&mut self, id: &EntryId) -> StorageResult<Option<AccountEntry>>;

    /// Inserts or replaces a loan.
    fn put_loan(&mut self, loan: &LoanRecord) -> StorageResult<()>;

    /// Inserts or replaces a payment.
    fn put_payment(&mut self, payment: &PaymentRecord) -> StorageResult<()>;

    /// Inserts or replaces a lead payment batch.
    fn put_lead_payment_batch(&mut self, batch: &LeadPaymentBatchRecord) -> StorageResult<()>;
}

/// A transactional ledger store.
///
/// Implementations guarantee that a `write` closure's effects become visible
/// all at once on `Ok` and not at all on `Err`, and that writers are
/// serialized.
pub trait LedgerStore: Send + Sync {
    /// Returns the backend name for logging.
    fn backend_name(&self) -> &'static str;

    /// Checks if the storage is healthy and accessible.
    fn is_healthy(&self) -> bool;

    /// Runs `f` against a consistent snapshot.
    fn read<T, E>(&self, f: impl FnOnce(&dyn LedgerView) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StorageError>;

    /// Runs `f` inside a write transaction, committing on `Ok` and rolling back on `Err`.
    fn write<T, E>(&self, f: impl FnOnce(&mut dyn LedgerTxn) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StorageError>;

    /// Returns storage statistics.
    fn stats(&self) -> StorageResult<StorageStats>;
}

/// Storage statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of accounts.
    pub account_count: usize,
    /// Number of ledger entries.
    pub entry_count: usize,
    /// Number of loans.
    pub loan_count: usize,
    /// Number of payments.
    pub payment_count: usize,
    /// Number of lead payment batches.
    pub lead_payment_batch_count: usize,
}
