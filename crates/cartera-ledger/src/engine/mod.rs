//! The ledger engine.
//!
//! [`Ledger`] is the only path by which an account balance changes. Each
//! method runs in its own storage transaction; the [`ops`] functions it wraps
//! are public so orchestrators can run several of them in one transaction.

pub mod ops;
mod types;

use std::sync::Arc;

use rust_decimal::Decimal;

use cartera_config::CarteraConfig;
use cartera_core::types::{
    AccountId, DateRange, EntryId, LeadPaymentBatchId, LoanId, PaymentId, SourceType,
    DEFAULT_SCALE,
};
use cartera_storage::{Account, AccountEntry, AccountFilter, EntryReference, LedgerStore};

pub use types::{
    DeletionResult, FixOptions, FixOutcome, NewAccount, NewEntry, NewTransfer,
    ReconciliationReport, ReverseOptions, SourceTypeTotals, TransferResult,
};

use crate::batch::{self, BatchTransferSummary, DistributeRequest, DrainRequest};
use crate::error::LedgerResult;
use crate::migration::{self, DateMigrationRequest, DateMigrationSummary};

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Decimal places kept on amounts.
    pub scale: u32,
    /// Let distributions exceed the source balance.
    pub allow_overdraft: bool,
    /// Description used by batch transfers when the request carries none.
    pub transfer_description: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            allow_overdraft: false,
            transfer_description: "Batch transfer".to_string(),
        }
    }
}

impl LedgerSettings {
    /// Settings taken from the `money` and `batch` config sections.
    pub fn from_config(config: &CarteraConfig) -> Self {
        Self {
            scale: config.money.scale,
            allow_overdraft: config.batch.allow_overdraft,
            transfer_description: config.batch.transfer_description.clone(),
        }
    }
}

/// Ledger engine over an injected store.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use cartera_core::types::{AccountCategory, SourceType};
/// use cartera_ledger::{Ledger, NewAccount, NewEntry};
/// use cartera_storage::InMemoryStorage;
/// use chrono::Utc;
/// use rust_decimal_macros::dec;
///
/// let ledger = Ledger::new(Arc::new(InMemoryStorage::new()));
/// let bank = ledger
///     .open_account(NewAccount::new("Bank", AccountCategory::Bank).with_initial_balance(dec!(500)))
///     .unwrap();
/// ledger
///     .create_entry(NewEntry::debit(bank.id.clone(), dec!(120), SourceType::BankExpense, Utc::now()))
///     .unwrap();
///
/// assert_eq!(ledger.get_balance(&bank.id).unwrap(), dec!(380));
/// assert!(ledger.reconcile_account(&bank.id).unwrap().is_consistent);
/// ```
pub struct Ledger<S: LedgerStore> {
    store: Arc<S>,
    settings: LedgerSettings,
}

impl<S: LedgerStore> Clone for Ledger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            settings: self.settings.clone(),
        }
    }
}

impl<S: LedgerStore> Ledger<S> {
    /// Creates a ledger with default settings.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_settings(store, LedgerSettings::default())
    }

    /// Creates a ledger with explicit settings.
    pub fn with_settings(store: Arc<S>, settings: LedgerSettings) -> Self {
        Self { store, settings }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Current settings.
    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    // =========================================================================
    // ENTRIES
    // =========================================================================

    /// Books one entry and moves the account balance.
    pub fn create_entry(&self, request: NewEntry) -> LedgerResult<AccountEntry> {
        let scale = self.settings.scale;
        self.store
            .write(|txn| ops::create_entry(txn, request, scale))
    }

    /// Books both halves of a transfer.
    pub fn create_transfer(&self, request: NewTransfer) -> LedgerResult<TransferResult> {
        let scale = self.settings.scale;
        self.store
            .write(|txn| ops::create_transfer(txn, request, scale))
    }

    /// Books the mirror image of an entry.
    pub fn reverse_entry(
        &self,
        entry_id: &EntryId,
        options: ReverseOptions,
    ) -> LedgerResult<AccountEntry> {
        self.store
            .write(|txn| ops::reverse_entry(txn, entry_id, options))
    }

    /// Deletes every entry of a loan, undoing their balance effect.
    pub fn delete_entries_by_loan(&self, loan_id: &LoanId) -> LedgerResult<DeletionResult> {
        self.delete_by(EntryReference::Loan(loan_id.clone()))
    }

    /// Deletes every entry of an installment, undoing their balance effect.
    pub fn delete_entries_by_loan_payment(
        &self,
        payment_id: &PaymentId,
    ) -> LedgerResult<DeletionResult> {
        self.delete_by(EntryReference::LoanPayment(payment_id.clone()))
    }

    /// Deletes every entry of a daily hand-in, undoing their balance effect.
    pub fn delete_entries_by_lead_payment_batch(
        &self,
        batch_id: &LeadPaymentBatchId,
    ) -> LedgerResult<DeletionResult> {
        self.delete_by(EntryReference::LeadPaymentBatch(batch_id.clone()))
    }

    fn delete_by(&self, reference: EntryReference) -> LedgerResult<DeletionResult> {
        self.store
            .write(|txn| ops::delete_entries_by_reference(txn, &reference))
    }

    // =========================================================================
    // BALANCES
    // =========================================================================

    /// Materialized balance.
    pub fn get_balance(&self, account_id: &AccountId) -> LedgerResult<Decimal> {
        self.store
            .read(|view| Ok(view.require_account(account_id)?.balance))
    }

    /// Balance recomputed from the entries.
    pub fn calculate_balance_from_entries(&self, account_id: &AccountId) -> LedgerResult<Decimal> {
        self.store
            .read(|view| ops::calculate_balance_from_entries(view, account_id))
    }

    /// Compares the stored balance with the entries.
    pub fn reconcile_account(&self, account_id: &AccountId) -> LedgerResult<ReconciliationReport> {
        self.store
            .read(|view| ops::reconcile_account(view, account_id))
    }

    /// Reconciles every account.
    pub fn reconcile_all(&self) -> LedgerResult<Vec<ReconciliationReport>> {
        self.store.read(ops::reconcile_all)
    }

    /// Books an adjustment so the entries agree with the stored balance.
    pub fn fix_balance(
        &self,
        account_id: &AccountId,
        options: FixOptions,
    ) -> LedgerResult<FixOutcome> {
        self.store
            .write(|txn| ops::fix_balance(txn, account_id, options))
    }

    // =========================================================================
    // ACCOUNTS AND QUERIES
    // =========================================================================

    /// Opens an account.
    pub fn open_account(&self, request: NewAccount) -> LedgerResult<Account> {
        let scale = self.settings.scale;
        self.store
            .write(|txn| ops::open_account(txn, request, scale))
    }

    /// Retrieves an account.
    pub fn get_account(&self, account_id: &AccountId) -> LedgerResult<Account> {
        self.store
            .read(|view| Ok(view.require_account(account_id)?))
    }

    /// Lists accounts passing `filter`.
    pub fn list_accounts(&self, filter: &AccountFilter) -> LedgerResult<Vec<Account>> {
        self.store.read(|view| Ok(view.list_accounts(filter)?))
    }

    /// Entries of an account in entry-date order.
    pub fn account_entries(
        &self,
        account_id: &AccountId,
        range: Option<&DateRange>,
    ) -> LedgerResult<Vec<AccountEntry>> {
        self.store.read(|view| {
            view.require_account(account_id)?;
            Ok(view.entries_for_account(account_id, range)?)
        })
    }

    /// Entries of one source type in entry-date order.
    pub fn entries_by_source_type(
        &self,
        source_type: SourceType,
        range: Option<&DateRange>,
    ) -> LedgerResult<Vec<AccountEntry>> {
        self.store
            .read(|view| Ok(view.entries_by_source_type(source_type, range)?))
    }

    /// Per-source-type totals for an account over `range`.
    pub fn source_type_summary(
        &self,
        account_id: &AccountId,
        range: &DateRange,
    ) -> LedgerResult<Vec<SourceTypeTotals>> {
        self.store
            .read(|view| ops::source_type_summary(view, account_id, range))
    }

    // =========================================================================
    // ORCHESTRATION
    // =========================================================================

    /// Sweeps route cash funds into one account, all or nothing.
    pub fn drain_routes(&self, request: DrainRequest) -> LedgerResult<BatchTransferSummary> {
        self.store
            .write(|txn| batch::drain_routes(txn, request, &self.settings))
    }

    /// Spreads one account's money across route cash funds, all or nothing.
    pub fn distribute_money(&self, request: DistributeRequest) -> LedgerResult<BatchTransferSummary> {
        self.store
            .write(|txn| batch::distribute_money(txn, request, &self.settings))
    }

    /// Moves a window of business dates to a new day, all or nothing.
    pub fn migrate_dates(&self, request: DateMigrationRequest) -> LedgerResult<DateMigrationSummary> {
        self.store
            .write(|txn| migration::migrate_dates(txn, &request))
    }
}
