//! In-memory storage adapter.
//!
//! Provides a simple in-memory implementation of [`LedgerStore`]. Useful for
//! testing and development. Data is not persisted across restarts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use cartera_core::types::{
    AccountId, DateRange, EntryId, LeadPaymentBatchId, LeadPaymentBatchRecord, LoanId,
    LoanRecord, PaymentId, PaymentRecord, SourceType,
};

use crate::adapter::{LedgerStore, LedgerTxn, LedgerView, StorageStats};
use crate::error::{StorageError, StorageResult};
use crate::types::{sort_entries, Account, AccountEntry, AccountFilter, EntryReference};

/// Everything the store holds.
#[derive(Debug, Clone, Default)]
struct MemoryState {
    accounts: BTreeMap<AccountId, Account>,
    entries: BTreeMap<EntryId, AccountEntry>,
    loans: BTreeMap<LoanId, LoanRecord>,
    payments: BTreeMap<PaymentId, PaymentRecord>,
    batches: BTreeMap<LeadPaymentBatchId, LeadPaymentBatchRecord>,
}

/// In-memory storage adapter.
///
/// Readers share the live state behind a read lock. A writer takes the writer
/// mutex, clones the live state, runs its closure on the clone, and swaps the
/// clone in only when the closure succeeds.
///
/// # Example
///
/// ```rust
/// use cartera_storage::{InMemoryStorage, LedgerStore};
///
/// let storage = InMemoryStorage::new();
/// assert!(storage.is_healthy());
/// assert_eq!(storage.backend_name(), "memory");
/// ```
#[derive(Default)]
pub struct InMemoryStorage {
    state: RwLock<MemoryState>,
    writer: Mutex<()>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all data from storage.
    pub fn clear(&self) {
        let _writer = self.writer.lock();
        *self.state.write() = MemoryState::default();
    }
}

impl LedgerStore for InMemoryStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn read<T, E>(&self, f: impl FnOnce(&dyn LedgerView) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let state = self.state.read();
        f(&*state)
    }

    fn write<T, E>(&self, f: impl FnOnce(&mut dyn LedgerTxn) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let _writer = self.writer.lock();
        let mut working = self.state.read().clone();
        let output = f(&mut working)?;
        *self.state.write() = working;
        Ok(output)
    }

    fn stats(&self) -> StorageResult<StorageStats> {
        let state = self.state.read();
        Ok(StorageStats {
            account_count: state.accounts.len(),
            entry_count: state.entries.len(),
            loan_count: state.loans.len(),
            payment_count: state.payments.len(),
            lead_payment_batch_count: state.batches.len(),
        })
    }
}

impl MemoryState {
    fn collect_entries(&self, keep: impl Fn(&AccountEntry) -> bool) -> Vec<AccountEntry> {
        let mut entries: Vec<_> = self.entries.values().filter(|e| keep(e)).cloned().collect();
        sort_entries(&mut entries);
        entries
    }
}

impl LedgerView for MemoryState {
    fn get_account(&self, id: &AccountId) -> StorageResult<Option<Account>> {
        Ok(self.accounts.get(id).cloned())
    }

    fn list_accounts(&self, filter: &AccountFilter) -> StorageResult<Vec<Account>> {
        Ok(self
            .accounts
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    fn get_entry(&self, id: &EntryId) -> StorageResult<Option<AccountEntry>> {
        Ok(self.entries.get(id).cloned())
    }

    fn entries_for_account(
        &self,
        account_id: &AccountId,
        range: Option<&DateRange>,
    ) -> StorageResult<Vec<AccountEntry>> {
        Ok(self.collect_entries(|e| {
            e.account_id == *account_id && range.map_or(true, |r| r.contains(e.entry_date))
        }))
    }

    fn entries_by_source_type(
        &self,
        source_type: SourceType,
        range: Option<&DateRange>,
    ) -> StorageResult<Vec<AccountEntry>> {
        Ok(self.collect_entries(|e| {
            e.source_type == source_type && range.map_or(true, |r| r.contains(e.entry_date))
        }))
    }

    fn entries_by_reference(
        &self,
        reference: &EntryReference,
    ) -> StorageResult<Vec<AccountEntry>> {
        Ok(self.collect_entries(|e| e.has_reference(reference)))
    }

    fn entries_in_range(&self, range: &DateRange) -> StorageResult<Vec<AccountEntry>> {
        Ok(self.collect_entries(|e| range.contains(e.entry_date)))
    }

    fn get_loan(&self, id: &LoanId) -> StorageResult<Option<LoanRecord>> {
        Ok(self.loans.get(id).cloned())
    }

    fn list_loans(&self) -> StorageResult<Vec<LoanRecord>> {
        Ok(self.loans.values().cloned().collect())
    }

    fn get_payment(&self, id: &PaymentId) -> StorageResult<Option<PaymentRecord>> {
        Ok(self.payments.get(id).cloned())
    }

    fn list_payments(&self) -> StorageResult<Vec<PaymentRecord>> {
        Ok(self.payments.values().cloned().collect())
    }

    fn get_lead_payment_batch(
        &self,
        id: &LeadPaymentBatchId,
    ) -> StorageResult<Option<LeadPaymentBatchRecord>> {
        Ok(self.batches.get(id).cloned())
    }

    fn list_lead_payment_batches(&self) -> StorageResult<Vec<LeadPaymentBatchRecord>> {
        Ok(self.batches.values().cloned().collect())
    }
}

impl LedgerTxn for MemoryState {
    fn as_view(&self) -> &dyn LedgerView {
        self
    }

    fn put_account(&mut self, account: &Account) -> StorageResult<()> {
        self.accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    fn insert_entry(&mut self, entry: &AccountEntry) -> StorageResult<()> {
        if self.entries.contains_key(&entry.id) {
            return Err(StorageError::DuplicateKey {
                entity_type: "Entry",
                key: entry.id.to_string(),
            });
        }
        self.entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    fn reschedule_entry(&mut self, id: &EntryId, entry_date: DateTime<Utc>) -> StorageResult<()> {
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| StorageError::not_found("Entry", id.as_str()))?;
        entry.entry_date = entry_date;
        Ok(())
    }

    fn delete_entry(&mut self, id: &EntryId) -> StorageResult<Option<AccountEntry>> {
        Ok(self.entries.remove(id))
    }

    fn put_loan(&mut self, loan: &LoanRecord) -> StorageResult<()> {
        self.loans.insert(loan.id.clone(), loan.clone());
        Ok(())
    }

    fn put_payment(&mut self, payment: &PaymentRecord) -> StorageResult<()> {
        self.payments.insert(payment.id.clone(), payment.clone());
        Ok(())
    }

    fn put_lead_payment_batch(&mut self, batch: &LeadPaymentBatchRecord) -> StorageResult<()> {
        self.batches.insert(batch.id.clone(), batch.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartera_core::types::{AccountCategory, EntryDirection, Money};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn entry(id: &str, account: &AccountId, day: u32) -> AccountEntry {
        AccountEntry {
            id: EntryId::from(id),
            account_id: account.clone(),
            amount: Money::new(dec!(100)).unwrap(),
            direction: EntryDirection::Credit,
            source_type: SourceType::LoanPaymentCash,
            entry_date: Utc.with_ymd_and_hms(2024, 12, day, 10, 0, 0).unwrap(),
            created_at: Utc::now(),
            description: String::new(),
            loan_id: Some(LoanId::from("loan-1")),
            loan_payment_id: None,
            lead_payment_batch_id: None,
            destination_account_id: None,
            snapshot_lead_id: None,
            snapshot_route_id: None,
            reverses_entry_id: None,
        }
    }

    #[test]
    fn test_write_commits_on_ok() {
        let storage = InMemoryStorage::new();
        let account = Account::new("Cash", AccountCategory::EmployeeCashFund);
        storage
            .write(|txn| txn.put_account(&account))
            .unwrap();
        assert_eq!(storage.stats().unwrap().account_count, 1);
    }

    #[test]
    fn test_write_rolls_back_on_err() {
        let storage = InMemoryStorage::new();
        let account = Account::new("Cash", AccountCategory::EmployeeCashFund);
        let result: StorageResult<()> = storage.write(|txn| {
            txn.put_account(&account)?;
            txn.insert_entry(&entry("e1", &account.id, 10))?;
            txn.insert_entry(&entry("e1", &account.id, 11))
        });
        assert!(matches!(result, Err(StorageError::DuplicateKey { .. })));
        let stats = storage.stats().unwrap();
        assert_eq!(stats.account_count, 0);
        assert_eq!(stats.entry_count, 0);
    }

    #[test]
    fn test_entries_for_account_ordered_and_ranged() {
        let storage = InMemoryStorage::new();
        let account = AccountId::from("acc");
        storage
            .write(|txn| {
                txn.insert_entry(&entry("e3", &account, 12))?;
                txn.insert_entry(&entry("e1", &account, 10))?;
                txn.insert_entry(&entry("e2", &account, 11))
            })
            .unwrap();

        let all = storage
            .read(|v| v.entries_for_account(&account, None))
            .unwrap();
        let ids: Vec<_> = all.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2", "e3"]);

        let range = DateRange::from_dates(
            chrono::NaiveDate::from_ymd_opt(2024, 12, 11).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 12, 12).unwrap(),
        )
        .unwrap();
        let ranged = storage
            .read(|v| v.entries_for_account(&account, Some(&range)))
            .unwrap();
        assert_eq!(ranged.len(), 2);
    }

    #[test]
    fn test_reschedule_and_delete() {
        let storage = InMemoryStorage::new();
        let account = AccountId::from("acc");
        storage
            .write(|txn| txn.insert_entry(&entry("e1", &account, 10)))
            .unwrap();
        let new_date = Utc.with_ymd_and_hms(2024, 12, 20, 10, 0, 0).unwrap();
        storage
            .write(|txn| txn.reschedule_entry(&EntryId::from("e1"), new_date))
            .unwrap();
        let moved = storage
            .read(|v| v.require_entry(&EntryId::from("e1")))
            .unwrap();
        assert_eq!(moved.entry_date, new_date);

        let removed = storage
            .write(|txn| txn.delete_entry(&EntryId::from("e1")))
            .unwrap();
        assert!(removed.is_some());
        assert_eq!(storage.stats().unwrap().entry_count, 0);
    }

    #[test]
    fn test_entries_by_reference() {
        let storage = InMemoryStorage::new();
        let account = AccountId::from("acc");
        storage
            .write(|txn| {
                txn.insert_entry(&entry("e1", &account, 10))?;
                txn.insert_entry(&entry("e2", &account, 11))
            })
            .unwrap();
        let found = storage
            .read(|v| v.entries_by_reference(&EntryReference::Loan(LoanId::from("loan-1"))))
            .unwrap();
        assert_eq!(found.len(), 2);
    }
}
