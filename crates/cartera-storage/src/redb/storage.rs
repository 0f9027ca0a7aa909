//! RedbStorage implementation.
//!
//! Implements the ledger storage traits using redb as the underlying database.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{
    Database, ReadTransaction, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use cartera_core::types::{
    AccountId, DateRange, EntryId, LeadPaymentBatchId, LeadPaymentBatchRecord, LoanId,
    LoanRecord, PaymentId, PaymentRecord, SourceType,
};

use crate::adapter::{LedgerStore, LedgerTxn, LedgerView, StorageStats};
use crate::error::{StorageError, StorageResult};
use crate::types::{sort_entries, Account, AccountEntry, AccountFilter, EntryReference};

type BlobTable = TableDefinition<'static, &'static str, &'static [u8]>;
type IndexTable = TableDefinition<'static, &'static str, &'static str>;

// Table definitions
const ACCOUNTS_TABLE: BlobTable = TableDefinition::new("accounts");
const ENTRIES_TABLE: BlobTable = TableDefinition::new("entries");
const LOANS_TABLE: BlobTable = TableDefinition::new("loans");
const PAYMENTS_TABLE: BlobTable = TableDefinition::new("payments");
const BATCHES_TABLE: BlobTable = TableDefinition::new("lead_payment_batches");

// Secondary indexes, key -> entry id
const ENTRIES_BY_ACCOUNT: IndexTable = TableDefinition::new("entries_by_account");
const ENTRIES_BY_SOURCE: IndexTable = TableDefinition::new("entries_by_source");
const ENTRIES_BY_REF: IndexTable = TableDefinition::new("entries_by_ref");

/// Redb-based storage adapter.
///
/// This adapter uses redb, a pure-Rust embedded database, for persistent storage.
/// It provides ACID transactions and is suitable for single-process applications.
/// A [`LedgerStore::write`] closure maps onto exactly one redb write transaction.
///
/// # Example
///
/// ```rust,ignore
/// use cartera_storage::{LedgerStore, RedbStorage};
///
/// let storage = RedbStorage::open("./cartera.redb")?;
/// assert!(storage.is_healthy());
/// ```
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Opens or creates a database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.initialize_tables()?;
        Ok(storage)
    }

    /// Initializes all required tables.
    fn initialize_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            for table in [
                ACCOUNTS_TABLE,
                ENTRIES_TABLE,
                LOANS_TABLE,
                PAYMENTS_TABLE,
                BATCHES_TABLE,
            ] {
                let _ = write_txn.open_table(table)?;
            }
            for index in [ENTRIES_BY_ACCOUNT, ENTRIES_BY_SOURCE, ENTRIES_BY_REF] {
                let _ = write_txn.open_table(index)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

/// Fixed-width, lexically sortable timestamp.
///
/// Keys are truncated to milliseconds; range scans re-check the exact instant.
fn date_key(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Scan bounds `[lower, upper)` for keys `{prefix}:{date}:{entry}`.
fn dated_bounds(prefix: &str, range: Option<&DateRange>) -> (String, String) {
    match range {
        Some(r) => (
            format!("{}:{}", prefix, date_key(r.start)),
            format!("{}:{};", prefix, date_key(r.end)),
        ),
        None => (format!("{}:", prefix), format!("{};", prefix)),
    }
}

/// Index rows of an entry.
fn index_rows(entry: &AccountEntry) -> Vec<(IndexTable, String)> {
    let date = date_key(entry.entry_date);
    let mut rows = vec![
        (
            ENTRIES_BY_ACCOUNT,
            format!("{}:{}:{}", entry.account_id, date, entry.id),
        ),
        (
            ENTRIES_BY_SOURCE,
            format!("{}:{}:{}", entry.source_type.as_str(), date, entry.id),
        ),
    ];
    for reference in entry.references() {
        rows.push((
            ENTRIES_BY_REF,
            format!("{}:{}:{}", reference.kind(), reference.id(), entry.id),
        ));
    }
    rows
}

// =============================================================================
// TABLE ACCESS
// =============================================================================

/// Read primitives shared by read and write transactions.
trait Tables {
    fn get_json<T: DeserializeOwned>(&self, table: BlobTable, key: &str)
        -> StorageResult<Option<T>>;

    fn all_json<T: DeserializeOwned>(&self, table: BlobTable) -> StorageResult<Vec<T>>;

    /// Entry ids stored under index keys in `[lower, upper)`.
    fn index_range(&self, table: IndexTable, lower: &str, upper: &str)
        -> StorageResult<Vec<String>>;

    fn count(&self, table: BlobTable) -> StorageResult<usize>;
}

macro_rules! impl_tables {
    ($txn:ty) => {
        impl Tables for $txn {
            fn get_json<T: DeserializeOwned>(
                &self,
                table: BlobTable,
                key: &str,
            ) -> StorageResult<Option<T>> {
                let table = self.open_table(table)?;
                let found = match table.get(key)? {
                    Some(data) => Some(serde_json::from_slice(data.value())?),
                    None => None,
                };
                Ok(found)
            }

            fn all_json<T: DeserializeOwned>(&self, table: BlobTable) -> StorageResult<Vec<T>> {
                let table = self.open_table(table)?;
                let mut results = Vec::new();
                for row in table.iter()? {
                    let (_, value) = row?;
                    results.push(serde_json::from_slice(value.value())?);
                }
                Ok(results)
            }

            fn index_range(
                &self,
                table: IndexTable,
                lower: &str,
                upper: &str,
            ) -> StorageResult<Vec<String>> {
                let table = self.open_table(table)?;
                let mut ids = Vec::new();
                for row in table.range(lower..upper)? {
                    let (_, value) = row?;
                    ids.push(value.value().to_string());
                }
                Ok(ids)
            }

            fn count(&self, table: BlobTable) -> StorageResult<usize> {
                let table = self.open_table(table)?;
                Ok(table.len()? as usize)
            }
        }
    };
}

impl_tables!(ReadTransaction);
impl_tables!(WriteTransaction);

/// A redb transaction seen through the ledger traits.
struct RedbTxn<T> {
    txn: T,
}

impl<T: Tables> RedbTxn<T> {
    /// Loads the entries behind `ids`, keeping those passing `keep`.
    fn load_entries(
        &self,
        ids: Vec<String>,
        keep: impl Fn(&AccountEntry) -> bool,
    ) -> StorageResult<Vec<AccountEntry>> {
        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            let entry: AccountEntry = self
                .txn
                .get_json(ENTRIES_TABLE, &id)?
                .ok_or_else(|| StorageError::not_found("Entry", id.as_str()))?;
            if keep(&entry) {
                entries.push(entry);
            }
        }
        sort_entries(&mut entries);
        Ok(entries)
    }
}

impl RedbTxn<WriteTransaction> {
    fn put_json<V: Serialize>(&self, table: BlobTable, key: &str, value: &V) -> StorageResult<()> {
        let data = serde_json::to_vec(value)?;
        let mut table = self.txn.open_table(table)?;
        table.insert(key, data.as_slice())?;
        Ok(())
    }

    fn insert_index_rows(&self, entry: &AccountEntry) -> StorageResult<()> {
        for (index, key) in index_rows(entry) {
            let mut table = self.txn.open_table(index)?;
            table.insert(key.as_str(), entry.id.as_str())?;
        }
        Ok(())
    }

    fn remove_index_rows(&self, entry: &AccountEntry) -> StorageResult<()> {
        for (index, key) in index_rows(entry) {
            let mut table = self.txn.open_table(index)?;
            table.remove(key.as_str())?;
        }
        Ok(())
    }
}

impl<T: Tables> LedgerView for RedbTxn<T> {
    fn get_account(&self, id: &AccountId) -> StorageResult<Option<Account>> {
        self.txn.get_json(ACCOUNTS_TABLE, id.as_str())
    }

    fn list_accounts(&self, filter: &AccountFilter) -> StorageResult<Vec<Account>> {
        let accounts: Vec<Account> = self.txn.all_json(ACCOUNTS_TABLE)?;
        Ok(accounts.into_iter().filter(|a| filter.matches(a)).collect())
    }

    fn get_entry(&self, id: &EntryId) -> StorageResult<Option<AccountEntry>> {
        self.txn.get_json(ENTRIES_TABLE, id.as_str())
    }

    fn entries_for_account(
        &self,
        account_id: &AccountId,
        range: Option<&DateRange>,
    ) -> StorageResult<Vec<AccountEntry>> {
        let (lower, upper) = dated_bounds(account_id.as_str(), range);
        let ids = self.txn.index_range(ENTRIES_BY_ACCOUNT, &lower, &upper)?;
        // Ids containing ':' can share a key prefix with another account.
        self.load_entries(ids, |e| {
            e.account_id == *account_id && range.map_or(true, |r| r.contains(e.entry_date))
        })
    }

    fn entries_by_source_type(
        &self,
        source_type: SourceType,
        range: Option<&DateRange>,
    ) -> StorageResult<Vec<AccountEntry>> {
        let (lower, upper) = dated_bounds(source_type.as_str(), range);
        let ids = self.txn.index_range(ENTRIES_BY_SOURCE, &lower, &upper)?;
        self.load_entries(ids, |e| {
            e.source_type == source_type && range.map_or(true, |r| r.contains(e.entry_date))
        })
    }

    fn entries_by_reference(
        &self,
        reference: &EntryReference,
    ) -> StorageResult<Vec<AccountEntry>> {
        let lower = format!("{}:{}:", reference.kind(), reference.id());
        let upper = format!("{}:{};", reference.kind(), reference.id());
        let ids = self.txn.index_range(ENTRIES_BY_REF, &lower, &upper)?;
        self.load_entries(ids, |e| e.has_reference(reference))
    }

    fn entries_in_range(&self, range: &DateRange) -> StorageResult<Vec<AccountEntry>> {
        let entries: Vec<AccountEntry> = self.txn.all_json(ENTRIES_TABLE)?;
        let mut entries: Vec<_> = entries
            .into_iter()
            .filter(|e| range.contains(e.entry_date))
            .collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn get_loan(&self, id: &LoanId) -> StorageResult<Option<LoanRecord>> {
        self.txn.get_json(LOANS_TABLE, id.as_str())
    }

    fn list_loans(&self) -> StorageResult<Vec<LoanRecord>> {
        self.txn.all_json(LOANS_TABLE)
    }

    fn get_payment(&self, id: &PaymentId) -> StorageResult<Option<PaymentRecord>> {
        self.txn.get_json(PAYMENTS_TABLE, id.as_str())
    }

    fn list_payments(&self) -> StorageResult<Vec<PaymentRecord>> {
        self.txn.all_json(PAYMENTS_TABLE)
    }

    fn get_lead_payment_batch(
        &self,
        id: &LeadPaymentBatchId,
    ) -> StorageResult<Option<LeadPaymentBatchRecord>> {
        self.txn.get_json(BATCHES_TABLE, id.as_str())
    }

    fn list_lead_payment_batches(&self) -> StorageResult<Vec<LeadPaymentBatchRecord>> {
        self.txn.all_json(BATCHES_TABLE)
    }
}

impl LedgerTxn for RedbTxn<WriteTransaction> {
    fn as_view(&self) -> &dyn LedgerView {
        self
    }

    fn put_account(&mut self, account: &Account) -> StorageResult<()> {
        self.put_json(ACCOUNTS_TABLE, account.id.as_str(), account)
    }

    fn insert_entry(&mut self, entry: &AccountEntry) -> StorageResult<()> {
        if self.get_entry(&entry.id)?.is_some() {
            return Err(StorageError::DuplicateKey {
                entity_type: "Entry",
                key: entry.id.to_string(),
            });
        }
        self.put_json(ENTRIES_TABLE, entry.id.as_str(), entry)?;
        self.insert_index_rows(entry)
    }

    fn reschedule_entry(&mut self, id: &EntryId, entry_date: DateTime<Utc>) -> StorageResult<()> {
        let mut entry = self.require_entry(id)?;
        self.remove_index_rows(&entry)?;
        entry.entry_date = entry_date;
        self.put_json(ENTRIES_TABLE, entry.id.as_str(), &entry)?;
        self.insert_index_rows(&entry)
    }

    fn delete_entry(&mut self, id: &EntryId) -> StorageResult<Option<AccountEntry>> {
        let Some(entry) = self.get_entry(id)? else {
            return Ok(None);
        };
        self.remove_index_rows(&entry)?;
        {
            let mut table = self.txn.open_table(ENTRIES_TABLE)?;
            table.remove(id.as_str())?;
        }
        Ok(Some(entry))
    }

    fn put_loan(&mut self, loan: &LoanRecord) -> StorageResult<()> {
        self.put_json(LOANS_TABLE, loan.id.as_str(), loan)
    }

    fn put_payment(&mut self, payment: &PaymentRecord) -> StorageResult<()> {
        self.put_json(PAYMENTS_TABLE, payment.id.as_str(), payment)
    }

    fn put_lead_payment_batch(&mut self, batch: &LeadPaymentBatchRecord) -> StorageResult<()> {
        self.put_json(BATCHES_TABLE, batch.id.as_str(), batch)
    }
}

impl LedgerStore for RedbStorage {
    fn backend_name(&self) -> &'static str {
        "redb"
    }

    fn is_healthy(&self) -> bool {
        // Try a simple read transaction to verify database is accessible
        self.db.begin_read().is_ok()
    }

    fn read<T, E>(&self, f: impl FnOnce(&dyn LedgerView) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let txn = self.db.begin_read().map_err(StorageError::from)?;
        f(&RedbTxn { txn })
    }

    fn write<T, E>(&self, f: impl FnOnce(&mut dyn LedgerTxn) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let txn = self.db.begin_write().map_err(StorageError::from)?;
        let mut handle = RedbTxn { txn };
        match f(&mut handle) {
            Ok(output) => {
                handle.txn.commit().map_err(StorageError::from)?;
                Ok(output)
            }
            Err(err) => {
                // The closure's error is the one worth reporting.
                let _ = handle.txn.abort();
                Err(err)
            }
        }
    }

    fn stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;
        Ok(StorageStats {
            account_count: read_txn.count(ACCOUNTS_TABLE)?,
            entry_count: read_txn.count(ENTRIES_TABLE)?,
            loan_count: read_txn.count(LOANS_TABLE)?,
            payment_count: read_txn.count(PAYMENTS_TABLE)?,
            lead_payment_batch_count: read_txn.count(BATCHES_TABLE)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartera_core::types::{AccountCategory, EntryDirection, Money};
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn create_test_storage() -> RedbStorage {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");
        // Keep the tempdir alive by leaking it (for tests only)
        std::mem::forget(dir);
        RedbStorage::open(path).unwrap()
    }

    fn entry(id: &str, account: &str, day: u32, source_type: SourceType) -> AccountEntry {
        AccountEntry {
            id: EntryId::from(id),
            account_id: AccountId::from(account),
            amount: Money::new(dec!(50)).unwrap(),
            direction: EntryDirection::Debit,
            source_type,
            entry_date: Utc.with_ymd_and_hms(2024, 12, day, 9, 30, 0).unwrap(),
            created_at: Utc::now(),
            description: "test".to_string(),
            loan_id: None,
            loan_payment_id: Some(PaymentId::from("pay-1")),
            lead_payment_batch_id: None,
            destination_account_id: None,
            snapshot_lead_id: None,
            snapshot_route_id: None,
            reverses_entry_id: None,
        }
    }

    #[test]
    fn test_backend_name() {
        let storage = create_test_storage();
        assert_eq!(storage.backend_name(), "redb");
        assert!(storage.is_healthy());
    }

    #[test]
    fn test_account_roundtrip() {
        let storage = create_test_storage();
        let account =
            Account::new("Route 3 cash", AccountCategory::EmployeeCashFund).with_route("r3");
        storage.write(|txn| txn.put_account(&account)).unwrap();

        let stored = storage
            .read(|v| v.require_account(&account.id))
            .unwrap();
        assert_eq!(stored, account);

        let filtered = storage
            .read(|v| v.list_accounts(&AccountFilter::new().route("r3")))
            .unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_rollback_leaves_nothing() {
        let storage = create_test_storage();
        let result: StorageResult<()> = storage.write(|txn| {
            txn.insert_entry(&entry("e1", "acc", 10, SourceType::Gasoline))?;
            Err(StorageError::Transaction("abort".into()))
        });
        assert!(result.is_err());
        assert_eq!(storage.stats().unwrap().entry_count, 0);
        let by_source = storage
            .read(|v| v.entries_by_source_type(SourceType::Gasoline, None))
            .unwrap();
        assert!(by_source.is_empty());
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let storage = create_test_storage();
        let e = entry("e1", "acc", 10, SourceType::Gasoline);
        storage.write(|txn| txn.insert_entry(&e)).unwrap();
        let err = storage.write(|txn| txn.insert_entry(&e)).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateKey { .. }));
    }

    #[test]
    fn test_indexes_follow_reschedule_and_delete() {
        let storage = create_test_storage();
        storage
            .write(|txn| {
                txn.insert_entry(&entry("e1", "acc", 10, SourceType::Gasoline))?;
                txn.insert_entry(&entry("e2", "acc", 12, SourceType::Gasoline))?;
                txn.insert_entry(&entry("e3", "acc-b", 12, SourceType::VehicleMaintenance))
            })
            .unwrap();

        let dec_12 = DateRange::day(NaiveDate::from_ymd_opt(2024, 12, 12).unwrap());
        let on_12 = storage
            .read(|v| v.entries_for_account(&AccountId::from("acc"), Some(&dec_12)))
            .unwrap();
        assert_eq!(on_12.len(), 1);
        assert_eq!(on_12[0].id.as_str(), "e2");

        let moved_to = Utc.with_ymd_and_hms(2024, 12, 12, 7, 0, 0).unwrap();
        storage
            .write(|txn| txn.reschedule_entry(&EntryId::from("e1"), moved_to))
            .unwrap();
        let on_12 = storage
            .read(|v| v.entries_for_account(&AccountId::from("acc"), Some(&dec_12)))
            .unwrap();
        let ids: Vec<_> = on_12.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2"]);

        storage
            .write(|txn| txn.delete_entry(&EntryId::from("e2")))
            .unwrap();
        let by_payment = storage
            .read(|v| v.entries_by_reference(&EntryReference::LoanPayment(PaymentId::from("pay-1"))))
            .unwrap();
        let ids: Vec<_> = by_payment.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e3"]);

        let cars = storage
            .read(|v| v.entries_by_source_type(SourceType::VehicleMaintenance, None))
            .unwrap();
        assert_eq!(cars.len(), 1);
    }

    #[test]
    fn test_loan_records_and_stats() {
        let storage = create_test_storage();
        let loan = LoanRecord::new(
            "loan-1",
            dec!(3000),
            dec!(3000),
            dec!(4200),
            Utc.with_ymd_and_hms(2024, 11, 4, 12, 0, 0).unwrap(),
        )
        .with_lead("lead-1", "route-1");
        storage.write(|txn| txn.put_loan(&loan)).unwrap();

        let stored = storage.read(|v| v.get_loan(&loan.id)).unwrap();
        assert_eq!(stored, Some(loan));

        let stats = storage.stats().unwrap();
        assert_eq!(stats.loan_count, 1);
        assert_eq!(stats.account_count, 0);
    }

    #[test]
    fn test_missing_keys_read_as_none() {
        let storage = create_test_storage();
        let (account, entry) = storage
            .read(|v| {
                let account = v.get_account(&AccountId::from("nope"))?;
                let entry = v.get_entry(&EntryId::from("nope"))?;
                Ok::<_, StorageError>((account, entry))
            })
            .unwrap();
        assert!(account.is_none());
        assert!(entry.is_none());

        let found = storage
            .write(|txn| {
                txn.put_account(&Account::new("Bank", AccountCategory::Bank).with_id("bank"))?;
                txn.as_view().get_account(&AccountId::from("bank"))
            })
            .unwrap();
        assert_eq!(found.map(|a| a.name), Some("Bank".to_string()));
        assert!(matches!(
            storage.read(|v| v.require_account(&AccountId::from("nope"))),
            Err(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_ranged_scans_respect_sub_millisecond_bounds() {
        let storage = create_test_storage();
        let mut late = entry("late", "acc", 15, SourceType::Gasoline);
        late.entry_date = Utc.with_ymd_and_hms(2024, 12, 15, 23, 59, 59).unwrap()
            + chrono::Duration::microseconds(999_500);
        storage.write(|txn| txn.insert_entry(&late)).unwrap();

        let sunday = DateRange::day(NaiveDate::from_ymd_opt(2024, 12, 15).unwrap());
        let monday = DateRange::day(NaiveDate::from_ymd_opt(2024, 12, 16).unwrap());
        let on_sunday = storage
            .read(|v| v.entries_by_source_type(SourceType::Gasoline, Some(&sunday)))
            .unwrap();
        assert_eq!(on_sunday.len(), 1);
        let on_monday = storage
            .read(|v| v.entries_for_account(&AccountId::from("acc"), Some(&monday)))
            .unwrap();
        assert!(on_monday.is_empty());
    }

    #[test]
    fn test_date_key_sorts_lexically() {
        let a = Utc.with_ymd_and_hms(2024, 9, 30, 23, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap();
        assert!(date_key(a) < date_key(b));
        assert_eq!(date_key(a), "2024-09-30T23:00:00.000Z");
    }
}
