//! Property-based tests for ledger invariants.
//!
//! - Materialized balance equals the signed sum of entries after any sequence
//!   of operations, including failed ones
//! - Transfers contribute zero to the ledger-wide signed sum
//! - A reversal nets an entry back to the prior balance

use std::sync::Arc;

use cartera_core::types::{AccountCategory, AccountId, EntryId, LoanId, SourceType};
use cartera_ledger::prelude::*;
use cartera_storage::InMemoryStorage;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

const ACCOUNTS: [&str; 3] = ["bank", "cash-r1", "cash-r2"];

#[derive(Debug, Clone, Copy)]
enum Op {
    Credit { account: usize, cents: i64, loan: Option<u8> },
    Debit { account: usize, cents: i64, loan: Option<u8> },
    Transfer { from: usize, to: usize, cents: i64 },
    Reverse { nth: usize },
    DeleteLoan { loan: u8 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let cents = -500i64..200_000i64;
    prop_oneof![
        (0..3usize, cents.clone(), proptest::option::of(0..3u8))
            .prop_map(|(account, cents, loan)| Op::Credit { account, cents, loan }),
        (0..3usize, cents.clone(), proptest::option::of(0..3u8))
            .prop_map(|(account, cents, loan)| Op::Debit { account, cents, loan }),
        (0..3usize, 0..3usize, cents).prop_map(|(from, to, cents)| Op::Transfer { from, to, cents }),
        (0..64usize).prop_map(|nth| Op::Reverse { nth }),
        (0..3u8).prop_map(|loan| Op::DeleteLoan { loan }),
    ]
}

fn new_ledger() -> Ledger<InMemoryStorage> {
    let ledger = Ledger::new(Arc::new(InMemoryStorage::new()));
    for id in ACCOUNTS {
        ledger
            .open_account(NewAccount::new(id, AccountCategory::EmployeeCashFund).with_id(id))
            .unwrap();
    }
    ledger
}

fn entry_request(
    direction_credit: bool,
    account: usize,
    cents: i64,
    loan: Option<u8>,
) -> NewEntry {
    let date = Utc.with_ymd_and_hms(2024, 12, 10, 12, 0, 0).unwrap();
    let amount = Decimal::new(cents, 2);
    let mut request = if direction_credit {
        NewEntry::credit(ACCOUNTS[account], amount, SourceType::LoanPaymentCash, date)
    } else {
        NewEntry::debit(ACCOUNTS[account], amount, SourceType::LoanGrant, date)
    };
    if let Some(loan) = loan {
        request = request.with_loan(format!("loan-{loan}"));
    }
    request
}

fn assert_consistent(ledger: &Ledger<InMemoryStorage>) -> Result<(), TestCaseError> {
    for id in ACCOUNTS {
        let id = AccountId::from(id);
        prop_assert_eq!(
            ledger.calculate_balance_from_entries(&id).unwrap(),
            ledger.get_balance(&id).unwrap(),
            "account {} drifted",
            id
        );
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_balance_matches_entries(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let ledger = new_ledger();
        let mut entries: Vec<EntryId> = Vec::new();

        for op in ops {
            match op {
                Op::Credit { account, cents, loan } | Op::Debit { account, cents, loan } => {
                    let credit = matches!(op, Op::Credit { .. });
                    match ledger.create_entry(entry_request(credit, account, cents, loan)) {
                        Ok(entry) => entries.push(entry.id),
                        Err(err) => {
                            prop_assert!(cents <= 0);
                            prop_assert!(matches!(err, LedgerError::Validation { .. }), "{err}");
                        }
                    }
                }
                Op::Transfer { from, to, cents } => {
                    let request = NewTransfer::new(
                        ACCOUNTS[from],
                        ACCOUNTS[to],
                        Decimal::new(cents, 2),
                        Utc::now(),
                    );
                    match ledger.create_transfer(request) {
                        Ok(result) => {
                            prop_assert_eq!(
                                result.outgoing.signed_amount() + result.incoming.signed_amount(),
                                Decimal::ZERO
                            );
                            entries.push(result.outgoing.id);
                            entries.push(result.incoming.id);
                        }
                        Err(err) => {
                            let rejected = matches!(err, LedgerError::Validation { .. });
                            prop_assert!(rejected, "unexpected error {:?}", err);
                        }
                    }
                }
                Op::Reverse { nth } => {
                    if !entries.is_empty() {
                        let target = entries[nth % entries.len()].clone();
                        if let Ok(reversal) = ledger.reverse_entry(&target, ReverseOptions::default()) {
                            entries.push(reversal.id);
                        }
                    }
                }
                Op::DeleteLoan { loan } => {
                    let result = ledger
                        .delete_entries_by_loan(&LoanId::from(format!("loan-{loan}")))
                        .unwrap();
                    let undone: Decimal = result.adjustments.values().copied().sum();
                    prop_assert!(result.deleted_count > 0 || undone.is_zero());
                }
            }
            assert_consistent(&ledger)?;
        }

        for report in ledger.reconcile_all().unwrap() {
            prop_assert!(report.is_consistent);
        }
    }

    #[test]
    fn prop_transfers_net_to_zero(amounts in prop::collection::vec(1i64..1_000_000i64, 1..20)) {
        let ledger = new_ledger();
        for (i, cents) in amounts.iter().enumerate() {
            let from = ACCOUNTS[i % 3];
            let to = ACCOUNTS[(i + 1) % 3];
            ledger
                .create_transfer(NewTransfer::new(from, to, Decimal::new(*cents, 2), Utc::now()))
                .unwrap();
        }
        let total: Decimal = ACCOUNTS
            .iter()
            .map(|id| ledger.get_balance(&AccountId::from(*id)).unwrap())
            .sum();
        prop_assert_eq!(total, Decimal::ZERO);

        let transfer_entries = ledger
            .entries_by_source_type(SourceType::TransferOut, None)
            .unwrap();
        prop_assert_eq!(transfer_entries.len(), amounts.len());
    }

    #[test]
    fn prop_reversal_restores_balance(cents in 1i64..10_000_000i64, credit in any::<bool>()) {
        let ledger = new_ledger();
        let account = AccountId::from("bank");
        let before = ledger.get_balance(&account).unwrap();

        let entry = ledger
            .create_entry(entry_request(credit, 0, cents, None))
            .unwrap();
        ledger.reverse_entry(&entry.id, ReverseOptions::default()).unwrap();

        prop_assert_eq!(ledger.get_balance(&account).unwrap(), before);
        prop_assert_eq!(ledger.calculate_balance_from_entries(&account).unwrap(), before);
        prop_assert_eq!(ledger.account_entries(&account, None).unwrap().len(), 2);
    }
}
