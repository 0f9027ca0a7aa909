//! Renewal chains.
//!
//! Loans only point back at the loan they renewed. [`SuccessorIndex`] inverts
//! that once per computation so "was this loan renewed" is a map lookup.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use cartera_core::types::LoanId;

use crate::types::LoanSnapshot;

/// Map from a loan to the loan that renewed it.
#[derive(Debug, Clone, Default)]
pub struct SuccessorIndex {
    successors: HashMap<LoanId, LoanId>,
}

impl SuccessorIndex {
    /// Builds the index from every loan's `previous_loan`.
    ///
    /// If several loans claim the same predecessor, the smallest id wins so
    /// the result does not depend on input order.
    pub fn build(loans: &[LoanSnapshot]) -> Self {
        let mut successors: HashMap<LoanId, LoanId> = HashMap::with_capacity(loans.len());
        for loan in loans {
            let Some(ref previous) = loan.previous_loan else {
                continue;
            };
            match successors.entry(previous.clone()) {
                Entry::Occupied(mut slot) => {
                    tracing::warn!(
                        loan_id = %previous,
                        first = %slot.get(),
                        second = %loan.id,
                        "Loan renewed more than once"
                    );
                    if loan.id < *slot.get() {
                        slot.insert(loan.id.clone());
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(loan.id.clone());
                }
            }
        }
        Self { successors }
    }

    /// The loan that renewed `loan_id`.
    pub fn successor_of(&self, loan_id: &LoanId) -> Option<&LoanId> {
        self.successors.get(loan_id)
    }

    /// Whether some loan renewed `loan_id`.
    pub fn has_successor(&self, loan_id: &LoanId) -> bool {
        self.successors.contains_key(loan_id)
    }

    /// Number of renewed loans.
    pub fn len(&self) -> usize {
        self.successors.len()
    }

    /// True when no loan was renewed.
    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }
}

/// Fills `was_renewed` on every loan that does not carry it yet.
///
/// Returns the index so callers can reuse it.
pub fn annotate_renewals(loans: &mut [LoanSnapshot]) -> SuccessorIndex {
    let index = SuccessorIndex::build(loans);
    for loan in loans.iter_mut() {
        if loan.was_renewed.is_none() {
            loan.was_renewed = Some(index.has_successor(&loan.id));
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn loan(id: &str, previous: Option<&str>) -> LoanSnapshot {
        let signed = Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap();
        let loan = LoanSnapshot::new(id, dec!(100), signed);
        match previous {
            Some(p) => loan.with_previous_loan(p),
            None => loan,
        }
    }

    #[test]
    fn test_chain() {
        let loans = vec![loan("c", Some("b")), loan("a", None), loan("b", Some("a"))];
        let index = SuccessorIndex::build(&loans);
        assert_eq!(index.len(), 2);
        assert_eq!(index.successor_of(&"a".into()), Some(&LoanId::from("b")));
        assert_eq!(index.successor_of(&"b".into()), Some(&LoanId::from("c")));
        assert!(!index.has_successor(&"c".into()));
    }

    #[test]
    fn test_duplicate_successor_is_order_independent() {
        let forward = vec![loan("x2", Some("x")), loan("x1", Some("x"))];
        let backward = vec![loan("x1", Some("x")), loan("x2", Some("x"))];
        let expected = LoanId::from("x1");
        assert_eq!(SuccessorIndex::build(&forward).successor_of(&"x".into()), Some(&expected));
        assert_eq!(SuccessorIndex::build(&backward).successor_of(&"x".into()), Some(&expected));
    }

    #[test]
    fn test_annotate_keeps_explicit_flags() {
        let mut loans = vec![
            loan("a", None),
            loan("b", Some("a")),
            loan("c", None).with_was_renewed(true),
        ];
        annotate_renewals(&mut loans);
        assert_eq!(loans[0].was_renewed, Some(true));
        assert_eq!(loans[1].was_renewed, Some(false));
        assert_eq!(loans[2].was_renewed, Some(true));
    }
}
