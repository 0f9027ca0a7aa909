//! Non-negative money amounts.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use super::EntryDirection;
use crate::error::{CoreError, CoreResult};

/// Default number of decimal places kept for ledger amounts.
pub const DEFAULT_SCALE: u32 = 2;

/// A non-negative money amount.
///
/// Amounts at rest never carry a sign: whether money enters or leaves an
/// account is expressed by [`EntryDirection`]. Use [`Money::signed`] to get the
/// balance delta an amount produces.
///
/// # Example
///
/// ```rust
/// use cartera_core::types::{EntryDirection, Money};
/// use rust_decimal_macros::dec;
///
/// let amount = Money::new(dec!(1200)).unwrap();
/// assert_eq!(amount.signed(EntryDirection::Credit), dec!(1200));
/// assert!(Money::new(dec!(-1)).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates an amount, rejecting negative values.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NegativeAmount` if `value` is below zero.
    pub fn new(value: Decimal) -> CoreResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(CoreError::NegativeAmount { value });
        }
        Ok(Self(value))
    }

    /// Creates a strictly positive amount rounded to `scale`.
    ///
    /// This is the validation applied to every ledger write: zero and negative
    /// values are rejected, and so is anything that rounds to zero.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the rounded amount is not positive.
    pub fn positive(value: Decimal, scale: u32) -> CoreResult<Self> {
        let rounded = round_half_up(value, scale);
        if rounded <= Decimal::ZERO {
            return Err(CoreError::validation(format!(
                "amount must be strictly positive, got {value}"
            )));
        }
        Ok(Self(rounded))
    }

    /// Absolute value of a signed decimal.
    #[must_use]
    pub fn from_abs(value: Decimal) -> Self {
        Self(value.abs())
    }

    /// Returns the underlying decimal.
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns the balance delta this amount produces in `direction`.
    #[must_use]
    pub fn signed(&self, direction: EntryDirection) -> Decimal {
        match direction {
            EntryDirection::Credit => self.0,
            EntryDirection::Debit => -self.0,
        }
    }

    /// Rounds half away from zero to `scale` decimal places.
    #[must_use]
    pub fn round(&self, scale: u32) -> Self {
        Self(round_half_up(self.0, scale))
    }

    /// Returns true for zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true for amounts above zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Subtracts, returning `None` if the result would be negative.
    #[must_use]
    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        let diff = self.0 - other.0;
        (diff >= Decimal::ZERO).then_some(Money(diff))
    }

    /// Subtracts, clamping at zero.
    #[must_use]
    pub fn saturating_sub(&self, other: Money) -> Money {
        self.checked_sub(other).unwrap_or(Money::ZERO)
    }
}

fn round_half_up(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

impl TryFrom<Decimal> for Money {
    type Error = CoreError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
