use crate::error::ReconcileError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Number of decimal places carried by gateway minor units (cents).
const MINOR_UNIT_SCALE: u32 = 2;

/// An amount as reported by the gateway, in integer minor units.
///
/// Gateway payloads never carry fractional cents, so the value is kept as an `i64`
/// and only converted to a `Decimal` when it has to be booked on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorUnits(i64);

impl MinorUnits {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Converts to major units, e.g. `10050` becomes `100.50`.
    pub fn to_major(self) -> Money {
        Money(Decimal::new(self.0, MINOR_UNIT_SCALE))
    }
}

impl From<i64> for MinorUnits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A booked monetary value in major units (e.g. euros).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Converts back to gateway minor units, rejecting sub-cent precision.
    pub fn to_minor(self) -> Result<MinorUnits, ReconcileError> {
        let cents = self.0 * Decimal::ONE_HUNDRED;
        if cents.fract() != Decimal::ZERO {
            return Err(ReconcileError::ValidationError(format!(
                "{} has more than {} decimal places",
                self.0, MINOR_UNIT_SCALE
            )));
        }
        i64::try_from(cents)
            .map(MinorUnits)
            .map_err(|e| ReconcileError::ValidationError(e.to_string()))
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}
