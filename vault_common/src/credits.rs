use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// The internal unit of account. Every balance and payment amount on the platform is
/// denominated in credits, regardless of the currency the provider reported.
pub const UNIT_OF_ACCOUNT: &str = "USD";
pub const UNIT_OF_ACCOUNT_LOWER: &str = "usd";

//--------------------------------------      Credits       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Credits(i64);

op!(binary Credits, Add, add);
op!(binary Credits, Sub, sub);
op!(inplace Credits, SubAssign, sub_assign);
op!(unary Credits, Neg, neg);

impl Mul<i64> for Credits {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Credits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in credits: {0}")]
pub struct CreditsConversionError(String);

impl From<i64> for Credits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Credits {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Credits {}

impl TryFrom<u64> for Credits {
    type Error = CreditsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CreditsConversionError(format!("Value {} is too large to convert to Credits", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Credits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}cr", self.0)
    }
}

impl Credits {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Credits::from(100);
        let b = Credits::from(40);
        assert_eq!(a + b, Credits::from(140));
        assert_eq!(a - b, Credits::from(60));
        assert_eq!(-b, Credits::from(-40));
        let mut c = a;
        c -= b;
        assert_eq!(c, Credits::from(60));
    }

    #[test]
    fn sum_and_display() {
        let total: Credits = [10, 20, 30].into_iter().map(Credits::from).sum();
        assert_eq!(total, Credits::from(60));
        assert_eq!(total.to_string(), "60cr");
    }

    #[test]
    fn u64_conversion() {
        assert!(Credits::try_from(u64::MAX).is_err());
        assert_eq!(Credits::try_from(42u64).unwrap(), Credits::from(42));
    }
}
