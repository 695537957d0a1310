//! Decimal type for prices and USD values, backed by rust_decimal.
//!
//! Raw token amounts never pass through this type; they stay in `FeeAmount`. A `Decimal`
//! only ever holds a human-normalized token amount or a USD figure.

use crate::domain::FeeAmount;
use rust_decimal::{Decimal as RustDecimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fractional digits kept when converting a normalized token amount.
///
/// rust_decimal holds 28 significant digits; 12 leaves room for the integer part of any
/// realistic fee total.
const MAX_PRICE_SCALE: usize = 12;

/// Decimal for USD pricing. Serializes to a JSON number.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Decimal {
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    /// Human token amount of `amount` for a token with `decimals`, truncated to 12
    /// fractional digits. `None` if the integer part does not fit.
    pub fn from_fee_amount(amount: &FeeAmount, decimals: u8) -> Option<Self> {
        let normalised = amount.to_normalised_string(decimals);
        let truncated = match normalised.split_once('.') {
            Some((int_part, frac)) if frac.len() > MAX_PRICE_SCALE => {
                format!("{}.{}", int_part, &frac[..MAX_PRICE_SCALE])
            }
            _ => normalised,
        };
        Self::from_str_canonical(&truncated).ok()
    }

    /// Format without exponent notation and without trailing zeros.
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Round half away from zero to `dp` places (cents for display).
    pub fn round_dp(&self, dp: u32) -> Self {
        Decimal(
            self.0
                .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiplication that reports overflow instead of panicking.
    pub fn checked_mul(&self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_mul(rhs.0).map(Decimal)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::zero(), |acc, x| acc + x)
    }
}
