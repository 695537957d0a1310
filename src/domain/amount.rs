//! Exact fixed-point fee amounts.
//!
//! Token amounts arrive as raw 256-bit integers and are apportioned by a ratio of two more
//! 256-bit integers. A `FeeAmount` stores the value in units of 10^-18 raw unit inside a
//! 512-bit integer.
//! Each apportioned share is floored once at that precision; totals are plain integer sums
//! and therefore independent of how the events were grouped or ordered.

use alloy::primitives::{U256, U512};
use serde::{Serialize, Serializer};
use std::fmt;

/// Number of fractional decimal digits kept below one raw unit.
pub const FRACTION_DIGITS: usize = 18;

const SCALE: u64 = 1_000_000_000_000_000_000;

fn scale() -> U512 {
    U512::from(SCALE)
}

/// Fee amount in raw token units with 18 fractional digits of precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeeAmount(U512);

impl FeeAmount {
    pub const ZERO: FeeAmount = FeeAmount(U512::ZERO);

    /// A whole number of raw units.
    pub fn from_raw(raw: U256) -> Self {
        // 2^256 * 10^18 always fits in 512 bits.
        FeeAmount(U512::from(raw) * scale())
    }

    /// `fees * stake / supply`, floored at 10^-18 raw unit.
    ///
    /// A zero `supply` yields zero. Returns `None` only if the result does not fit,
    /// which requires `stake` to exceed `supply` by an astronomical factor.
    pub fn share_of(fees: U256, stake: U256, supply: U256) -> Option<Self> {
        if supply.is_zero() || stake.is_zero() || fees.is_zero() {
            return Some(Self::ZERO);
        }
        Self::from_raw_ratio(U512::from(fees) * U512::from(stake), U512::from(supply))
    }

    /// `self * numerator / denominator`, floored. `None` on zero denominator or overflow.
    pub fn scale_by(&self, numerator: U256, denominator: U256) -> Option<Self> {
        if denominator.is_zero() {
            return None;
        }
        let product = self.0.checked_mul(U512::from(numerator))?;
        Some(FeeAmount(product / U512::from(denominator)))
    }

    fn from_raw_ratio(product: U512, divisor: U512) -> Option<Self> {
        let whole = product / divisor;
        let rem = product % divisor;
        // rem < divisor < 2^256, so rem * 10^18 cannot overflow.
        let frac = rem * scale() / divisor;
        whole.checked_mul(scale())?.checked_add(frac).map(FeeAmount)
    }

    pub fn checked_add(self, rhs: FeeAmount) -> Option<FeeAmount> {
        self.0.checked_add(rhs.0).map(FeeAmount)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whole raw units, fraction discarded.
    pub fn raw_floor(&self) -> U512 {
        self.0 / scale()
    }

    /// The underlying value in units of 10^-18 raw unit.
    pub fn scaled(&self) -> U512 {
        self.0
    }

    /// Raw units as a decimal string, trailing fractional zeros trimmed (`"55"`, `"12.5"`).
    pub fn to_raw_string(&self) -> String {
        let whole = self.0 / scale();
        let frac = self.0 % scale();
        if frac.is_zero() {
            return whole.to_string();
        }
        let frac = format!("{:0>width$}", frac.to_string(), width = FRACTION_DIGITS);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }

    /// Human token amount (`raw / 10^decimals`) with exactly `decimals` fractional digits,
    /// truncated.
    pub fn to_normalised_string(&self, decimals: u8) -> String {
        let decimals = decimals as usize;
        let shift = FRACTION_DIGITS + decimals;
        let mut digits = self.0.to_string();
        if digits.len() <= shift {
            digits = format!("{:0>width$}", digits, width = shift + 1);
        }
        let split = digits.len() - shift;
        let (int_part, frac_part) = digits.split_at(split);
        if decimals == 0 {
            int_part.to_string()
        } else {
            format!("{}.{}", int_part, &frac_part[..decimals])
        }
    }
}

impl fmt::Display for FeeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_raw_string())
    }
}

impl Serialize for FeeAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_raw_string())
    }
}
