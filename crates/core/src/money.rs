//! Fixed-point money arithmetic.
//!
//! Amounts are stored in the smallest currency unit (cents) as `i64`, so
//! totals never accumulate binary floating-point drift. Form input is parsed
//! with at most two decimal places; percentages round half-up at the cent.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value_object::ValueObject;

/// A currency amount in cents.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

/// Why a user-supplied amount string was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoneyParseError {
    #[error("not a number")]
    NotANumber,

    #[error("at most two decimal places")]
    TooManyDecimals,

    #[error("amount out of range")]
    OutOfRange,
}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Whole currency units (e.g. `from_major(50)` is $50.00).
    pub const fn from_major(units: i64) -> Self {
        Money(units * 100)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Clamp negative amounts to zero (form-boundary policy for rates).
    pub const fn clamp_non_negative(self) -> Self {
        if self.0 < 0 { Money::ZERO } else { self }
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// Multiply by a quantity; `None` if the product does not fit in cents.
    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    /// Multiply by a quantity, saturating at the representable bounds.
    pub fn saturating_mul(self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Take a whole-number percentage of this amount, rounding half-up
    /// (half away from zero for negative amounts) at the cent.
    ///
    /// The intermediate product is widened to `i128` so it cannot overflow.
    pub fn percent(self, pct: u32) -> Money {
        let scaled = i128::from(self.0) * i128::from(pct);
        let rounded = if scaled >= 0 {
            (scaled + 50) / 100
        } else {
            (scaled - 50) / 100
        };
        Money(rounded.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
    }
}

impl ValueObject for Money {}

impl fmt::Display for Money {
    /// Renders with a fixed `$` symbol and exactly two decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    /// Parses decimal form input: optional sign, integer part, at most two
    /// fractional digits. `"50"`, `"50."`, `"50.5"`, `".50"` are all accepted;
    /// anything non-numeric is rejected rather than coerced.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (digits, None),
        };

        if int_part.is_empty() && frac_part.is_none_or(str::is_empty) {
            return Err(MoneyParseError::NotANumber);
        }
        if !int_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(MoneyParseError::NotANumber);
        }

        let whole: i128 = if int_part.is_empty() {
            0
        } else {
            // All-digit string, so a parse failure can only mean overflow.
            int_part.parse().map_err(|_| MoneyParseError::OutOfRange)?
        };

        let frac: i128 = match frac_part {
            None => 0,
            Some("") => 0,
            Some(f) => {
                if !f.chars().all(|c| c.is_ascii_digit()) {
                    return Err(MoneyParseError::NotANumber);
                }
                if f.len() > 2 {
                    return Err(MoneyParseError::TooManyDecimals);
                }
                let digits: i128 = f.parse().map_err(|_| MoneyParseError::NotANumber)?;
                if f.len() == 1 { digits * 10 } else { digits }
            }
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or(MoneyParseError::OutOfRange)?;
        let cents = if negative { -cents } else { cents };

        if cents < i128::from(i64::MIN) || cents > i128::from(i64::MAX) {
            return Err(MoneyParseError::OutOfRange);
        }

        Ok(Money(cents as i64))
    }
}
