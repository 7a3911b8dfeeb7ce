//! Money amounts stored as integer cents
//!
//! JSON carries amounts as plain numbers (`25.5`), CSV and text input as
//! decimal strings. Anything past two decimal places is rounded half away
//! from zero.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ValidationError;

/// Monetary amount in minor units (cents, paise)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Convert from a floating point major-unit amount.
    ///
    /// Returns `None` for NaN, infinities and values outside the i64 cent range.
    pub fn from_major(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let cents = (value * 100.0).round();
        if cents.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Self(cents as i64))
    }

    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Parse a decimal string such as `25.50`, `-3`, `0.125`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        const FIELD: &str = "amount";
        let invalid = ValidationError::InvalidFormat {
            field: FIELD,
            reason: "must be a decimal number",
        };

        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Empty { field: FIELD });
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if (whole.is_empty() && frac.is_empty())
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid);
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid.clone())?
        };

        let frac_bytes = frac.as_bytes();
        let digit = |i: usize| frac_bytes.get(i).map(|b| (b - b'0') as i64).unwrap_or(0);
        let mut cents = digit(0) * 10 + digit(1);
        if digit(2) >= 5 {
            cents += 1;
        }

        let total = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(cents))
            .ok_or(invalid)?;

        Ok(Self(if negative { -total } else { total }))
    }

    /// Parse and require a strictly positive amount.
    pub fn parse_positive(s: &str) -> Result<Self, ValidationError> {
        Self::parse(s)?.require_positive()
    }

    pub fn require_positive(self) -> Result<Self, ValidationError> {
        if self.is_positive() {
            Ok(self)
        } else {
            Err(ValidationError::NotPositive { field: "amount" })
        }
    }

    /// Divide evenly, rounding to the nearest cent.
    pub fn div_round(self, divisor: i64) -> Money {
        if divisor == 0 {
            return Money::ZERO;
        }
        Money((self.0 as f64 / divisor as f64).round() as i64)
    }

    /// Multiply by a conversion rate, rounding to the nearest cent.
    pub fn scale(self, rate: f64) -> Money {
        Money((self.0 as f64 * rate).round() as i64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => {
                Money::from_major(n).ok_or_else(|| serde::de::Error::custom("amount out of range"))
            }
            Raw::Text(s) => Money::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}
