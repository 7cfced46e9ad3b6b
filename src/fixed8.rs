//! Fixed-point monetary amount with 8 decimal places
//!
//! Fixed8: ℤ₆₄ scaled by 10⁸. One raw unit is 0.00000001.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{FIXED8_DECIMALS, FIXED8_FACTOR};
use crate::error::{Result, TxError};

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed8(i64);

impl Fixed8 {
    pub const ZERO: Fixed8 = Fixed8(0);
    pub const ONE: Fixed8 = Fixed8(FIXED8_FACTOR);
    pub const SATOSHI: Fixed8 = Fixed8(1);
    pub const MAX: Fixed8 = Fixed8(i64::MAX);
    pub const MIN: Fixed8 = Fixed8(i64::MIN);

    /// Wrap a raw (already scaled) value.
    pub const fn from_raw(raw: i64) -> Self {
        Fixed8(raw)
    }

    /// Scale a whole number of tokens.
    pub fn from_int(whole: i64) -> Result<Self> {
        whole
            .checked_mul(FIXED8_FACTOR)
            .map(Fixed8)
            .ok_or_else(|| TxError::Overflow(format!("{} whole units", whole)))
    }

    pub const fn raw_value(self) -> i64 {
        self.0
    }

    /// Whole-unit part, truncated toward zero.
    pub const fn integral_value(self) -> i64 {
        self.0 / FIXED8_FACTOR
    }

    pub const fn fractional_value(self) -> i64 {
        self.0 % FIXED8_FACTOR
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Fixed8) -> Result<Fixed8> {
        self.0
            .checked_add(other.0)
            .map(Fixed8)
            .ok_or_else(|| TxError::Overflow(format!("{} + {}", self, other)))
    }

    pub fn checked_sub(self, other: Fixed8) -> Result<Fixed8> {
        self.0
            .checked_sub(other.0)
            .map(Fixed8)
            .ok_or_else(|| TxError::Overflow(format!("{} - {}", self, other)))
    }

    pub fn checked_neg(self) -> Result<Fixed8> {
        self.0
            .checked_neg()
            .map(Fixed8)
            .ok_or_else(|| TxError::Overflow(format!("-({})", self)))
    }

    /// Sum `values`, failing on the first overflow.
    pub fn checked_sum<I: IntoIterator<Item = Fixed8>>(values: I) -> Result<Fixed8> {
        values.into_iter().try_fold(Fixed8::ZERO, Fixed8::checked_add)
    }

    /// Multiply in a 128-bit intermediate, rescale, round half away from zero.
    pub fn checked_mul(self, other: Fixed8) -> Result<Fixed8> {
        let product = self.0 as i128 * other.0 as i128;
        let factor = FIXED8_FACTOR as i128;
        let mut quotient = product / factor;
        let remainder = product % factor;
        if remainder.abs() * 2 >= factor {
            quotient += product.signum();
        }
        i64::try_from(quotient)
            .map(Fixed8)
            .map_err(|_| TxError::Overflow(format!("{} * {}", self, other)))
    }

    /// Multiply by a plain integer (e.g. byte counts times a per-byte fee).
    pub fn checked_mul_int(self, n: i64) -> Result<Fixed8> {
        self.0
            .checked_mul(n)
            .map(Fixed8)
            .ok_or_else(|| TxError::Overflow(format!("{} * {}", self, n)))
    }

    /// Divide after scaling the dividend; truncates toward zero.
    pub fn checked_div(self, other: Fixed8) -> Result<Fixed8> {
        if other.0 == 0 {
            return Err(TxError::DivisionByZero);
        }
        let quotient = self.0 as i128 * FIXED8_FACTOR as i128 / other.0 as i128;
        i64::try_from(quotient)
            .map(Fixed8)
            .map_err(|_| TxError::Overflow(format!("{} / {}", self, other)))
    }

    pub fn abs(self) -> Result<Fixed8> {
        self.0
            .checked_abs()
            .map(Fixed8)
            .ok_or_else(|| TxError::Overflow(format!("abs({})", self)))
    }

    /// Round up to the next whole unit.
    pub fn ceil(self) -> Result<Fixed8> {
        let frac = self.fractional_value();
        if frac <= 0 {
            // already whole, or negative (truncation toward zero rounds up)
            return Ok(Fixed8(self.0 - frac));
        }
        (self.integral_value() + 1)
            .checked_mul(FIXED8_FACTOR)
            .map(Fixed8)
            .ok_or_else(|| TxError::Overflow(format!("ceil({})", self)))
    }

    /// Parse a decimal string with at most 8 fractional digits.
    pub fn parse(s: &str) -> Result<Fixed8> {
        let malformed = || TxError::MalformedDecimal(s.to_string());

        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => {
                if f.is_empty() {
                    return Err(malformed());
                }
                (i, f)
            }
            None => (body, ""),
        };
        if int_part.is_empty() || !is_digits(int_part) || !is_digits(frac_part) {
            return Err(malformed());
        }
        if frac_part.len() > FIXED8_DECIMALS as usize {
            return Err(TxError::MalformedDecimal(format!(
                "{}: more than {} decimal places",
                s, FIXED8_DECIMALS
            )));
        }

        let overflow = || TxError::Overflow(s.to_string());
        let mut raw: i128 = 0;
        for b in int_part.bytes() {
            raw = raw * 10 + (b - b'0') as i128;
            if raw > i64::MAX as i128 + 1 {
                return Err(overflow());
            }
        }
        raw *= FIXED8_FACTOR as i128;
        let mut frac: i128 = 0;
        for b in frac_part.bytes() {
            frac = frac * 10 + (b - b'0') as i128;
        }
        frac *= 10i128.pow(FIXED8_DECIMALS - frac_part.len() as u32);
        raw += frac;
        if negative {
            raw = -raw;
        }
        i64::try_from(raw).map(Fixed8).map_err(|_| overflow())
    }
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Fixed8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let factor = FIXED8_FACTOR as u64;
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "{}", magnitude / factor)?;
        let frac = magnitude % factor;
        if frac != 0 {
            let digits = format!("{:08}", frac);
            write!(f, ".{}", digits.trim_end_matches('0'))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fixed8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed8({})", self)
    }
}

impl FromStr for Fixed8 {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self> {
        Fixed8::parse(s)
    }
}

impl Serialize for Fixed8 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fixed8 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(Fixed8Visitor)
    }
}

struct Fixed8Visitor;

impl<'de> Visitor<'de> for Fixed8Visitor {
    type Value = Fixed8;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or number with at most 8 decimal places")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Fixed8, E> {
        Fixed8::parse(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Fixed8, E> {
        Fixed8::from_int(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Fixed8, E> {
        let v = i64::try_from(v).map_err(E::custom)?;
        Fixed8::from_int(v).map_err(E::custom)
    }

    // Display of f64 is the shortest string that round-trips, so a JSON
    // literal like 81.96167 comes back as exactly those digits.
    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Fixed8, E> {
        if !v.is_finite() {
            return Err(E::custom("non-finite amount"));
        }
        Fixed8::parse(&format!("{}", v)).map_err(E::custom)
    }
}
