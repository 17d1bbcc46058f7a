//! Exact decimal arithmetic for token quantities
//!
//! A quantity arrives as human-readable decimal text ("1", "2.5", "1e3") and
//! leaves as an integer number of base units. Nothing here rounds.

use ethabi::Uint;
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Decimal magnitude bounds of a positive IEEE double. Anything outside is
/// treated the same as a non-finite or zero amount.
const MAX_MAGNITUDE: i64 = 308;
const MIN_MAGNITUDE: i64 = -324;

/// Significant digits beyond this cannot fit a `uint256` (78 digits) at any
/// supported precision (255 decimals).
const MAX_SIGNIFICANT_DIGITS: usize = 78 + 255;

/// Exponents are read as at most this many digits, which keeps the scale
/// arithmetic far away from `i64` overflow.
const MAX_EXPONENT_DIGITS: usize = 9;

/// A strictly positive decimal number, stored as `digits × 10^-scale`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
    digits: BigUint,
    scale: u32,
}

impl Quantity {
    /// Parse a decimal literal.
    ///
    /// Accepts an optional leading `+`, an integer and/or fractional part, and
    /// an optional exponent. Returns `None` for anything that is not a finite
    /// number greater than zero.
    ///
    /// Runs in time linear in the input length: zeros are stripped on the
    /// string and only a bounded number of significant digits ever reaches
    /// the bigint.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        let s = s.strip_prefix('+').unwrap_or(s);
        if s.is_empty() {
            return None;
        }

        let (mantissa, exponent) = match s.find(|c: char| c == 'e' || c == 'E') {
            Some(idx) => {
                let exp: i64 = parse_exponent(&s[idx + 1..])?;
                (&s[..idx], exp)
            }
            None => (s, 0),
        };

        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        // Leading fraction zeros only move the scale.
        let frac_part = frac_part.trim_end_matches('0');
        let joined = format!("{}{}", int_part.trim_start_matches('0'), frac_part);
        let significant = joined.trim_start_matches('0');
        if significant.is_empty() || significant.len() > MAX_SIGNIFICANT_DIGITS {
            return None;
        }

        let mut scale = frac_part.len() as i64 - exponent;
        let magnitude = significant.len() as i64 - 1 - scale;
        if !(MIN_MAGNITUDE..=MAX_MAGNITUDE).contains(&magnitude) {
            return None;
        }

        let mut digits = BigUint::parse_bytes(significant.as_bytes(), 10)?;
        if scale < 0 {
            digits *= pow10((-scale) as u32);
            scale = 0;
        }

        Some(Self::normalized(digits, scale as u32))
    }

    fn normalized(mut digits: BigUint, mut scale: u32) -> Self {
        let ten = BigUint::from(10u32);
        while scale > 0 && (&digits % &ten).is_zero() {
            digits /= &ten;
            scale -= 1;
        }
        Self { digits, scale }
    }

    /// Number of significant fractional digits.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// `self × 10^decimals` as an integer, or `None` if the quantity has more
    /// fractional digits than `decimals` can represent.
    pub fn to_base_units(&self, decimals: u32) -> Option<BigUint> {
        if self.scale > decimals {
            return None;
        }
        Some(&self.digits * pow10(decimals - self.scale))
    }

    /// `per_unit × self`, or `None` if the product is not a whole number.
    pub fn scale_value(&self, per_unit: &BigUint) -> Option<BigUint> {
        let product = per_unit * &self.digits;
        let divisor = pow10(self.scale);
        if !(&product % &divisor).is_zero() {
            return None;
        }
        Some(product / divisor)
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let raw = self.digits.to_str_radix(10);
        let scale = self.scale as usize;
        if scale == 0 {
            return f.write_str(&raw);
        }
        let padded = format!("{:0>width$}", raw, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}.{}", int_part, frac_part)
    }
}

fn parse_exponent(s: &str) -> Option<i64> {
    let (negative, body) = match s.as_bytes().first()? {
        b'+' => (false, &s[1..]),
        b'-' => (true, &s[1..]),
        _ => (false, s),
    };
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let body = body.trim_start_matches('0');
    if body.len() > MAX_EXPONENT_DIGITS {
        return None;
    }
    let value: i64 = if body.is_empty() { 0 } else { body.parse().ok()? };
    Some(if negative { -value } else { value })
}

pub(crate) fn pow10(exp: u32) -> BigUint {
    if exp == 0 {
        return BigUint::one();
    }
    BigUint::from(10u32).pow(exp)
}

/// Narrow to `uint256`, `None` on overflow.
pub fn to_uint(value: &BigUint) -> Option<Uint> {
    let bytes = value.to_bytes_be();
    if bytes.len() > 32 {
        return None;
    }
    Some(Uint::from_big_endian(&bytes))
}
