//! IEEE 754-2008 decimal128 numbers in the binary integer decimal encoding.
//!
//! Only the arithmetic-free subset the value layer needs is implemented:
//! exact construction from integers, correctly rounded conversion to and
//! from `f64`, parsing and printing, total numeric comparison, cohort
//! normalization, and integer extraction.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

const BIAS: i32 = 6176;
const EXPONENT_MIN: i32 = -6176;
const EXPONENT_MAX: i32 = 6111;
const PRECISION: usize = 34;
const MAX_COEFFICIENT: u128 = 10u128.pow(34) - 1;
const COEFFICIENT_MASK: u128 = (1 << 113) - 1;
const SIGN_BIT: u128 = 1 << 127;

/// A 128-bit decimal floating point number.
///
/// `PartialEq` and `Hash` compare representations, so `2` and `2.00` are
/// different values here even though [`Decimal128::compare`] orders them as
/// equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal128 {
    bits: u128,
}

/// Decoded form of a decimal.
#[derive(Clone, Copy, Debug)]
enum Kind {
    NaN,
    Infinity,
    Finite { coefficient: u128, exponent: i32 },
}

impl Decimal128 {
    /// Quiet NaN.
    pub const NAN: Self = Self {
        bits: 0x7c00_0000_0000_0000 << 64,
    };
    /// Positive infinity.
    pub const INFINITY: Self = Self {
        bits: 0x7800_0000_0000_0000 << 64,
    };
    /// Negative infinity.
    pub const NEG_INFINITY: Self = Self {
        bits: SIGN_BIT | Self::INFINITY.bits,
    };
    /// Zero with exponent zero.
    pub const ZERO: Self = Self::encode(false, 0, 0);

    /// Creates a decimal from its high and low 64-bit halves.
    #[must_use]
    pub const fn from_bits(high: u64, low: u64) -> Self {
        Self {
            bits: ((high as u128) << 64) | low as u128,
        }
    }

    /// Returns the high 64 bits.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn high(self) -> u64 {
        (self.bits >> 64) as u64
    }

    /// Returns the low 64 bits.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn low(self) -> u64 {
        self.bits as u64
    }

    /// Returns the little-endian byte form (low half first), as stored in BSON.
    #[must_use]
    pub const fn to_le_bytes(self) -> [u8; 16] {
        self.bits.to_le_bytes()
    }

    /// Creates a decimal from its little-endian byte form.
    #[must_use]
    pub const fn from_le_bytes(bytes: [u8; 16]) -> Self {
        Self {
            bits: u128::from_le_bytes(bytes),
        }
    }

    /// Converts a 32-bit integer exactly.
    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        Self::from_i64(value as i64)
    }

    /// Converts a 64-bit integer exactly.
    #[must_use]
    pub const fn from_i64(value: i64) -> Self {
        Self::encode(value < 0, value.unsigned_abs() as u128, 0)
    }

    /// Converts a double, rounding half-even to `digits` significant digits
    /// (clamped to 1..=34).
    ///
    /// Fifteen digits reproduce what users typed for most doubles; 34 digits
    /// keep enough precision for exact-enough comparison against decimals.
    #[must_use]
    pub fn from_f64_digits(value: f64, digits: usize) -> Self {
        if value.is_nan() {
            return Self::NAN;
        }
        if value.is_infinite() {
            return if value < 0.0 {
                Self::NEG_INFINITY
            } else {
                Self::INFINITY
            };
        }
        if value == 0.0 {
            return Self::encode(value.is_sign_negative(), 0, 0);
        }
        let digits = digits.clamp(1, PRECISION);
        let text = format!("{:.*e}", digits - 1, value.abs());
        let Some((mantissa, exponent)) = text.split_once('e') else {
            unreachable!("LowerExp output always has an exponent");
        };
        let Ok(exponent) = exponent.parse::<i64>() else {
            unreachable!("LowerExp exponent is an integer");
        };
        let coefficient: Vec<u8> = mantissa.bytes().filter(u8::is_ascii_digit).collect();
        #[allow(clippy::cast_possible_wrap)]
        let shift = (digits - 1) as i64;
        Self::from_digits(value < 0.0, &coefficient, exponent - shift)
    }

    /// Converts to the nearest double (ties to even).
    #[must_use]
    pub fn to_f64(self) -> f64 {
        let (negative, kind) = self.decode();
        let magnitude = match kind {
            Kind::NaN => return f64::NAN,
            Kind::Infinity => f64::INFINITY,
            Kind::Finite {
                coefficient,
                exponent,
            } => match format!("{coefficient}e{exponent}").parse::<f64>() {
                Ok(parsed) => parsed,
                Err(_) => unreachable!("coefficient/exponent text is a valid float literal"),
            },
        };
        if negative { -magnitude } else { magnitude }
    }

    /// Returns true for NaN.
    #[must_use]
    pub fn is_nan(self) -> bool {
        matches!(self.decode().1, Kind::NaN)
    }

    /// Returns true for either infinity.
    #[must_use]
    pub fn is_infinite(self) -> bool {
        matches!(self.decode().1, Kind::Infinity)
    }

    /// Returns true for any zero, whatever its sign or exponent.
    #[must_use]
    pub fn is_zero(self) -> bool {
        matches!(self.decode().1, Kind::Finite { coefficient: 0, .. })
    }

    /// Returns true if the sign bit is set.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.bits & SIGN_BIT != 0
    }

    /// Returns the absolute value.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self {
            bits: self.bits & !SIGN_BIT,
        }
    }

    /// Numeric three-way comparison.
    ///
    /// NaN equals NaN and sorts below every other value; zeros of either sign
    /// and any exponent are equal; members of a cohort are equal.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        let (left_negative, left) = self.decode();
        let (right_negative, right) = other.decode();
        match (left, right) {
            (Kind::NaN, Kind::NaN) => return Ordering::Equal,
            (Kind::NaN, _) => return Ordering::Less,
            (_, Kind::NaN) => return Ordering::Greater,
            _ => {}
        }
        let left_sign = signum(left_negative, left);
        let right_sign = signum(right_negative, right);
        match left_sign.cmp(&right_sign) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
        match left_sign {
            0 => Ordering::Equal,
            1 => compare_magnitudes(left, right),
            _ => compare_magnitudes(right, left),
        }
    }

    /// Returns the cohort representative: trailing zeros are removed from the
    /// coefficient so that every member of a cohort shares one bit pattern.
    #[must_use]
    pub fn normalize(self) -> Self {
        let (negative, kind) = self.decode();
        match kind {
            Kind::NaN => Self::NAN,
            Kind::Infinity => self,
            Kind::Finite { coefficient: 0, .. } => Self::encode(negative, 0, 0),
            Kind::Finite {
                mut coefficient,
                mut exponent,
            } => {
                while coefficient % 10 == 0 && exponent < EXPONENT_MAX {
                    coefficient /= 10;
                    exponent += 1;
                }
                Self::encode(negative, coefficient, exponent)
            }
        }
    }

    /// Converts to `i32` when the value is an integer in range.
    #[must_use]
    pub fn to_i32_exact(self) -> Option<i32> {
        match self.to_integer()? {
            (value, true) => i32::try_from(value).ok(),
            (_, false) => None,
        }
    }

    /// Converts to `i64` when the value is an integer in range.
    #[must_use]
    pub fn to_i64_exact(self) -> Option<i64> {
        match self.to_integer()? {
            (value, true) => i64::try_from(value).ok(),
            (_, false) => None,
        }
    }

    /// Rounds half-even to an integer and converts to `i64` if in range.
    #[must_use]
    pub fn to_i64_round_half_even(self) -> Option<i64> {
        self.to_integer()
            .and_then(|(value, _)| i64::try_from(value).ok())
    }

    /// Rounds half-even to an integer; the flag reports whether no rounding
    /// was needed. `None` for NaN, infinities, and magnitudes beyond `i128`.
    fn to_integer(self) -> Option<(i128, bool)> {
        let (negative, kind) = self.decode();
        let Kind::Finite {
            coefficient,
            exponent,
        } = kind
        else {
            return None;
        };
        if coefficient == 0 {
            return Some((0, true));
        }
        let (magnitude, exact) = if exponent >= 0 {
            let scale = 10u128.checked_pow(exponent.unsigned_abs())?;
            (coefficient.checked_mul(scale)?, true)
        } else {
            let shift = exponent.unsigned_abs();
            if shift > 38 {
                (0, false)
            } else {
                let divisor = 10u128.pow(shift);
                let quotient = coefficient / divisor;
                let remainder = coefficient % divisor;
                let half = divisor / 2;
                let round_up = remainder > half || (remainder == half && quotient % 2 == 1);
                (quotient + u128::from(round_up), remainder == 0)
            }
        };
        let magnitude = i128::try_from(magnitude).ok()?;
        Some((if negative { -magnitude } else { magnitude }, exact))
    }

    const fn encode(negative: bool, coefficient: u128, exponent: i32) -> Self {
        #[allow(clippy::cast_sign_loss)]
        let biased = (exponent + BIAS) as u128;
        let sign = if negative { SIGN_BIT } else { 0 };
        Self {
            bits: sign | (biased << 113) | coefficient,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn decode(self) -> (bool, Kind) {
        let negative = self.is_negative();
        let combination = (self.bits >> 122) & 0x1f;
        if combination == 0x1f {
            return (negative, Kind::NaN);
        }
        if combination == 0x1e {
            return (negative, Kind::Infinity);
        }
        if (self.bits >> 125) & 0b11 == 0b11 {
            // The long-coefficient form always exceeds 34 digits, which makes
            // it non-canonical; such coefficients read as zero.
            let exponent = ((self.bits >> 111) & 0x3fff) as i32 - BIAS;
            return (
                negative,
                Kind::Finite {
                    coefficient: 0,
                    exponent,
                },
            );
        }
        let exponent = ((self.bits >> 113) & 0x3fff) as i32 - BIAS;
        let mut coefficient = self.bits & COEFFICIENT_MASK;
        if coefficient > MAX_COEFFICIENT {
            coefficient = 0;
        }
        (
            negative,
            Kind::Finite {
                coefficient,
                exponent,
            },
        )
    }

    /// Builds a decimal from ASCII digits scaled by `10^exponent`, rounding
    /// half-even to 34 digits and clamping the exponent into range.
    fn from_digits(negative: bool, digits: &[u8], exponent: i64) -> Self {
        let start = digits.iter().position(|d| *d != b'0').unwrap_or(digits.len());
        let digits = &digits[start..];
        if digits.is_empty() {
            let exponent = exponent.clamp(i64::from(EXPONENT_MIN), i64::from(EXPONENT_MAX));
            #[allow(clippy::cast_possible_truncation)]
            return Self::encode(negative, 0, exponent as i32);
        }

        let kept_len = digits.len().min(PRECISION);
        let (kept, dropped) = digits.split_at(kept_len);
        let mut coefficient = kept
            .iter()
            .fold(0u128, |acc, d| acc * 10 + u128::from(d - b'0'));
        #[allow(clippy::cast_possible_wrap)]
        let mut exponent = exponent.saturating_add(dropped.len() as i64);

        if round_up(coefficient, dropped) {
            coefficient += 1;
            if coefficient > MAX_COEFFICIENT {
                coefficient /= 10;
                exponent += 1;
            }
        }
        Self::clamped(negative, coefficient, exponent)
    }

    fn clamped(negative: bool, mut coefficient: u128, mut exponent: i64) -> Self {
        let max = i64::from(EXPONENT_MAX);
        let min = i64::from(EXPONENT_MIN);
        if exponent > max {
            if coefficient == 0 {
                exponent = max;
            }
            while exponent > max && coefficient <= MAX_COEFFICIENT / 10 {
                coefficient *= 10;
                exponent -= 1;
            }
            if exponent > max {
                tracing::trace!(exponent, "decimal overflow rounds to infinity");
                return if negative {
                    Self::NEG_INFINITY
                } else {
                    Self::INFINITY
                };
            }
        }
        if exponent < min {
            let shift = min - exponent;
            coefficient = if shift > 34 {
                0
            } else {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let divisor = 10u128.pow(shift as u32);
                let quotient = coefficient / divisor;
                let remainder = coefficient % divisor;
                let half = divisor / 2;
                if remainder > half || (remainder == half && quotient % 2 == 1) {
                    quotient + 1
                } else {
                    quotient
                }
            };
            exponent = min;
        }
        #[allow(clippy::cast_possible_truncation)]
        Self::encode(negative, coefficient, exponent as i32)
    }
}

/// Half-even rounding decision for the digits dropped past the precision.
fn round_up(kept: u128, dropped: &[u8]) -> bool {
    let Some((&first, rest)) = dropped.split_first() else {
        return false;
    };
    match first.cmp(&b'5') {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => rest.iter().any(|d| *d != b'0') || kept % 2 == 1,
    }
}

fn signum(negative: bool, kind: Kind) -> i8 {
    match kind {
        Kind::Finite { coefficient: 0, .. } => 0,
        _ if negative => -1,
        _ => 1,
    }
}

/// Compares the magnitudes of two non-NaN, non-zero-or-same-sign operands.
fn compare_magnitudes(left: Kind, right: Kind) -> Ordering {
    match (left, right) {
        (Kind::Infinity, Kind::Infinity) => Ordering::Equal,
        (Kind::Infinity, _) => Ordering::Greater,
        (_, Kind::Infinity) => Ordering::Less,
        (
            Kind::Finite {
                coefficient: lc,
                exponent: le,
            },
            Kind::Finite {
                coefficient: rc,
                exponent: re,
            },
        ) => compare_finite(lc, le, rc, re),
        _ => unreachable!("NaN operands are ordered before magnitudes are compared"),
    }
}

fn compare_finite(lc: u128, le: i32, rc: u128, re: i32) -> Ordering {
    match (lc == 0, rc == 0) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }
    let l_digits = lc.ilog10() + 1;
    let r_digits = rc.ilog10() + 1;
    #[allow(clippy::cast_possible_wrap)]
    let l_adjusted = le + l_digits as i32;
    #[allow(clippy::cast_possible_wrap)]
    let r_adjusted = re + r_digits as i32;
    l_adjusted.cmp(&r_adjusted).then_with(|| {
        // Same leading-digit position: pad both to full precision.
        #[allow(clippy::cast_possible_truncation)]
        let precision = PRECISION as u32;
        let l_scaled = lc * 10u128.pow(precision - l_digits);
        let r_scaled = rc * 10u128.pow(precision - r_digits);
        l_scaled.cmp(&r_scaled)
    })
}

impl From<i32> for Decimal128 {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

impl From<i64> for Decimal128 {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl FromStr for Decimal128 {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let invalid = || Error::new(ErrorKind::InvalidDecimal(text.to_string()));
        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let lowered = body.to_ascii_lowercase();
        match lowered.as_str() {
            "nan" => return Ok(Self::NAN),
            "inf" | "infinity" => {
                return Ok(if negative {
                    Self::NEG_INFINITY
                } else {
                    Self::INFINITY
                });
            }
            _ => {}
        }

        let (mantissa, exponent_text) = match lowered.split_once('e') {
            Some((mantissa, exponent)) => (mantissa, Some(exponent)),
            None => (lowered.as_str(), None),
        };

        let mut digits = Vec::with_capacity(mantissa.len());
        let mut fraction_len: i64 = 0;
        let mut seen_point = false;
        for byte in mantissa.bytes() {
            match byte {
                b'0'..=b'9' => {
                    digits.push(byte);
                    if seen_point {
                        fraction_len += 1;
                    }
                }
                b'.' if !seen_point => seen_point = true,
                _ => return Err(invalid()),
            }
        }
        if digits.is_empty() {
            return Err(invalid());
        }

        let exponent = match exponent_text {
            None => 0,
            Some(exponent) => parse_exponent(exponent).ok_or_else(invalid)?,
        };
        Ok(Self::from_digits(
            negative,
            &digits,
            exponent.saturating_sub(fraction_len),
        ))
    }
}

/// Parses a signed exponent, saturating far outside the representable range.
fn parse_exponent(text: &str) -> Option<i64> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude = digits.bytes().fold(0i64, |acc, d| {
        (acc * 10 + i64::from(d - b'0')).min(1_000_000_000)
    });
    Some(if negative { -magnitude } else { magnitude })
}

impl fmt::Display for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (negative, kind) = self.decode();
        let (coefficient, exponent) = match kind {
            Kind::NaN => return f.write_str("NaN"),
            Kind::Infinity => {
                return f.write_str(if negative { "-Infinity" } else { "Infinity" });
            }
            Kind::Finite {
                coefficient,
                exponent,
            } => (coefficient, i64::from(exponent)),
        };
        if negative {
            f.write_str("-")?;
        }
        let digits = coefficient.to_string();
        #[allow(clippy::cast_possible_wrap)]
        let len = digits.len() as i64;
        let adjusted = exponent + len - 1;

        if exponent > 0 || adjusted < -6 {
            let (first, rest) = digits.split_at(1);
            f.write_str(first)?;
            if !rest.is_empty() {
                write!(f, ".{rest}")?;
            }
            let sign = if adjusted >= 0 { '+' } else { '-' };
            write!(f, "E{sign}{}", adjusted.abs())
        } else if exponent == 0 {
            f.write_str(&digits)
        } else {
            let point = len + exponent;
            if point > 0 {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let (integer, fraction) = digits.split_at(point as usize);
                write!(f, "{integer}.{fraction}")
            } else {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let zeros = "0".repeat((-point) as usize);
                write!(f, "0.{zeros}{digits}")
            }
        }
    }
}

impl fmt::Debug for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal128(\"{self}\")")
    }
}
