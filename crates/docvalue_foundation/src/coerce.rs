//! Fallible conversions between value kinds.
//!
//! Out-of-range numbers and unsupported source kinds are reported with
//! stable error codes rather than clamped.

use crate::decimal::Decimal128;
use crate::error::{CoercionTarget, Error, ErrorKind, Result};
use crate::scalar::{Date, Timestamp};
use crate::value::Value;

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

impl Value {
    /// Truth value: numbers are true when non-zero, missing, null, and
    /// undefined are false, every other kind is true.
    #[must_use]
    pub fn coerce_to_bool(&self) -> bool {
        match self {
            Self::Missing | Self::Null | Self::Undefined => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Long(n) => *n != 0,
            Self::Double(n) => *n != 0.0,
            Self::Decimal(d) => !d.is_zero(),
            _ => true,
        }
    }

    /// Converts a number to `i32`. Doubles truncate toward zero and
    /// decimals round half-even.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::IntOutOfRange`] when the number does not fit, and
    /// [`ErrorKind::CannotCoerce`] for non-numbers.
    #[allow(clippy::cast_possible_truncation)]
    pub fn coerce_to_int(&self) -> Result<i32> {
        let out_of_range = || Error::new(ErrorKind::IntOutOfRange(self.to_string()));
        match self {
            Self::Int(n) => Ok(*n),
            Self::Long(n) => i32::try_from(*n).map_err(|_| out_of_range()),
            Self::Double(n) => {
                if *n >= f64::from(i32::MIN) && *n <= f64::from(i32::MAX) {
                    Ok(*n as i32)
                } else {
                    Err(out_of_range())
                }
            }
            Self::Decimal(d) => d
                .to_i64_round_half_even()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(out_of_range),
            _ => Err(Error::cannot_coerce(self.type_tag(), CoercionTarget::Int)),
        }
    }

    /// Converts a number to `i64`. Doubles truncate toward zero and
    /// decimals round half-even.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::LongOutOfRange`] when the number does not fit, and
    /// [`ErrorKind::CannotCoerce`] for non-numbers.
    #[allow(clippy::cast_possible_truncation)]
    pub fn coerce_to_long(&self) -> Result<i64> {
        let out_of_range = || Error::new(ErrorKind::LongOutOfRange(self.to_string()));
        match self {
            Self::Int(n) => Ok(i64::from(*n)),
            Self::Long(n) => Ok(*n),
            Self::Double(n) => {
                if *n >= -TWO_POW_63 && *n < TWO_POW_63 {
                    Ok(*n as i64)
                } else {
                    Err(out_of_range())
                }
            }
            Self::Decimal(d) => d.to_i64_round_half_even().ok_or_else(out_of_range),
            _ => Err(Error::cannot_coerce(self.type_tag(), CoercionTarget::Long)),
        }
    }

    /// Converts a number to `f64`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::CannotCoerce`] for non-numbers.
    pub fn coerce_to_double(&self) -> Result<f64> {
        self.get_double()
            .ok_or_else(|| Error::cannot_coerce(self.type_tag(), CoercionTarget::Double))
    }

    /// Converts a number to a decimal. Doubles keep 15 significant digits.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::CannotCoerce`] for non-numbers.
    pub fn coerce_to_decimal(&self) -> Result<Decimal128> {
        match self {
            Self::Int(n) => Ok(Decimal128::from_i32(*n)),
            Self::Long(n) => Ok(Decimal128::from_i64(*n)),
            Self::Double(n) => Ok(Decimal128::from_f64_digits(*n, 15)),
            Self::Decimal(d) => Ok(**d),
            _ => Err(Error::cannot_coerce(self.type_tag(), CoercionTarget::Decimal)),
        }
    }

    /// Converts to a date: dates as is, timestamps from their seconds, and
    /// object ids from their embedded creation time.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::CannotCoerce`] for every other kind.
    pub fn coerce_to_date(&self) -> Result<Date> {
        match self {
            Self::Date(date) => Ok(*date),
            Self::Timestamp(ts) => Ok(Date::from_millis(i64::from(ts.secs()) * 1000)),
            Self::ObjectId(oid) => Ok(oid.creation_date()),
            _ => Err(Error::cannot_coerce(self.type_tag(), CoercionTarget::Date)),
        }
    }

    /// Renders the value as text.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::DateFormat`] for dates outside years 0 to 9999 and
    /// [`ErrorKind::CannotCoerce`] for composites, binaries, and the other
    /// kinds without a textual form.
    pub fn coerce_to_string(&self) -> Result<String> {
        match self {
            Self::Missing | Self::Null | Self::Undefined => Ok(String::new()),
            Self::Int(n) => Ok(n.to_string()),
            Self::Long(n) => Ok(n.to_string()),
            Self::Double(n) => Ok(format_double(*n)),
            Self::Decimal(d) => Ok(d.to_string()),
            Self::String(s) | Self::Symbol(s) | Self::Code(s) => Ok(s.as_str().to_string()),
            Self::Timestamp(ts) => Ok(ts.to_string()),
            Self::Date(date) => date.to_iso_string(),
            _ => Err(Error::cannot_coerce(self.type_tag(), CoercionTarget::String)),
        }
    }

    /// Returns the timestamp payload.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::CannotCoerce`] for every other kind.
    pub fn coerce_to_timestamp(&self) -> Result<Timestamp> {
        self.as_timestamp()
            .ok_or_else(|| Error::cannot_coerce(self.type_tag(), CoercionTarget::Timestamp))
    }

    /// Returns true if the number converts to `i32` without loss.
    #[must_use]
    pub fn integral(&self) -> bool {
        match self {
            Self::Int(_) => true,
            Self::Long(n) => i32::try_from(*n).is_ok(),
            Self::Double(n) => double_is_exact_int(*n, f64::from(i32::MIN), f64::from(i32::MAX) + 1.0),
            Self::Decimal(d) => d.to_i32_exact().is_some(),
            _ => false,
        }
    }

    /// Returns true if the number converts to `i64` without loss.
    #[must_use]
    pub fn integral_64_bit(&self) -> bool {
        match self {
            Self::Int(_) | Self::Long(_) => true,
            Self::Double(n) => double_is_exact_int(*n, -TWO_POW_63, TWO_POW_63),
            Self::Decimal(d) => d.to_i64_exact().is_some(),
            _ => false,
        }
    }

    /// Returns true for a NaN double or decimal.
    #[must_use]
    pub fn is_nan(&self) -> bool {
        match self {
            Self::Double(n) => n.is_nan(),
            Self::Decimal(d) => d.is_nan(),
            _ => false,
        }
    }

    /// Returns true for an infinite double or decimal.
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        match self {
            Self::Double(n) => n.is_infinite(),
            Self::Decimal(d) => d.is_infinite(),
            _ => false,
        }
    }
}

/// True if `n` is a whole number within `[low, high)`.
fn double_is_exact_int(n: f64, low: f64, high: f64) -> bool {
    n.fract() == 0.0 && n >= low && n < high
}

/// Shortest round-trip text, switching to exponent form for very large and
/// very small magnitudes.
fn format_double(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = n.abs();
    if magnitude != 0.0 && !(1e-6..1e21).contains(&magnitude) {
        format!("{n:e}")
    } else {
        n.to_string()
    }
}
