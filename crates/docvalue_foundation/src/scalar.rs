//! Fixed-width scalar payloads: dates, timestamps, and object identifiers.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};

use crate::error::{Error, ErrorKind, Result};

/// UTC date with millisecond precision.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Date(i64);

impl Date {
    /// Creates a date from milliseconds since the Unix epoch.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns milliseconds since the Unix epoch.
    #[must_use]
    pub const fn millis(self) -> i64 {
        self.0
    }

    /// Formats the date as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DateFormat`] when the year falls outside 0–9999.
    pub fn to_iso_string(self) -> Result<String> {
        let out_of_range = || Error::new(ErrorKind::DateFormat { millis: self.0 });
        let utc = DateTime::<Utc>::from_timestamp_millis(self.0).ok_or_else(out_of_range)?;
        if !(0..=9999).contains(&utc.year()) {
            return Err(out_of_range());
        }
        Ok(utc.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
    }
}

impl From<DateTime<Utc>> for Date {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}

impl fmt::Debug for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_iso_string() {
            Ok(s) => f.write_str(&s),
            Err(_) => f.write_str("illegal date"),
        }
    }
}

/// Internal replication timestamp: seconds plus an ordinal increment.
///
/// Orders as the unsigned 64-bit integer `secs << 32 | increment`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from seconds and increment.
    #[must_use]
    pub const fn new(secs: u32, increment: u32) -> Self {
        Self(((secs as u64) << 32) | increment as u64)
    }

    /// Creates a timestamp from its packed 64-bit form.
    #[must_use]
    pub const fn from_u64(packed: u64) -> Self {
        Self(packed)
    }

    /// Returns the packed 64-bit form.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the seconds component.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn secs(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns the increment component.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn increment(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}, {})", self.secs(), self.increment())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 12-byte object identifier; the first four bytes are a big-endian
/// creation time in seconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId([u8; ObjectId::LEN]);

impl ObjectId {
    /// Size of an object id in bytes.
    pub const LEN: usize = 12;

    /// Creates an object id from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Returns the embedded creation time.
    #[must_use]
    pub fn creation_date(&self) -> Date {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        Date::from_millis(i64::from(secs) * 1000)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId(\"{self}\")")
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
