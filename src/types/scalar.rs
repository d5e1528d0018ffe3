//! # Timestamp and Guid Scalars
//!
//! Thin newtypes giving the two fixed-width kinds without a natural Rust
//! primitive a distinct type, so `Collection<Timestamp>` and
//! `Collection<i64>` cannot be confused. Text forms are produced and parsed
//! by `parsing::literal`.

use crate::parsing::literal;
use std::fmt;
use std::str::FromStr;

/// Microseconds since 1970-01-01T00:00:00 UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn micros(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::new();
        literal::format_timestamp(self.0, &mut s);
        f.write_str(&s)
    }
}

impl FromStr for Timestamp {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        literal::parse_timestamp(s).map(Timestamp)
    }
}

/// 16-byte identifier in RFC 4122 textual byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::new();
        literal::format_guid(&self.0, &mut s);
        f.write_str(&s)
    }
}

impl FromStr for Guid {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        literal::parse_guid(s).map(Guid)
    }
}
