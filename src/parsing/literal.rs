//! # Item Literal Grammar
//!
//! Parsing and formatting of the literal form of a single item. Every
//! `format_*` function produces text its `parse_*` counterpart reads back to
//! the identical value, which is what lets `Parse(Format(b))` reproduce a
//! buffer byte for byte.
//!
//! ## Supported Literal Types
//!
//! | Kind | Format | Also accepted by parse |
//! |------|--------|------------------------|
//! | Boolean | `true` / `false` | `1` / `0`, any case |
//! | Integers | decimal | leading `+` |
//! | Single / Double | shortest round-trip, `NaN`, `NaN(0x..)`, `inf` | exponent forms |
//! | Timestamp | `2024-01-15T13:45:30.250000` | space separator, trailing `Z`, date only |
//! | Guid | `550e8400-e29b-41d4-a716-446655440000` | braces, 32 bare hex digits |
//! | Raw | `0x48454C4C4F` | `\x` prefix, bare hex |
//! | Text | `"he said \"hi\""` | unquoted (trimmed) |
//!
//! ## Error Handling
//!
//! All parse failures are `CodecError::ParseError` with the offending token:
//!
//! ```text
//! "invalid Guid 'abc': expected 32 hex digits, got 3"
//! "invalid Int16 '70000': number too large to fit in target type"
//! ```

use crate::config::{ESCAPE, QUOTE, RAW_HEX_PREFIX};
use crate::error::CodecError;
use eyre::{bail, ensure, Result};
use std::fmt::Write;
use std::str::FromStr;

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;
// i64 microseconds span roughly +-292,000 years
const MAX_YEAR: i64 = 300_000;

pub fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") || s == "1" {
        Ok(true)
    } else if s.eq_ignore_ascii_case("false") || s == "0" {
        Ok(false)
    } else {
        bail!(CodecError::parse(format!("invalid Boolean '{}'", s)))
    }
}

pub fn format_bool(value: bool, out: &mut String) {
    out.push_str(if value { "true" } else { "false" });
}

/// Parses an integer or float literal, naming `kind` in the error.
pub fn parse_number<T>(s: &str, kind: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let s = s.trim();
    match s.parse::<T>() {
        Ok(v) => Ok(v),
        Err(e) => bail!(CodecError::parse(format!("invalid {} '{}': {}", kind, s, e))),
    }
}

/// Bit pattern of a `NaN(0x..)` literal, or `None` for any other token.
fn nan_payload(s: &str, kind: &str) -> Result<Option<u64>> {
    let Some(inner) = s.strip_prefix("NaN(").and_then(|rest| rest.strip_suffix(')')) else {
        return Ok(None);
    };
    let hex = inner
        .strip_prefix(RAW_HEX_PREFIX)
        .or_else(|| inner.strip_prefix("0X"))
        .unwrap_or(inner);
    match u64::from_str_radix(hex, 16) {
        Ok(bits) => Ok(Some(bits)),
        Err(e) => bail!(CodecError::parse(format!("invalid {} '{}': {}", kind, s, e))),
    }
}

/// Parses a Double literal, including `NaN(0x..)` with an exact bit pattern.
pub fn parse_f64(s: &str, kind: &str) -> Result<f64> {
    let s = s.trim();
    match nan_payload(s, kind)? {
        Some(bits) => {
            let value = f64::from_bits(bits);
            ensure!(
                value.is_nan(),
                CodecError::parse(format!("invalid {} '{}': bits are not a NaN", kind, s))
            );
            Ok(value)
        }
        None => parse_number(s, kind),
    }
}

pub fn parse_f32(s: &str, kind: &str) -> Result<f32> {
    let s = s.trim();
    match nan_payload(s, kind)? {
        Some(bits) => {
            let value = u32::try_from(bits).map(f32::from_bits).map_err(|_| {
                eyre::Report::new(CodecError::parse(format!(
                    "invalid {} '{}': NaN bits wider than 32",
                    kind, s
                )))
            })?;
            ensure!(
                value.is_nan(),
                CodecError::parse(format!("invalid {} '{}': bits are not a NaN", kind, s))
            );
            Ok(value)
        }
        None => parse_number(s, kind),
    }
}

/// Formats a Double. A NaN other than the canonical one keeps its sign and
/// payload as `NaN(0x..)`.
pub fn format_f64(value: f64, out: &mut String) {
    if value.is_nan() && value.to_bits() != f64::NAN.to_bits() {
        let _ = write!(out, "NaN(0x{:016X})", value.to_bits());
        return;
    }
    let abs = value.abs();
    if value.is_finite() && abs != 0.0 && !(1e-5..1e16).contains(&abs) {
        let _ = write!(out, "{:e}", value);
    } else {
        let _ = write!(out, "{}", value);
    }
}

pub fn format_f32(value: f32, out: &mut String) {
    if value.is_nan() && value.to_bits() != f32::NAN.to_bits() {
        let _ = write!(out, "NaN(0x{:08X})", value.to_bits());
        return;
    }
    let abs = value.abs();
    if value.is_finite() && abs != 0.0 && !(1e-5..1e16).contains(&abs) {
        let _ = write!(out, "{:e}", value);
    } else {
        let _ = write!(out, "{}", value);
    }
}

/// Parses `YYYY-MM-DD[(T| )HH:MM:SS[.ffffff]][Z]` into epoch microseconds.
pub fn parse_timestamp(s: &str) -> Result<i64> {
    let s = s.trim();
    let body = s.strip_suffix('Z').unwrap_or(s);

    let (date_str, time_str) = match body.find(['T', ' ']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };

    let days = parse_date(date_str).map_err(|e| {
        eyre::Report::new(CodecError::parse(format!("invalid Timestamp '{}': {}", s, e)))
    })?;
    let time_micros = match time_str {
        Some(t) => parse_time(t).map_err(|e| {
            eyre::Report::new(CodecError::parse(format!("invalid Timestamp '{}': {}", s, e)))
        })?,
        None => 0,
    };

    let total = days as i128 * MICROS_PER_DAY as i128 + time_micros as i128;
    match i64::try_from(total) {
        Ok(v) => Ok(v),
        Err(_) => bail!(CodecError::parse(format!(
            "Timestamp '{}' is outside the representable range",
            s
        ))),
    }
}

fn parse_date(s: &str) -> std::result::Result<i64, String> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let parts: Vec<&str> = rest.split('-').collect();
    if parts.len() != 3 {
        return Err("expected YYYY-MM-DD".to_string());
    }

    let year: i64 = parse_digits(parts[0], "year")?;
    if year > MAX_YEAR {
        return Err(format!("year {} out of range", year));
    }
    let year = if negative { -year } else { year };
    let month: u32 = parse_digits(parts[1], "month")?;
    let day: u32 = parse_digits(parts[2], "day")?;

    if !(1..=12).contains(&month) {
        return Err(format!("month {} must be 1-12", month));
    }
    let max_day = days_in_month(year, month);
    if day < 1 || day > max_day {
        return Err(format!("day {} invalid, month {} has {} days", day, month, max_day));
    }

    Ok(days_from_civil(year, month, day))
}

fn parse_time(s: &str) -> std::result::Result<i64, String> {
    let (time_part, frac_part) = match s.find('.') {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    };

    let parts: Vec<&str> = time_part.split(':').collect();
    if parts.len() != 3 {
        return Err("expected HH:MM:SS".to_string());
    }

    let hour: i64 = parse_digits(parts[0], "hour")?;
    let minute: i64 = parse_digits(parts[1], "minute")?;
    let second: i64 = parse_digits(parts[2], "second")?;

    if hour > 23 {
        return Err(format!("hour {} must be 0-23", hour));
    }
    if minute > 59 {
        return Err(format!("minute {} must be 0-59", minute));
    }
    if second > 59 {
        return Err(format!("second {} must be 0-59", second));
    }

    let fraction: i64 = match frac_part {
        Some(frac) => {
            if frac.is_empty() || frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("invalid fractional seconds '{}'", frac));
            }
            let padded = format!("{:0<6}", frac);
            parse_digits(&padded[..6], "fractional seconds")?
        }
        None => 0,
    };

    Ok((hour * 3600 + minute * 60 + second) * MICROS_PER_SECOND + fraction)
}

fn parse_digits<T: FromStr>(s: &str, what: &str) -> std::result::Result<T, String> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid {} '{}'", what, s));
    }
    s.parse().map_err(|_| format!("invalid {} '{}'", what, s))
}

pub fn format_timestamp(micros: i64, out: &mut String) {
    let days = micros.div_euclid(MICROS_PER_DAY);
    let rem = micros.rem_euclid(MICROS_PER_DAY);
    let (year, month, day) = civil_from_days(days);

    if year < 0 {
        let _ = write!(out, "-{:04}", -year);
    } else {
        let _ = write!(out, "{:04}", year);
    }

    let secs = rem / MICROS_PER_SECOND;
    let frac = rem % MICROS_PER_SECOND;
    let _ = write!(
        out,
        "-{:02}-{:02}T{:02}:{:02}:{:02}",
        month,
        day,
        secs / 3600,
        (secs / 60) % 60,
        secs % 60
    );
    if frac != 0 {
        let _ = write!(out, ".{:06}", frac);
    }
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = y - era * 400;
    let mp = ((month + 9) % 12) as i64;
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

pub fn parse_guid(s: &str) -> Result<[u8; 16]> {
    let s = s.trim();
    let inner = s
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(s);
    let hex_only: Vec<u8> = inner.bytes().filter(|b| *b != b'-').collect();

    if hex_only.len() != 32 {
        bail!(CodecError::parse(format!(
            "invalid Guid '{}': expected 32 hex digits, got {}",
            s,
            hex_only.len()
        )));
    }

    let mut bytes = [0u8; 16];
    for (i, pair) in hex_only.chunks(2).enumerate() {
        match (hex_value(pair[0]), hex_value(pair[1])) {
            (Some(hi), Some(lo)) => bytes[i] = (hi << 4) | lo,
            _ => bail!(CodecError::parse(format!(
                "invalid Guid '{}': non-hex digit",
                s
            ))),
        }
    }

    Ok(bytes)
}

pub fn format_guid(bytes: &[u8; 16], out: &mut String) {
    for (i, b) in bytes.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        let _ = write!(out, "{:02x}", b);
    }
}

/// Parses a Raw literal: `0x`-prefixed, `\x`-prefixed or bare hex.
pub fn parse_raw(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    let hex = s
        .strip_prefix(RAW_HEX_PREFIX)
        .or_else(|| s.strip_prefix("0X"))
        .or_else(|| s.strip_prefix("\\x"))
        .unwrap_or(s);
    parse_hex_blob(hex)
}

pub fn parse_hex_blob(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        bail!(CodecError::parse(format!(
            "hex string must have even length, got {}",
            s.len()
        )));
    }

    s.as_bytes()
        .chunks(2)
        .map(|pair| match (hex_value(pair[0]), hex_value(pair[1])) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(eyre::Report::new(CodecError::parse(format!(
                "invalid hex byte: '{}'",
                String::from_utf8_lossy(pair)
            )))),
        })
        .collect()
}

pub fn format_raw(bytes: &[u8], out: &mut String) {
    out.push_str(RAW_HEX_PREFIX);
    for b in bytes {
        let _ = write!(out, "{:02X}", b);
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Writes `s` as a double-quoted literal, escaping quotes and backslashes.
pub fn format_quoted(s: &str, out: &mut String) {
    out.push(QUOTE);
    for ch in s.chars() {
        if ch == QUOTE || ch == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
    out.push(QUOTE);
}
