//! Datetime normalization
//!
//! Date/time values reach the API either as UNIX timestamps (pagination
//! `since`/`until`) or as `YYYY-MM-DDTHH:MM:SSZ` strings (upload
//! `publish_date`). Callers may hand in a timestamp, a chrono value or a
//! human-readable string; timezone-naive inputs are read in the local
//! zone and everything is converted to UTC.

use crate::error::{ModelError, Result};
use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use serde::Deserialize;
use serde_json::Value;

/// Output format of [`format_datetime`]
pub const API_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S %z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m-%d-%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%b %d %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%Y %b %d, %H:%M:%S",
    "%Y %b %d %H:%M:%S",
];

// Slash dates are month first, falling back to day first when that fails.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m-%d-%Y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%b %d, %Y",
    "%d %b %Y",
];

/// A value that can be interpreted as a point in time
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawDateTime")]
pub enum DateTimeLike {
    /// Seconds since the UNIX epoch
    Timestamp(i64),
    /// Datetime already in UTC
    Utc(DateTime<Utc>),
    /// Datetime with an explicit offset
    Fixed(DateTime<FixedOffset>),
    /// Datetime without a zone, read in the local zone
    Naive(NaiveDateTime),
    /// Human-readable string, parsed on conversion
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDateTime {
    Timestamp(i64),
    Text(String),
}

impl From<RawDateTime> for DateTimeLike {
    fn from(raw: RawDateTime) -> Self {
        match raw {
            RawDateTime::Timestamp(ts) => DateTimeLike::Timestamp(ts),
            RawDateTime::Text(text) => DateTimeLike::Text(text),
        }
    }
}

impl From<i64> for DateTimeLike {
    fn from(ts: i64) -> Self {
        DateTimeLike::Timestamp(ts)
    }
}

impl From<DateTime<Utc>> for DateTimeLike {
    fn from(dt: DateTime<Utc>) -> Self {
        DateTimeLike::Utc(dt)
    }
}

impl From<DateTime<FixedOffset>> for DateTimeLike {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        DateTimeLike::Fixed(dt)
    }
}

impl From<DateTime<Local>> for DateTimeLike {
    fn from(dt: DateTime<Local>) -> Self {
        DateTimeLike::Utc(dt.with_timezone(&Utc))
    }
}

impl From<NaiveDateTime> for DateTimeLike {
    fn from(dt: NaiveDateTime) -> Self {
        DateTimeLike::Naive(dt)
    }
}

impl From<&str> for DateTimeLike {
    fn from(text: &str) -> Self {
        DateTimeLike::Text(text.to_string())
    }
}

impl From<String> for DateTimeLike {
    fn from(text: String) -> Self {
        DateTimeLike::Text(text)
    }
}

impl DateTimeLike {
    /// Resolve to a UTC datetime.
    pub fn to_utc(&self) -> Result<DateTime<Utc>> {
        match self {
            DateTimeLike::Timestamp(ts) => from_timestamp(*ts),
            DateTimeLike::Utc(dt) => Ok(*dt),
            DateTimeLike::Fixed(dt) => Ok(dt.with_timezone(&Utc)),
            DateTimeLike::Naive(dt) => local_to_utc(dt),
            DateTimeLike::Text(text) => parse_datetime(text),
        }
    }
}

/// Interpret a JSON value (string or integer) as a UTC datetime.
pub fn to_datetime(value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_datetime(text),
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| ModelError::InvalidDateTime(number.to_string()))
            .and_then(from_timestamp),
        other => Err(ModelError::InvalidDateTime(other.to_string())),
    }
}

/// UNIX timestamp of a datetime-like value.
pub fn to_timestamp(value: impl Into<DateTimeLike>) -> Result<i64> {
    Ok(value.into().to_utc()?.timestamp())
}

/// `YYYY-MM-DDTHH:MM:SSZ` string of a datetime-like value, in UTC.
pub fn format_datetime(value: impl Into<DateTimeLike>) -> Result<String> {
    Ok(value.into().to_utc()?.format(API_DATETIME_FORMAT).to_string())
}

/// Parse a human-readable date/time string.
///
/// Tries RFC 3339, RFC 2822, offset-carrying formats, naive datetimes
/// followed by a separate offset token (`+03`, `-0530`, `GMT-2`), then
/// naive datetimes and dates (read in the local zone), and finally a bare
/// integer timestamp.
pub fn parse_datetime(text: &str) -> Result<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    if let Some((head, offset)) = split_offset(text) {
        if let Some(dt) = parse_naive(head) {
            return offset
                .from_local_datetime(&dt)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| ModelError::InvalidDateTime(text.to_string()));
        }
    }
    if let Some(dt) = parse_naive(text) {
        return local_to_utc(&dt);
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return local_to_utc(&date.and_time(NaiveTime::MIN));
        }
    }
    if let Ok(ts) = text.parse::<i64>() {
        return from_timestamp(ts);
    }

    Err(ModelError::InvalidDateTime(text.to_string()))
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Split a trailing offset token off a datetime string.
///
/// `GMT+h`/`UTC+h` follow the POSIX convention, where the sign is
/// inverted: `GMT-2` is two hours east of UTC.
fn split_offset(text: &str) -> Option<(&str, FixedOffset)> {
    let (head, tail) = text.rsplit_once(' ')?;
    let head = head.trim_end();
    let seconds = match tail.get(..3) {
        Some("GMT") | Some("UTC") => -offset_seconds(&tail[3..])?,
        _ => offset_seconds(tail)?,
    };
    FixedOffset::east_opt(seconds).map(|offset| (head, offset))
}

// `+H`, `+HH`, `+HHMM` or `+HH:MM`.
fn offset_seconds(token: &str) -> Option<i32> {
    let sign = match token.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let digits: String = token[1..].chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    Some(sign * (hours * 3600 + minutes * 60))
}

fn from_timestamp(ts: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .ok_or_else(|| ModelError::InvalidDateTime(ts.to_string()))
}

// Ambiguous local times (DST fold) resolve to the earlier instant.
fn local_to_utc(dt: &NaiveDateTime) -> Result<DateTime<Utc>> {
    Local
        .from_local_datetime(dt)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| ModelError::InvalidDateTime(dt.to_string()))
}
