//! Timestamp formatting and parsing.
//!
//! Timestamps are stored as naive wall-clock text (`YYYY-MM-DD HH:MM:SS`).
//! Older databases contain a handful of other spellings, which
//! [`parse_stored`] accepts.

use chrono::{DateTime, NaiveDateTime};

use crate::error::{ParseError, Result};

/// Canonical storage and export format.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats accepted by CSV import, in order of preference.
const CSV_FORMATS: &[&str] = &[CANONICAL_FORMAT, "%Y/%m/%d %H:%M"];

/// Formats found in stored rows, including those written by legacy builds.
const STORED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Format a timestamp in the canonical form.
pub fn format_canonical(value: &NaiveDateTime) -> String {
    value.format(CANONICAL_FORMAT).to_string()
}

/// Parse a timestamp read back from the database.
///
/// RFC 3339 values keep their wall-clock part; the offset is dropped so the
/// result agrees with the textual year/month used by the SQL filters.
pub fn parse_stored(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    for format in STORED_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.naive_local());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }
    Err(ParseError::BadDateFormat {
        value: value.to_string(),
    })
}

/// Parse a played-date cell from an imported CSV file.
pub fn parse_csv(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    CSV_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| ParseError::BadDateFormat {
            value: value.to_string(),
        })
}

/// Parse a played date supplied by a JSON record: the stored spellings plus
/// the slash form used by CSV files.
pub fn parse_lenient(value: &str) -> Result<NaiveDateTime> {
    parse_stored(value).or_else(|_| parse_csv(value))
}
