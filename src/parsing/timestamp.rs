//! Timestamp parsing shared by the XML readers.
//!
//! Instants are parsed as UTC and then re-expressed in a fixed offset, so a
//! message's timestamp is not necessarily UTC-normalized when displayed but
//! always compares by instant.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

use crate::config::ParseConfig;
use crate::error::{Result, ThreadpackError};

/// Parses `input` with the configured pattern, interpreted in GMT.
pub fn parse_pattern(input: &str, config: &ParseConfig) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(input.trim(), &config.timestamp_format)
        .map(|naive| naive.and_utc())
        .map_err(|_| ThreadpackError::invalid_timestamp(input, config.timestamp_format.clone()))
}

/// Parses milliseconds since the Unix epoch.
///
/// Backups store `"1705314600000"`-style strings.
pub fn parse_epoch_millis(input: &str) -> Option<DateTime<Utc>> {
    input
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

/// Parses Unix seconds.
pub fn parse_epoch_seconds(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}

/// Accepts either epoch milliseconds or the configured pattern.
pub fn parse_flexible(input: &str, config: &ParseConfig) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return parse_epoch_millis(trimmed).ok_or_else(|| {
            ThreadpackError::invalid_timestamp(input, "milliseconds since 1970-01-01")
        });
    }
    parse_pattern(trimmed, config)
}

/// Re-expresses a UTC instant in `offset`.
pub fn localize(instant: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    instant.with_timezone(&offset)
}
