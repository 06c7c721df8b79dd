//! Filter threads by date range, direction and contact.
//!
//! This module provides [`FilterConfig`] for defining filter criteria and
//! [`apply_filters`] for filtering thread collections.
//!
//! # Filter Types
//!
//! | Filter | Method | Description |
//! |--------|--------|-------------|
//! | Date from | [`with_date_from`](FilterConfig::with_date_from) | Messages on or after date |
//! | Date to | [`with_date_to`](FilterConfig::with_date_to) | Messages on or before date |
//! | Direction | [`with_direction`](FilterConfig::with_direction) | Sent, received or draft only |
//! | Contact | [`with_contact`](FilterConfig::with_contact) | Threads whose name or address contains a substring |
//!
//! # Examples
//!
//! ```
//! use threadpack::core::filter::{FilterConfig, apply_filters};
//! use threadpack::{Direction, Message, Thread};
//! use chrono::{FixedOffset, TimeZone};
//!
//! # fn main() -> threadpack::Result<()> {
//! let utc = FixedOffset::east_opt(0).unwrap();
//! let mut thread = Thread::new(Some("Alice".into()), "5551234567");
//! thread.add(Message::new(
//!     "5551234567",
//!     utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
//!     "Old",
//!     Direction::Received,
//! ));
//! thread.add(Message::new(
//!     "5551234567",
//!     utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
//!     "New",
//!     Direction::Sent,
//! ));
//!
//! let config = FilterConfig::new().with_date_from("2024-06-01")?;
//! let filtered = apply_filters(vec![thread], &config);
//! assert_eq!(filtered[0].len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Behavior Notes
//!
//! - Date bounds are compared against the message instant in UTC
//! - Contact matching is case-insensitive
//! - Threads left without messages are dropped
//! - Multiple filters are combined with AND logic

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{Result, ThreadpackError};
use crate::message::{Direction, Message};
use crate::thread::Thread;

/// Configuration for filtering threads and their messages.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Include only messages on or after this instant.
    pub after: Option<DateTime<Utc>>,

    /// Include only messages on or before this instant.
    pub before: Option<DateTime<Utc>>,

    /// Include only messages with this direction.
    pub direction: Option<Direction>,

    /// Include only threads whose name or address contains this text.
    pub contact: Option<String>,
}

impl FilterConfig {
    /// Creates a new empty filter configuration.
    ///
    /// No filters are active by default; all threads pass through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the start date filter (inclusive), format `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadpackError::InvalidDate`] if the format is invalid.
    pub fn with_date_from(mut self, date_str: &str) -> Result<Self> {
        self.after = Some(parse_date(date_str)?.and_time(chrono::NaiveTime::MIN).and_utc());
        Ok(self)
    }

    /// Sets the end date filter (inclusive), format `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadpackError::InvalidDate`] if the format is invalid.
    pub fn with_date_to(mut self, date_str: &str) -> Result<Self> {
        let end_of_day = parse_date(date_str)?
            .and_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| ThreadpackError::invalid_date(date_str))?;
        self.before = Some(end_of_day.and_utc());
        Ok(self)
    }

    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Sets the contact filter. Matches the thread's display name or
    /// address, ignoring case.
    #[must_use]
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    /// Sets the start instant directly.
    #[must_use]
    pub fn with_after(mut self, dt: DateTime<Utc>) -> Self {
        self.after = Some(dt);
        self
    }

    /// Sets the end instant directly.
    #[must_use]
    pub fn with_before(mut self, dt: DateTime<Utc>) -> Self {
        self.before = Some(dt);
        self
    }

    /// Returns `true` if any filter is active.
    pub fn is_active(&self) -> bool {
        self.has_message_filter() || self.contact.is_some()
    }

    /// Returns `true` if a per-message filter is active.
    pub fn has_message_filter(&self) -> bool {
        self.after.is_some() || self.before.is_some() || self.direction.is_some()
    }

    fn matches_thread(&self, thread: &Thread) -> bool {
        let Some(needle) = &self.contact else {
            return true;
        };
        let needle = needle.to_lowercase();
        thread.display_name().to_lowercase().contains(&needle)
            || thread.address.to_lowercase().contains(&needle)
    }

    fn matches_message(&self, message: &Message) -> bool {
        let instant = message.timestamp().with_timezone(&Utc);
        if self.after.is_some_and(|after| instant < after) {
            return false;
        }
        if self.before.is_some_and(|before| instant > before) {
            return false;
        }
        self.direction.is_none_or(|d| d == message.direction())
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| ThreadpackError::invalid_date(date_str))
}

/// Filters threads and their messages.
///
/// Threads failing the contact filter are removed, remaining threads keep
/// only matching messages, and threads left empty are dropped. With no
/// active filter the input is returned unchanged.
pub fn apply_filters(threads: Vec<Thread>, config: &FilterConfig) -> Vec<Thread> {
    if !config.is_active() {
        return threads;
    }

    threads
        .into_iter()
        .filter(|thread| config.matches_thread(thread))
        .filter_map(|mut thread| {
            if config.has_message_filter() {
                thread.retain(|m| config.matches_message(m));
            }
            (!thread.is_empty()).then_some(thread)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn make_thread(name: &str, address: &str, messages: &[(&str, Direction)]) -> Thread {
        let mut thread = Thread::new(Some(name.to_string()), address);
        for (day, direction) in messages {
            let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap();
            let ts = FixedOffset::east_opt(0)
                .unwrap()
                .from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap());
            thread.add(Message::new(address, ts, format!("on {day}"), *direction));
        }
        thread
    }

    fn sample() -> Vec<Thread> {
        vec![
            make_thread(
                "Alice",
                "5551234567",
                &[("2024-01-01", Direction::Received), ("2024-06-15", Direction::Sent)],
            ),
            make_thread("Bob", "5559876543", &[("2024-03-01", Direction::Received)]),
        ]
    }

    #[test]
    fn test_no_filters_passthrough() {
        let filtered = apply_filters(sample(), &FilterConfig::new());
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].len(), 2);
    }

    #[test]
    fn test_filter_by_date_after() {
        let config = FilterConfig::new().with_date_from("2024-06-01").unwrap();
        let filtered = apply_filters(sample(), &config);

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].display_name(), "Alice");
        assert_eq!(filtered[0].len(), 1);
    }

    #[test]
    fn test_filter_by_date_before_is_inclusive() {
        let config = FilterConfig::new().with_date_to("2024-03-01").unwrap();
        let filtered = apply_filters(sample(), &config);

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].len(), 1);
        assert_eq!(filtered[1].len(), 1);
    }

    #[test]
    fn test_filter_by_direction() {
        let config = FilterConfig::new().with_direction(Direction::Sent);
        let filtered = apply_filters(sample(), &config);

        assert_eq!(filtered.len(), 1);
        assert!(filtered[0].messages().all(|m| m.direction() == Direction::Sent));
    }

    #[test]
    fn test_filter_by_contact() {
        let by_name = FilterConfig::new().with_contact("BOB");
        assert_eq!(apply_filters(sample(), &by_name)[0].display_name(), "Bob");

        let by_address = FilterConfig::new().with_contact("1234");
        assert_eq!(apply_filters(sample(), &by_address)[0].display_name(), "Alice");
    }

    #[test]
    fn test_invalid_date() {
        let err = FilterConfig::new().with_date_from("15/06/2024").unwrap_err();
        assert!(matches!(err, ThreadpackError::InvalidDate { .. }));
        assert!(FilterConfig::new().with_date_to("2024-13-01").is_err());
    }

    #[test]
    fn test_offset_messages_compare_in_utc() {
        let mut thread = Thread::new(None, "5551234567");
        let plus_five = FixedOffset::east_opt(5 * 3600).unwrap();
        // 2024-06-01 02:00 +05:00 is still May 31 in UTC
        let ts = plus_five.with_ymd_and_hms(2024, 6, 1, 2, 0, 0).unwrap();
        thread.add(Message::new("5551234567", ts, "late", Direction::Sent));

        let config = FilterConfig::new().with_date_from("2024-06-01").unwrap();
        assert!(apply_filters(vec![thread], &config).is_empty());
    }
}
