//! Edge case tests for threadpack
//!
//! These tests cover boundary conditions of the readers and the message
//! model that the per-module unit tests do not reach.

use chrono::{FixedOffset, TimeZone};
use threadpack::mms::{Charset, ContentKind, RawPart, build_part};
use threadpack::prelude::*;
use threadpack::thread::format_address;

fn at(hour: u32, minute: u32) -> chrono::DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 1, 15, hour, minute, 0)
        .unwrap()
}

// =========================================================================
// Threads and labels
// =========================================================================

#[test]
fn test_label_collision_merges_threads() {
    let mut first = Thread::new(Some("Ann".into()), "+1 555 010 0200");
    first.add(Message::new("+1 555 010 0200", at(10, 0), "one", Direction::Sent));
    let mut second = Thread::new(Some("Ann".into()), "+1-555-010-0200");
    second.add(Message::new("+1-555-010-0200", at(10, 1), "two", Direction::Sent));

    let collection: ThreadCollection = [first, second].into_iter().collect();
    assert_eq!(collection.len(), 1);
    assert_eq!(collection.message_count(), 2);
}

#[test]
fn test_same_address_different_names_stay_apart() {
    let collection: ThreadCollection = [
        Thread::new(Some("Ann".into()), "5550100200"),
        Thread::new(Some("Annie".into()), "5550100200"),
    ]
    .into_iter()
    .collect();
    assert_eq!(collection.len(), 2);
}

#[test]
fn test_placeholder_names_are_no_name() {
    for name in ["", "  ", "(Unknown)", "null", "NULL"] {
        let thread = Thread::new(Some(name.to_string()), "1");
        assert_eq!(thread.name, None, "{name:?} should not name a thread");
        assert_eq!(thread.display_name(), "(Unknown)");
    }
}

#[test]
fn test_format_address_keeps_non_numbers() {
    assert_eq!(format_address(" ann.w "), "ann.w");
    assert_eq!(format_address("ann@example.com"), "ann@example.com");
    assert_eq!(format_address("(555) 010.0200"), "5550100200");
    assert_eq!(format_address("*86#"), "*86#");
}

// =========================================================================
// Message identity
// =========================================================================

#[test]
fn test_duplicate_messages_collapse() {
    let mut thread = Thread::new(None, "1");
    assert!(thread.add(Message::new("1", at(9, 0), "same", Direction::Received)));
    assert!(!thread.add(Message::new("1", at(9, 0), "same", Direction::Received)));
    assert!(thread.add(Message::new("1", at(9, 0), "same", Direction::Sent)));
    assert_eq!(thread.len(), 2);
}

#[test]
fn test_same_instant_in_other_offset_is_equal() {
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    let local = plus_two.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
    let a = Message::new("1", at(10, 0), "x", Direction::Sent);
    let b = Message::new("1", local, "x", Direction::Sent);
    assert_eq!(a, b);
}

#[test]
fn test_messages_sorted_by_time_not_insertion() {
    let mut thread = Thread::new(None, "1");
    thread.add(Message::new("1", at(12, 0), "late", Direction::Sent));
    thread.add(Message::new("1", at(8, 0), "early", Direction::Sent));
    let bodies: Vec<_> = thread.messages().map(Message::body).collect();
    assert_eq!(bodies, ["early", "late"]);
}

// =========================================================================
// Parts
// =========================================================================

#[test]
fn test_utf16_text_part() {
    let raw = RawPart {
        content_type: Some("text/plain".into()),
        charset: Some("1015".into()),
        encoding: Some("base64".into()),
        // BOM (little-endian) + "hi"
        payload: "//5oAGkA".into(),
        ..RawPart::default()
    };
    let part = build_part(&raw, Charset::Utf8).unwrap().unwrap();
    assert_eq!(part.text(), Some("hi"));
    assert_eq!(part.charset, Charset::Utf16);
}

#[test]
fn test_audio_and_video_parts_have_no_representation() {
    for content_type in ["audio/amr", "video/3gpp"] {
        let raw = RawPart {
            content_type: Some(content_type.into()),
            encoding: Some("base64".into()),
            payload: "AAEC".into(),
            ..RawPart::default()
        };
        assert!(ContentKind::resolve(content_type).is_some());
        assert!(build_part(&raw, Charset::Utf8).unwrap().is_none());
    }
}

#[test]
fn test_unsupported_charset_is_an_error() {
    let raw = RawPart {
        content_type: Some("text/plain".into()),
        charset: Some("koi8-r".into()),
        payload: "x".into(),
        ..RawPart::default()
    };
    let err = build_part(&raw, Charset::Utf8).unwrap_err();
    assert!(err.is_record_level());
}

// =========================================================================
// Readers
// =========================================================================

#[test]
fn test_full_backup_empty_thread_and_backup() {
    let mut reader = FullBackupReader::new();
    let summary = reader.load_str("<backup/>").unwrap();
    assert_eq!(summary.threads, 0);

    let summary = reader.load_str(r#"<backup><thread address="1"/></backup>"#).unwrap();
    assert_eq!(summary.threads, 1);
    assert_eq!(summary.messages, 0);
}

#[test]
fn test_full_backup_missing_date_is_skipped() {
    let mut reader = FullBackupReader::new();
    let summary = reader
        .load_str(
            r#"<backup><thread address="1">
                <sms type="sent">no date</sms>
                <sms type="sent" date="2024-01-15T10:00:00.000Z">dated</sms>
            </thread></backup>"#,
        )
        .unwrap();
    assert_eq!(summary.messages, 1);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn test_full_backup_sms_address_overrides_thread() {
    let mut reader = FullBackupReader::new();
    reader
        .load_str(
            r#"<backup><thread address="+15550100200;+15550100300">
                <sms type="received" address="+15550100300" date="2024-01-15T10:00:00.000Z">from member</sms>
            </thread></backup>"#,
        )
        .unwrap();
    let message = reader.threads()[0].messages().next().unwrap();
    assert_eq!(message.address(), "+15550100300");
}

#[test]
fn test_sms_backup_missing_address_skipped() {
    let mut reader = SmsBackupReader::new();
    let summary = reader
        .load_str(
            r#"<smses>
                <sms date="1705312800000" type="1" body="who?"/>
                <sms address="null" date="1705312800000" type="1" body="nobody"/>
                <sms address="1" date="1705312800000" type="1" body="kept"/>
            </smses>"#,
        )
        .unwrap();
    assert_eq!(summary.messages, 1);
    assert_eq!(summary.skipped, 2);
}

#[test]
fn test_sms_backup_bad_date_skipped() {
    let mut reader = SmsBackupReader::new();
    let summary = reader
        .load_str(
            r#"<smses>
                <sms address="1" date="yesterday" type="1" body="bad"/>
                <sms address="1" date="1705312800000" type="1" body="good"/>
            </smses>"#,
        )
        .unwrap();
    assert_eq!(summary.messages, 1);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn test_sms_backup_entities_in_body() {
    let mut reader = SmsBackupReader::new();
    reader
        .load_str(r#"<smses><sms address="1" date="1705312800000" type="2" body="a &amp; b &lt;3&#10;bye"/></smses>"#)
        .unwrap();
    let message = reader.threads()[0].messages().next().unwrap();
    assert_eq!(message.body(), "a & b <3\nbye");
}

#[test]
fn test_sms_backup_empty_root() {
    let mut reader = SmsBackupReader::new();
    let summary = reader.load_str(r#"<smses count="0"></smses>"#).unwrap();
    assert_eq!(summary, ImportSummary::default());
}

#[test]
fn test_failed_load_str_clears_previous_threads() {
    let mut reader = SmsBackupReader::new();
    reader
        .load_str(r#"<smses><sms address="1" date="1705312800000" type="1" body="x"/></smses>"#)
        .unwrap();
    assert_eq!(reader.message_count(), 1);

    assert!(reader.load_str("<smses><sms").is_err());
    assert!(reader.threads().is_empty());
    assert_eq!(reader.message_count(), 0);
}

// =========================================================================
// Filters
// =========================================================================

#[test]
fn test_filter_invalid_date_rejected() {
    assert!(FilterConfig::new().with_date_from("2024-02-30").is_err());
    assert!(FilterConfig::new().with_date_to("").is_err());
}

#[test]
fn test_filter_drops_threads_left_empty() {
    let mut thread = Thread::new(None, "1");
    thread.add(Message::new("1", at(9, 0), "in", Direction::Received));
    let filtered = apply_filters(vec![thread], &FilterConfig::new().with_direction(Direction::Draft));
    assert!(filtered.is_empty());
}
