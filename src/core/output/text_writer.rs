//! Plain-text output writer.
//!
//! Each thread renders as its label, a blank line, then one line per message
//! in chronological order. Threads are separated by a line of `+`.

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::error::Result;
use crate::thread::Thread;

/// Line written between consecutive threads.
pub const THREAD_DELIMITER: &str = "++++++++++++++++++++++++++++++++++++++++";

/// Renders one thread.
///
/// Line breaks inside a message body are flattened so every message takes
/// exactly one line.
pub fn thread_to_text(thread: &Thread) -> String {
    let mut out = String::new();
    out.push_str(&thread.label());
    out.push_str("\n\n");
    for message in thread.messages() {
        let line = message.to_string();
        out.push_str(&flatten_line(&line));
        out.push('\n');
    }
    out
}

/// Renders every thread, delimited.
pub fn to_text(threads: &[Thread]) -> String {
    threads
        .iter()
        .map(thread_to_text)
        .collect::<Vec<_>>()
        .join(&format!("{THREAD_DELIMITER}\n"))
}

/// Writes the text rendering of `threads` to `output_path`.
pub fn write_text(threads: &[Thread], output_path: &str) -> Result<()> {
    let mut writer = BufWriter::new(File::create(output_path)?);
    writer.write_all(to_text(threads).as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn flatten_line(line: &str) -> String {
    line.split(['\r', '\n'])
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Direction, Message};
    use chrono::{FixedOffset, TimeZone};

    fn thread(name: &str, address: &str, bodies: &[&str]) -> Thread {
        let utc = FixedOffset::east_opt(0).unwrap();
        let mut thread = Thread::new(Some(name.into()), address);
        for (i, body) in bodies.iter().enumerate() {
            let ts = utc.with_ymd_and_hms(2024, 5, 1, 10, i as u32, 0).unwrap();
            thread.add(Message::new(address, ts, *body, Direction::Received));
        }
        thread
    }

    #[test]
    fn test_thread_to_text() {
        let text = thread_to_text(&thread("Alice", "5551234567", &["one", "two"]));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Alice <5551234567>",
                "",
                "2024-05-01 10:00:00 RECEIVED 5551234567: one",
                "2024-05-01 10:01:00 RECEIVED 5551234567: two",
            ]
        );
    }

    #[test]
    fn test_multiline_body_takes_one_line() {
        let text = thread_to_text(&thread("Alice", "5551234567", &["first\nsecond\r\nthird"]));
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("first second third"));
    }

    #[test]
    fn test_threads_are_delimited() {
        let text = to_text(&[
            thread("Alice", "5551234567", &["hi"]),
            thread("Bob", "5559876543", &["yo"]),
        ]);
        assert_eq!(text.lines().filter(|l| *l == THREAD_DELIMITER).count(), 1);
        assert!(text.starts_with("Alice <5551234567>"));
        assert!(text.contains(&format!("{THREAD_DELIMITER}\nBob <5559876543>")));
    }

    #[test]
    fn test_write_text() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        write_text(&[thread("Alice", "5551234567", &["hi"])], path).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.ends_with("RECEIVED 5551234567: hi\n"));
    }
}
