//! CSV output writer.

use std::fs::File;

use crate::error::Result;
use crate::thread::Thread;

const HEADER: [&str; 5] = ["Thread", "Address", "Timestamp", "Direction", "Body"];

/// Writes one row per message with semicolon delimiter.
///
/// # Format
/// - Delimiter: `;`
/// - Columns: `Thread`, `Address`, `Timestamp`, `Direction`, `Body`
/// - Timestamps in RFC 3339 with the message's own offset
pub fn write_csv(threads: &[Thread], output_path: &str) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(file);
    write_rows(&mut writer, threads)?;
    writer.flush()?;
    Ok(())
}

/// Same rows as [`write_csv`], returned as a string.
pub fn to_csv(threads: &[Thread]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(Vec::new());
    write_rows(&mut writer, threads)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| crate::error::ThreadpackError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

fn write_rows<W: std::io::Write>(writer: &mut csv::Writer<W>, threads: &[Thread]) -> Result<()> {
    writer.write_record(HEADER)?;
    for thread in threads {
        let label = thread.label();
        for message in thread.messages() {
            writer.write_record([
                label.as_str(),
                message.address(),
                message.timestamp().to_rfc3339().as_str(),
                message.direction().as_str(),
                message.body(),
            ])?;
        }
    }
    Ok(())
}
