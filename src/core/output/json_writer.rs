//! JSON output writer.

use std::fs::File;
use std::io::Write;

use crate::error::Result;
use crate::thread::Thread;

/// Writes threads to a JSON file as a pretty-printed array.
///
/// # Format
/// ```json
/// [
///   {
///     "name": "Alice",
///     "address": "5551234567",
///     "messages": [
///       {"address": "5551234567", "timestamp": "2024-06-15T12:30:00-05:00",
///        "body": "Hi", "direction": "RECEIVED", "kind": "plain"}
///     ]
///   }
/// ]
/// ```
pub fn write_json(threads: &[Thread], output_path: &str) -> Result<()> {
    let json = to_json(threads)?;
    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

/// Converts threads to a JSON string.
pub fn to_json(threads: &[Thread]) -> Result<String> {
    Ok(serde_json::to_string_pretty(threads)?)
}
