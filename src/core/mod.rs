//! Post-import processing.
//!
//! This module contains:
//! - [`filter`] - Thread filtering by date, direction and contact
//! - [`processor`] - Import statistics
//! - [`output`] - Export writers (text, CSV, JSON)
//!
//! # Quick Start
//!
//! ```rust
//! use threadpack::core::{FilterConfig, ImportStats, apply_filters, to_text};
//! ```

pub mod filter;
pub mod output;
pub mod processor;

pub use filter::{FilterConfig, apply_filters};
pub use processor::ImportStats;

#[cfg(feature = "csv-output")]
pub use output::{to_csv, write_csv};
#[cfg(feature = "json-output")]
pub use output::{to_json, write_json};
pub use output::{thread_to_text, to_text, write_text};
