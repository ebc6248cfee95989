//! Readers and writers for the tabular survey files.
//!
//! All tables are CSV, optionally gzip-compressed (detected from the file
//! contents, not the name). Column names are matched case-insensitively.
//!
//! - [`csv_parser`]: exposures, field catalog, field status and night windows
//! - [`compression`]: transparent gzip handling
//!
//! # Example
//!
//! ```no_run
//! use survey_status::parsing::csv_parser::parse_exposures_csv;
//! use std::path::Path;
//!
//! let exposures = parse_exposures_csv(Path::new("delve-exposures.csv.gz"))
//!     .expect("Failed to parse exposures");
//! ```

pub mod compression;
pub mod csv_parser;
