//! Core data types shared by the loaders, classifier and reporters.
//!
//! - [`exposure`]: one row per telescope exposure
//! - [`field`]: planned sky pointings and their derived completion labels
//! - [`quality`]: per (program, filter) data-quality thresholds
//! - [`time`]: timestamp parsing and observing periods

pub mod exposure;
pub mod field;
pub mod quality;
pub mod time;

pub use exposure::{Exposure, MISSING_METRIC};
pub use field::{DoneFlags, Field, FieldId, LabeledField};
pub use quality::{QualityPolicy, QualityThresholds};
pub use time::{Period, Semester};
