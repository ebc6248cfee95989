//! Survey progress tracking.
//!
//! Decides which planned survey fields have been adequately observed,
//! tabulates progress per (program, band) and renders coverage and
//! observing-time charts.
//!
//! - [`models`]: exposures, fields, quality thresholds, periods
//! - [`services`]: pure classification and aggregation
//! - [`parsing`]: CSV / gzip readers and writers
//! - [`db`]: exposure sources and the cache-first loader
//! - [`config`]: `survey.toml`
//! - [`pipeline`]: the batch steps run by the `survey-status` binary
//! - `plotting` (feature `plots`): SVG/PNG charts

pub mod config;
pub mod db;
pub mod models;
pub mod parsing;
pub mod pipeline;
#[cfg(feature = "plots")]
pub mod plotting;
pub mod services;

pub use config::SurveyConfig;
pub use models::{Exposure, Field, LabeledField, QualityPolicy};
pub use services::{StatusError, StatusResult};
