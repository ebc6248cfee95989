//! The exposure-source abstraction.
//!
//! Exposures come either from the live observatory database or from a
//! cached table written by an earlier run. Both sit behind
//! [`ExposureSource`] so the loading logic in [`crate::db`] does not care
//! which one it talks to.

pub mod error;

pub use error::{RepositoryError, RepositoryResult};

use crate::db::query::ExposureQuery;
use crate::models::Exposure;

/// Anything that can answer the historical exposure query.
pub trait ExposureSource {
    /// Rows matching `query`, ordered by date.
    fn fetch_exposures(&self, query: &ExposureQuery) -> RepositoryResult<Vec<Exposure>>;

    /// Short human-readable description used in log messages.
    fn describe(&self) -> String;
}
