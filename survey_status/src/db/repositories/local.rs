//! In-memory exposure source.
//!
//! Stores exposures in a `Vec` behind a lock so tests can populate it,
//! simulate connection failures and count how often it was queried.

use std::sync::{Arc, RwLock};

use crate::db::query::ExposureQuery;
use crate::db::repository::{ExposureSource, RepositoryError, RepositoryResult};
use crate::models::Exposure;

/// In-memory exposure source.
///
/// # Example
/// ```
/// use survey_status::db::repositories::LocalRepository;
/// use survey_status::db::{ExposureQuery, ExposureSource};
///
/// let repo = LocalRepository::new();
/// assert!(repo.fetch_exposures(&ExposureQuery::default()).unwrap().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

#[derive(Default)]
struct LocalData {
    exposures: Vec<Exposure>,
    queries: usize,
    unhealthy: bool,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exposures(exposures: Vec<Exposure>) -> Self {
        let repo = Self::new();
        repo.add_exposures(exposures);
        repo
    }

    pub fn add_exposures(&self, exposures: Vec<Exposure>) {
        if let Ok(mut data) = self.data.write() {
            data.exposures.extend(exposures);
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        if let Ok(mut data) = self.data.write() {
            data.unhealthy = !healthy;
        }
    }

    /// Number of times the source has been queried.
    pub fn query_count(&self) -> usize {
        self.data.read().map(|d| d.queries).unwrap_or(0)
    }

    fn lock_error() -> RepositoryError {
        RepositoryError::Poisoned
    }
}

impl ExposureSource for LocalRepository {
    fn fetch_exposures(&self, query: &ExposureQuery) -> RepositoryResult<Vec<Exposure>> {
        let mut data = self.data.write().map_err(|_| Self::lock_error())?;
        data.queries += 1;
        if data.unhealthy {
            return Err(RepositoryError::Connection(
                "Database is not healthy".to_string(),
            ));
        }

        let mut rows: Vec<Exposure> = data
            .exposures
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(rows)
    }

    fn describe(&self) -> String {
        "in-memory exposure store".to_string()
    }
}
