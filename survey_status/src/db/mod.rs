//! Exposure loading.
//!
//! ```text
//!           load_exposures
//!                 │
//!     ┌───────────┴────────────┐
//!     │ cache present?         │
//! ┌───▼──────────────┐  ┌──────▼─────────────────┐
//! │ CsvCacheRepository│  │ live ExposureSource    │
//! │ (gzip CSV)        │  │ (Postgres / in-memory) │
//! └───────────────────┘  └──────┬─────────────────┘
//!                               │ result written to cache
//! ```
//!
//! The cache always wins when it exists; it is never refreshed
//! automatically. Delete it to force a new query.

pub mod checksum;
pub mod query;
pub mod repositories;
pub mod repository;

pub use query::ExposureQuery;
pub use repositories::CsvCacheRepository;
pub use repository::{ExposureSource, RepositoryError, RepositoryResult};

use log::{info, warn};

use crate::models::Exposure;

/// Read exposures from `cache` if it exists, otherwise from `live`,
/// writing the live result to `cache`.
///
/// Live failures are propagated unchanged; there is no retry.
pub fn load_exposures(
    cache: &CsvCacheRepository,
    live: Option<&dyn ExposureSource>,
    query: &ExposureQuery,
) -> RepositoryResult<Vec<Exposure>> {
    if cache.exists() {
        info!("Reading exposures from {}", cache.describe());
        return cache.fetch_exposures(query);
    }

    let live = live.ok_or_else(|| {
        RepositoryError::Unconfigured(format!(
            "No exposure cache at {} and no live database configured",
            cache.path().display()
        ))
    })?;
    info!("Querying {}", live.describe());
    let exposures = live.fetch_exposures(query)?;
    if exposures.is_empty() {
        warn!("Exposure query returned no rows");
    }

    info!("Writing exposures to {}", cache.path().display());
    cache.store(&exposures)?;
    Ok(exposures)
}

/// Live exposure source for the enabled backend, if one can be configured.
pub fn live_source() -> Option<Box<dyn ExposureSource>> {
    #[cfg(feature = "postgres-repo")]
    {
        match repositories::PostgresRepository::from_env() {
            Ok(repo) => return Some(Box::new(repo)),
            Err(e) => warn!("Live database unavailable: {}", e),
        }
    }
    None
}

#[cfg(all(test, feature = "local-repo"))]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::models::exposure::test_support::exposure;
    use tempfile::tempdir;

    fn rows() -> Vec<Exposure> {
        vec![
            exposure("DELVE field: 1-01-g", "delve-wide", "g", 0.5, 1.0),
            exposure("DELVE field: 2-01-i", "delve-wide", "i", -1.0, 1.2),
        ]
    }

    #[test]
    fn test_live_result_is_cached() {
        let dir = tempdir().unwrap();
        let cache = CsvCacheRepository::new(dir.path().join("exposures.csv.gz"));
        let live = LocalRepository::with_exposures(rows());
        let source: &dyn ExposureSource = &live;

        let first = load_exposures(&cache, Some(source), &ExposureQuery::default()).unwrap();
        assert_eq!(first.len(), 2);
        assert!(cache.exists());
        assert_eq!(live.query_count(), 1);

        let second = load_exposures(&cache, Some(source), &ExposureQuery::default()).unwrap();
        assert_eq!(second, first);
        assert_eq!(live.query_count(), 1);
    }

    #[test]
    fn test_live_failure_propagates_and_leaves_no_cache() {
        let dir = tempdir().unwrap();
        let cache = CsvCacheRepository::new(dir.path().join("exposures.csv.gz"));
        let live = LocalRepository::with_exposures(rows());
        live.set_healthy(false);
        let source: &dyn ExposureSource = &live;

        let err = load_exposures(&cache, Some(source), &ExposureQuery::default()).unwrap_err();
        assert!(matches!(err, RepositoryError::Connection(_)));
        assert!(!cache.exists());
    }

    #[test]
    fn test_no_cache_and_no_live_source() {
        let dir = tempdir().unwrap();
        let cache = CsvCacheRepository::new(dir.path().join("exposures.csv.gz"));
        let err = load_exposures(&cache, None, &ExposureQuery::default()).unwrap_err();
        assert!(matches!(err, RepositoryError::Unconfigured(_)));
    }
}
