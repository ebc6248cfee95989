//! Cached exposure table on disk.

use log::info;
use std::path::{Path, PathBuf};

use crate::db::checksum::file_checksum;
use crate::db::query::ExposureQuery;
use crate::db::repository::{ExposureSource, RepositoryError, RepositoryResult};
use crate::models::Exposure;
use crate::parsing::csv_parser::{parse_exposures_csv, write_exposures_csv};

/// Exposure table cached as (optionally gzipped) CSV.
///
/// The cache is a verbatim snapshot of an earlier live query and is never
/// invalidated automatically: the query is not re-applied on read.
#[derive(Debug, Clone)]
pub struct CsvCacheRepository {
    path: PathBuf,
}

impl CsvCacheRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replace the cache with `exposures`.
    pub fn store(&self, exposures: &[Exposure]) -> RepositoryResult<()> {
        write_exposures_csv(&self.path, exposures).map_err(|e| RepositoryError::CacheWrite {
            path: self.path.clone(),
            message: format!("{:#}", e),
        })
    }

    /// SHA-256 of the cache file as stored on disk.
    pub fn checksum(&self) -> RepositoryResult<String> {
        file_checksum(&self.path).map_err(|e| self.unreadable(e))
    }

    fn unreadable(&self, e: anyhow::Error) -> RepositoryError {
        RepositoryError::CacheUnreadable {
            path: self.path.clone(),
            message: format!("{:#}", e),
        }
    }
}

impl ExposureSource for CsvCacheRepository {
    fn fetch_exposures(&self, _query: &ExposureQuery) -> RepositoryResult<Vec<Exposure>> {
        if !self.exists() {
            return Err(RepositoryError::CacheMissing {
                path: self.path.clone(),
            });
        }
        let exposures = parse_exposures_csv(&self.path)
            .map_err(|e| self.unreadable(e))?;
        info!(
            "Exposure cache {} sha256={}",
            self.path.display(),
            self.checksum()?
        );
        Ok(exposures)
    }

    fn describe(&self) -> String {
        format!("exposure cache {}", self.path.display())
    }
}
