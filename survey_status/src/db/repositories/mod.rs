//! Exposure-source implementations:
//! - `cache`: gzip CSV snapshot written by a previous run
//! - `local`: in-memory source for tests and offline development
//! - `postgres`: live observatory database through Diesel

pub mod cache;
#[cfg(feature = "local-repo")]
pub mod local;
#[cfg(feature = "postgres-repo")]
pub mod postgres;

pub use cache::CsvCacheRepository;
#[cfg(feature = "local-repo")]
pub use local::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use postgres::{PostgresConfig, PostgresRepository};
