//! Error types for exposure sources.

use std::path::PathBuf;

/// Result type for exposure-source operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Failures raised while fetching or caching exposures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The live source could not be reached or reported itself unhealthy.
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Exposure query failed: {0}")]
    Query(String),

    /// A live row could not be turned into an exposure.
    #[error("Invalid exposure at row {row}: {message}")]
    InvalidRow { row: usize, message: String },

    #[error("No exposure cache at {}", path.display())]
    CacheMissing { path: PathBuf },

    /// The cache exists but could not be read, parsed or hashed.
    #[error("Unreadable exposure cache {}: {message}", path.display())]
    CacheUnreadable { path: PathBuf, message: String },

    #[error("Failed to write exposure cache {}: {message}", path.display())]
    CacheWrite { path: PathBuf, message: String },

    /// Neither a cache nor a live source is available, or the live source
    /// settings are incomplete.
    #[error("No usable exposure source: {0}")]
    Unconfigured(String),

    #[error("Exposure source lock poisoned")]
    Poisoned,
}
