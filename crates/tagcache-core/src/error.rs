//! Error types for cache operations

use thiserror::Error;

/// Main error type for all cache operations
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Identifier or tag rejected before reaching the store
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Stored record is not an entry of this cache
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Store could not be reached
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Store answered with an error
    #[error("store error: {0}")]
    Store(String),

    /// Store backend has no secondary index support
    #[error("secondary indexes not supported by store: {0}")]
    IndexesUnsupported(String),

    /// Invalid or unknown configuration option
    #[error("configuration error: {0}")]
    Config(String),

    /// Some deletions of a bulk operation failed
    #[error("{operation}: {failed} of {attempted} deletions failed (first error: {first_error})")]
    BulkDelete {
        operation: &'static str,
        failed: usize,
        attempted: usize,
        first_error: String,
    },
}

impl CacheError {
    /// Whether the error was raised by input validation, before any store call
    pub fn is_validation(&self) -> bool {
        matches!(self, CacheError::InvalidArgument(_))
    }

    /// Whether the error comes from the store being unreachable
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheError::StoreUnavailable(_))
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
