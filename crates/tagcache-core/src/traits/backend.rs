//! Cache backend trait

use async_trait::async_trait;
use crate::{CacheError, EntryOptions};

/// The cache contract every backend implements
///
/// Identifiers are opaque, non-empty strings; invalid identifiers fail with
/// [`CacheError::InvalidArgument`] before the store is touched.
#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    /// Store `payload` under `identifier`, replacing payload, tags and
    /// expiration of any previous entry
    async fn set(
        &self,
        identifier: &str,
        payload: Vec<u8>,
        options: &EntryOptions,
    ) -> Result<(), CacheError>;

    /// Load the payload stored under `identifier`
    ///
    /// Returns `None` if the entry doesn't exist or has expired. Expired
    /// entries are deleted on the way out.
    async fn get(&self, identifier: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Check if an entry exists
    async fn has(&self, identifier: &str) -> Result<bool, CacheError>;

    /// Remove an entry
    ///
    /// Returns `true` if the entry existed and was deleted.
    async fn remove(&self, identifier: &str) -> Result<bool, CacheError>;

    /// Remove every entry of this cache
    ///
    /// Returns the number of deleted entries.
    async fn flush(&self) -> Result<u64, CacheError>;

    /// Remove every entry whose expiration has passed
    ///
    /// Returns the number of deleted entries.
    async fn collect_garbage(&self) -> Result<u64, CacheError>;
}

/// Extended trait for backends that support tag-based operations
#[async_trait]
pub trait TaggableBackend: CacheBackend {
    /// Identifiers of all entries carrying `tag`, in no particular order
    async fn find_identifiers_by_tag(&self, tag: &str) -> Result<Vec<String>, CacheError>;

    /// Remove every entry carrying `tag`
    ///
    /// Returns the number of deleted entries.
    async fn flush_by_tag(&self, tag: &str) -> Result<u64, CacheError>;
}
