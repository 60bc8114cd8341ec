//! Store gateway trait

use async_trait::async_trait;
use crate::{CacheError, IndexSet, IndexValue, StoreRecord};

/// Client contract of a key/value store with secondary indexes
///
/// Every call is one independent request/response round-trip. Records live
/// in buckets; each record carries a full index set that is replaced on
/// every write.
#[async_trait]
pub trait StoreGateway: Send + Sync + 'static {
    /// Read a record, `None` if absent
    async fn get_record(&self, bucket: &str, key: &str) -> Result<Option<StoreRecord>, CacheError>;

    /// Write a record, overwriting payload and all indexes
    async fn put_record(&self, bucket: &str, key: &str, record: &StoreRecord) -> Result<(), CacheError>;

    /// Delete a record; deleting an absent key is not an error
    async fn delete_record(&self, bucket: &str, key: &str) -> Result<(), CacheError>;

    /// Keys whose index `field` holds exactly `value`
    async fn query_exact(
        &self,
        bucket: &str,
        field: &str,
        value: &IndexValue,
    ) -> Result<Vec<String>, CacheError>;

    /// Keys whose integer index `field` holds a value in `low..=high`
    async fn query_range(
        &self,
        bucket: &str,
        field: &str,
        low: i64,
        high: i64,
    ) -> Result<Vec<String>, CacheError>;

    /// Reject an index set the store cannot represent
    ///
    /// Runs before any round-trip of a write.
    fn check_indexes(&self, _indexes: &IndexSet) -> Result<(), CacheError> {
        Ok(())
    }

    /// Check that the store is reachable
    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
