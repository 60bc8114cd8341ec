//! In-memory key/value store with secondary indexes

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::trace;

use tagcache_core::{CacheError, IndexEntry, IndexValue, Result, StoreGateway, StoreRecord};

/// Records and index of one bucket
#[derive(Debug, Default)]
struct BucketState {
    /// key -> (record, version)
    records: HashMap<String, (StoreRecord, u64)>,
    /// (field, value) -> keys, ordered so integer ranges are a range scan
    index: BTreeMap<IndexEntry, BTreeSet<String>>,
}

impl BucketState {
    fn unindex(&mut self, key: &str) {
        let Some((record, _)) = self.records.get(key) else {
            return;
        };
        let entries: Vec<IndexEntry> = record.indexes.iter().cloned().collect();
        for entry in entries {
            if let Some(keys) = self.index.get_mut(&entry) {
                keys.remove(key);
                if keys.is_empty() {
                    self.index.remove(&entry);
                }
            }
        }
    }

    fn index_len(&self) -> usize {
        self.index.values().map(BTreeSet::len).sum()
    }
}

/// Injected failures for exercising error paths
#[derive(Debug, Default)]
struct Faults {
    unavailable: AtomicBool,
    failing_deletes: RwLock<HashSet<String>>,
}

/// In-memory store gateway
///
/// Keeps a real secondary index per bucket, so exact and range queries behave
/// like the remote store's. Cloning creates a new handle to the SAME store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    buckets: Arc<DashMap<String, Arc<RwLock<BucketState>>>>,
    faults: Arc<Faults>,
    versions: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket(&self, name: &str) -> Arc<RwLock<BucketState>> {
        self.buckets.entry(name.to_string()).or_default().clone()
    }

    fn check_available(&self) -> Result<()> {
        if self.faults.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::StoreUnavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of records in a bucket
    pub fn len(&self, bucket: &str) -> usize {
        self.bucket(bucket).read().records.len()
    }

    /// Check if a bucket holds no records
    pub fn is_empty(&self, bucket: &str) -> bool {
        self.len(bucket) == 0
    }

    /// Keys of a bucket, sorted
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self.bucket(bucket).read().records.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Total number of `(index entry, key)` associations in a bucket
    pub fn index_len(&self, bucket: &str) -> usize {
        self.bucket(bucket).read().index_len()
    }

    /// Make every call fail with [`CacheError::StoreUnavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make deletions of `key` fail with [`CacheError::Store`]
    pub fn fail_deletes_of(&self, key: impl Into<String>) {
        self.faults.failing_deletes.write().insert(key.into());
    }

    /// Remove all injected failures
    pub fn clear_faults(&self) {
        self.faults.unavailable.store(false, Ordering::SeqCst);
        self.faults.failing_deletes.write().clear();
    }
}

#[async_trait]
impl StoreGateway for MemoryStore {
    async fn get_record(&self, bucket: &str, key: &str) -> Result<Option<StoreRecord>> {
        self.check_available()?;
        let bucket = self.bucket(bucket);
        let state = bucket.read();
        Ok(state.records.get(key).map(|(record, version)| {
            record.clone().with_causal_context(Some(version.to_string()))
        }))
    }

    async fn put_record(&self, bucket: &str, key: &str, record: &StoreRecord) -> Result<()> {
        self.check_available()?;
        let version = self.versions.fetch_add(1, Ordering::SeqCst) + 1;
        let bucket = self.bucket(bucket);
        let mut state = bucket.write();

        state.unindex(key);
        for entry in record.indexes.iter() {
            state
                .index
                .entry(entry.clone())
                .or_default()
                .insert(key.to_string());
        }

        let mut stored = record.clone();
        stored.causal_context = None;
        state.records.insert(key.to_string(), (stored, version));
        trace!(key = %key, version, "memory store put");
        Ok(())
    }

    async fn delete_record(&self, bucket: &str, key: &str) -> Result<()> {
        self.check_available()?;
        if self.faults.failing_deletes.read().contains(key) {
            return Err(CacheError::Store(format!("injected delete failure for '{}'", key)));
        }
        let bucket = self.bucket(bucket);
        let mut state = bucket.write();
        state.unindex(key);
        state.records.remove(key);
        Ok(())
    }

    async fn query_exact(&self, bucket: &str, field: &str, value: &IndexValue) -> Result<Vec<String>> {
        self.check_available()?;
        let bucket = self.bucket(bucket);
        let state = bucket.read();
        let probe = IndexEntry::new(field, value.clone());
        Ok(state
            .index
            .get(&probe)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn query_range(&self, bucket: &str, field: &str, low: i64, high: i64) -> Result<Vec<String>> {
        self.check_available()?;
        if low > high {
            return Ok(Vec::new());
        }
        let bucket = self.bucket(bucket);
        let state = bucket.read();
        let from = IndexEntry::new(field, IndexValue::Int(low));
        let to = IndexEntry::new(field, IndexValue::Int(high));
        let keys: BTreeSet<String> = state
            .index
            .range(from..=to)
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect();
        Ok(keys.into_iter().collect())
    }

    async fn ping(&self) -> Result<()> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagcache_core::IndexSet;

    const BUCKET: &str = "test";

    fn record(payload: &[u8], indexes: Vec<IndexEntry>) -> StoreRecord {
        StoreRecord::new(payload.to_vec(), indexes.into_iter().collect::<IndexSet>())
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        store
            .put_record(BUCKET, "k", &record(b"v", vec![IndexEntry::cache_marker()]))
            .await
            .unwrap();

        let loaded = store.get_record(BUCKET, "k").await.unwrap().unwrap();
        assert_eq!(loaded.payload, b"v".to_vec());
        assert!(loaded.causal_context.is_some());

        store.delete_record(BUCKET, "k").await.unwrap();
        assert!(store.get_record(BUCKET, "k").await.unwrap().is_none());
        assert_eq!(store.index_len(BUCKET), 0);

        // deleting an absent key is fine
        store.delete_record(BUCKET, "k").await.unwrap();
    }

    #[tokio::test]
    async fn test_overwrite_replaces_indexes() {
        let store = MemoryStore::new();
        store
            .put_record(BUCKET, "k", &record(b"v1", vec![IndexEntry::tag("A")]))
            .await
            .unwrap();
        store
            .put_record(BUCKET, "k", &record(b"v2", vec![IndexEntry::tag("B")]))
            .await
            .unwrap();

        let a = store
            .query_exact(BUCKET, "tag_bin", &IndexValue::Bin("A".into()))
            .await
            .unwrap();
        let b = store
            .query_exact(BUCKET, "tag_bin", &IndexValue::Bin("B".into()))
            .await
            .unwrap();
        assert!(a.is_empty());
        assert_eq!(b, vec!["k".to_string()]);
        assert_eq!(store.index_len(BUCKET), 1);
    }

    #[tokio::test]
    async fn test_range_query_is_inclusive_and_field_scoped() {
        let store = MemoryStore::new();
        for (key, ts) in [("a", 10), ("b", 20), ("c", 30)] {
            store
                .put_record(BUCKET, key, &record(b"", vec![IndexEntry::expiration(ts)]))
                .await
                .unwrap();
        }
        store
            .put_record(
                BUCKET,
                "other",
                &record(b"", vec![IndexEntry::new("other_int", IndexValue::Int(15))]),
            )
            .await
            .unwrap();

        let keys = store.query_range(BUCKET, "expiration_int", 0, 20).await.unwrap();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        let keys = store.query_range(BUCKET, "expiration_int", 21, 20).await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_buckets_are_isolated() {
        let store = MemoryStore::new();
        store
            .put_record("one", "k", &record(b"1", vec![IndexEntry::cache_marker()]))
            .await
            .unwrap();

        assert!(store.get_record("two", "k").await.unwrap().is_none());
        assert_eq!(store.len("one"), 1);
        assert!(store.is_empty("two"));
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let err = store.get_record(BUCKET, "k").await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(store.ping().await.is_err());

        store.clear_faults();
        store.fail_deletes_of("k");
        assert!(store.delete_record(BUCKET, "k").await.is_err());
        assert!(store.delete_record(BUCKET, "other").await.is_ok());
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store
            .put_record(BUCKET, "k", &record(b"v", vec![]))
            .await
            .unwrap();
        assert_eq!(handle.keys(BUCKET), vec!["k".to_string()]);
    }
}
