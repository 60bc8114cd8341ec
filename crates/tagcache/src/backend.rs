//! Tagged, expiring cache backend on top of a secondary-index store
//!
//! Every entry is one store record keyed by its identifier. Tags, expiration
//! and cache membership are written as secondary indexes on that record, so:
//!
//! - `flush` is an exact-match query on the cache marker index,
//! - `flush_by_tag` / `find_identifiers_by_tag` are exact-match queries on the
//!   tag index,
//! - `collect_garbage` is a range query `[0, now)` on the expiration index.
//!
//! The backend keeps no cache state of its own. The read-then-write in `set`
//! is not atomic: concurrent writers of one identifier race at the store and
//! the last write wins. Bulk deletions are not transactional either; an entry
//! written while a flush runs may survive it.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use tagcache_core::{
    CacheBackend, CacheError, CacheMetrics, CacheOperation, Clock, Entry, EntryCodec,
    EntryOptions, IndexFamily, IndexValue, NoopMetrics, RemovalReason, Result, StoreGateway,
    SystemClock, TaggableBackend, CACHE_MARKER_VALUE,
};

use crate::BackendOptions;

/// Cache backend mapping the cache contract onto a [`StoreGateway`]
///
/// Generic over:
/// - `G`: The store gateway (Memory, Riak)
/// - `M`: The metrics collector
/// - `C`: The clock expiration is evaluated against
pub struct TaggedExpiringCacheBackend<G, M = NoopMetrics, C = SystemClock>
where
    G: StoreGateway,
    M: CacheMetrics,
    C: Clock,
{
    gateway: Arc<G>,
    metrics: Arc<M>,
    clock: Arc<C>,
    codec: EntryCodec,
    options: BackendOptions,
}

// Constructors for default metrics/clock
impl<G: StoreGateway> TaggedExpiringCacheBackend<G, NoopMetrics, SystemClock> {
    /// Create a backend owning `gateway`
    pub fn new(gateway: G, options: BackendOptions) -> Result<Self> {
        Self::with_shared_gateway(Arc::new(gateway), options)
    }

    /// Create a backend on a gateway shared with other caches
    pub fn with_shared_gateway(gateway: Arc<G>, options: BackendOptions) -> Result<Self> {
        Self::with_metrics_and_clock(gateway, NoopMetrics, SystemClock, options)
    }
}

#[cfg(feature = "riak")]
impl TaggedExpiringCacheBackend<tagcache_storage::RiakGateway, NoopMetrics, SystemClock> {
    /// Connect to the Riak node named in `options` and check it answers
    pub async fn connect(options: BackendOptions) -> Result<Self> {
        options.validate()?;
        let gateway = tagcache_storage::RiakGateway::new(options.riak_config())?;
        gateway.ping().await?;
        info!(
            host = %options.hostname,
            port = options.port,
            bucket = %options.bucket_name,
            "connected tagcache backend to riak"
        );
        Self::new(gateway, options)
    }
}

// Full generic implementation
impl<G, M, C> TaggedExpiringCacheBackend<G, M, C>
where
    G: StoreGateway,
    M: CacheMetrics,
    C: Clock,
{
    /// Create a backend with custom metrics and clock
    pub fn with_metrics_and_clock(
        gateway: Arc<G>,
        metrics: M,
        clock: C,
        options: BackendOptions,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            gateway,
            metrics: Arc::new(metrics),
            clock: Arc::new(clock),
            codec: EntryCodec::new(options.zero_lifetime),
            options,
        })
    }

    /// Bucket holding this cache's entries
    pub fn bucket(&self) -> &str {
        &self.options.bucket_name
    }

    /// The backend configuration
    pub fn options(&self) -> &BackendOptions {
        &self.options
    }

    /// The underlying store gateway
    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Check that the store is reachable
    pub async fn ping(&self) -> Result<()> {
        self.gateway.ping().await
    }

    /// Load the full entry (payload, tags, expiration) without expiring it
    pub async fn entry(&self, identifier: &str) -> Result<Option<Entry>> {
        EntryCodec::validate_identifier(identifier)?;
        match self.gateway.get_record(self.bucket(), identifier).await? {
            Some(record) => Ok(Some(EntryCodec::decode(identifier, record)?)),
            None => Ok(None),
        }
    }

    /// Load a live entry, deleting it if it has expired
    async fn load_live(&self, identifier: &str) -> Result<Option<Entry>> {
        let Some(entry) = self.entry(identifier).await? else {
            return Ok(None);
        };

        let now = self.clock.now();
        if entry.is_expired_at(now) {
            debug!(
                identifier = %identifier,
                expires_at = entry.expires_at,
                now,
                "dropping expired entry on read"
            );
            self.gateway.delete_record(self.bucket(), identifier).await?;
            self.metrics.record_removal(RemovalReason::Expired, 1);
            return Ok(None);
        }

        Ok(Some(entry))
    }

    /// Delete every key, continuing past failures
    ///
    /// Returns the number of successful deletions, or a
    /// [`CacheError::BulkDelete`] summarizing the failures once every key
    /// has been attempted.
    async fn delete_all(
        &self,
        operation: CacheOperation,
        reason: RemovalReason,
        keys: Vec<String>,
    ) -> Result<u64> {
        let attempted = keys.len();
        let gateway = &self.gateway;
        let bucket = self.bucket();

        let results: Vec<(String, Result<()>)> = stream::iter(keys)
            .map(move |key| async move {
                let result = gateway.delete_record(bucket, &key).await;
                (key, result)
            })
            .buffer_unordered(self.options.delete_concurrency)
            .collect()
            .await;

        let mut deleted = 0u64;
        let mut failed = 0usize;
        let mut first_error: Option<CacheError> = None;
        for (key, result) in results {
            match result {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!(
                        operation = operation.as_str(),
                        identifier = %key,
                        error = %e,
                        "bulk delete of entry failed, continuing"
                    );
                    self.metrics.record_delete_failure(operation, &key);
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        self.metrics.record_removal(reason, deleted);

        match first_error {
            Some(e) => Err(CacheError::BulkDelete {
                operation: operation.as_str(),
                failed,
                attempted,
                first_error: e.to_string(),
            }),
            None => Ok(deleted),
        }
    }

    /// Record latency and the summary of a bulk operation, failed or not
    fn finish_bulk(
        &self,
        operation: CacheOperation,
        matched: usize,
        start: Instant,
        result: Result<u64>,
    ) -> Result<u64> {
        self.metrics.record_latency(operation, start.elapsed());
        match &result {
            Ok(deleted) => info!(
                bucket = %self.bucket(),
                operation = operation.as_str(),
                matched,
                deleted,
                "bulk removal finished"
            ),
            Err(e) => warn!(
                bucket = %self.bucket(),
                operation = operation.as_str(),
                matched,
                error = %e,
                "bulk removal finished with failures"
            ),
        }
        result
    }
}

#[async_trait]
impl<G, M, C> CacheBackend for TaggedExpiringCacheBackend<G, M, C>
where
    G: StoreGateway,
    M: CacheMetrics,
    C: Clock,
{
    async fn set(&self, identifier: &str, payload: Vec<u8>, options: &EntryOptions) -> Result<()> {
        let start = Instant::now();
        let lifetime = options
            .lifetime
            .or_else(|| self.options.default_lifetime_duration());

        // Validation happens here, before any store call
        let encoded = self.codec.encode(
            identifier,
            payload,
            &options.tags,
            lifetime,
            self.clock.now(),
        )?;
        self.gateway.check_indexes(&encoded.record.indexes)?;

        let existing = self.gateway.get_record(self.bucket(), &encoded.key).await?;
        let replaced = existing.is_some();
        let record = encoded
            .record
            .with_causal_context(existing.and_then(|r| r.causal_context));

        self.gateway
            .put_record(self.bucket(), &encoded.key, &record)
            .await?;

        debug!(
            identifier = %identifier,
            tags = options.tags.len(),
            replaced,
            "cache entry stored"
        );
        self.metrics
            .record_latency(CacheOperation::Set, start.elapsed());
        Ok(())
    }

    async fn get(&self, identifier: &str) -> Result<Option<Vec<u8>>> {
        let start = Instant::now();
        let result = match self.load_live(identifier).await? {
            Some(entry) => {
                self.metrics.record_hit(identifier);
                Some(entry.payload)
            }
            None => {
                self.metrics.record_miss(identifier);
                None
            }
        };

        self.metrics
            .record_latency(CacheOperation::Get, start.elapsed());
        Ok(result)
    }

    async fn has(&self, identifier: &str) -> Result<bool> {
        let start = Instant::now();
        let exists = if self.options.check_expiry_on_has {
            self.load_live(identifier).await?.is_some()
        } else {
            EntryCodec::validate_identifier(identifier)?;
            self.gateway
                .get_record(self.bucket(), identifier)
                .await?
                .is_some()
        };

        self.metrics
            .record_latency(CacheOperation::Has, start.elapsed());
        Ok(exists)
    }

    async fn remove(&self, identifier: &str) -> Result<bool> {
        let start = Instant::now();
        EntryCodec::validate_identifier(identifier)?;

        let existed = self
            .gateway
            .get_record(self.bucket(), identifier)
            .await?
            .is_some();
        if existed {
            self.gateway.delete_record(self.bucket(), identifier).await?;
            self.metrics.record_removal(RemovalReason::Removed, 1);
        }

        self.metrics
            .record_latency(CacheOperation::Remove, start.elapsed());
        Ok(existed)
    }

    async fn flush(&self) -> Result<u64> {
        let start = Instant::now();
        let keys = self
            .gateway
            .query_exact(
                self.bucket(),
                IndexFamily::CacheMarker.field(),
                &IndexValue::Int(CACHE_MARKER_VALUE),
            )
            .await?;

        let matched = keys.len();
        let result = self
            .delete_all(CacheOperation::Flush, RemovalReason::Flushed, keys)
            .await;
        self.finish_bulk(CacheOperation::Flush, matched, start, result)
    }

    async fn collect_garbage(&self) -> Result<u64> {
        let start = Instant::now();
        let now = self.clock.now();

        // Store ranges are inclusive, so [0, now) is 0..=now-1
        let keys = if now > 0 {
            self.gateway
                .query_range(self.bucket(), IndexFamily::Expiration.field(), 0, now - 1)
                .await?
        } else {
            Vec::new()
        };

        let matched = keys.len();
        debug!(bucket = %self.bucket(), now, matched, "collecting expired entries");
        let result = self
            .delete_all(CacheOperation::CollectGarbage, RemovalReason::Collected, keys)
            .await;
        self.finish_bulk(CacheOperation::CollectGarbage, matched, start, result)
    }
}

#[async_trait]
impl<G, M, C> TaggableBackend for TaggedExpiringCacheBackend<G, M, C>
where
    G: StoreGateway,
    M: CacheMetrics,
    C: Clock,
{
    async fn find_identifiers_by_tag(&self, tag: &str) -> Result<Vec<String>> {
        let start = Instant::now();
        EntryCodec::validate_tag(tag)?;

        let identifiers = self
            .gateway
            .query_exact(
                self.bucket(),
                IndexFamily::Tag.field(),
                &IndexValue::Bin(tag.to_string()),
            )
            .await?;

        self.metrics
            .record_latency(CacheOperation::FindByTag, start.elapsed());
        Ok(identifiers)
    }

    async fn flush_by_tag(&self, tag: &str) -> Result<u64> {
        let start = Instant::now();
        EntryCodec::validate_tag(tag)?;

        let keys = self
            .gateway
            .query_exact(
                self.bucket(),
                IndexFamily::Tag.field(),
                &IndexValue::Bin(tag.to_string()),
            )
            .await?;

        let matched = keys.len();
        debug!(bucket = %self.bucket(), tag = %tag, matched, "flushing tagged entries");
        let result = self
            .delete_all(CacheOperation::FlushByTag, RemovalReason::TagFlushed, keys)
            .await;
        self.finish_bulk(CacheOperation::FlushByTag, matched, start, result)
    }
}

impl<G, M, C> Clone for TaggedExpiringCacheBackend<G, M, C>
where
    G: StoreGateway,
    M: CacheMetrics,
    C: Clock,
{
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            metrics: self.metrics.clone(),
            clock: self.clock.clone(),
            codec: self.codec,
            options: self.options.clone(),
        }
    }
}
