//! Metrics trait for cache observability

use std::time::Duration;

/// Cache operation for latency tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheOperation {
    Set,
    Get,
    Has,
    Remove,
    FindByTag,
    Flush,
    FlushByTag,
    CollectGarbage,
}

impl CacheOperation {
    /// Get operation as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOperation::Set => "set",
            CacheOperation::Get => "get",
            CacheOperation::Has => "has",
            CacheOperation::Remove => "remove",
            CacheOperation::FindByTag => "find_by_tag",
            CacheOperation::Flush => "flush",
            CacheOperation::FlushByTag => "flush_by_tag",
            CacheOperation::CollectGarbage => "collect_garbage",
        }
    }
}

/// Why entries left the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalReason {
    /// Explicit `remove`
    Removed,
    /// Found expired on read
    Expired,
    /// Deleted by `flush`
    Flushed,
    /// Deleted by `flush_by_tag`
    TagFlushed,
    /// Deleted by `collect_garbage`
    Collected,
}

impl RemovalReason {
    /// Get reason as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::Removed => "removed",
            RemovalReason::Expired => "expired",
            RemovalReason::Flushed => "flushed",
            RemovalReason::TagFlushed => "tag_flushed",
            RemovalReason::Collected => "collected",
        }
    }
}

/// Trait for cache metrics/observability
///
/// Implement this to integrate with your metrics system (Prometheus, StatsD, etc.)
pub trait CacheMetrics: Send + Sync + 'static {
    /// Record a cache hit
    fn record_hit(&self, identifier: &str);

    /// Record a cache miss
    fn record_miss(&self, identifier: &str);

    /// Record operation latency
    fn record_latency(&self, operation: CacheOperation, duration: Duration);

    /// Record removed entries
    fn record_removal(&self, reason: RemovalReason, count: u64);

    /// Record a failed deletion inside a bulk operation
    fn record_delete_failure(&self, operation: CacheOperation, identifier: &str);
}

/// No-op metrics implementation (default)
///
/// Zero overhead when metrics are not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl CacheMetrics for NoopMetrics {
    #[inline]
    fn record_hit(&self, _identifier: &str) {}

    #[inline]
    fn record_miss(&self, _identifier: &str) {}

    #[inline]
    fn record_latency(&self, _operation: CacheOperation, _duration: Duration) {}

    #[inline]
    fn record_removal(&self, _reason: RemovalReason, _count: u64) {}

    #[inline]
    fn record_delete_failure(&self, _operation: CacheOperation, _identifier: &str) {}
}

/// Metrics adapter using the `metrics` crate
///
/// Integrates with Prometheus, StatsD, and other exporters via the `metrics` ecosystem.
///
/// # Example
/// ```ignore
/// use tagcache_core::MetricsCrateAdapter;
///
/// // Set up a metrics recorder (e.g., prometheus_exporter)
/// // metrics::set_global_recorder(recorder);
///
/// let metrics = MetricsCrateAdapter::new("tagcache");
/// // Emits: tagcache_hits_total, tagcache_removals_total, etc.
/// ```
#[cfg(feature = "metrics")]
#[derive(Debug, Clone)]
pub struct MetricsCrateAdapter {
    prefix: String,
}

#[cfg(feature = "metrics")]
impl MetricsCrateAdapter {
    /// Create a new adapter with the given metric name prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn metric_name(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }
}

#[cfg(feature = "metrics")]
impl CacheMetrics for MetricsCrateAdapter {
    fn record_hit(&self, _identifier: &str) {
        metrics::counter!(self.metric_name("hits_total")).increment(1);
    }

    fn record_miss(&self, _identifier: &str) {
        metrics::counter!(self.metric_name("misses_total")).increment(1);
    }

    fn record_latency(&self, operation: CacheOperation, duration: Duration) {
        metrics::histogram!(
            self.metric_name("operation_duration_seconds"),
            "operation" => operation.as_str()
        )
        .record(duration.as_secs_f64());
    }

    fn record_removal(&self, reason: RemovalReason, count: u64) {
        metrics::counter!(
            self.metric_name("removals_total"),
            "reason" => reason.as_str()
        )
        .increment(count);
    }

    fn record_delete_failure(&self, operation: CacheOperation, _identifier: &str) {
        metrics::counter!(
            self.metric_name("delete_failures_total"),
            "operation" => operation.as_str()
        )
        .increment(1);
    }
}
