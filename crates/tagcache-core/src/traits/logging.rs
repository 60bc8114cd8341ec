//! `tracing` adapter for cache metrics

use crate::{CacheMetrics, CacheOperation, RemovalReason};
use std::time::Duration;
use tracing::{debug, warn};

/// Metrics adapter that logs events via `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingMetrics {
    /// Service name/prefix (optional)
    service_name: Option<String>,
}

impl TracingMetrics {
    /// Create new tracing metrics adapter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with service name prefix
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }
}

impl CacheMetrics for TracingMetrics {
    fn record_hit(&self, identifier: &str) {
        debug!(
            target: "tagcache",
            event = "hit",
            identifier = %identifier,
            service = ?self.service_name,
            "Cache Hit"
        );
    }

    fn record_miss(&self, identifier: &str) {
        debug!(
            target: "tagcache",
            event = "miss",
            identifier = %identifier,
            service = ?self.service_name,
            "Cache Miss"
        );
    }

    fn record_latency(&self, operation: CacheOperation, duration: Duration) {
        tracing::trace!(
            target: "tagcache",
            event = "latency",
            operation = operation.as_str(),
            duration_ms = duration.as_millis(),
            service = ?self.service_name,
            "Cache Operation Latency"
        );
    }

    fn record_removal(&self, reason: RemovalReason, count: u64) {
        debug!(
            target: "tagcache",
            event = "removal",
            reason = reason.as_str(),
            count = count,
            service = ?self.service_name,
            "Cache Removal"
        );
    }

    fn record_delete_failure(&self, operation: CacheOperation, identifier: &str) {
        warn!(
            target: "tagcache",
            event = "delete_failure",
            operation = operation.as_str(),
            identifier = %identifier,
            service = ?self.service_name,
            "Cache Delete Failed"
        );
    }
}
