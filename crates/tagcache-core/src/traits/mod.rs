//! Core traits for cache operations

mod backend;
mod gateway;
mod metrics;
mod logging;

pub use backend::{CacheBackend, TaggableBackend};
pub use gateway::StoreGateway;
pub use metrics::{CacheMetrics, CacheOperation, NoopMetrics, RemovalReason};
pub use logging::TracingMetrics;

#[cfg(feature = "metrics")]
pub use metrics::MetricsCrateAdapter;
