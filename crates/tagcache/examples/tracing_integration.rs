//! Structured logging of cache operations through `tracing`

use std::sync::Arc;
use tagcache::prelude::*;
use tagcache::{SystemClock, TracingMetrics};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize tracing subscriber (RUST_LOG overrides the default)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .with_target(true)
        .init();

    println!("🔍 Initialized tracing...");

    // 2. Backend reporting through TracingMetrics
    let metrics = TracingMetrics::new().with_service_name("example-service");
    let cache = TaggedExpiringCacheBackend::with_metrics_and_clock(
        Arc::new(MemoryStore::new()),
        metrics,
        SystemClock,
        BackendOptions::with_bucket("traced"),
    )?;

    println!("\n⚡ Setting value...");
    cache
        .set(
            "user_1",
            b"Alice".to_vec(),
            &EntryOpts::new().tag("users").lifetime_secs(60).build(),
        )
        .await?;

    println!("\n⚡ Getting value (Hit)...");
    let hit = cache.get("user_1").await?;
    println!("   Got: {:?}", hit.map(String::from_utf8));

    println!("\n⚡ Getting missing value (Miss)...");
    let miss = cache.get("user_99").await?;
    println!("   Got: {:?}", miss);

    println!("\n⚡ Flushing by tag...");
    cache.flush_by_tag("users").await?;

    println!("\n✅ Check your console output for structured logs!");
    Ok(())
}
