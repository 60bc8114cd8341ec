//! Basic example demonstrating tagcache with the in-memory store

use std::sync::Arc;
use std::time::Duration;
use tagcache::prelude::*;
use tagcache::{ManualClock, NoopMetrics};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct User {
    id: u64,
    name: String,
    email: String,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("=== tagcache Basic Example ===\n");

    // A manual clock lets the example show expiration without sleeping
    let store = MemoryStore::new();
    let clock = ManualClock::starting_now();
    let cache = TaggedExpiringCacheBackend::with_metrics_and_clock(
        Arc::new(store.clone()),
        NoopMetrics,
        clock.clone(),
        BackendOptions::with_bucket("users"),
    )?;

    let user = User {
        id: 123,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
    };

    // Store with tags and a lifetime
    println!("Storing user in cache...");
    cache
        .set(
            "user_123",
            serde_json::to_vec(&user)?,
            &EntryOpts::new()
                .lifetime_secs(300)
                .tags(["users", "team_1"])
                .build(),
        )
        .await?;

    println!("Retrieving user from cache...");
    match cache.get("user_123").await? {
        Some(payload) => {
            let user: User = serde_json::from_slice(&payload)?;
            println!("✅ Cache HIT: {} <{}>", user.name, user.email);
        }
        None => println!("❌ Cache MISS"),
    }

    if let Some(entry) = cache.entry("user_123").await? {
        println!("   Tags: {:?}", entry.tags);
        println!("   Expires at: {:?}", entry.expires_at);
    }

    // Tag lookups
    println!("\n--- Tags ---");
    cache
        .set("user_456", b"{}".to_vec(), &EntryOpts::new().tag("users").build())
        .await?;
    let mut members = cache.find_identifiers_by_tag("users").await?;
    members.sort();
    println!("   Tagged 'users': {:?}", members);

    let flushed = cache.flush_by_tag("team_1").await?;
    println!("   Flushed {} entry tagged 'team_1'", flushed);
    println!("   user_123 exists: {}", cache.has("user_123").await?);
    println!("   user_456 exists: {}", cache.has("user_456").await?);

    // Expiration and garbage collection
    println!("\n--- Expiration ---");
    cache
        .set(
            "temp_data",
            b"expires soon".to_vec(),
            &EntryOptions::from(Duration::from_secs(60)),
        )
        .await?;
    clock.advance(Duration::from_secs(61));
    let collected = cache.collect_garbage().await?;
    println!("   Collected {} expired entry", collected);
    println!("   temp_data exists: {}", cache.has("temp_data").await?);

    // Flush everything
    println!("\n--- Flush ---");
    let removed = cache.flush().await?;
    println!("   Flushed {} entries, store now holds {}", removed, store.len("users"));

    println!("\n=== Example Complete ===");
    Ok(())
}
