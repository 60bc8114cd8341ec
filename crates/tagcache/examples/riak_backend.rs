//! Cache backed by a Riak node (requires the `riak` feature and eLevelDB for 2i)

use tagcache::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let hostname = std::env::var("RIAK_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("RIAK_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8098);

    println!("Connecting to Riak at {}:{}", hostname, port);

    let options = BackendOptions::with_bucket("example").address(hostname, port);
    let cache = match TaggedExpiringCacheBackend::connect(options).await {
        Ok(cache) => cache,
        Err(e) if e.is_unavailable() => {
            println!("Riak is not reachable ({}), skipping", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    cache
        .set("hello", b"world".to_vec(), &EntryOpts::new().lifetime_mins(5).build())
        .await?;

    match cache.get("hello").await? {
        Some(payload) => println!("Hit: {}", String::from_utf8_lossy(&payload)),
        None => println!("Miss"),
    }

    // Tagging example
    cache
        .set(
            "user_1",
            b"sachin".to_vec(),
            &EntryOpts::new().tags(["users", "admins"]).build(),
        )
        .await?;

    match cache.find_identifiers_by_tag("admins").await {
        Ok(identifiers) => println!("Tagged 'admins': {:?}", identifiers),
        Err(CacheError::IndexesUnsupported(msg)) => {
            println!("The bucket's backend has no secondary indexes: {}", msg);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let flushed = cache.flush_by_tag("users").await?;
    println!("Flushed {} entries tagged 'users'", flushed);

    let collected = cache.collect_garbage().await?;
    println!("Collected {} expired entries", collected);

    Ok(())
}
