//! tagcache: Tagged, expiring cache backend for secondary-index stores
//!
//! # Features
//!
//! - **Tag-based invalidation** through a tag secondary index
//! - **Flush-all** through a cache marker index on every entry
//! - **Range-query garbage collection** through an expiration index
//! - **Pluggable stores** (in-memory, Riak HTTP) behind [`StoreGateway`]
//! - **Metrics and tracing integration**
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tagcache::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!     let cache = TaggedExpiringCacheBackend::new(store, BackendOptions::with_bucket("pages"))?;
//!
//!     cache
//!         .set("page_1", b"<html/>".to_vec(), &EntryOpts::new().tag("pages").lifetime_secs(60).build())
//!         .await?;
//!
//!     match cache.get("page_1").await? {
//!         Some(payload) => println!("Got {} bytes", payload.len()),
//!         None => println!("Cache miss"),
//!     }
//!
//!     cache.flush_by_tag("pages").await?;
//!     Ok(())
//! }
//! ```

mod backend;
mod config;

// Re-export core
pub use tagcache_core::*;

// Re-export storage
#[cfg(feature = "memory")]
pub use tagcache_storage::MemoryStore;

#[cfg(feature = "riak")]
pub use tagcache_storage::{RiakConfig, RiakGateway};

// Export backend
pub use backend::TaggedExpiringCacheBackend;
pub use config::BackendOptions;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BackendOptions, CacheBackend, CacheError, EntryOptions, EntryOpts, Result,
        StoreGateway, TaggableBackend, TaggedExpiringCacheBackend, ZeroLifetime,
    };

    #[cfg(feature = "memory")]
    pub use crate::MemoryStore;

    #[cfg(feature = "riak")]
    pub use crate::{RiakConfig, RiakGateway};
}
