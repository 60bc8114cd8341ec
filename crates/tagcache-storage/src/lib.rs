//! tagcache-storage: Store gateways for tagcache

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;

#[cfg(feature = "riak")]
pub mod riak;

#[cfg(feature = "riak")]
pub use riak::{RiakConfig, RiakGateway};
