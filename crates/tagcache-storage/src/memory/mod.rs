//! In-memory store gateway

mod store;

pub use store::MemoryStore;
