//! Store record type

use crate::IndexSet;

/// Content type written on every record of the cache
pub const CONTENT_TYPE: &str = "application/x-tagcache";

/// A record as exchanged with a store gateway
///
/// The payload is stored verbatim; everything the cache knows about an entry
/// beyond its bytes lives in the index set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRecord {
    /// Raw payload bytes
    pub payload: Vec<u8>,
    /// Secondary index entries
    pub indexes: IndexSet,
    /// MIME type of the payload
    pub content_type: String,
    /// Opaque causal context (e.g. a Riak vector clock) returned by reads
    /// and handed back on the next write of the same key
    pub causal_context: Option<String>,
}

impl StoreRecord {
    /// Create a record with the cache content type
    pub fn new(payload: Vec<u8>, indexes: IndexSet) -> Self {
        Self {
            payload,
            indexes,
            content_type: CONTENT_TYPE.to_string(),
            causal_context: None,
        }
    }

    /// Attach a causal context obtained from a previous read
    pub fn with_causal_context(mut self, context: Option<String>) -> Self {
        self.causal_context = context;
        self
    }
}
