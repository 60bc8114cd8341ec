//! Cache entry type

use std::collections::BTreeSet;
use std::time::Duration;

/// A decoded cache entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Cache identifier (store key)
    pub identifier: String,
    /// The cached payload
    pub payload: Vec<u8>,
    /// Absolute expiration in unix seconds, `None` never expires
    pub expires_at: Option<i64>,
    /// Associated tags
    pub tags: BTreeSet<String>,
}

impl Entry {
    /// Check if the entry has expired at `now`
    ///
    /// An entry expiring at second `t` is still live during `t` and expired
    /// from `t + 1` on, which matches the `[0, now)` garbage collection range.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }

    /// Remaining lifetime at `now`, `None` for entries that never expire
    pub fn ttl_remaining(&self, now: i64) -> Option<Duration> {
        self.expires_at
            .map(|expires_at| Duration::from_secs(expires_at.saturating_sub(now).max(0) as u64))
    }

    /// Check whether the entry carries `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}
