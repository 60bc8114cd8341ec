//! Entry codec: maps cache entries to store records and back

use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;

use crate::{CacheError, Entry, IndexEntry, IndexFamily, IndexSet, IndexValue, Result, StoreRecord};

/// Maximum length in bytes of identifiers and tags
pub const MAX_KEY_LENGTH: usize = 250;

/// How an explicit lifetime of zero seconds is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZeroLifetime {
    /// `0` means unlimited: no expiration index is written
    #[default]
    Unlimited,
    /// `0` means the entry expires now: `expires_at = now`
    ExpireImmediately,
}

/// Output of [`EntryCodec::encode`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedEntry {
    /// Store key
    pub key: String,
    /// Record to write under `key`
    pub record: StoreRecord,
}

/// Stateless encoder/decoder between entries and store records
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryCodec {
    zero_lifetime: ZeroLifetime,
}

impl EntryCodec {
    /// Create a codec with the given zero-lifetime policy
    pub fn new(zero_lifetime: ZeroLifetime) -> Self {
        Self { zero_lifetime }
    }

    pub fn zero_lifetime(&self) -> ZeroLifetime {
        self.zero_lifetime
    }

    /// Validate a cache identifier
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        validate_key("identifier", identifier)
    }

    /// Validate a tag
    pub fn validate_tag(tag: &str) -> Result<()> {
        validate_key("tag", tag)
    }

    /// Absolute expiration for a write at `now`
    pub fn expiration_for(&self, lifetime: Option<Duration>, now: i64) -> Result<Option<i64>> {
        let Some(lifetime) = lifetime else {
            return Ok(None);
        };

        if lifetime.is_zero() && self.zero_lifetime == ZeroLifetime::Unlimited {
            return Ok(None);
        }

        i64::try_from(lifetime.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(secs))
            .map(Some)
            .ok_or_else(|| {
                CacheError::InvalidArgument(format!(
                    "lifetime of {}s is out of range",
                    lifetime.as_secs()
                ))
            })
    }

    /// Build the record and index set for a write
    ///
    /// The index set always contains the cache marker, one entry per distinct
    /// tag, and an expiration entry when the lifetime resolves to one.
    pub fn encode(
        &self,
        identifier: &str,
        payload: Vec<u8>,
        tags: &[String],
        lifetime: Option<Duration>,
        now: i64,
    ) -> Result<EncodedEntry> {
        Self::validate_identifier(identifier)?;
        for tag in tags {
            Self::validate_tag(tag)?;
        }

        let mut indexes = IndexSet::new();
        indexes.insert(IndexEntry::cache_marker());
        if let Some(expires_at) = self.expiration_for(lifetime, now)? {
            indexes.insert(IndexEntry::expiration(expires_at));
        }
        for tag in tags {
            indexes.insert(IndexEntry::tag(tag.as_str()));
        }

        Ok(EncodedEntry {
            key: identifier.to_string(),
            record: StoreRecord::new(payload, indexes),
        })
    }

    /// Recover an entry from a stored record
    ///
    /// The payload is returned verbatim. Records without the cache marker were
    /// not written by this cache and are rejected.
    pub fn decode(identifier: &str, record: StoreRecord) -> Result<Entry> {
        if !record.indexes.contains(&IndexEntry::cache_marker()) {
            return Err(CacheError::InvalidData(format!(
                "record '{}' carries no cache marker index",
                identifier
            )));
        }

        // Several expiration values can only come from a foreign writer; the
        // earliest one wins.
        let expires_at = record
            .indexes
            .family_values(IndexFamily::Expiration)
            .filter_map(IndexValue::as_int)
            .min();

        let tags: BTreeSet<String> = record
            .indexes
            .family_values(IndexFamily::Tag)
            .filter_map(IndexValue::as_bin)
            .map(str::to_string)
            .collect();

        Ok(Entry {
            identifier: identifier.to_string(),
            payload: record.payload,
            expires_at,
            tags,
        })
    }
}

fn validate_key(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(CacheError::InvalidArgument(format!(
            "{} must not be empty",
            what
        )));
    }
    if value.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidArgument(format!(
            "{} is {} bytes long, at most {} are allowed",
            what,
            value.len(),
            MAX_KEY_LENGTH
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(CacheError::InvalidArgument(format!(
            "{} '{}' contains control characters",
            what,
            value.escape_debug()
        )));
    }
    Ok(())
}
