//! Riak secondary index headers
//!
//! Riak transports the index set of an object as `x-riak-index-<field>`
//! headers, several values of one field joined with `, `.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;

use tagcache_core::{CacheError, IndexEntry, IndexKind, IndexSet, IndexValue, Result};

pub(crate) const INDEX_HEADER_PREFIX: &str = "x-riak-index-";
pub(crate) const VCLOCK_HEADER: &str = "x-riak-vclock";

/// Reject binary values that would not survive the header round-trip
///
/// `,` separates values of one field and surrounding whitespace is trimmed
/// on the way back.
pub(crate) fn check_indexes(indexes: &IndexSet) -> Result<()> {
    for entry in indexes {
        let IndexValue::Bin(v) = entry.value() else {
            continue;
        };
        if v.contains(',') {
            return Err(CacheError::InvalidArgument(format!(
                "index value '{}' of {} must not contain ','",
                v,
                entry.field()
            )));
        }
        if v.trim() != v {
            return Err(CacheError::InvalidArgument(format!(
                "index value '{}' of {} must not start or end with whitespace",
                v,
                entry.field()
            )));
        }
    }
    Ok(())
}

/// Write `indexes` into `headers`
pub(crate) fn encode_indexes(indexes: &IndexSet, headers: &mut HeaderMap) -> Result<()> {
    check_indexes(indexes)?;

    let mut fields: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for entry in indexes {
        let value = match entry.value() {
            IndexValue::Int(v) => v.to_string(),
            IndexValue::Bin(v) => v.clone(),
        };
        fields.entry(entry.field()).or_default().push(value);
    }

    for (field, values) in fields {
        let name = HeaderName::from_bytes(format!("{}{}", INDEX_HEADER_PREFIX, field).as_bytes())
            .map_err(|e| CacheError::InvalidArgument(format!("index field '{}': {}", field, e)))?;
        let value = HeaderValue::from_bytes(values.join(", ").as_bytes())
            .map_err(|e| CacheError::InvalidArgument(format!("index values of '{}': {}", field, e)))?;
        headers.insert(name, value);
    }
    Ok(())
}

/// Read the index set out of response headers
pub(crate) fn decode_indexes(headers: &HeaderMap) -> Result<IndexSet> {
    let mut indexes = IndexSet::new();
    for (name, value) in headers {
        let Some(field) = name.as_str().strip_prefix(INDEX_HEADER_PREFIX) else {
            continue;
        };
        let Some(kind) = IndexKind::from_field(field) else {
            continue;
        };

        let raw = String::from_utf8_lossy(value.as_bytes());
        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let value = match kind {
                IndexKind::Int => item.parse::<i64>().map(IndexValue::Int).map_err(|e| {
                    CacheError::Store(format!("malformed {} value '{}': {}", field, item, e))
                })?,
                IndexKind::Bin => IndexValue::Bin(item.to_string()),
            };
            indexes.insert(IndexEntry::new(field, value));
        }
    }
    Ok(indexes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IndexSet {
        [
            IndexEntry::cache_marker(),
            IndexEntry::tag("Session_1"),
            IndexEntry::tag("pages"),
            IndexEntry::expiration(1_700_000_060),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_encode_groups_values_per_field() {
        let mut headers = HeaderMap::new();
        encode_indexes(&sample(), &mut headers).unwrap();

        assert_eq!(headers.get("x-riak-index-cache_int").unwrap(), "1");
        assert_eq!(
            headers.get("x-riak-index-expiration_int").unwrap(),
            "1700000060"
        );
        assert_eq!(
            headers.get("x-riak-index-tag_bin").unwrap(),
            "Session_1, pages"
        );
    }

    #[test]
    fn test_decode_reads_what_encode_writes() {
        let mut headers = HeaderMap::new();
        encode_indexes(&sample(), &mut headers).unwrap();
        headers.insert("content-type", HeaderValue::from_static("application/x-tagcache"));

        assert_eq!(decode_indexes(&headers).unwrap(), sample());
    }

    #[test]
    fn test_decode_ignores_unknown_headers_and_kinds() {
        let mut headers = HeaderMap::new();
        headers.insert("x-riak-index-weird", HeaderValue::from_static("1"));
        headers.insert("x-riak-meta-owner", HeaderValue::from_static("me"));
        assert!(decode_indexes(&headers).unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_malformed_int() {
        let mut headers = HeaderMap::new();
        headers.insert("x-riak-index-expiration_int", HeaderValue::from_static("soon"));
        assert!(matches!(
            decode_indexes(&headers),
            Err(CacheError::Store(_))
        ));
    }

    #[test]
    fn test_encode_rejects_comma_in_tag() {
        let indexes: IndexSet = [IndexEntry::tag("a,b")].into_iter().collect();
        let err = encode_indexes(&indexes, &mut HeaderMap::new()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_check_rejects_padded_tag() {
        for tag in [" lead", "trail ", "\tboth "] {
            let indexes: IndexSet = [IndexEntry::tag(tag)].into_iter().collect();
            assert!(check_indexes(&indexes).unwrap_err().is_validation());
        }

        let indexes: IndexSet = [IndexEntry::tag("inner space"), IndexEntry::expiration(5)]
            .into_iter()
            .collect();
        assert!(check_indexes(&indexes).is_ok());
    }
}
