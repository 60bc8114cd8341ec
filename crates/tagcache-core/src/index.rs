//! Index policy: the secondary indexes written on every cache entry
//!
//! | Family        | Field            | Values                      |
//! |---------------|------------------|-----------------------------|
//! | cache marker  | `cache_int`      | always [`CACHE_MARKER_VALUE`] |
//! | tag           | `tag_bin`        | one per tag                 |
//! | expiration    | `expiration_int` | zero or one unix timestamp  |
//!
//! Field names carry the value type as a `_int` / `_bin` suffix, which is the
//! naming convention secondary-index stores such as Riak expect.

use std::collections::BTreeSet;
use std::fmt;

/// Constant value of the cache marker index
pub const CACHE_MARKER_VALUE: i64 = 1;

/// Value type of an index field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Integer index, supports range queries
    Int,
    /// Binary (string) index, exact match
    Bin,
}

impl IndexKind {
    /// Field name suffix for this kind
    pub fn suffix(&self) -> &'static str {
        match self {
            IndexKind::Int => "int",
            IndexKind::Bin => "bin",
        }
    }

    /// Infer the kind from a field name suffix
    pub fn from_field(field: &str) -> Option<Self> {
        if field.ends_with("_int") {
            Some(IndexKind::Int)
        } else if field.ends_with("_bin") {
            Some(IndexKind::Bin)
        } else {
            None
        }
    }
}

/// The index families this cache writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFamily {
    /// Marks every entry of the cache, enables flush-all
    CacheMarker,
    /// Tag membership, enables find/flush by tag
    Tag,
    /// Absolute expiration time, enables garbage collection by range
    Expiration,
}

impl IndexFamily {
    /// Short family name
    pub fn name(&self) -> &'static str {
        match self {
            IndexFamily::CacheMarker => "cache",
            IndexFamily::Tag => "tag",
            IndexFamily::Expiration => "expiration",
        }
    }

    /// Value type of the family
    pub fn kind(&self) -> IndexKind {
        match self {
            IndexFamily::CacheMarker | IndexFamily::Expiration => IndexKind::Int,
            IndexFamily::Tag => IndexKind::Bin,
        }
    }

    /// Store field name (`name_kind`)
    pub fn field(&self) -> &'static str {
        match self {
            IndexFamily::CacheMarker => "cache_int",
            IndexFamily::Tag => "tag_bin",
            IndexFamily::Expiration => "expiration_int",
        }
    }

    /// Map a store field name back to a family
    pub fn from_field(field: &str) -> Option<Self> {
        match field {
            "cache_int" => Some(IndexFamily::CacheMarker),
            "tag_bin" => Some(IndexFamily::Tag),
            "expiration_int" => Some(IndexFamily::Expiration),
            _ => None,
        }
    }
}

/// A single index value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexValue {
    Int(i64),
    Bin(String),
}

impl IndexValue {
    /// Kind of this value
    pub fn kind(&self) -> IndexKind {
        match self {
            IndexValue::Int(_) => IndexKind::Int,
            IndexValue::Bin(_) => IndexKind::Bin,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            IndexValue::Int(v) => Some(*v),
            IndexValue::Bin(_) => None,
        }
    }

    pub fn as_bin(&self) -> Option<&str> {
        match self {
            IndexValue::Bin(v) => Some(v),
            IndexValue::Int(_) => None,
        }
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexValue::Int(v) => write!(f, "{}", v),
            IndexValue::Bin(v) => f.write_str(v),
        }
    }
}

/// One `(field, value)` pair attached to a record
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexEntry {
    field: String,
    value: IndexValue,
}

impl IndexEntry {
    /// Create an entry for an arbitrary field
    pub fn new(field: impl Into<String>, value: IndexValue) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }

    /// The cache marker entry
    pub fn cache_marker() -> Self {
        Self::new(
            IndexFamily::CacheMarker.field(),
            IndexValue::Int(CACHE_MARKER_VALUE),
        )
    }

    /// A tag membership entry
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::new(IndexFamily::Tag.field(), IndexValue::Bin(tag.into()))
    }

    /// An expiration entry
    pub fn expiration(expires_at: i64) -> Self {
        Self::new(IndexFamily::Expiration.field(), IndexValue::Int(expires_at))
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &IndexValue {
        &self.value
    }

    /// Family of this entry, if it is one the cache writes
    pub fn family(&self) -> Option<IndexFamily> {
        IndexFamily::from_field(&self.field)
    }
}

/// The full set of index entries of one record
///
/// Writing a record replaces its whole index set, so a set computed from
/// scratch on every write never leaves stale tag or expiration entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSet {
    entries: BTreeSet<IndexEntry>,
}

impl IndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; returns `false` if it was already present
    pub fn insert(&mut self, entry: IndexEntry) -> bool {
        self.entries.insert(entry)
    }

    pub fn contains(&self, entry: &IndexEntry) -> bool {
        self.entries.contains(entry)
    }

    /// All values stored under `field`
    pub fn values<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a IndexValue> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| &e.value)
    }

    /// All values of a family
    pub fn family_values(&self, family: IndexFamily) -> impl Iterator<Item = &IndexValue> {
        self.values(family.field())
    }

    /// Distinct field names, in order
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.entries.iter().map(|e| e.field.as_str()).collect();
        fields.dedup();
        fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<IndexEntry> for IndexSet {
    fn from_iter<I: IntoIterator<Item = IndexEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for IndexSet {
    type Item = IndexEntry;
    type IntoIter = std::collections::btree_set::IntoIter<IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a IndexSet {
    type Item = &'a IndexEntry;
    type IntoIter = std::collections::btree_set::Iter<'a, IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
