//! tagcache-core: Core traits and types for the tagcache library
//!
//! This crate provides the index policy, the entry codec and the traits
//! shared by every tagcache store gateway and backend.

mod clock;
mod codec;
mod error;
mod index;
mod traits;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{EncodedEntry, EntryCodec, ZeroLifetime, MAX_KEY_LENGTH};
pub use error::{CacheError, Result};
pub use index::{IndexEntry, IndexFamily, IndexKind, IndexSet, IndexValue, CACHE_MARKER_VALUE};
pub use traits::*;
pub use types::*;
