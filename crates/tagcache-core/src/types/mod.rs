//! Core types for cache operations

mod entry;
mod options;
mod record;

pub use entry::Entry;
pub use options::{EntryOptions, EntryOpts};
pub use record::{StoreRecord, CONTENT_TYPE};
