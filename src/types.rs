//! Core identifier types shared by the indexes and the content log

use serde::{Deserialize, Serialize};

/// Fixed-width identifier of a content-bearing graph node
pub type LinkHash = u64;

/// Byte position of a record inside the content log
pub type ContentOffset = u64;

/// Width of every persisted integer (little endian)
pub const WORD_SIZE: u64 = std::mem::size_of::<u64>() as u64;

/// How per-term offset collections are combined in term queries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermMode {
    /// Content must contain every term
    And,
    /// Content must contain at least one term
    Or,
}

/// Snapshot of store sizes for monitoring
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Append position of the content log
    pub next_offset: ContentOffset,
    /// Distinct indexed terms
    pub term_count: usize,
    /// Identifiers currently referencing content
    pub linked_identifiers: usize,
    /// Content offsets with at least one owner
    pub stored_offsets: usize,
}
