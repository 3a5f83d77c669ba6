//! In-memory indexes over the content log
//!
//! - `Trie`: byte-keyed prefix tree backing the term index
//! - `TermIndex`: term -> offsets of strings containing it
//! - `LinkIndex`: identifier <-> offset references with dedup owner sets

mod link_index;
mod term_index;
mod trie;

pub use link_index::LinkIndex;
pub use term_index::TermIndex;
pub use trie::{Iter as TrieIter, Trie};
