//! Inverted index from terms to content offsets

use crate::index::trie::Trie;
use crate::types::ContentOffset;

/// Maps each term to the offsets of every stored string containing it
///
/// Collections keep insertion order and may hold the same offset more than
/// once when a string repeats a term.
#[derive(Clone, Debug, Default)]
pub struct TermIndex {
    terms: Trie<Vec<ContentOffset>>,
}

impl TermIndex {
    pub fn new() -> Self {
        Self { terms: Trie::new() }
    }

    /// Append `offset` to the collection of every term in `terms`
    pub fn index_terms<I, S>(&mut self, terms: I, offset: ContentOffset)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            self.append(term.as_ref().as_bytes(), offset);
        }
    }

    pub(crate) fn append(&mut self, term: &[u8], offset: ContentOffset) {
        self.terms.get_or_insert_with(term, Vec::new).push(offset);
    }

    /// Offsets of strings containing exactly `term`
    pub fn offsets_for(&self, term: &str) -> &[ContentOffset] {
        self.terms
            .get(term.as_bytes())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Offsets of every term entry starting with `prefix`, in trie order
    pub fn offsets_for_prefix(&self, prefix: &str) -> Vec<ContentOffset> {
        self.terms
            .prefix_iter(prefix.as_bytes())
            .flat_map(|(_, offsets)| offsets.iter().copied())
            .collect()
    }

    /// Distinct terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Every `(term bytes, offsets)` entry in lexicographic order
    pub fn entries(&self) -> impl Iterator<Item = (Vec<u8>, &[ContentOffset])> + '_ {
        self.terms
            .iter()
            .map(|(term, offsets)| (term, offsets.as_slice()))
    }
}
