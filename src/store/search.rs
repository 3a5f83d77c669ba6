//! Reverse lookups: exact string, substring and boolean term queries
//!
//! String and substring queries only consult the term index for the query's
//! first term. Candidates are then verified against the stored bytes, so a
//! result is never a false positive. A substring whose first term is not the
//! prefix of some indexed term finds nothing.

use std::collections::HashSet;

use roaring::RoaringTreemap;
use tracing::debug;

use crate::error::Result;
use crate::persistence::decode;
use crate::store::StringStore;
use crate::types::{ContentOffset, LinkHash, TermMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Match {
    Exact,
    Substring,
}

impl Match {
    fn from_substring(substring: bool) -> Self {
        if substring {
            Match::Substring
        } else {
            Match::Exact
        }
    }

    fn size_fits(self, candidate: u64, query: u64) -> bool {
        match self {
            Match::Exact => candidate == query,
            Match::Substring => candidate >= query,
        }
    }

    fn content_fits(self, candidate: &str, query: &str) -> bool {
        match self {
            Match::Exact => candidate == query,
            Match::Substring => candidate.contains(query),
        }
    }
}

impl StringStore {
    /// Identifiers whose string equals `string`, or contains it when
    /// `substring` is set
    pub fn identifiers_for(&self, string: &str, substring: bool) -> Result<HashSet<LinkHash>> {
        let verified = self.verified_candidates(string, Match::from_substring(substring))?;
        Ok(verified
            .iter()
            .flat_map(|(offset, _)| self.links.owners_of(*offset))
            .collect())
    }

    pub fn identifiers_for_string(&self, string: &str) -> Result<HashSet<LinkHash>> {
        self.identifiers_for(string, false)
    }

    pub fn identifiers_for_substring(&self, substring: &str) -> Result<HashSet<LinkHash>> {
        self.identifiers_for(substring, true)
    }

    /// Stored strings containing `substring`
    pub fn strings_for(&self, substring: &str) -> Result<HashSet<String>> {
        let verified = self.verified_candidates(substring, Match::Substring)?;
        Ok(verified.into_iter().map(|(_, content)| content).collect())
    }

    /// Identifiers whose content contains all (`And`) or any (`Or`) of `terms`
    pub fn identifiers_for_terms<I, S>(&self, terms: I, mode: TermMode) -> Result<HashSet<LinkHash>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let offsets = self.offsets_for_terms(terms, mode);
        Ok(offsets
            .iter()
            .flat_map(|offset| self.links.owners_of(offset))
            .collect())
    }

    /// Stored strings containing all (`And`) or any (`Or`) of `terms`
    pub fn strings_for_terms<I, S>(&self, terms: I, mode: TermMode) -> Result<HashSet<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let offsets = self.offsets_for_terms(terms, mode);
        if offsets.is_empty() {
            return Ok(HashSet::new());
        }

        let mut reader = self.content.reader()?;
        offsets
            .iter()
            .map(|offset| reader.read_string(offset))
            .collect()
    }

    /// Offset of a stored string byte-identical to `string`, looked up under
    /// the string's first term
    pub(super) fn find_exact(
        &self,
        first_term: &str,
        string: &str,
    ) -> Result<Option<ContentOffset>> {
        let candidates = self.terms.offsets_for(first_term);
        if candidates.is_empty() {
            return Ok(None);
        }

        let size = string.len() as u64;
        let mut reader = self.content.reader()?;
        for &offset in candidates {
            if let Some(bytes) = reader.read_if(offset, |found| found == size)? {
                if bytes == string.as_bytes() {
                    return Ok(Some(offset));
                }
            }
        }
        Ok(None)
    }

    fn candidates(&self, query: &str, mode: Match) -> Vec<ContentOffset> {
        let Some(first) = self.tokenizer.first_term(query) else {
            return Vec::new();
        };

        let raw = match mode {
            Match::Exact => self.terms.offsets_for(&first).to_vec(),
            Match::Substring => self.terms.offsets_for_prefix(&first),
        };

        let mut seen = HashSet::with_capacity(raw.len());
        raw.into_iter().filter(|offset| seen.insert(*offset)).collect()
    }

    /// Candidate records that really match `query`, with their content
    fn verified_candidates(
        &self,
        query: &str,
        mode: Match,
    ) -> Result<Vec<(ContentOffset, String)>> {
        let candidates = self.candidates(query, mode);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let size = query.len() as u64;
        let mut reader = self.content.reader()?;
        let mut verified = Vec::new();
        for &offset in &candidates {
            let Some(bytes) = reader.read_if(offset, |found| mode.size_fits(found, size))? else {
                continue;
            };
            let content = decode(offset, bytes)?;
            if mode.content_fits(&content, query) {
                verified.push((offset, content));
            }
        }

        debug!(
            ?mode,
            candidates = candidates.len(),
            verified = verified.len(),
            "verified search candidates"
        );
        Ok(verified)
    }

    /// Intersection or union of the per-term offset collections
    fn offsets_for_terms<I, S>(&self, terms: I, mode: TermMode) -> RoaringTreemap
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result: Option<RoaringTreemap> = None;

        for term in terms {
            let offsets: RoaringTreemap =
                self.terms.offsets_for(term.as_ref()).iter().copied().collect();
            result = Some(match (result, mode) {
                (None, _) => offsets,
                (Some(acc), TermMode::And) => acc & offsets,
                (Some(acc), TermMode::Or) => acc | offsets,
            });

            if mode == TermMode::And && result.as_ref().is_some_and(RoaringTreemap::is_empty) {
                break;
            }
        }

        result.unwrap_or_else(RoaringTreemap::new)
    }
}
