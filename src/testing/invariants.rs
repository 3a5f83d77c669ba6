//! Invariant checking framework for correctness verification
//!
//! Each invariant inspects a [`StringStore`] directly and reports the
//! offsets or identifiers that break it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::store::StringStore;
use crate::types::WORD_SIZE;

/// A violation of an invariant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub invariant: String,
    pub description: String,
    /// Offsets or identifiers involved
    pub subjects: Vec<u64>,
    pub context: HashMap<String, String>,
}

impl Violation {
    fn new(invariant: &dyn Invariant, description: impl Into<String>, subjects: Vec<u64>) -> Self {
        Self {
            invariant: invariant.name().to_string(),
            description: description.into(),
            subjects,
            context: HashMap::new(),
        }
    }

    fn with_context(mut self, key: &str, value: impl ToString) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "INVARIANT VIOLATION: {}", self.invariant)?;
        writeln!(f, "  Description: {}", self.description)?;
        writeln!(f, "  Subjects: {:?}", self.subjects)?;
        if !self.context.is_empty() {
            writeln!(f, "  Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "    {}: {}", key, value)?;
            }
        }
        Ok(())
    }
}

/// Trait for invariant checkers
pub trait Invariant: Send + Sync {
    /// Name of the invariant
    fn name(&self) -> &str;

    /// Check the invariant against the store's current state
    fn check(&self, store: &StringStore) -> Result<(), Violation>;

    /// Human-readable description
    fn description(&self) -> &str {
        "No description provided"
    }
}

/// Check all invariants and return violations
pub fn check_all_invariants(
    store: &StringStore,
    invariants: &[Box<dyn Invariant>],
) -> Vec<Violation> {
    invariants
        .iter()
        .filter_map(|invariant| invariant.check(store).err())
        .collect()
}

/// Invariant: an identifier is an owner of an offset exactly when it
/// references that offset
pub struct OwnersMatchReferences;

impl Invariant for OwnersMatchReferences {
    fn name(&self) -> &str {
        "OwnersMatchReferences"
    }

    fn description(&self) -> &str {
        "Owner sets and identifier references describe the same relation"
    }

    fn check(&self, store: &StringStore) -> Result<(), Violation> {
        let links = store.link_index();

        let unowned: Vec<u64> = links
            .references()
            .filter(|(link, offset)| !links.owners_of(*offset).any(|owner| owner == *link))
            .map(|(link, _)| link)
            .collect();
        if !unowned.is_empty() {
            return Err(Violation::new(
                self,
                "Identifiers reference offsets that do not list them as owners",
                unowned,
            ));
        }

        let mut stale = Vec::new();
        for (offset, owners) in links.entries() {
            if owners.is_empty() {
                stale.push(offset);
            }
            for &link in owners {
                if links.reference_of(link) != Some(offset) {
                    stale.push(link);
                }
            }
        }
        if !stale.is_empty() {
            return Err(Violation::new(
                self,
                "Owner sets hold identifiers referencing other offsets",
                stale,
            ));
        }

        Ok(())
    }
}

/// Invariant: every indexed offset points at a record header inside the log
pub struct OffsetsWithinLog;

impl Invariant for OffsetsWithinLog {
    fn name(&self) -> &str {
        "OffsetsWithinLog"
    }

    fn description(&self) -> &str {
        "Term and link offsets lie before the content log's next offset"
    }

    fn check(&self, store: &StringStore) -> Result<(), Violation> {
        let next_offset = store.content_log().next_offset();
        let outside = |offset: u64| offset.saturating_add(WORD_SIZE) > next_offset;

        let mut bad: Vec<u64> = store
            .term_index()
            .entries()
            .flat_map(|(_, offsets)| offsets.iter().copied())
            .filter(|&offset| outside(offset))
            .collect();
        bad.extend(
            store
                .link_index()
                .entries()
                .map(|(offset, _)| offset)
                .filter(|&offset| outside(offset)),
        );
        bad.sort_unstable();
        bad.dedup();

        if bad.is_empty() {
            Ok(())
        } else {
            Err(Violation::new(self, "Offsets past the end of the content log", bad)
                .with_context("next_offset", next_offset))
        }
    }
}

/// Invariant: every linked identifier resolves to its string, and
/// searchable strings are indexed under each of their terms
pub struct LinkedContentIndexed;

impl Invariant for LinkedContentIndexed {
    fn name(&self) -> &str {
        "LinkedContentIndexed"
    }

    fn description(&self) -> &str {
        "Linked strings are readable and findable through all of their terms"
    }

    fn check(&self, store: &StringStore) -> Result<(), Violation> {
        let Ok(mut reader) = store.content_log().reader() else {
            return Err(Violation::new(self, "Content log cannot be opened", Vec::new()));
        };

        let mut unreadable = Vec::new();
        let mut unindexed = Vec::new();
        for (offset, _) in store.link_index().entries() {
            let content = match reader.read_string(offset) {
                Ok(content) => content,
                Err(_) => {
                    unreadable.push(offset);
                    continue;
                }
            };
            let missing = store
                .terms_of(&content)
                .iter()
                .any(|term| !store.term_index().offsets_for(term).contains(&offset));
            if missing {
                unindexed.push(offset);
            }
        }

        if !unreadable.is_empty() {
            return Err(Violation::new(self, "Linked offsets cannot be read", unreadable));
        }
        if !unindexed.is_empty() {
            return Err(Violation::new(
                self,
                "Searchable strings missing from their terms' offsets",
                unindexed,
            ));
        }
        Ok(())
    }
}

/// All invariants shipped with the crate
pub fn default_invariants() -> Vec<Box<dyn Invariant>> {
    vec![
        Box::new(OwnersMatchReferences),
        Box::new(OffsetsWithinLog),
        Box::new(LinkedContentIndexed),
    ]
}
