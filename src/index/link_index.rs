//! Bidirectional identifier <-> offset mapping with dedup ownership

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::types::{ContentOffset, LinkHash};

/// Tracks which content offset each identifier references, and the reverse
/// owner set of every offset
///
/// Both directions store plain keys, never shared collections. The owner
/// map is ordered so persisted files are deterministic.
#[derive(Clone, Debug, Default)]
pub struct LinkIndex {
    references: HashMap<LinkHash, ContentOffset>,
    owners: BTreeMap<ContentOffset, BTreeSet<LinkHash>>,
}

impl LinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `link` at `offset`, moving it out of its previous owner set
    ///
    /// Returns `false` when `link` already referenced `offset`.
    pub fn set_reference(&mut self, link: LinkHash, offset: ContentOffset) -> bool {
        let old = self.references.insert(link, offset);
        match old {
            Some(old) if old == offset => return false,
            Some(old) => self.release(link, old),
            None => {}
        }
        self.owners.entry(offset).or_default().insert(link);
        true
    }

    fn release(&mut self, link: LinkHash, offset: ContentOffset) {
        if let Some(owners) = self.owners.get_mut(&offset) {
            owners.remove(&link);
            if owners.is_empty() {
                self.owners.remove(&offset);
            }
        }
    }

    pub fn reference_of(&self, link: LinkHash) -> Option<ContentOffset> {
        self.references.get(&link).copied()
    }

    /// Identifiers currently referencing `offset`
    pub fn owners_of(&self, offset: ContentOffset) -> impl Iterator<Item = LinkHash> + '_ {
        self.owners
            .get(&offset)
            .into_iter()
            .flat_map(|owners| owners.iter().copied())
    }

    /// Offsets with at least one owner and their owners, by ascending offset
    pub fn entries(&self) -> impl Iterator<Item = (ContentOffset, &BTreeSet<LinkHash>)> + '_ {
        self.owners.iter().map(|(offset, owners)| (*offset, owners))
    }

    /// Every `(identifier, offset)` reference
    pub fn references(&self) -> impl Iterator<Item = (LinkHash, ContentOffset)> + '_ {
        self.references.iter().map(|(link, offset)| (*link, *offset))
    }

    pub fn linked_count(&self) -> usize {
        self.references.len()
    }

    pub fn offset_count(&self) -> usize {
        self.owners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reference_new() {
        let mut index = LinkIndex::new();
        assert!(index.set_reference(42, 0));
        assert!(index.set_reference(7, 0));

        assert_eq!(index.reference_of(42), Some(0));
        assert_eq!(index.reference_of(7), Some(0));
        assert_eq!(index.reference_of(1), None);
        assert_eq!(index.owners_of(0).collect::<Vec<_>>(), vec![7, 42]);
    }

    #[test]
    fn test_set_reference_same_offset_is_noop() {
        let mut index = LinkIndex::new();
        index.set_reference(42, 16);
        assert!(!index.set_reference(42, 16));

        assert_eq!(index.owners_of(16).count(), 1);
        assert_eq!(index.linked_count(), 1);
    }

    #[test]
    fn test_set_reference_moves_owner() {
        let mut index = LinkIndex::new();
        index.set_reference(1, 0);
        index.set_reference(2, 0);
        index.set_reference(1, 30);

        assert_eq!(index.reference_of(1), Some(30));
        assert_eq!(index.owners_of(0).collect::<Vec<_>>(), vec![2]);
        assert_eq!(index.owners_of(30).collect::<Vec<_>>(), vec![1]);

        // last owner leaving drops the offset entry
        index.set_reference(2, 30);
        assert_eq!(index.owners_of(0).count(), 0);
        assert_eq!(index.offset_count(), 1);
    }

    #[test]
    fn test_owners_match_references() {
        let mut index = LinkIndex::new();
        for (link, offset) in [(1, 0), (2, 0), (3, 12), (1, 12), (4, 40), (3, 40)] {
            index.set_reference(link, offset);
        }

        for (link, offset) in index.references() {
            assert!(index.owners_of(offset).any(|owner| owner == link));
        }
        for (offset, owners) in index.entries() {
            for link in owners {
                assert_eq!(index.reference_of(*link), Some(offset));
            }
        }
    }
}
