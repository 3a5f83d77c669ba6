use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::index::{LinkIndex, TermIndex};
use crate::persistence::{ContentLog, IndexFiles};
use crate::tokenizer::Tokenizer;
use crate::types::{ContentOffset, LinkHash, StoreStats, WORD_SIZE};

/// Persistent string storage with term search and content dedup.
///
/// Single writer: mutating calls take `&mut self`, reads take `&self` and
/// open their own short-lived file handles. Wrap in
/// [`SharedStringStore`](crate::SharedStringStore) to share across threads.
pub struct StringStore {
    pub(super) config: StoreConfig,
    pub(super) tokenizer: Tokenizer,
    pub(super) content: ContentLog,
    pub(super) terms: TermIndex,
    pub(super) links: LinkIndex,
    index_files: IndexFiles,
}

impl StringStore {
    /// Create the root directory if needed and open an empty store over it.
    ///
    /// Index files are not read; call [`load`](Self::load) for that, or use
    /// [`open`](Self::open).
    pub fn initialize(config: StoreConfig) -> Result<Self> {
        info!(path = %config.path.display(), "initializing string store");
        config.validate()?;
        ensure_root(&config.path)?;

        let content = ContentLog::open(config.strings_path())?;
        let index_files = IndexFiles::new(config.term_offsets_path(), config.link_hashes_path());

        Ok(Self {
            tokenizer: Tokenizer::new(&config.tokenizer),
            content,
            terms: TermIndex::new(),
            links: LinkIndex::new(),
            index_files,
            config,
        })
    }

    /// Initialize, then load saved indexes.
    ///
    /// Starts empty only when neither index file exists. A lone index file
    /// fails the load like any other missing file.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let mut store = Self::initialize(config)?;
        if store.index_files.any_exist() {
            store.load()?;
        } else {
            info!(path = %store.config.path.display(), "no saved indexes, starting empty");
        }
        Ok(store)
    }

    /// Release the store. Unsaved index changes are discarded.
    pub fn shutdown(self) {
        info!(
            path = %self.config.path.display(),
            next_offset = self.content.next_offset(),
            "string store shutdown"
        );
    }

    /// Replace the in-memory indexes with the saved ones.
    ///
    /// Missing files, truncated records and offsets beyond the content log
    /// abort the load and leave the current indexes untouched.
    pub fn load(&mut self) -> Result<()> {
        info!(path = %self.config.path.display(), "loading string store indexes");
        let loaded = self.index_files.load()?;
        let log_end = self.content.refresh()?;

        if loaded.next_offset > log_end {
            return Err(StoreError::Corrupt(format!(
                "saved next offset {} is past content log end {}",
                loaded.next_offset, log_end
            )));
        }
        if loaded.next_offset < log_end {
            warn!(
                saved = loaded.next_offset,
                log_end, "content log grew after last save, appending at log end"
            );
        }

        let beyond = |offset: ContentOffset| {
            offset
                .checked_add(WORD_SIZE)
                .map_or(true, |header_end| header_end > log_end)
        };
        if let Some((term, _)) = loaded
            .terms
            .entries()
            .find(|(_, offsets)| offsets.iter().any(|&o| beyond(o)))
        {
            return Err(StoreError::Corrupt(format!(
                "term {:?} references an offset past content log end {}",
                String::from_utf8_lossy(&term),
                log_end
            )));
        }
        if let Some((offset, _)) = loaded.links.entries().find(|(o, _)| beyond(*o)) {
            return Err(StoreError::Corrupt(format!(
                "link index references offset {} past content log end {}",
                offset, log_end
            )));
        }

        self.terms = loaded.terms;
        self.links = loaded.links;
        info!(
            next_offset = log_end,
            terms = self.terms.len(),
            links = self.links.linked_count(),
            "all data loaded"
        );
        Ok(())
    }

    /// Write the term index and link index files.
    pub fn save(&self) -> Result<()> {
        info!(path = %self.config.path.display(), "saving string store indexes");
        self.index_files
            .save(self.content.next_offset(), &self.terms, &self.links)?;
        info!("all data saved");
        Ok(())
    }

    /// Link `string` to `link`, reusing stored content when an identical
    /// searchable string already exists.
    ///
    /// Returns the content offset `link` now references.
    pub fn link_string(&mut self, link: LinkHash, string: &str) -> Result<ContentOffset> {
        let searchable = self.is_searchable(string);
        let terms = if searchable {
            self.tokenizer.split(string)
        } else {
            Vec::new()
        };

        let existing = match terms.first() {
            Some(first) => self.find_exact(first, string)?,
            None => None,
        };

        let offset = match existing {
            Some(offset) => offset,
            None => {
                let offset = self.content.append(string.as_bytes())?;
                self.terms.index_terms(&terms, offset);
                offset
            }
        };

        let moved = self.links.set_reference(link, offset);
        debug!(
            link,
            offset,
            size = string.len(),
            reused = existing.is_some(),
            moved,
            "linked string"
        );
        Ok(offset)
    }

    /// String referenced by `link`, or `None` when nothing is linked
    pub fn get_string(&self, link: LinkHash) -> Result<Option<String>> {
        match self.links.reference_of(link) {
            Some(offset) => self.content.read_string(offset).map(Some),
            None => Ok(None),
        }
    }

    /// String referenced by `link`; unset identifiers yield `NoString`
    pub fn string_for(&self, link: LinkHash) -> Result<String> {
        self.get_string(link)?.ok_or(StoreError::NoString(link))
    }

    /// Content offset `link` references
    pub fn offset_of(&self, link: LinkHash) -> Option<ContentOffset> {
        self.links.reference_of(link)
    }

    /// Identifiers currently sharing the content at `offset`
    pub fn owners_of(&self, offset: ContentOffset) -> Vec<LinkHash> {
        self.links.owners_of(offset).collect()
    }

    /// Terms `string` would be indexed under; empty at or above the threshold
    pub fn terms_of(&self, string: &str) -> Vec<String> {
        if self.is_searchable(string) {
            self.tokenizer.split(string)
        } else {
            Vec::new()
        }
    }

    pub(super) fn is_searchable(&self, string: &str) -> bool {
        string.len() < self.config.max_searchable_string_size
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            next_offset: self.content.next_offset(),
            term_count: self.terms.len(),
            linked_identifiers: self.links.linked_count(),
            stored_offsets: self.links.offset_count(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn term_index(&self) -> &TermIndex {
        &self.terms
    }

    pub fn link_index(&self) -> &LinkIndex {
        &self.links
    }

    pub fn content_log(&self) -> &ContentLog {
        &self.content
    }
}

fn ensure_root(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(StoreError::InvalidPath {
            path: path.to_path_buf(),
            source: None,
        });
    }
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|e| StoreError::InvalidPath {
        path: path.to_path_buf(),
        source: Some(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_store(tmp: &TempDir) -> StringStore {
        StringStore::initialize(StoreConfig::new(tmp.path().join("kb"))).unwrap()
    }

    #[test]
    fn test_initialize_creates_root() {
        let tmp = TempDir::new().unwrap();
        let store = create_store(&tmp);

        assert!(tmp.path().join("kb").is_dir());
        assert!(store.config().strings_path().is_file());
        assert_eq!(store.stats(), StoreStats::default());
    }

    #[test]
    fn test_initialize_rejects_bad_paths() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("not_a_dir");
        std::fs::write(&file, b"x").unwrap();

        let err = StringStore::initialize(StoreConfig::new(&file)).err().unwrap();
        assert!(matches!(err, StoreError::InvalidPath { .. }));

        let err = StringStore::initialize(StoreConfig::new("")).err().unwrap();
        assert!(matches!(err, StoreError::InvalidPath { source: None, .. }));
    }

    #[test]
    fn test_link_and_get() {
        let tmp = TempDir::new().unwrap();
        let mut store = create_store(&tmp);

        store.link_string(42, "hello world").unwrap();
        assert_eq!(store.string_for(42).unwrap(), "hello world");
        assert_eq!(store.get_string(7).unwrap(), None);
        assert!(store.string_for(7).unwrap_err().is_not_found());
    }

    #[test]
    fn test_dedup_shares_offset() {
        let tmp = TempDir::new().unwrap();
        let mut store = create_store(&tmp);

        let a = store.link_string(1, "shared content").unwrap();
        let end = store.stats().next_offset;
        let b = store.link_string(2, "shared content").unwrap();

        assert_eq!(a, b);
        assert_eq!(store.stats().next_offset, end);
        assert_eq!(store.owners_of(a), vec![1, 2]);
    }

    #[test]
    fn test_same_first_term_different_content() {
        let tmp = TempDir::new().unwrap();
        let mut store = create_store(&tmp);

        let a = store.link_string(1, "hello world").unwrap();
        let b = store.link_string(2, "hello there").unwrap();
        let c = store.link_string(3, "hello").unwrap();

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(store.string_for(3).unwrap(), "hello");
    }

    #[test]
    fn test_relink_replaces_reference() {
        let tmp = TempDir::new().unwrap();
        let mut store = create_store(&tmp);

        let first = store.link_string(1, "old value").unwrap();
        let second = store.link_string(1, "new value").unwrap();

        assert_eq!(store.string_for(1).unwrap(), "new value");
        assert!(store.owners_of(first).is_empty());
        assert_eq!(store.owners_of(second), vec![1]);
        assert_eq!(store.offset_of(1), Some(second));
    }

    #[test]
    fn test_relink_same_string_is_stable() {
        let tmp = TempDir::new().unwrap();
        let mut store = create_store(&tmp);

        let first = store.link_string(9, "stable").unwrap();
        let again = store.link_string(9, "stable").unwrap();
        assert_eq!(first, again);
        assert_eq!(store.owners_of(first), vec![9]);
        assert_eq!(store.term_index().offsets_for("stable"), &[first]);
    }

    #[test]
    fn test_long_strings_are_not_indexed_or_deduplicated() {
        let tmp = TempDir::new().unwrap();
        let config = StoreConfig::new(tmp.path()).with_max_searchable_string_size(10);
        let mut store = StringStore::initialize(config).unwrap();

        let long = "0123456789"; // exactly at the threshold
        let a = store.link_string(1, long).unwrap();
        let b = store.link_string(2, long).unwrap();

        assert_ne!(a, b);
        assert!(store.terms_of(long).is_empty());
        assert!(store.term_index().is_empty());
        assert_eq!(store.string_for(2).unwrap(), long);
    }

    #[test]
    fn test_strings_without_terms_are_stored() {
        let tmp = TempDir::new().unwrap();
        let mut store = create_store(&tmp);

        let a = store.link_string(1, "").unwrap();
        let b = store.link_string(2, " ,. ").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.string_for(1).unwrap(), "");
        assert_eq!(store.string_for(2).unwrap(), " ,. ");
        assert!(store.term_index().is_empty());
    }

    #[test]
    fn test_open_without_saved_indexes() {
        let tmp = TempDir::new().unwrap();
        let store = StringStore::open(StoreConfig::new(tmp.path())).unwrap();
        assert_eq!(store.stats().linked_identifiers, 0);
    }

    #[test]
    fn test_failed_load_keeps_current_indexes() {
        let tmp = TempDir::new().unwrap();
        let mut store = create_store(&tmp);
        store.link_string(1, "kept").unwrap();

        assert!(store.load().unwrap_err().is_read_error());
        assert_eq!(store.string_for(1).unwrap(), "kept");
    }
}
