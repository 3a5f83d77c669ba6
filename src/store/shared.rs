use std::collections::HashSet;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::store::StringStore;
use crate::types::{ContentOffset, LinkHash, TermMode};

/// Process-owned slot holding at most one open [`StringStore`].
///
/// Writers are serialized by the lock; readers run concurrently. Every
/// operation on an empty slot fails with `NotInitialized`.
#[derive(Default)]
pub struct SharedStringStore {
    inner: RwLock<Option<StringStore>>,
}

impl SharedStringStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store into the slot, replacing any store already there
    pub fn initialize(&self, config: StoreConfig) -> Result<()> {
        let store = StringStore::open(config)?;
        let mut slot = self.inner.write();
        if let Some(previous) = slot.replace(store) {
            warn!(
                path = %previous.config().path.display(),
                "replacing an initialized string store without saving"
            );
            previous.shutdown();
        }
        Ok(())
    }

    /// Empty the slot, saving the indexes first when `save_state` is set.
    ///
    /// A failed save leaves the store in place.
    pub fn shutdown(&self, save_state: bool) -> Result<()> {
        let mut slot = self.inner.write();
        let store = slot.as_ref().ok_or(StoreError::NotInitialized)?;
        if save_state {
            store.save()?;
        }
        if let Some(store) = slot.take() {
            store.shutdown();
        }
        info!(save_state, "shared string store released");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Run `f` with shared access to the store
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&StringStore) -> Result<T>,
    {
        let guard = self.inner.read();
        let store = guard.as_ref().ok_or(StoreError::NotInitialized)?;
        f(store)
    }

    /// Run `f` with exclusive access to the store
    pub fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut StringStore) -> Result<T>,
    {
        let mut guard = self.inner.write();
        let store = guard.as_mut().ok_or(StoreError::NotInitialized)?;
        f(store)
    }

    pub fn load(&self) -> Result<()> {
        self.write(|store| store.load())
    }

    pub fn save(&self) -> Result<()> {
        self.read(|store| store.save())
    }

    pub fn link_string(&self, link: LinkHash, string: &str) -> Result<ContentOffset> {
        self.write(|store| store.link_string(link, string))
    }

    pub fn string_for(&self, link: LinkHash) -> Result<String> {
        self.read(|store| store.string_for(link))
    }

    pub fn identifiers_for(&self, string: &str, substring: bool) -> Result<HashSet<LinkHash>> {
        self.read(|store| store.identifiers_for(string, substring))
    }

    pub fn strings_for(&self, substring: &str) -> Result<HashSet<String>> {
        self.read(|store| store.strings_for(substring))
    }

    pub fn identifiers_for_terms(
        &self,
        terms: &[&str],
        mode: TermMode,
    ) -> Result<HashSet<LinkHash>> {
        self.read(|store| store.identifiers_for_terms(terms, mode))
    }

    pub fn strings_for_terms(&self, terms: &[&str], mode: TermMode) -> Result<HashSet<String>> {
        self.read(|store| store.strings_for_terms(terms, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_uninitialized_operations_fail() {
        let shared = SharedStringStore::new();
        assert!(!shared.is_initialized());

        assert!(matches!(shared.string_for(1), Err(StoreError::NotInitialized)));
        assert!(matches!(shared.link_string(1, "x"), Err(StoreError::NotInitialized)));
        assert!(matches!(shared.save(), Err(StoreError::NotInitialized)));
        assert!(matches!(shared.shutdown(false), Err(StoreError::NotInitialized)));
    }

    #[test]
    fn test_shutdown_with_save_then_reinitialize() {
        let tmp = TempDir::new().unwrap();
        let shared = SharedStringStore::new();

        shared.initialize(StoreConfig::new(tmp.path())).unwrap();
        shared.link_string(42, "hello world").unwrap();
        shared.shutdown(true).unwrap();
        assert!(!shared.is_initialized());

        shared.initialize(StoreConfig::new(tmp.path())).unwrap();
        assert_eq!(shared.string_for(42).unwrap(), "hello world");
        assert_eq!(
            shared.identifiers_for_terms(&["hello"], TermMode::Or).unwrap(),
            HashSet::from([42])
        );
    }

    #[test]
    fn test_shutdown_without_save_drops_indexes() {
        let tmp = TempDir::new().unwrap();
        let shared = SharedStringStore::new();

        shared.initialize(StoreConfig::new(tmp.path())).unwrap();
        shared.link_string(1, "transient").unwrap();
        shared.shutdown(false).unwrap();

        shared.initialize(StoreConfig::new(tmp.path())).unwrap();
        assert!(shared.string_for(1).unwrap_err().is_not_found());
    }

    #[test]
    fn test_concurrent_readers() {
        let tmp = TempDir::new().unwrap();
        let shared = Arc::new(SharedStringStore::new());
        shared.initialize(StoreConfig::new(tmp.path())).unwrap();
        for i in 0..16u64 {
            shared.link_string(i, &format!("entry number {}", i)).unwrap();
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || shared.identifiers_for("entry", true).unwrap().len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 16);
        }
    }
}
