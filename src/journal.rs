//! Undo journal for session rollback
//!
//! Before a session mutates a key for the first time, the key's prior state
//! is recorded. Rolling back replays the journal newest-first, restoring each
//! key to what it held when the session began.

use crate::error::{RefVaultError, Result};
use crate::store::Store;
use std::collections::HashSet;

/// Pre-session state of a single key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    pub key: String,
    /// `None` when the key did not exist
    pub prior: Option<String>,
}

/// Undo log of every key touched since the session began
#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<UndoEntry>,
    touched: HashSet<String>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the prior state of `key`. Only the first record per key is kept.
    pub fn record(&mut self, key: &str, prior: Option<String>) {
        if self.touched.insert(key.to_string()) {
            self.entries.push(UndoEntry {
                key: key.to_string(),
                prior,
            });
        }
    }

    pub fn is_recorded(&self, key: &str) -> bool {
        self.touched.contains(key)
    }

    pub fn entries(&self) -> &[UndoEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget all recorded state; nothing recorded so far can be undone
    pub fn clear(&mut self) {
        self.entries.clear();
        self.touched.clear();
    }

    /// Restore every recorded key in `store`, newest first.
    ///
    /// Returns the number of keys restored. An entry leaves the journal only
    /// once its key is restored, so a failed rollback can be run again.
    pub fn rollback<S: Store + ?Sized>(&mut self, store: &mut S) -> Result<usize> {
        let mut restored = 0;

        while let Some(entry) = self.entries.last() {
            let result = match &entry.prior {
                Some(value) => store.put(entry.key.clone(), value.clone()),
                None => store.delete(&entry.key).map(|_| ()),
            };
            result.map_err(|e| {
                RefVaultError::Rollback(format!("failed to restore key '{}': {}", entry.key, e))
            })?;

            if let Some(entry) = self.entries.pop() {
                self.touched.remove(&entry.key);
            }
            restored += 1;
        }

        Ok(restored)
    }
}

/// Store wrapper that journals prior state ahead of every mutation
pub struct JournaledStore<'a, S: Store + ?Sized> {
    store: &'a mut S,
    journal: &'a mut Journal,
}

impl<'a, S: Store + ?Sized> JournaledStore<'a, S> {
    pub fn new(store: &'a mut S, journal: &'a mut Journal) -> Self {
        Self { store, journal }
    }

    fn capture(&mut self, key: &str) -> Result<()> {
        if !self.journal.is_recorded(key) {
            let prior = self.store.get(key)?;
            self.journal.record(key, prior);
        }
        Ok(())
    }
}

impl<S: Store + ?Sized> Store for JournaledStore<'_, S> {
    fn put(&mut self, key: String, value: String) -> Result<()> {
        self.capture(&key)?;
        self.store.put(key, value)
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        self.store.get(key)
    }

    fn delete(&mut self, key: &str) -> Result<bool> {
        self.capture(key)?;
        self.store.delete(key)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.store.exists(key)
    }

    fn len(&self) -> Result<usize> {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn put(store: &mut impl Store, key: &str, value: &str) {
        store.put(key.to_string(), value.to_string()).unwrap();
    }

    #[test]
    fn test_first_record_per_key_wins() {
        let mut journal = Journal::new();

        journal.record("A", None);
        journal.record("A", Some("later".to_string()));

        assert_eq!(journal.len(), 1);
        assert_eq!(journal.entries()[0].prior, None);
    }

    #[test]
    fn test_rollback_restores_pre_session_state() {
        let mut store = MemoryStore::new();
        put(&mut store, "A", "1");
        put(&mut store, "B", "2");

        let mut journal = Journal::new();
        {
            let mut journaled = JournaledStore::new(&mut store, &mut journal);
            put(&mut journaled, "A", "10");
            put(&mut journaled, "A", "11");
            put(&mut journaled, "C", "3");
            journaled.delete("B").unwrap();
        }
        assert_eq!(store.get("A").unwrap(), Some("11".to_string()));
        assert!(!store.exists("B").unwrap());

        let restored = journal.rollback(&mut store).unwrap();

        assert_eq!(restored, 3);
        assert!(journal.is_empty());
        assert_eq!(store.get("A").unwrap(), Some("1".to_string()));
        assert_eq!(store.get("B").unwrap(), Some("2".to_string()));
        assert!(!store.exists("C").unwrap());
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_deleting_absent_key_rolls_back_cleanly() {
        let mut store = MemoryStore::new();
        let mut journal = Journal::new();
        {
            let mut journaled = JournaledStore::new(&mut store, &mut journal);
            assert!(!journaled.delete("missing").unwrap());
        }

        journal.rollback(&mut store).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_clear_discards_undo_state() {
        let mut store = MemoryStore::new();
        let mut journal = Journal::new();
        {
            let mut journaled = JournaledStore::new(&mut store, &mut journal);
            put(&mut journaled, "A", "1");
        }

        journal.clear();
        assert_eq!(journal.rollback(&mut store).unwrap(), 0);
        assert_eq!(store.get("A").unwrap(), Some("1".to_string()));
    }

    /// Memory store whose deletes fail while `locked` is set
    #[derive(Default)]
    struct LockedStore {
        inner: MemoryStore,
        locked: bool,
    }

    impl Store for LockedStore {
        fn put(&mut self, key: String, value: String) -> Result<()> {
            self.inner.put(key, value)
        }

        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn delete(&mut self, key: &str) -> Result<bool> {
            if self.locked {
                return Err(RefVaultError::Store("locked".to_string()));
            }
            self.inner.delete(key)
        }

        fn exists(&self, key: &str) -> Result<bool> {
            self.inner.exists(key)
        }

        fn len(&self) -> Result<usize> {
            self.inner.len()
        }
    }

    #[test]
    fn test_failed_restore_keeps_entry_for_retry() {
        let mut store = LockedStore::default();
        put(&mut store.inner, "A", "1");

        let mut journal = Journal::new();
        {
            let mut journaled = JournaledStore::new(&mut store, &mut journal);
            put(&mut journaled, "B", "2");
            put(&mut journaled, "A", "10");
        }

        store.locked = true;
        let err = journal.rollback(&mut store).unwrap_err();

        assert!(matches!(err, RefVaultError::Rollback(_)));
        // "A" was restored before the delete of "B" failed
        assert_eq!(store.get("A").unwrap(), Some("1".to_string()));
        assert_eq!(journal.len(), 1);
        assert!(journal.is_recorded("B"));

        store.locked = false;
        assert_eq!(journal.rollback(&mut store).unwrap(), 1);
        assert!(journal.is_empty());
        assert!(!store.exists("B").unwrap());
        assert_eq!(store.len().unwrap(), 1);
    }
}
