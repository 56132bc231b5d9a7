//! In-memory key-value store implementation
//!
//! The store is owned by a single session and accessed from one thread, so
//! it needs no locking. Every method returns `Result` so that alternate
//! backends can surface faults that end the session.

use crate::error::Result;
use std::collections::HashMap;

/// Trait defining the interface for key-value storage operations
pub trait Store {
    /// Insert or overwrite the value for a key
    fn put(&mut self, key: String, value: String) -> Result<()>;

    /// Get a value by key
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Delete a key, returning whether it was present
    fn delete(&mut self, key: &str) -> Result<bool>;

    /// Check if a key exists
    fn exists(&self, key: &str) -> Result<bool>;

    /// Get the number of stored entries
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// `HashMap` backed store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn put(&mut self, key: String, value: String) -> Result<()> {
        self.data.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.get(key).cloned())
    }

    fn delete(&mut self, key: &str) -> Result<bool> {
        Ok(self.data.remove(key).is_some())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.data.contains_key(key))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.data.len())
    }
}
