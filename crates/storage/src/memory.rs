//! In-memory storage backend for testing
//!
//! All data is lost when the store is dropped. Thread-safe via internal
//! `RwLock`.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use anyhow::Result;

use crate::StorageBackend;

/// Ephemeral key-value store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with entries.
    pub fn with_entries(entries: Vec<(&str, &str)>) -> Self {
        let store = Self::new();
        {
            let mut map = store
                .entries
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            for (key, value) in entries {
                map.insert(key.to_string(), value.to_string());
            }
        }
        store
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
