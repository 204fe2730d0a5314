//! Key-value storage collaborator for cache persistence.
//!
//! The cache only ever reads and writes one string value under one key. What
//! backs the store (browser storage, a file, a database row) is the
//! embedding application's business.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{RankError, Result};

/// A string-to-string store the result cache can persist its snapshot into.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Storage`] when the medium is unavailable.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Storage`] when the medium is unavailable or full.
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process [`KeyValueStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one value.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), value.into());
        store
    }

    /// Current value under `key`, bypassing the trait's `Result`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A store whose medium is gone: every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn read(&self, _key: &str) -> Result<Option<String>> {
        Err(RankError::Storage("storage medium unavailable".into()))
    }

    fn write(&self, _key: &str, _value: &str) -> Result<()> {
        Err(RankError::Storage("storage medium unavailable".into()))
    }
}
