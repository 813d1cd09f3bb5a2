//! In-memory storage backend
//!
//! Used by tests and by callers that want analytics without persistence.

use super::StorageBackend;
use crate::error::{PrismError, Result};
use std::collections::HashMap;
use std::sync::RwLock;

/// Volatile key-value backend
#[derive(Debug)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
    available: bool,
}

impl MemoryStorage {
    /// Create an empty, available backend
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            available: true,
        }
    }

    /// Create a backend that reports itself absent, like a rendering
    /// context with no persistent store
    pub fn unavailable() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            available: false,
        }
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for MemoryStorage {
    fn is_available(&self) -> bool {
        self.available
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| PrismError::Storage("memory storage lock poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| PrismError::Storage("memory storage lock poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
