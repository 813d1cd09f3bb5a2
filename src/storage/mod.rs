//! Storage layer for the Prism event logs
//!
//! The event log store persists through a small key-value capability
//! instead of a process-wide global, so it can run against an in-memory
//! fake in tests and a file-backed store in production.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::Result;

/// Durable key-value backend holding one serialized log per key
pub trait StorageBackend: Send + Sync {
    /// Whether the backend exists at all in this execution context.
    ///
    /// Checked once when the event log store is constructed; an
    /// unavailable backend turns every store operation into a safe no-op.
    fn is_available(&self) -> bool {
        true
    }

    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the raw value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;
}
