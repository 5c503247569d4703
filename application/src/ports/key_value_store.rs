//! Key-value storage port
//!
//! A small string-to-string store standing in for tab-scoped browser
//! storage. Implementations live in the infrastructure layer; tests use
//! in-memory fakes.

use thiserror::Error;

/// Errors raised by a key-value store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt storage data: {0}")]
    Corrupt(String),
}

/// String key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
