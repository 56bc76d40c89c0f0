//! Local persistent storage tier.
//!
//! `LocalStore` is a flat string key/value space (key = collection name,
//! value = the collection's JSON document). `LocalTier` layers the collection
//! codec and validation on top of it.
//!
//! Implementations:
//! - `FileStore`: one JSON file per key in a directory
//! - `MemoryStore`: in-process map with an optional quota

pub mod file;
pub mod memory;
pub mod tier;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use tier::LocalTier;

use crate::error::StorageError;

/// Flat key/value persistence. No transactions; callers never retry.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
