//! In-memory cache tier.
//!
//! Holds one `CacheEntry` per collection. Entries expire after a TTL
//! (5 minutes by default) and the whole cache is flushed on every write.

pub mod memory;

pub use memory::{CacheEntry, MemoryCache, DEFAULT_CACHE_TTL};
