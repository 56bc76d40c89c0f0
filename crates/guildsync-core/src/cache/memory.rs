use std::collections::HashMap;
use std::time::Duration;

use crate::models::{Collection, CollectionName};

/// Memory entries older than this are ignored and the remote is consulted again.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

const MILLIS_PER_MINUTE: i64 = 60_000;
const MINUTES_PER_DAY: i64 = 24 * 60;

/// A collection snapshot held in memory, stamped with when it was cached.
///
/// `cached_at` is the insertion time and has nothing to do with
/// `data.last_updated`, which tracks the last mutation of the data itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub data: Collection,
    pub cached_at: i64,
}

impl CacheEntry {
    pub fn new(data: Collection, now: i64) -> Self {
        Self {
            data,
            cached_at: now,
        }
    }

    pub fn age_millis(&self, now: i64) -> i64 {
        now.saturating_sub(self.cached_at)
    }

    pub fn age_minutes(&self, now: i64) -> i64 {
        self.age_millis(now) / MILLIS_PER_MINUTE
    }

    pub fn is_fresh(&self, now: i64, ttl_millis: i64) -> bool {
        self.age_millis(now) < ttl_millis
    }

    /// Coarsest whole unit of the entry's age: "just now", "5m ago", "2h ago", "3d ago".
    pub fn age_display(&self, now: i64) -> String {
        match self.age_minutes(now) {
            // Includes negative ages from clock skew
            m if m < 1 => "just now".to_string(),
            m if m < 60 => format!("{}m ago", m),
            m if m < MINUTES_PER_DAY => format!("{}h ago", m / 60),
            m => format!("{}d ago", m / MINUTES_PER_DAY),
        }
    }
}

/// At most one entry per collection; inserting overwrites.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<CollectionName, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: CollectionName) -> Option<&CacheEntry> {
        self.entries.get(&name)
    }

    pub fn insert(&mut self, data: Collection, now: i64) {
        self.entries.insert(data.name, CacheEntry::new(data, now));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
