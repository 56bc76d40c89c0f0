//! guildsync core - photo and member collections for the guild site.
//!
//! Collections are resolved across three tiers of differing authority:
//!
//! 1. an in-memory cache with a TTL ([`cache`]),
//! 2. a local persistent store that buffers edits and serves offline reads ([`storage`]),
//! 3. the read-only static JSON files the site ships with ([`remote`]).
//!
//! [`SyncedCollectionStore`] owns the freshness policy between them.
//! `lastUpdated` decides which tier is trusted, with strict greater-than so
//! that ties keep the copy already held.

pub mod cache;
pub mod clock;
pub mod config;
pub mod defaults;
pub mod error;
pub mod models;
pub mod remote;
pub mod storage;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use defaults::{DefaultProvider, SeedData};
pub use error::{SchemaError, StorageError, SyncError};
pub use models::{Collection, CollectionName, Record, Stats};
pub use remote::{DirRemote, HttpRemote, RemoteError, RemoteSource};
pub use storage::{FileStore, LocalStore, MemoryStore};
pub use store::{CollectionStatus, SyncedCollectionStore, Written};
