//! Data models for the guild site's collections.
//!
//! - `CollectionName`: the closed set of collections and their per-name schema
//! - `Collection`: a snapshot of records plus `lastUpdated`/`version`
//! - `Record`: a single photo or member entry keyed by `id`
//! - `Stats`: counts and latest activity across both collections

pub mod collection;
pub mod record;
pub mod schema;
pub mod stats;

pub use collection::{Collection, DEFAULT_VERSION};
pub use record::Record;
pub use schema::{CollectionName, UnknownCollection, MEMBER_ACTIVE_STATUS};
pub use stats::Stats;
