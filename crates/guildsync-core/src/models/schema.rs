//! Per-collection schema: storage key, id prefix, and the timestamp fields
//! stamped onto records by mutations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::Record;

/// Status assigned to every newly added member.
pub const MEMBER_ACTIVE_STATUS: &str = "active";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown collection: {0} (expected \"photos\" or \"members\")")]
pub struct UnknownCollection(pub String);

/// The collections the guild site knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum CollectionName {
    Photos,
    Members,
}

impl CollectionName {
    pub const ALL: [CollectionName; 2] = [CollectionName::Photos, CollectionName::Members];

    /// Name used as the local-store key and as the items key in the JSON document.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionName::Photos => "photos",
            CollectionName::Members => "members",
        }
    }

    pub fn items_key(&self) -> &'static str {
        self.as_str()
    }

    /// Name of the static JSON resource backing this collection.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }

    pub fn id_prefix(&self) -> &'static str {
        match self {
            CollectionName::Photos => "photo",
            CollectionName::Members => "member",
        }
    }

    /// Stamp the fields a freshly added record carries.
    pub fn stamp_new(&self, record: &mut Record, now: i64) {
        match self {
            CollectionName::Photos => {
                record.set("createdAt", Value::from(now));
                record.set("updatedAt", Value::from(now));
            }
            CollectionName::Members => {
                record.set("joinDate", Value::from(now));
                record.set("status", Value::from(MEMBER_ACTIVE_STATUS));
            }
        }
    }

    /// Stamp the fields an updated record carries. Members keep no update time.
    pub fn stamp_update(&self, record: &mut Record, now: i64) {
        if let CollectionName::Photos = self {
            record.set("updatedAt", Value::from(now));
        }
    }

    /// Timestamp that counts as the record's most recent activity for stats.
    pub fn activity_timestamp(&self, record: &Record) -> Option<i64> {
        match self {
            CollectionName::Photos => record
                .timestamp("updatedAt")
                .filter(|&ts| ts != 0)
                .or_else(|| record.timestamp("createdAt")),
            CollectionName::Members => record.timestamp("joinDate"),
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CollectionName {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = trimmed.strip_suffix(".json").unwrap_or(trimmed);
        match bare.to_ascii_lowercase().as_str() {
            "photos" => Ok(CollectionName::Photos),
            "members" => Ok(CollectionName::Members),
            _ => Err(UnknownCollection(s.to_string())),
        }
    }
}
