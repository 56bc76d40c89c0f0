use thiserror::Error;

use crate::models::CollectionName;
use crate::remote::RemoteError;

/// A JSON document that does not match its collection's schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document is not a JSON object")]
    NotAnObject,

    #[error("Missing \"{0}\" array")]
    MissingItems(&'static str),

    #[error("\"{0}\" is not an array")]
    ItemsNotArray(&'static str),

    #[error("Missing numeric \"lastUpdated\"")]
    MissingLastUpdated,

    #[error("\"lastUpdated\" is out of range")]
    LastUpdatedOutOfRange,

    #[error("Record is not a JSON object")]
    RecordNotAnObject,

    #[error("Record has no string \"id\"")]
    MissingId,

    #[error("Invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("Duplicate record id: {0}")]
    DuplicateId(String),
}

/// Failure writing to or reading from the local persistent store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {0}: {1}")]
    Serialize(CollectionName, #[source] serde_json::Error),

    #[error("Storage quota exceeded writing {key} ({needed} bytes, limit {limit})")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },
}

/// Errors surfaced by the diagnostic operations. Steady-state reads never return one.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to encode collection: {0}")]
    Encode(#[from] serde_json::Error),
}
