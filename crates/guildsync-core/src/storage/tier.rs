use std::sync::Arc;

use tracing::{debug, warn};

use super::LocalStore;
use crate::error::StorageError;
use crate::models::{Collection, CollectionName};

/// Collection-level view over a raw `LocalStore`.
///
/// Entries that are missing, unreadable, fail schema validation, or carry a
/// zero `lastUpdated` all load as `None`.
#[derive(Clone)]
pub struct LocalTier {
    store: Arc<dyn LocalStore>,
}

impl LocalTier {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    pub fn load(&self, name: CollectionName) -> Option<Collection> {
        let text = match self.store.get(name.as_str()) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                warn!(collection = %name, error = %e, "Failed to read local store");
                return None;
            }
        };

        match Collection::from_json(name, &text) {
            Ok(collection) if collection.last_updated > 0 => Some(collection),
            Ok(_) => {
                debug!(collection = %name, "Ignoring local entry without lastUpdated");
                None
            }
            Err(e) => {
                warn!(collection = %name, error = %e, "Ignoring corrupt local entry");
                None
            }
        }
    }

    pub fn save(&self, collection: &Collection) -> Result<(), StorageError> {
        let json = collection
            .to_json()
            .map_err(|e| StorageError::Serialize(collection.name, e))?;
        self.store.set(collection.name.as_str(), &json)
    }

    pub fn remove(&self, name: CollectionName) -> Result<(), StorageError> {
        self.store.remove(name.as_str())
    }
}
