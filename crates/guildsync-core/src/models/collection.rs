use std::collections::HashSet;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use super::{CollectionName, Record};
use crate::error::SchemaError;

/// Version tag written on every snapshot. Carried through, never interpreted.
pub const DEFAULT_VERSION: &str = "1.0";

/// A named, ordered set of records plus freshness metadata.
///
/// The JSON form shared by the static files and the local store is
/// `{ "<items key>": [...], "lastUpdated": <epoch ms>, "version": "1.0" }`,
/// where the items key is the collection name.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub name: CollectionName,
    pub items: Vec<Record>,
    /// Epoch millis of the most recent mutation. The only freshness signal between tiers.
    pub last_updated: i64,
    pub version: String,
}

impl Collection {
    pub fn new(name: CollectionName, items: Vec<Record>, last_updated: i64) -> Self {
        Self {
            name,
            items,
            last_updated,
            version: DEFAULT_VERSION.to_string(),
        }
    }

    pub fn empty(name: CollectionName, last_updated: i64) -> Self {
        Self::new(name, Vec::new(), last_updated)
    }

    /// Validate a parsed JSON document against the schema for `name`.
    pub fn from_value(name: CollectionName, value: Value) -> Result<Self, SchemaError> {
        let Value::Object(mut doc) = value else {
            return Err(SchemaError::NotAnObject);
        };

        let key = name.items_key();
        let raw_items = match doc.remove(key) {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(SchemaError::ItemsNotArray(key)),
            None => return Err(SchemaError::MissingItems(key)),
        };

        let last_updated = match doc.get("lastUpdated") {
            Some(v) if v.is_number() => parse_millis(v).ok_or(SchemaError::LastUpdatedOutOfRange)?,
            _ => return Err(SchemaError::MissingLastUpdated),
        };

        let version = doc
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_VERSION)
            .to_string();

        let mut seen = HashSet::with_capacity(raw_items.len());
        let mut items = Vec::with_capacity(raw_items.len());
        for (index, raw) in raw_items.into_iter().enumerate() {
            let record = Record::try_from(raw).map_err(|e| SchemaError::InvalidRecord {
                index,
                reason: e.to_string(),
            })?;
            let id = record.id().unwrap_or_default().to_string();
            if !seen.insert(id.clone()) {
                return Err(SchemaError::DuplicateId(id));
            }
            items.push(record);
        }

        Ok(Self {
            name,
            items,
            last_updated,
            version,
        })
    }

    pub fn from_json(name: CollectionName, text: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(name, value)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn find(&self, id: &str) -> Option<&Record> {
        self.items.iter().find(|r| r.id() == Some(id))
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Epoch millis from a JSON number. Fractions truncate; floats outside the
/// `i64` range are rejected rather than clamped.
fn parse_millis(value: &Value) -> Option<i64> {
    if let Some(millis) = value.as_i64() {
        return Some(millis);
    }
    let f = value.as_f64().filter(|f| f.is_finite())?.trunc();
    (f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(self.name.items_key(), &self.items)?;
        map.serialize_entry("lastUpdated", &self.last_updated)?;
        map.serialize_entry("version", &self.version)?;
        map.end()
    }
}
