use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SchemaError;

/// A photo or member entry: a JSON object that always carries a string `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Build a record from caller fields. The given id replaces any `id` in `fields`.
    pub fn with_id(id: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.insert("id".to_string(), Value::String(id.into()));
        Self(fields)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    /// Read an epoch-millis field. Fractional JSON numbers are truncated.
    pub fn timestamp(&self, key: &str) -> Option<i64> {
        let value = self.0.get(key)?;
        value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
    }

    /// Shallow-merge `patch` over this record. The id never changes.
    pub fn merge(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            if key == "id" {
                continue;
            }
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl TryFrom<Value> for Record {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => match map.get("id") {
                Some(Value::String(_)) => Ok(Self(map)),
                _ => Err(SchemaError::MissingId),
            },
            _ => Err(SchemaError::RecordNotAnObject),
        }
    }
}
