//! Document types.
//!
//! This module defines the [`Document`] type, a JSON object as stored in a
//! collection and handed around by the access layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BackendError, StorageError, StorageResult};

/// Name of the primary key field on every document.
pub const ID_FIELD: &str = "_id";

/// A stored JSON object.
///
/// Documents are schemaless; the access layer only cares about the `_id`
/// field and whatever fields carry owner references or ACLs.
///
/// # Examples
///
/// ```
/// use helios_access::types::Document;
/// use serde_json::json;
///
/// let doc = Document::from_value(json!({"_id": "abc", "name": "scan.dcm"})).unwrap();
/// assert_eq!(doc.id().as_deref(), Some("abc"));
///
/// let projected = doc.project::<&str>(&[]);
/// assert!(projected.contains_key("_id"));
/// assert!(!projected.contains_key("name"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Creates a document from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> StorageResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StorageError::Backend(BackendError::SerializationError {
                message: format!("expected a JSON object, found {}", other),
            })),
        }
    }

    /// Returns the document's id rendered as a string.
    pub fn id(&self) -> Option<String> {
        self.0.get(ID_FIELD).and_then(value_as_id)
    }

    /// Sets the document's id.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.0.insert(ID_FIELD.to_string(), Value::String(id.into()));
    }

    /// Returns the value of a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if the top-level field is present (even if null).
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Inserts or replaces a top-level field.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Removes a top-level field, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the document and returns it as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Returns a copy restricted to `_id` and the given fields.
    ///
    /// An empty field list keeps only `_id`.
    pub fn project<S: AsRef<str>>(&self, fields: &[S]) -> Document {
        let mut projected = Map::new();
        if let Some(id) = self.0.get(ID_FIELD) {
            projected.insert(ID_FIELD.to_string(), id.clone());
        }
        for field in fields {
            let field = field.as_ref();
            if let Some(value) = self.0.get(field) {
                projected.insert(field.to_string(), value.clone());
            }
        }
        Document(projected)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Document {
    type Error = StorageError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Renders a JSON id value as a string.
///
/// Strings are used as they are and numbers are rendered in decimal. Any other
/// shape is not a usable id.
pub fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
