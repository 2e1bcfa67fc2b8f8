//! Resource type identifiers.
//!
//! This module defines the [`ResourceType`] type, a hashable key naming a
//! collection, optionally qualified by the plugin namespace that provides it.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ConfigError;

/// Identifies a collection, optionally within a plugin namespace.
///
/// Two collections provided by different plugins may share a name; the
/// namespace disambiguates them. On the wire a resource type is either a
/// plain string (`"folder"`) or a two-element array
/// (`["annotation", "large_image"]`).
///
/// # Examples
///
/// ```
/// use helios_access::types::ResourceType;
/// use serde_json::json;
///
/// let plain = ResourceType::from_value(&json!("folder")).unwrap();
/// assert_eq!(plain, ResourceType::new("folder"));
///
/// let namespaced = ResourceType::from_value(&json!(["annotation", "large_image"])).unwrap();
/// assert_eq!(namespaced.namespace(), Some("large_image"));
///
/// assert!(ResourceType::from_value(&json!(["a", "b", "c"])).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceType {
    name: String,
    namespace: Option<String>,
}

impl ResourceType {
    /// Creates an un-namespaced resource type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }

    /// Creates a resource type provided by the given plugin namespace.
    pub fn namespaced(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the plugin namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Parses a resource type from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidResourceType`] unless the value is a
    /// string or an array of exactly two strings.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        match value {
            Value::String(name) => Ok(Self::new(name.as_str())),
            Value::Array(parts) if parts.len() == 2 => match (&parts[0], &parts[1]) {
                (Value::String(name), Value::String(namespace)) => {
                    Ok(Self::namespaced(name.as_str(), namespace.as_str()))
                }
                _ => Err(ConfigError::InvalidResourceType {
                    value: value.to_string(),
                }),
            },
            _ => Err(ConfigError::InvalidResourceType {
                value: value.to_string(),
            }),
        }
    }

    /// Returns the JSON form of this resource type.
    pub fn to_value(&self) -> Value {
        match &self.namespace {
            None => Value::String(self.name.clone()),
            Some(namespace) => Value::Array(vec![
                Value::String(self.name.clone()),
                Value::String(namespace.clone()),
            ]),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            None => write!(f, "{}", self.name),
            Some(namespace) => write!(f, "{} ({})", self.name, namespace),
        }
    }
}

impl From<&str> for ResourceType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Serialize for ResourceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResourceType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_structural_equality_and_hashing() {
        let mut decisions = HashMap::new();
        decisions.insert(ResourceType::namespaced("model", "plugin"), true);

        let parsed = ResourceType::from_value(&json!(["model", "plugin"])).unwrap();
        assert_eq!(decisions.get(&parsed), Some(&true));
        assert!(!decisions.contains_key(&ResourceType::new("model")));
    }

    #[test]
    fn test_invalid_shapes() {
        for value in [
            json!(null),
            json!(42),
            json!([]),
            json!(["only"]),
            json!(["a", 1]),
            json!({"name": "folder"}),
        ] {
            let err = ResourceType::from_value(&value).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidResourceType { .. }));
        }
    }

    #[test]
    fn test_serde_roundtrip_shapes() {
        let plain = ResourceType::new("folder");
        assert_eq!(serde_json::to_value(&plain).unwrap(), json!("folder"));

        let namespaced: ResourceType = serde_json::from_value(json!(["model", "plugin"])).unwrap();
        assert_eq!(
            serde_json::to_value(&namespaced).unwrap(),
            json!(["model", "plugin"])
        );

        assert!(serde_json::from_value::<ResourceType>(json!(3)).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ResourceType::new("item").to_string(), "item");
        assert_eq!(
            ResourceType::namespaced("model", "plugin").to_string(),
            "model (plugin)"
        );
    }
}
