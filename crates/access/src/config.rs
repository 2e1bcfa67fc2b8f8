//! Delegation configuration for a set of collections.
//!
//! Deployments describe which collections delegate their permissions, and to
//! what, in a single JSON document:
//!
//! ```json
//! {
//!     "collections": [
//!         {"collection": "item", "ownerType": "folder", "ownerField": "folderId"},
//!         {"collection": "file"},
//!         {"collection": "annotationelement", "ownerType": ["annotation", "large_image"], "ownerField": "annotationId"},
//!         {"collection": "image", "namespace": "large_image"}
//!     ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::delegation::DelegationConfig;
use crate::error::{BackendError, ConfigError, StorageResult};
use crate::types::ResourceType;

/// Delegation settings for every dependent collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// One entry per dependent collection.
    #[serde(default)]
    pub collections: Vec<DelegationConfig>,
}

impl AccessConfig {
    /// Creates a configuration from a list of collection settings.
    pub fn new(collections: Vec<DelegationConfig>) -> Self {
        Self { collections }
    }

    /// Parses a configuration from JSON. The result is not validated.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a configuration from a JSON file. The result is not validated.
    pub fn from_path(path: impl AsRef<Path>) -> StorageResult<Self> {
        let json = std::fs::read_to_string(path).map_err(BackendError::from)?;
        Self::from_json(&json)
    }

    /// Returns the settings for an un-namespaced collection.
    pub fn get(&self, collection: &str) -> Option<&DelegationConfig> {
        self.get_as(&ResourceType::new(collection))
    }

    /// Returns the settings for a collection by type.
    pub fn get_as(&self, resource_type: &ResourceType) -> Option<&DelegationConfig> {
        self.collections
            .iter()
            .find(|c| &c.resource_type() == resource_type)
    }

    /// Validates the configuration.
    ///
    /// Returns a list of validation errors if any are found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for (index, config) in self.collections.iter().enumerate() {
            if config.collection.trim().is_empty() {
                errors.push(format!("Collection #{index} has an empty name"));
                continue;
            }

            let name = config.resource_type();
            if !seen.insert(name.clone()) {
                errors.push(format!("Collection '{name}' is configured more than once"));
            }

            match (&config.owner_type, &config.owner_field) {
                (Some(_), None) => errors.push(format!(
                    "Collection '{name}' declares an owner type without an owner field"
                )),
                (None, Some(_)) => errors.push(format!(
                    "Collection '{name}' declares an owner field without an owner type"
                )),
                (Some(owner_type), Some(owner_field)) => {
                    if owner_type.name().trim().is_empty() {
                        errors.push(format!("Collection '{name}' has an empty owner type"));
                    }
                    if owner_field.trim().is_empty() {
                        errors.push(format!("Collection '{name}' has an empty owner field"));
                    }
                }
                (None, None) => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates the configuration, folding all problems into one error.
    pub fn ensure_valid(&self) -> StorageResult<()> {
        self.validate().map_err(|errors| {
            ConfigError::Invalid {
                message: errors.join("; "),
            }
            .into()
        })
    }
}
