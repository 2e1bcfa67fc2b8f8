//! JSON fixtures describing a populated set of in-memory models.
//!
//! ```json
//! {
//!     "models": [
//!         {"name": "folder", "kind": "access_controlled", "documents": [
//!             {"_id": "f1", "public": false, "access": {"users": [{"id": "u1", "level": 1}]}}
//!         ]},
//!         {"name": "item", "kind": "delegated", "ownerType": "folder", "ownerField": "folderId",
//!          "documents": [{"_id": "i1", "folderId": "f1"}]}
//!     ],
//!     "users": [{"_id": "u1"}, {"_id": "root", "admin": true}]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::AccessConfig;
use crate::core::ModelRegistry;
use crate::delegation::{DelegatedCollection, DelegationConfig};
use crate::error::{BackendError, ConfigError, StorageResult};
use crate::types::{ResourceType, User};

use super::{AclCollection, MemoryCollection};

/// How a fixture model decides permissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// No ACL.
    #[default]
    Plain,
    /// Native ACL on each document.
    AccessControlled,
    /// Permissions come from an owner.
    Delegated,
}

/// One model of a fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFixture {
    /// Collection name.
    pub name: String,
    /// Plugin namespace, if any.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Permission behaviour.
    #[serde(default)]
    pub kind: ModelKind,
    /// Declared owner type (delegated models only).
    #[serde(default)]
    pub owner_type: Option<ResourceType>,
    /// Declared owner id field (delegated models only).
    #[serde(default)]
    pub owner_field: Option<String>,
    /// Initial documents.
    #[serde(default)]
    pub documents: Vec<Value>,
}

impl ModelFixture {
    fn resource_type(&self) -> ResourceType {
        match &self.namespace {
            Some(namespace) => ResourceType::namespaced(&self.name, namespace),
            None => ResourceType::new(&self.name),
        }
    }

    fn delegation_config(&self) -> DelegationConfig {
        DelegationConfig {
            collection: self.name.clone(),
            namespace: self.namespace.clone(),
            owner_type: self.owner_type.clone(),
            owner_field: self.owner_field.clone(),
        }
    }
}

/// A set of models, their documents and the users acting on them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    /// Models to register.
    #[serde(default)]
    pub models: Vec<ModelFixture>,
    /// Known users.
    #[serde(default)]
    pub users: Vec<User>,
}

impl Fixture {
    /// Parses a fixture from JSON.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a fixture from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> StorageResult<Self> {
        let json = std::fs::read_to_string(path).map_err(BackendError::from)?;
        Self::from_json(&json)
    }

    /// Returns the delegation settings of the delegated models.
    pub fn access_config(&self) -> AccessConfig {
        AccessConfig::new(
            self.models
                .iter()
                .filter(|m| m.kind == ModelKind::Delegated)
                .map(ModelFixture::delegation_config)
                .collect(),
        )
    }

    /// Creates, populates and registers every model.
    ///
    /// # Errors
    ///
    /// * `ConfigError::Invalid` - If a delegated model is misconfigured or an
    ///   owner setting is given on a model that does not delegate
    /// * `ConfigError::DuplicateModel` - If two models share a type
    pub fn build(&self) -> StorageResult<LoadedFixture> {
        self.access_config().ensure_valid()?;

        let registry = Arc::new(ModelRegistry::new());
        let mut delegated = HashMap::new();

        for model in &self.models {
            if model.kind != ModelKind::Delegated
                && (model.owner_type.is_some() || model.owner_field.is_some())
            {
                return Err(ConfigError::Invalid {
                    message: format!("Model '{}' sets an owner but does not delegate", model.name),
                }
                .into());
            }

            let store = MemoryCollection::with_type(model.resource_type());
            for doc in &model.documents {
                store.save(doc.clone())?;
            }

            match model.kind {
                ModelKind::Plain => registry.register(Arc::new(store))?,
                ModelKind::AccessControlled => {
                    registry.register(Arc::new(AclCollection::from_collection(store)))?
                }
                ModelKind::Delegated => {
                    let collection = Arc::new(DelegatedCollection::new(
                        model.delegation_config(),
                        Arc::new(store),
                        &registry,
                    )?);
                    registry.register(collection.clone())?;
                    delegated.insert(model.resource_type(), collection);
                }
            }
        }

        info!(
            models = registry.len(),
            delegated = delegated.len(),
            users = self.users.len(),
            "Loaded fixture"
        );

        Ok(LoadedFixture {
            registry,
            delegated,
            users: self
                .users
                .iter()
                .map(|u| (u.id().to_string(), u.clone()))
                .collect(),
        })
    }
}

/// The models built from a [`Fixture`].
#[derive(Debug)]
pub struct LoadedFixture {
    registry: Arc<ModelRegistry>,
    delegated: HashMap<ResourceType, Arc<DelegatedCollection>>,
    users: HashMap<String, User>,
}

impl LoadedFixture {
    /// Returns the registry holding every model.
    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Returns an un-namespaced delegated collection.
    pub fn delegated(&self, name: &str) -> Option<&Arc<DelegatedCollection>> {
        self.delegated.get(&ResourceType::new(name))
    }

    /// Returns a delegated collection by type.
    pub fn delegated_as(&self, resource_type: &ResourceType) -> Option<&Arc<DelegatedCollection>> {
        self.delegated.get(resource_type)
    }

    /// Returns a user by id.
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::is_access_controlled;
    use crate::error::StorageError;

    const FIXTURE: &str = r#"{
        "models": [
            {"name": "folder", "kind": "access_controlled", "documents": [{"_id": "f1"}]},
            {"name": "assetstore", "documents": [{"_id": "a1"}]},
            {"name": "item", "kind": "delegated", "ownerType": "folder", "ownerField": "folderId",
             "documents": [{"_id": "i1", "folderId": "f1"}]},
            {"name": "image", "namespace": "large_image", "kind": "delegated"}
        ],
        "users": [{"_id": "u1", "groups": ["g1"]}]
    }"#;

    #[test]
    fn test_build_registers_every_model() {
        let loaded = Fixture::from_json(FIXTURE).unwrap().build().unwrap();
        let registry = loaded.registry();

        assert_eq!(registry.len(), 4);
        assert!(is_access_controlled(registry.model("folder").unwrap().as_ref()));
        assert!(!is_access_controlled(registry.model("assetstore").unwrap().as_ref()));
        assert!(loaded.delegated("item").is_some());
        assert!(loaded.delegated("image").is_none());
        assert!(
            loaded
                .delegated_as(&ResourceType::namespaced("image", "large_image"))
                .is_some()
        );
        assert!(loaded.user("u1").unwrap().in_group("g1"));
    }

    #[test]
    fn test_same_name_delegated_in_two_namespaces() {
        let fixture = Fixture::from_json(
            r#"{"models": [
                {"name": "image", "namespace": "large_image", "kind": "delegated"},
                {"name": "image", "namespace": "slicer", "kind": "delegated"}
            ]}"#,
        )
        .unwrap();
        let config = fixture.access_config();
        assert!(config.validate().is_ok());
        assert!(
            config
                .get_as(&ResourceType::namespaced("image", "slicer"))
                .is_some()
        );

        let loaded = fixture.build().unwrap();
        assert_eq!(loaded.registry().len(), 2);
        assert!(
            loaded
                .delegated_as(&ResourceType::namespaced("image", "slicer"))
                .is_some()
        );
    }

    #[test]
    fn test_half_declared_delegation_rejected() {
        let fixture = Fixture::from_json(
            r#"{"models": [{"name": "item", "kind": "delegated", "ownerType": "folder"}]}"#,
        )
        .unwrap();
        let err = fixture.build().unwrap_err();
        assert!(matches!(err, StorageError::Config(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_owner_on_plain_model_rejected() {
        let fixture = Fixture::from_json(
            r#"{"models": [{"name": "item", "ownerType": "folder", "ownerField": "folderId"}]}"#,
        )
        .unwrap();
        assert!(fixture.build().unwrap_err().is_config_error());
    }

    #[test]
    fn test_duplicate_model_rejected() {
        let fixture = Fixture::from_json(
            r#"{"models": [{"name": "folder"}, {"name": "folder", "kind": "access_controlled"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            fixture.build().unwrap_err(),
            StorageError::Config(ConfigError::DuplicateModel { .. })
        ));
    }
}
