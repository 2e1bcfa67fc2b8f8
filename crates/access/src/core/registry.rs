//! Model registry.
//!
//! The registry maps a [`ResourceType`] to the [`Model`] handling that
//! collection. It is populated at process startup; lookups for unknown types
//! fail fast with a configuration error.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ConfigError, StorageResult};
use crate::types::ResourceType;

use super::Model;

/// Typed registry of collection models.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use helios_access::backends::memory::MemoryCollection;
/// use helios_access::core::ModelRegistry;
///
/// let registry = ModelRegistry::new();
/// registry.register(Arc::new(MemoryCollection::new("folder"))).unwrap();
/// registry
///     .register(Arc::new(MemoryCollection::namespaced("annotation", "large_image")))
///     .unwrap();
///
/// assert!(registry.model("folder").is_ok());
/// assert!(registry.namespaced_model("annotation", "large_image").is_ok());
/// assert!(registry.model("annotation").is_err());
/// ```
#[derive(Default)]
pub struct ModelRegistry {
    models: RwLock<HashMap<ResourceType, Arc<dyn Model>>>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model under its own [`Model::resource_type`].
    ///
    /// # Errors
    ///
    /// * `ConfigError::DuplicateModel` - If the type is already registered
    pub fn register(&self, model: Arc<dyn Model>) -> StorageResult<()> {
        let resource_type = model.resource_type();
        self.register_as(resource_type, model)
    }

    /// Registers a model under an explicit type.
    pub fn register_as(
        &self,
        resource_type: ResourceType,
        model: Arc<dyn Model>,
    ) -> StorageResult<()> {
        let mut models = self.models.write();
        if models.contains_key(&resource_type) {
            return Err(ConfigError::DuplicateModel { resource_type }.into());
        }
        tracing::debug!(resource_type = %resource_type, "Registered model");
        models.insert(resource_type, model);
        Ok(())
    }

    /// Looks up an un-namespaced model by name.
    pub fn model(&self, name: &str) -> StorageResult<Arc<dyn Model>> {
        self.get(&ResourceType::new(name))
    }

    /// Looks up a model provided by a plugin namespace.
    pub fn namespaced_model(&self, name: &str, namespace: &str) -> StorageResult<Arc<dyn Model>> {
        self.get(&ResourceType::namespaced(name, namespace))
    }

    /// Looks up a model by type.
    ///
    /// # Errors
    ///
    /// * `ConfigError::UnknownModel` - If nothing is registered under the type
    pub fn get(&self, resource_type: &ResourceType) -> StorageResult<Arc<dyn Model>> {
        self.models
            .read()
            .get(resource_type)
            .cloned()
            .ok_or_else(|| {
                ConfigError::UnknownModel {
                    resource_type: resource_type.clone(),
                }
                .into()
            })
    }

    /// Returns `true` if a model is registered under the type.
    pub fn contains(&self, resource_type: &ResourceType) -> bool {
        self.models.read().contains_key(resource_type)
    }

    /// Returns the number of registered models.
    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }

    /// Returns the registered types in sorted order.
    pub fn resource_types(&self) -> Vec<ResourceType> {
        let mut types: Vec<_> = self.models.read().keys().cloned().collect();
        types.sort();
        types
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.resource_types())
            .finish()
    }
}
