//! The delegated collection.

use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::{Map, Value};
use tracing::debug;

use crate::core::{Cursor, Model, ModelRegistry, SupportsAccessControl};
use crate::error::{AccessError, ConfigError, ResourceError, StorageResult};
use crate::types::{
    AccessLevel, Document, FilterOptions, LoadOptions, ResourceType, SearchRequest,
    SortDirective, User,
};

use super::config::DelegationConfig;
use super::filter::PermissionFilter;
use super::owner::{OwnerRef, load_owner, resolve_owner_ref};

/// A collection whose documents take their permissions from an owner.
///
/// Wraps the collection's own storage model and answers every permission
/// question by resolving the owner of the document at hand and asking the
/// owner's model. Nothing is stored on the dependent documents themselves.
///
/// Restricted projections are widened with the owner reference fields
/// (`attachedToType`, `attachedToId` and the declared owner field) while the
/// owner is resolved, and those fields are stripped again unless the caller
/// asked for them.
pub struct DelegatedCollection {
    config: DelegationConfig,
    store: Arc<dyn Model>,
    registry: Weak<ModelRegistry>,
}

impl DelegatedCollection {
    /// Wraps `store` with the delegation described by `config`.
    ///
    /// The collection only keeps a weak handle on `registry`, so it can be
    /// registered in that same registry.
    ///
    /// # Errors
    ///
    /// * `ConfigError::Invalid` - If `config` names a different collection
    ///   or namespace than `store`
    pub fn new(
        config: DelegationConfig,
        store: Arc<dyn Model>,
        registry: &Arc<ModelRegistry>,
    ) -> StorageResult<Self> {
        let configured = config.resource_type();
        if configured != store.resource_type() {
            return Err(ConfigError::Invalid {
                message: format!(
                    "delegation config for '{}' applied to collection '{}'",
                    configured,
                    store.resource_type()
                ),
            }
            .into());
        }
        Ok(Self {
            config,
            store,
            registry: Arc::downgrade(registry),
        })
    }

    /// Returns the delegation settings.
    pub fn config(&self) -> &DelegationConfig {
        &self.config
    }

    /// Returns the wrapped storage model.
    pub fn store(&self) -> &Arc<dyn Model> {
        &self.store
    }

    /// Returns the owner type and id of `doc` without touching the registry.
    pub fn resolve_owner_type(&self, doc: &Document) -> StorageResult<OwnerRef> {
        resolve_owner_ref(&self.config, doc)
    }

    /// Returns the owner's model and id for `doc`.
    ///
    /// # Errors
    ///
    /// * `ConfigError::InvalidResourceType` - If the owner type is malformed
    /// * `ConfigError::MissingOwnerReference` - If the document names no owner
    /// * `ConfigError::UnknownModel` - If the owner type is not registered
    pub fn resolve_owner(&self, doc: &Document) -> StorageResult<(Arc<dyn Model>, String)> {
        let owner = self.resolve_owner_type(doc)?;
        let model = self.owner_model(&owner.resource_type)?;
        Ok((model, owner.id))
    }

    /// Looks up an owner model in the registry.
    pub fn owner_model(&self, resource_type: &ResourceType) -> StorageResult<Arc<dyn Model>> {
        let registry = self
            .registry
            .upgrade()
            .ok_or_else(|| ConfigError::RegistryUnavailable {
                collection: self.config.collection.clone(),
            })?;
        match resource_type.namespace() {
            Some(namespace) => registry.namespaced_model(resource_type.name(), namespace),
            None => registry.model(resource_type.name()),
        }
    }

    /// Loads a document, checking that `options.user` can load its owner at
    /// `options.level`.
    ///
    /// Returns `Ok(None)` if the document does not exist. A forced load never
    /// contacts the owner.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(NotFound)` - If the owner does not exist
    /// * `StorageError::Access` - If the owner denies the load
    /// * `StorageError::Config` - If the owner cannot be resolved
    pub fn load(&self, id: &str, options: &LoadOptions<'_>) -> StorageResult<Option<Document>> {
        let (fields, added) = self.supplement_fields(options.fields.as_deref());
        let Some(mut doc) = self.store.find_by_id(id, fields.as_deref())? else {
            return Ok(None);
        };

        if !options.force {
            let (model, owner_id) = self.resolve_owner(&doc)?;
            debug!(
                collection = %self.name(),
                id = %id,
                owner = %model.resource_type(),
                owner_id = %owner_id,
                "Checking owner on load"
            );
            let owner_options = LoadOptions {
                level: options.level,
                user: options.user,
                force: false,
                fields: Some(Vec::new()),
            };
            load_owner(model.as_ref(), &owner_id, &owner_options)?;
        }

        for field in &added {
            doc.remove(field);
        }
        Ok(Some(doc))
    }

    /// Filters `cursor` down to the documents whose owner grants
    /// `options.level` (and `options.flags`) to `user`.
    ///
    /// The returned iterator is lazy: each call to `next` pulls cursor items
    /// until one is granted, and each distinct owner is checked at most once.
    pub fn filter_results_by_permission<'a>(
        &'a self,
        cursor: Cursor,
        user: Option<&'a User>,
        options: FilterOptions,
    ) -> PermissionFilter<'a> {
        PermissionFilter::new(self, cursor, user, options)
    }

    /// Runs a full-text search and filters the results by permission.
    pub fn text_search<'a>(
        &'a self,
        request: &SearchRequest<'a>,
    ) -> StorageResult<PermissionFilter<'a>> {
        let (fields, added) = self.supplement_fields(request.fields.as_deref());
        let cursor = self.store.search_text(
            &request.query,
            &request.filters,
            &request.sort,
            fields.as_deref(),
        )?;
        let options = search_options(request).with_remove_keys(added);
        Ok(self.filter_results_by_permission(cursor, request.user, options))
    }

    /// Runs a prefix search and filters the results by permission.
    pub fn prefix_search<'a>(
        &'a self,
        request: &SearchRequest<'a>,
    ) -> StorageResult<PermissionFilter<'a>> {
        let (fields, added) = self.supplement_fields(request.fields.as_deref());
        let cursor = self.store.search_prefix(
            &request.query,
            &request.filters,
            &request.sort,
            fields.as_deref(),
        )?;
        let options = search_options(request).with_remove_keys(added);
        Ok(self.filter_results_by_permission(cursor, request.user, options))
    }

    /// Widens a restricted projection with the reference fields, returning
    /// the projection and the fields that were added to it.
    fn supplement_fields(&self, fields: Option<&[String]>) -> (Option<Vec<String>>, Vec<String>) {
        let Some(fields) = fields else {
            return (None, Vec::new());
        };
        let mut fields = fields.to_vec();
        let mut added = Vec::new();
        for field in self.config.reference_fields() {
            if !fields.contains(&field) {
                fields.push(field.clone());
                added.push(field);
            }
        }
        (Some(fields), added)
    }

    fn load_owner_acl(
        &self,
        controlled: &dyn SupportsAccessControl,
        owner_id: &str,
        with_flags: bool,
    ) -> StorageResult<Document> {
        controlled.load_with_access(
            owner_id,
            &LoadOptions::forced().with_fields(controlled.access_fields(with_flags)),
        )
    }
}

fn search_options(request: &SearchRequest<'_>) -> FilterOptions {
    FilterOptions::new(request.level)
        .with_limit(request.limit)
        .with_offset(request.offset)
}

impl fmt::Debug for DelegatedCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedCollection")
            .field("config", &self.config)
            .field("store", &self.store.resource_type())
            .finish()
    }
}

impl Model for DelegatedCollection {
    fn name(&self) -> &str {
        self.store.name()
    }

    fn resource_type(&self) -> ResourceType {
        self.store.resource_type()
    }

    fn find_by_id(&self, id: &str, fields: Option<&[String]>) -> StorageResult<Option<Document>> {
        self.store.find_by_id(id, fields)
    }

    fn find(
        &self,
        filters: &Map<String, Value>,
        sort: &[SortDirective],
        fields: Option<&[String]>,
    ) -> StorageResult<Cursor> {
        self.store.find(filters, sort, fields)
    }

    fn search_text(
        &self,
        query: &str,
        filters: &Map<String, Value>,
        sort: &[SortDirective],
        fields: Option<&[String]>,
    ) -> StorageResult<Cursor> {
        self.store.search_text(query, filters, sort, fields)
    }

    fn search_prefix(
        &self,
        query: &str,
        filters: &Map<String, Value>,
        sort: &[SortDirective],
        fields: Option<&[String]>,
    ) -> StorageResult<Cursor> {
        self.store.search_prefix(query, filters, sort, fields)
    }

    fn access_control(&self) -> Option<&dyn SupportsAccessControl> {
        Some(self)
    }
}

impl SupportsAccessControl for DelegatedCollection {
    /// A dependent document is decided on through its owner reference.
    fn access_fields(&self, _with_flags: bool) -> Vec<String> {
        self.config.reference_fields()
    }

    fn load_with_access(&self, id: &str, options: &LoadOptions<'_>) -> StorageResult<Document> {
        self.load(id, options)?.ok_or_else(|| {
            ResourceError::NotFound {
                collection: self.name().to_string(),
                id: id.to_string(),
            }
            .into()
        })
    }

    fn has_access(
        &self,
        doc: &Document,
        user: Option<&User>,
        level: AccessLevel,
    ) -> StorageResult<bool> {
        let (model, owner_id) = self.resolve_owner(doc)?;
        match model.access_control() {
            Some(controlled) => {
                let owner = self.load_owner_acl(controlled, &owner_id, false)?;
                controlled.has_access(&owner, user, level)
            }
            // Plain owners grant every level.
            None => Ok(true),
        }
    }

    fn has_access_flags(
        &self,
        doc: &Document,
        user: Option<&User>,
        flags: &[String],
    ) -> StorageResult<bool> {
        if flags.is_empty() {
            return Ok(true);
        }
        let (model, owner_id) = self.resolve_owner(doc)?;
        match model.access_control() {
            Some(controlled) => {
                let owner = self.load_owner_acl(controlled, &owner_id, true)?;
                controlled.has_access_flags(&owner, user, flags)
            }
            // Plain owners never carry flags.
            None => Ok(false),
        }
    }

    fn require_access_flags(
        &self,
        doc: &Document,
        user: Option<&User>,
        flags: &[String],
    ) -> StorageResult<()> {
        if flags.is_empty() {
            return Ok(());
        }
        let (model, owner_id) = self.resolve_owner(doc)?;
        match model.access_control() {
            Some(controlled) => {
                let owner = self.load_owner_acl(controlled, &owner_id, true)?;
                controlled.require_access_flags(&owner, user, flags)
            }
            None => Err(AccessError::flags_denied(
                self.name(),
                doc.id().as_deref(),
                user.map(User::id),
                flags,
            )
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::backends::memory::{AclCollection, MemoryCollection};
    use crate::error::StorageError;

    fn world() -> (Arc<ModelRegistry>, Arc<AclCollection>, DelegatedCollection) {
        let registry = Arc::new(ModelRegistry::new());
        let folders = Arc::new(AclCollection::new("folder"));
        registry.register(folders.clone()).unwrap();

        let items = Arc::new(MemoryCollection::new("item"));
        let delegated = DelegatedCollection::new(
            DelegationConfig::declared("item", ResourceType::new("folder"), "folderId"),
            items,
            &registry,
        )
        .unwrap();
        (registry, folders, delegated)
    }

    #[test]
    fn test_config_must_match_store() {
        let registry = Arc::new(ModelRegistry::new());
        let err = DelegatedCollection::new(
            DelegationConfig::attached("file"),
            Arc::new(MemoryCollection::new("item")),
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, StorageError::Config(ConfigError::Invalid { .. })));

        let err = DelegatedCollection::new(
            DelegationConfig::attached("file").with_namespace("large_image"),
            Arc::new(MemoryCollection::new("file")),
            &registry,
        )
        .unwrap_err();
        assert!(err.is_config_error());

        let namespaced = DelegatedCollection::new(
            DelegationConfig::attached("file").with_namespace("large_image"),
            Arc::new(MemoryCollection::namespaced("file", "large_image")),
            &registry,
        )
        .unwrap();
        assert_eq!(
            namespaced.resource_type(),
            ResourceType::namespaced("file", "large_image")
        );
    }

    #[test]
    fn test_registry_dropped() {
        let (registry, _folders, delegated) = world();
        let item = Document::from_value(json!({"_id": "i1", "folderId": "f1"})).unwrap();
        drop(registry);

        let err = delegated.has_access(&item, None, AccessLevel::Read).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Config(ConfigError::RegistryUnavailable { .. })
        ));
        // The type-only path does not need the registry.
        assert!(delegated.resolve_owner_type(&item).is_ok());
    }

    #[test]
    fn test_supplement_fields() {
        let (_registry, _folders, delegated) = world();
        assert_eq!(delegated.supplement_fields(None), (None, vec![]));

        let (fields, added) =
            delegated.supplement_fields(Some(&["name".to_string(), "folderId".to_string()]));
        assert_eq!(
            fields,
            Some(vec![
                "name".to_string(),
                "folderId".to_string(),
                "attachedToType".to_string(),
                "attachedToId".to_string(),
            ])
        );
        assert_eq!(added, vec!["attachedToType".to_string(), "attachedToId".to_string()]);
        assert_eq!(delegated.access_fields(true), delegated.config().reference_fields());
    }

    #[test]
    fn test_access_control_capability() {
        let (_registry, _folders, delegated) = world();
        assert!(crate::core::is_access_controlled(&delegated));
        assert_eq!(delegated.name(), "item");
    }
}
