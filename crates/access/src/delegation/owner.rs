//! Owner reference resolution and owner loading.

use std::fmt;

use crate::core::Model;
use crate::error::{ConfigError, StorageResult};
use crate::types::{Document, LoadOptions, ResourceType, value_as_id};

use super::config::{ATTACHED_ID_FIELD, ATTACHED_TYPE_FIELD, DelegationConfig};

/// The `(type, id)` pair naming a document's owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerRef {
    /// The owner's model key.
    pub resource_type: ResourceType,
    /// The owner's document id.
    pub id: String,
}

impl OwnerRef {
    /// Creates an owner reference.
    pub fn new(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self {
            resource_type,
            id: id.into(),
        }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

/// Reads the owner reference out of a dependent document.
///
/// The attached form is used when the document carries both
/// `attachedToType` and `attachedToId`; otherwise the collection's declared
/// owner type and owner field apply. Nothing here touches the registry.
///
/// # Errors
///
/// * `ConfigError::InvalidResourceType` - If `attachedToType` is malformed
/// * `ConfigError::MissingOwnerReference` - If neither form yields a type and id
pub fn resolve_owner_ref(config: &DelegationConfig, doc: &Document) -> StorageResult<OwnerRef> {
    if let (Some(type_value), Some(id_value)) =
        (doc.get(ATTACHED_TYPE_FIELD), doc.get(ATTACHED_ID_FIELD))
    {
        let resource_type = ResourceType::from_value(type_value)?;
        let id = value_as_id(id_value).ok_or_else(|| missing_reference(config, doc))?;
        return Ok(OwnerRef::new(resource_type, id));
    }

    match (&config.owner_type, &config.owner_field) {
        (Some(owner_type), Some(owner_field)) => {
            let id = doc
                .get(owner_field)
                .and_then(value_as_id)
                .ok_or_else(|| missing_reference(config, doc))?;
            Ok(OwnerRef::new(owner_type.clone(), id))
        }
        _ => Err(missing_reference(config, doc).into()),
    }
}

fn missing_reference(config: &DelegationConfig, doc: &Document) -> ConfigError {
    ConfigError::MissingOwnerReference {
        collection: config.collection.clone(),
        document_id: doc.id().unwrap_or_else(|| "unknown".to_string()),
    }
}

/// Loads an owner document, which must exist.
///
/// Access-controlled owners receive every load option. Plain owners have no
/// permission parameters and only see `fields`.
///
/// # Errors
///
/// * `StorageError::Resource(NotFound)` - If the owner does not exist
/// * `StorageError::Access` - If an access-controlled owner denies the load
pub fn load_owner(model: &dyn Model, id: &str, options: &LoadOptions<'_>) -> StorageResult<Document> {
    match model.access_control() {
        Some(controlled) => controlled.load_with_access(id, options),
        None => model.load_required(id, options.fields.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::StorageError;

    fn doc(value: serde_json::Value) -> Document {
        Document::from_value(value).unwrap()
    }

    fn items() -> DelegationConfig {
        DelegationConfig::declared("item", ResourceType::new("folder"), "folderId")
    }

    #[test]
    fn test_declared_form() {
        let owner = resolve_owner_ref(&items(), &doc(json!({"_id": "i1", "folderId": "f1"}))).unwrap();
        assert_eq!(owner, OwnerRef::new(ResourceType::new("folder"), "f1"));
    }

    #[test]
    fn test_attached_form_wins() {
        let owner = resolve_owner_ref(
            &items(),
            &doc(json!({
                "_id": "i1",
                "folderId": "f1",
                "attachedToType": "user",
                "attachedToId": "u1"
            })),
        )
        .unwrap();
        assert_eq!(owner, OwnerRef::new(ResourceType::new("user"), "u1"));
    }

    #[test]
    fn test_partial_attached_form_falls_back() {
        let owner = resolve_owner_ref(
            &items(),
            &doc(json!({"_id": "i1", "folderId": "f1", "attachedToType": "user"})),
        )
        .unwrap();
        assert_eq!(owner.resource_type, ResourceType::new("folder"));
    }

    #[test]
    fn test_namespaced_attached_type() {
        let owner = resolve_owner_ref(
            &DelegationConfig::attached("annotationelement"),
            &doc(json!({
                "_id": "e1",
                "attachedToType": ["annotation", "large_image"],
                "attachedToId": 42
            })),
        )
        .unwrap();
        assert_eq!(
            owner,
            OwnerRef::new(ResourceType::namespaced("annotation", "large_image"), "42")
        );
        assert_eq!(owner.to_string(), "annotation (large_image)/42");
    }

    #[test]
    fn test_malformed_attached_type() {
        let err = resolve_owner_ref(
            &DelegationConfig::attached("file"),
            &doc(json!({"_id": "x", "attachedToType": 7, "attachedToId": "o"})),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Config(ConfigError::InvalidResourceType { .. })
        ));
    }

    #[test]
    fn test_missing_reference() {
        let err = resolve_owner_ref(&DelegationConfig::attached("file"), &doc(json!({"_id": "x"})))
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Config(ConfigError::MissingOwnerReference { ref document_id, .. })
                if document_id == "x"
        ));

        let err = resolve_owner_ref(&items(), &doc(json!({"_id": "i2", "folderId": null})))
            .unwrap_err();
        assert!(err.is_config_error());
    }
}
