//! Per-collection delegation settings.

use serde::{Deserialize, Serialize};

use crate::types::ResourceType;

/// Document field naming the owner's type in the attached form.
pub const ATTACHED_TYPE_FIELD: &str = "attachedToType";

/// Document field naming the owner's id in the attached form.
pub const ATTACHED_ID_FIELD: &str = "attachedToId";

/// How a dependent collection finds the owner of each of its documents.
///
/// A collection either declares a fixed owner type plus the document field
/// holding the owner id (the declared form), or declares nothing and relies
/// on every document carrying `attachedToType`/`attachedToId` (the attached
/// form). When a document carries both attached fields they take precedence
/// over the declared form.
///
/// Plugin collections set `namespace`, so two plugins can each configure a
/// collection of the same name.
///
/// # Examples
///
/// ```
/// use helios_access::delegation::DelegationConfig;
/// use helios_access::types::ResourceType;
///
/// // Items inherit from their folder.
/// let items = DelegationConfig::declared("item", ResourceType::new("folder"), "folderId");
/// assert!(items.is_declared());
///
/// // Files name their owner on each document.
/// let files = DelegationConfig::attached("file");
/// assert!(!files.is_declared());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationConfig {
    /// Name of the dependent collection.
    pub collection: String,

    /// Plugin namespace of the dependent collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Collection-wide owner type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_type: Option<ResourceType>,

    /// Document field holding the owner id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_field: Option<String>,
}

impl DelegationConfig {
    /// Creates a config that relies on the attached form only.
    pub fn attached(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            namespace: None,
            owner_type: None,
            owner_field: None,
        }
    }

    /// Creates a config with a declared owner type and id field.
    pub fn declared(
        collection: impl Into<String>,
        owner_type: ResourceType,
        owner_field: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            namespace: None,
            owner_type: Some(owner_type),
            owner_field: Some(owner_field.into()),
        }
    }

    /// Places the dependent collection in a plugin namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Returns the registry key of the dependent collection.
    pub fn resource_type(&self) -> ResourceType {
        match &self.namespace {
            Some(namespace) => ResourceType::namespaced(&self.collection, namespace),
            None => ResourceType::new(&self.collection),
        }
    }

    /// Returns `true` if both the owner type and the owner field are set.
    pub fn is_declared(&self) -> bool {
        self.owner_type.is_some() && self.owner_field.is_some()
    }

    /// Returns the fields a document must keep for its owner to be resolved.
    pub(crate) fn reference_fields(&self) -> Vec<String> {
        let mut fields = vec![
            ATTACHED_TYPE_FIELD.to_string(),
            ATTACHED_ID_FIELD.to_string(),
        ];
        if let Some(field) = &self.owner_field {
            fields.push(field.clone());
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_declared() {
        let config: DelegationConfig = serde_json::from_value(json!({
            "collection": "annotation",
            "ownerType": ["image", "large_image"],
            "ownerField": "imageId"
        }))
        .unwrap();
        assert_eq!(
            config.owner_type,
            Some(ResourceType::namespaced("image", "large_image"))
        );
        assert_eq!(config.owner_field.as_deref(), Some("imageId"));
        assert!(config.is_declared());
    }

    #[test]
    fn test_deserialize_attached_only() {
        let config: DelegationConfig =
            serde_json::from_value(json!({ "collection": "file" })).unwrap();
        assert_eq!(config, DelegationConfig::attached("file"));
        assert!(!config.is_declared());
    }

    #[test]
    fn test_reference_fields() {
        let config = DelegationConfig::declared("item", ResourceType::new("folder"), "folderId");
        assert_eq!(
            config.reference_fields(),
            vec!["attachedToType", "attachedToId", "folderId"]
        );
        assert_eq!(DelegationConfig::attached("file").reference_fields().len(), 2);
    }
}
