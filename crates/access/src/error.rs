//! Error types for the access layer.
//!
//! This module defines all error types used by delegated access resolution,
//! following a hierarchy that separates missing resources, permission
//! denials, configuration mistakes, and backend failures.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

use crate::types::ResourceType;

/// The primary error type for all access operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Resource state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Permission denials
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Programmer or deployment mistakes
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to resource state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested document was not found.
    #[error("resource not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
}

/// Permission denials raised by explicit `require_*` checks and by guarded loads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// A level-based check failed.
    #[error("{permission} access denied for {collection} {document_id} (user {user}).")]
    Denied {
        permission: String,
        collection: String,
        document_id: String,
        user: UserLabel,
    },

    /// A flag-based check failed.
    #[error("Access denied for {collection} {document_id} (user {user}).")]
    FlagsDenied {
        collection: String,
        document_id: String,
        flags: Vec<String>,
        user: UserLabel,
    },
}

impl AccessError {
    /// Builds a level denial for the given collection, document and user.
    pub fn denied(
        permission: impl Into<String>,
        collection: impl Into<String>,
        document_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Self {
        AccessError::Denied {
            permission: permission.into(),
            collection: collection.into(),
            document_id: document_id.unwrap_or("unknown").to_string(),
            user: UserLabel(user_id.map(str::to_string)),
        }
    }

    /// Builds a flag denial for the given collection, document and user.
    pub fn flags_denied(
        collection: impl Into<String>,
        document_id: Option<&str>,
        user_id: Option<&str>,
        flags: &[String],
    ) -> Self {
        AccessError::FlagsDenied {
            collection: collection.into(),
            document_id: document_id.unwrap_or("unknown").to_string(),
            flags: flags.to_vec(),
            user: UserLabel(user_id.map(str::to_string)),
        }
    }

    /// Returns the acting user's id, if there was one.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            AccessError::Denied { user, .. } | AccessError::FlagsDenied { user, .. } => {
                user.0.as_deref()
            }
        }
    }

    /// Returns the id of the document the check was made against.
    pub fn document_id(&self) -> &str {
        match self {
            AccessError::Denied { document_id, .. }
            | AccessError::FlagsDenied { document_id, .. } => document_id,
        }
    }
}

/// Display helper rendering an optional user id as `None` when anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserLabel(pub Option<String>);

impl fmt::Display for UserLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(id) => write!(f, "{}", id),
            None => write!(f, "None"),
        }
    }
}

/// Configuration errors. These are programmer bugs and must never degrade to "allow".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The owner type value is neither a string nor a two-element name/namespace pair.
    #[error("invalid resource parent type: {value}")]
    InvalidResourceType { value: String },

    /// Neither the attached nor the declared owner reference is present.
    #[error("no owner reference for {collection} {document_id}")]
    MissingOwnerReference {
        collection: String,
        document_id: String,
    },

    /// No model is registered under the resolved type.
    #[error("unknown model: {resource_type}")]
    UnknownModel { resource_type: ResourceType },

    /// A model is already registered under this type.
    #[error("model already registered: {resource_type}")]
    DuplicateModel { resource_type: ResourceType },

    /// The registry backing a delegated collection has been dropped.
    #[error("model registry is no longer available for {collection}")]
    RegistryUnavailable { collection: String },

    /// Generic invalid configuration.
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Errors originating from the storage backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for access operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Resource(ResourceError::NotFound { .. }))
    }

    /// Returns `true` if this is a permission denial.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, StorageError::Access(_))
    }

    /// Returns `true` if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(self, StorageError::Config(_))
    }

    /// Returns `true` if a bulk filter should treat this as "no owner matched"
    /// rather than surfacing it.
    ///
    /// Only failures to resolve the owner reference qualify. A reference that
    /// resolves to a missing owner document is a real error.
    pub(crate) fn is_unmatched_owner(&self) -> bool {
        matches!(
            self,
            StorageError::Config(
                ConfigError::InvalidResourceType { .. }
                    | ConfigError::MissingOwnerReference { .. }
                    | ConfigError::UnknownModel { .. }
            )
        )
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

impl From<regex::Error> for StorageError {
    fn from(err: regex::Error) -> Self {
        StorageError::Backend(BackendError::QueryError {
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Internal {
            backend_name: "unknown".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StorageError::Resource(ResourceError::NotFound {
            collection: "folder".to_string(),
            id: "123".to_string(),
        });
        assert_eq!(err.to_string(), "resource not found: folder/123");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_denied_display() {
        let err = AccessError::denied("Write", "item", Some("abc"), Some("u1"));
        assert_eq!(
            err.to_string(),
            "Write access denied for item abc (user u1)."
        );
        assert_eq!(err.user_id(), Some("u1"));
    }

    #[test]
    fn test_denied_display_anonymous_and_unknown() {
        let err = AccessError::denied("Read", "file", None, None);
        assert_eq!(
            err.to_string(),
            "Read access denied for file unknown (user None)."
        );
        assert_eq!(err.document_id(), "unknown");
    }

    #[test]
    fn test_flags_denied_display() {
        let err = AccessError::flags_denied("file", Some("f1"), None, &["flagX".to_string()]);
        assert_eq!(err.to_string(), "Access denied for file f1 (user None).");
    }

    #[test]
    fn test_unmatched_owner_classification() {
        let missing: StorageError = ResourceError::NotFound {
            collection: "item".to_string(),
            id: "x".to_string(),
        }
        .into();
        assert!(!missing.is_unmatched_owner());

        let invalid: StorageError = ConfigError::InvalidResourceType {
            value: "42".to_string(),
        }
        .into();
        assert!(invalid.is_unmatched_owner());
        assert!(invalid.is_config_error());

        let dup: StorageError = ConfigError::DuplicateModel {
            resource_type: ResourceType::new("item"),
        }
        .into();
        assert!(!dup.is_unmatched_owner());

        let backend: StorageError = BackendError::QueryError {
            message: "boom".to_string(),
        }
        .into();
        assert!(!backend.is_unmatched_owner());
    }

    #[test]
    fn test_storage_error_from_access() {
        let err: StorageError = AccessError::denied("Admin", "item", Some("1"), None).into();
        assert!(err.is_access_denied());
        assert!(matches!(err, StorageError::Access(AccessError::Denied { .. })));
    }
}
