//! Helios Delegated Access Resolver
//!
//! This crate resolves permissions for document collections that hold no ACL
//! of their own. Files attached to items, items inside folders, annotation
//! elements inside annotations: each dependent document names an owning
//! resource, and every permission question about the document is answered by
//! that owner's native access control.
//!
//! # Features
//!
//! - **Two reference forms**: a collection-wide owner type plus a per-document
//!   id field, or per-document `attachedToType`/`attachedToId`
//! - **Namespaced owners**: owner types provided by plugins resolve through a
//!   `(name, namespace)` registry lookup
//! - **Plain owners**: owners without an ACL grant every level and no flags
//! - **Lazy filtering**: result sets are filtered one document at a time with
//!   at most one owner check per distinct owner
//!
//! # Architecture
//!
//! - [`types`] - Documents, users, access levels, ACLs and request options
//! - [`error`] - Error types for all operations
//! - [`core`] - `Model` and `SupportsAccessControl` traits, the model registry
//! - [`delegation`] - Owner resolution, the delegated collection, permission filtering
//! - [`config`] - Delegation settings for a deployment
//! - [`backends`] - In-memory reference backend
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use helios_access::backends::memory::{AclCollection, MemoryCollection};
//! use helios_access::core::ModelRegistry;
//! use helios_access::delegation::{DelegatedCollection, DelegationConfig};
//! use helios_access::types::{AccessLevel, FilterOptions, LoadOptions, ResourceType, User};
//! use helios_access::Model;
//! use serde_json::{Map, json};
//!
//! let registry = Arc::new(ModelRegistry::new());
//! let folders = Arc::new(AclCollection::new("folder"));
//! registry.register(folders.clone()).unwrap();
//!
//! let items = Arc::new(MemoryCollection::new("item"));
//! let delegated = Arc::new(
//!     DelegatedCollection::new(
//!         DelegationConfig::declared("item", ResourceType::new("folder"), "folderId"),
//!         items.clone(),
//!         &registry,
//!     )
//!     .unwrap(),
//! );
//! registry.register(delegated.clone()).unwrap();
//!
//! folders.save(json!({"_id": "shared"})).unwrap();
//! folders
//!     .set_user_access("shared", "alice", Some(AccessLevel::Write), vec![])
//!     .unwrap();
//! folders.save(json!({"_id": "private"})).unwrap();
//! items.save(json!({"_id": "i1", "folderId": "shared"})).unwrap();
//! items.save(json!({"_id": "i2", "folderId": "private"})).unwrap();
//!
//! let alice = User::new("alice");
//!
//! // Guarded load: alice may write the owning folder.
//! let options = LoadOptions::new().with_user(&alice).with_level(AccessLevel::Write);
//! assert!(delegated.load("i1", &options).unwrap().is_some());
//! assert!(delegated.load("i2", &options).is_err());
//!
//! // Filtering: only the item in the shared folder is visible.
//! let cursor = delegated.find(&Map::new(), &[], None).unwrap();
//! let visible: Vec<_> = delegated
//!     .filter_results_by_permission(cursor, Some(&alice), FilterOptions::new(AccessLevel::Read))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(visible.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod config;
pub mod core;
pub mod delegation;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use config::AccessConfig;
pub use error::{StorageError, StorageResult};
pub use types::{AccessLevel, Document, FilterOptions, LoadOptions, ResourceType, User};

// Re-export core traits
pub use core::{Model, ModelRegistry, SupportsAccessControl};

// Re-export the resolver
pub use delegation::{DelegatedCollection, DelegationConfig, PermissionFilter};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given level.
///
/// `RUST_LOG` takes precedence when set.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
#[cfg(feature = "cli")]
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("helios_access={},access_check={}", level, level))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
