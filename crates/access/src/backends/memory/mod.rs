//! In-memory backend.
//!
//! Reference implementation of the [`Model`](crate::core::Model) traits,
//! used by the `access-check` tool and by tests.
//!
//! - [`MemoryCollection`] - plain collection, no ACL
//! - [`AclCollection`] - collection with a native ACL on each document
//! - [`Fixture`] - JSON description of a populated set of models
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use helios_access::backends::memory::{AclCollection, MemoryCollection};
//! use helios_access::core::ModelRegistry;
//! use helios_access::delegation::{DelegatedCollection, DelegationConfig};
//! use helios_access::types::{AccessLevel, ResourceType};
//! use helios_access::SupportsAccessControl;
//! use serde_json::json;
//!
//! let registry = Arc::new(ModelRegistry::new());
//! let folders = Arc::new(AclCollection::new("folder"));
//! registry.register(folders.clone()).unwrap();
//!
//! let items = Arc::new(MemoryCollection::new("item"));
//! let delegated = DelegatedCollection::new(
//!     DelegationConfig::declared("item", ResourceType::new("folder"), "folderId"),
//!     items.clone(),
//!     &registry,
//! )
//! .unwrap();
//!
//! folders.save(json!({"_id": "f1", "public": true})).unwrap();
//! let item = items.save(json!({"_id": "i1", "folderId": "f1"})).unwrap();
//!
//! assert!(delegated.has_access(&item, None, AccessLevel::Read).unwrap());
//! assert!(!delegated.has_access(&item, None, AccessLevel::Write).unwrap());
//! ```

mod acl;
mod collection;
mod fixture;
mod query;

pub use acl::AclCollection;
pub use collection::MemoryCollection;
pub use fixture::{Fixture, LoadedFixture, ModelFixture, ModelKind};
