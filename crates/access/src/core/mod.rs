//! Core traits and the model registry.
//!
//! - [`Model`] - A handle on one collection (load, find, search)
//! - [`SupportsAccessControl`] - Capability of models that decide grant/deny themselves
//! - [`ModelRegistry`] - Maps a [`ResourceType`](crate::types::ResourceType) to its model
//!
//! ```text
//! Model
//!     └── SupportsAccessControl
//!             ├── AclCollection        (native ACL)
//!             └── DelegatedCollection  (defers to an owner)
//! ```

mod model;
mod registry;

pub use model::{Cursor, Model, SupportsAccessControl, acl_fields, is_access_controlled};
pub use registry::ModelRegistry;
