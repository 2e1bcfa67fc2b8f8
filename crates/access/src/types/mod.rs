//! Core types for documents, users, permission levels and ACLs.

mod acl;
mod document;
mod level;
mod options;
mod resource_type;
mod user;

pub use acl::{ACCESS_FIELD, AccessEntry, AccessList, Acl, PUBLIC_FIELD, PUBLIC_FLAGS_FIELD};
pub use document::{Document, ID_FIELD, value_as_id};
pub use level::AccessLevel;
pub use options::{FilterOptions, LoadOptions, SearchRequest, SortDirection, SortDirective};
pub use resource_type::ResourceType;
pub use user::User;
