//! Delegated access resolution.
//!
//! Dependent collections hold no ACL of their own. Each document names an
//! owner resource, either through a collection-wide declaration or through
//! `attachedToType`/`attachedToId` on the document, and every permission
//! question is answered by that owner's model.
//!
//! ```text
//! file ──attachedTo──▶ item ──folderId──▶ folder (ACL)
//! ```

mod collection;
mod config;
mod filter;
mod owner;

pub use collection::DelegatedCollection;
pub use config::{ATTACHED_ID_FIELD, ATTACHED_TYPE_FIELD, DelegationConfig};
pub use filter::PermissionFilter;
pub use owner::{OwnerRef, load_owner, resolve_owner_ref};
