//! Model traits.
//!
//! A [`Model`] is a handle on one collection. Models that can make their own
//! grant/deny decisions additionally implement [`SupportsAccessControl`] and
//! expose it through [`Model::access_control`]; plain models do not.

use serde_json::{Map, Value};

use crate::error::{AccessError, ResourceError, StorageResult};
use crate::types::{
    ACCESS_FIELD, AccessLevel, Document, LoadOptions, PUBLIC_FIELD, PUBLIC_FLAGS_FIELD,
    ResourceType, SortDirective, User,
};

/// A lazy sequence of documents produced by the storage layer.
///
/// Items are pulled one at a time; a storage failure part-way through is
/// reported as an `Err` item.
pub type Cursor = Box<dyn Iterator<Item = StorageResult<Document>> + Send>;

/// A handle on one collection of documents.
///
/// Search methods are not permission-aware: they return whatever matches.
pub trait Model: Send + Sync {
    /// Returns the collection name.
    fn name(&self) -> &str;

    /// Returns the key this model is registered under.
    fn resource_type(&self) -> ResourceType {
        ResourceType::new(self.name())
    }

    /// Finds a document by id.
    ///
    /// `fields` restricts the returned fields besides `_id`; `None` returns
    /// everything.
    fn find_by_id(&self, id: &str, fields: Option<&[String]>) -> StorageResult<Option<Document>>;

    /// Loads a document that must exist.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(NotFound)` - If there is no such document
    fn load_required(&self, id: &str, fields: Option<&[String]>) -> StorageResult<Document> {
        self.find_by_id(id, fields)?.ok_or_else(|| {
            ResourceError::NotFound {
                collection: self.name().to_string(),
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Returns all documents matching the exact-match `filters`.
    fn find(
        &self,
        filters: &Map<String, Value>,
        sort: &[SortDirective],
        fields: Option<&[String]>,
    ) -> StorageResult<Cursor>;

    /// Full-text search.
    fn search_text(
        &self,
        query: &str,
        filters: &Map<String, Value>,
        sort: &[SortDirective],
        fields: Option<&[String]>,
    ) -> StorageResult<Cursor>;

    /// Case-insensitive prefix search.
    fn search_prefix(
        &self,
        query: &str,
        filters: &Map<String, Value>,
        sort: &[SortDirective],
        fields: Option<&[String]>,
    ) -> StorageResult<Cursor>;

    /// Returns the access-control capability, or `None` for plain models.
    fn access_control(&self) -> Option<&dyn SupportsAccessControl> {
        None
    }
}

/// Capability of a model that makes its own grant/deny decisions.
///
/// Implemented by natively access-controlled collections and by collections
/// that delegate to an owner.
pub trait SupportsAccessControl: Model {
    /// Loads a document that must exist, checking `options.level` for
    /// `options.user` unless `options.force` is set.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(NotFound)` - If there is no such document
    /// * `StorageError::Access` - If the check fails
    fn load_with_access(&self, id: &str, options: &LoadOptions<'_>) -> StorageResult<Document>;

    /// Returns the fields a projected document must carry for
    /// [`has_access`](Self::has_access) (and, with `with_flags`,
    /// [`has_access_flags`](Self::has_access_flags)) to decide on it.
    ///
    /// Defaults to the native ACL fields.
    fn access_fields(&self, with_flags: bool) -> Vec<String> {
        acl_fields(with_flags)
    }

    /// Returns `true` if `user` holds at least `level` on `doc`.
    fn has_access(
        &self,
        doc: &Document,
        user: Option<&User>,
        level: AccessLevel,
    ) -> StorageResult<bool>;

    /// Returns `true` if `user` holds every flag in `flags` on `doc`.
    fn has_access_flags(
        &self,
        doc: &Document,
        user: Option<&User>,
        flags: &[String],
    ) -> StorageResult<bool>;

    /// Fails with an access-denied error unless [`has_access`](Self::has_access) passes.
    fn require_access(
        &self,
        doc: &Document,
        user: Option<&User>,
        level: AccessLevel,
    ) -> StorageResult<()> {
        if self.has_access(doc, user, level)? {
            return Ok(());
        }
        Err(AccessError::denied(
            level.permission_name(),
            self.name(),
            doc.id().as_deref(),
            user.map(User::id),
        )
        .into())
    }

    /// Fails with an access-denied error unless
    /// [`has_access_flags`](Self::has_access_flags) passes.
    fn require_access_flags(
        &self,
        doc: &Document,
        user: Option<&User>,
        flags: &[String],
    ) -> StorageResult<()> {
        if self.has_access_flags(doc, user, flags)? {
            return Ok(());
        }
        Err(AccessError::flags_denied(
            self.name(),
            doc.id().as_deref(),
            user.map(User::id),
            flags,
        )
        .into())
    }
}

/// Returns the native ACL fields: `public` and `access`, plus `publicFlags`
/// when flags are checked.
pub fn acl_fields(with_flags: bool) -> Vec<String> {
    let mut fields = vec![PUBLIC_FIELD.to_string(), ACCESS_FIELD.to_string()];
    if with_flags {
        fields.push(PUBLIC_FLAGS_FIELD.to_string());
    }
    fields
}

/// Returns `true` if the model can make its own grant/deny decisions.
pub fn is_access_controlled(model: &dyn Model) -> bool {
    model.access_control().is_some()
}
