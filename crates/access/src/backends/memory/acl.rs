//! Natively access-controlled in-memory collection.

use std::fmt::Debug;

use serde_json::{Map, Value};

use crate::core::{Cursor, Model, SupportsAccessControl};
use crate::error::StorageResult;
use crate::types::{
    ACCESS_FIELD, AccessLevel, Acl, Document, LoadOptions, PUBLIC_FIELD, ResourceType,
    SortDirective, User,
};

use super::MemoryCollection;

/// An in-memory collection whose documents carry their own ACL.
///
/// Decisions read the `public`, `publicFlags` and `access` fields of the
/// document at hand. Site administrators pass every check.
///
/// # Examples
///
/// ```
/// use helios_access::backends::memory::AclCollection;
/// use helios_access::core::SupportsAccessControl;
/// use helios_access::types::{AccessLevel, User};
/// use serde_json::json;
///
/// let folders = AclCollection::new("folder");
/// let folder = folders.save(json!({"name": "Scans"})).unwrap();
/// let id = folder.id().unwrap();
/// let folder = folders
///     .set_user_access(&id, "u1", Some(AccessLevel::Write), vec![])
///     .unwrap();
///
/// let user = User::new("u1");
/// assert!(folders.has_access(&folder, Some(&user), AccessLevel::Write).unwrap());
/// assert!(!folders.has_access(&folder, Some(&user), AccessLevel::Admin).unwrap());
/// ```
pub struct AclCollection {
    inner: MemoryCollection,
}

impl Debug for AclCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AclCollection")
            .field("inner", &self.inner)
            .finish()
    }
}

impl AclCollection {
    /// Creates an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_collection(MemoryCollection::new(name))
    }

    /// Creates an empty collection provided by a plugin namespace.
    pub fn namespaced(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::from_collection(MemoryCollection::namespaced(name, namespace))
    }

    /// Adds access control to an existing collection.
    pub fn from_collection(inner: MemoryCollection) -> Self {
        Self { inner }
    }

    /// Returns the underlying storage.
    pub fn inner(&self) -> &MemoryCollection {
        &self.inner
    }

    /// Inserts or replaces a document. See [`MemoryCollection::save`].
    pub fn save(&self, value: Value) -> StorageResult<Document> {
        self.inner.save(value)
    }

    /// Returns how many id lookups have been served.
    pub fn lookup_count(&self) -> usize {
        self.inner.lookup_count()
    }

    /// Resets the lookup counter.
    pub fn reset_lookup_count(&self) {
        self.inner.reset_lookup_count()
    }

    /// Sets the public read switch.
    pub fn set_public(&self, id: &str, public: bool) -> StorageResult<Document> {
        self.update_acl(id, |acl| acl.public = public)
    }

    /// Sets the flags granted to everyone.
    pub fn set_public_flags(&self, id: &str, flags: Vec<String>) -> StorageResult<Document> {
        self.update_acl(id, |acl| acl.public_flags = flags)
    }

    /// Grants `level` and `flags` to a user, or revokes with `None`.
    pub fn set_user_access(
        &self,
        id: &str,
        user_id: &str,
        level: Option<AccessLevel>,
        flags: Vec<String>,
    ) -> StorageResult<Document> {
        self.update_acl(id, |acl| acl.set_user(user_id, level, flags))
    }

    /// Grants `level` and `flags` to a group, or revokes with `None`.
    pub fn set_group_access(
        &self,
        id: &str,
        group_id: &str,
        level: Option<AccessLevel>,
        flags: Vec<String>,
    ) -> StorageResult<Document> {
        self.update_acl(id, |acl| acl.set_group(group_id, level, flags))
    }

    fn update_acl<F>(&self, id: &str, change: F) -> StorageResult<Document>
    where
        F: FnOnce(&mut Acl),
    {
        self.inner.update(id, |doc| {
            let mut acl = Acl::from_document(doc)?;
            change(&mut acl);
            acl.write_to(doc)
        })
    }
}

impl Model for AclCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn resource_type(&self) -> ResourceType {
        self.inner.resource_type()
    }

    fn find_by_id(&self, id: &str, fields: Option<&[String]>) -> StorageResult<Option<Document>> {
        self.inner.find_by_id(id, fields)
    }

    fn find(
        &self,
        filters: &Map<String, Value>,
        sort: &[SortDirective],
        fields: Option<&[String]>,
    ) -> StorageResult<Cursor> {
        self.inner.find(filters, sort, fields)
    }

    fn search_text(
        &self,
        query: &str,
        filters: &Map<String, Value>,
        sort: &[SortDirective],
        fields: Option<&[String]>,
    ) -> StorageResult<Cursor> {
        self.inner.search_text(query, filters, sort, fields)
    }

    fn search_prefix(
        &self,
        query: &str,
        filters: &Map<String, Value>,
        sort: &[SortDirective],
        fields: Option<&[String]>,
    ) -> StorageResult<Cursor> {
        self.inner.search_prefix(query, filters, sort, fields)
    }

    fn access_control(&self) -> Option<&dyn SupportsAccessControl> {
        Some(self)
    }
}

impl SupportsAccessControl for AclCollection {
    fn load_with_access(&self, id: &str, options: &LoadOptions<'_>) -> StorageResult<Document> {
        if options.force {
            return self.load_required(id, options.fields.as_deref());
        }

        // The check needs the ACL even when the caller asked for fewer fields.
        let mut fields = options.fields.clone();
        let mut added = Vec::new();
        if let Some(fields) = fields.as_mut() {
            for acl_field in [PUBLIC_FIELD, ACCESS_FIELD] {
                if !fields.iter().any(|f| f == acl_field) {
                    fields.push(acl_field.to_string());
                    added.push(acl_field);
                }
            }
        }

        let mut doc = self.load_required(id, fields.as_deref())?;
        self.require_access(&doc, options.user, options.level)?;
        for field in added {
            doc.remove(field);
        }
        Ok(doc)
    }

    fn has_access(
        &self,
        doc: &Document,
        user: Option<&User>,
        level: AccessLevel,
    ) -> StorageResult<bool> {
        Ok(Acl::from_document(doc)?.has_access(user, level))
    }

    fn has_access_flags(
        &self,
        doc: &Document,
        user: Option<&User>,
        flags: &[String],
    ) -> StorageResult<bool> {
        Ok(Acl::from_document(doc)?.has_access_flags(user, flags))
    }
}
