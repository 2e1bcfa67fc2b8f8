//! Access control lists as stored on access-controlled documents.
//!
//! An access-controlled document carries three ACL fields:
//!
//! - `public` - whether anyone may read it
//! - `publicFlags` - flags granted to everyone
//! - `access` - per-user and per-group grants, each with a level and flags
//!
//! ```json
//! {
//!     "public": false,
//!     "publicFlags": ["preview"],
//!     "access": {
//!         "users": [{"id": "u1", "level": 1, "flags": []}],
//!         "groups": [{"id": "g1", "level": 0}]
//!     }
//! }
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StorageResult;

use super::{AccessLevel, Document, User};

/// Document field holding the public read switch.
pub const PUBLIC_FIELD: &str = "public";
/// Document field holding flags granted to everyone.
pub const PUBLIC_FLAGS_FIELD: &str = "publicFlags";
/// Document field holding user and group grants.
pub const ACCESS_FIELD: &str = "access";

/// A single user or group grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    /// User or group id.
    pub id: String,
    /// Granted level.
    pub level: AccessLevel,
    /// Granted flags.
    #[serde(default)]
    pub flags: Vec<String>,
}

/// User and group grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessList {
    /// Per-user grants.
    #[serde(default)]
    pub users: Vec<AccessEntry>,
    /// Per-group grants.
    #[serde(default)]
    pub groups: Vec<AccessEntry>,
}

/// The ACL of an access-controlled document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acl {
    /// Anyone may read.
    pub public: bool,
    /// Flags granted to everyone.
    pub public_flags: Vec<String>,
    /// User and group grants.
    pub access: AccessList,
}

impl Acl {
    /// Reads the ACL fields of a document. Absent fields mean "no grant".
    pub fn from_document(doc: &Document) -> StorageResult<Self> {
        let public = doc
            .get(PUBLIC_FIELD)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let public_flags = match doc.get(PUBLIC_FLAGS_FIELD) {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value.clone())?,
        };
        let access = match doc.get(ACCESS_FIELD) {
            None | Some(Value::Null) => AccessList::default(),
            Some(value) => serde_json::from_value(value.clone())?,
        };

        Ok(Self {
            public,
            public_flags,
            access,
        })
    }

    /// Writes the ACL fields back onto a document.
    pub fn write_to(&self, doc: &mut Document) -> StorageResult<()> {
        doc.insert(PUBLIC_FIELD, Value::Bool(self.public));
        doc.insert(PUBLIC_FLAGS_FIELD, serde_json::to_value(&self.public_flags)?);
        doc.insert(ACCESS_FIELD, serde_json::to_value(&self.access)?);
        Ok(())
    }

    /// Returns `true` if `user` holds at least `level`.
    ///
    /// Site administrators always pass. Public documents grant read to
    /// everyone, including anonymous callers.
    pub fn has_access(&self, user: Option<&User>, level: AccessLevel) -> bool {
        if self.public && level <= AccessLevel::Read {
            return true;
        }
        let Some(user) = user else {
            return false;
        };
        if user.is_admin() {
            return true;
        }
        self.user_entry(user).is_some_and(|e| e.level >= level)
            || self.group_entries(user).any(|e| e.level >= level)
    }

    /// Returns `true` if every flag in `flags` is granted to `user`.
    ///
    /// Flags can come from `publicFlags`, the user's own grant, or any of the
    /// user's groups. An empty flag set is always satisfied.
    pub fn has_access_flags<S: AsRef<str>>(&self, user: Option<&User>, flags: &[S]) -> bool {
        if flags.is_empty() {
            return true;
        }
        if user.is_some_and(User::is_admin) {
            return true;
        }

        let mut missing: BTreeSet<&str> = flags.iter().map(AsRef::as_ref).collect();
        for flag in &self.public_flags {
            missing.remove(flag.as_str());
        }
        if let Some(user) = user {
            for entry in self.user_entry(user).into_iter().chain(self.group_entries(user)) {
                for flag in &entry.flags {
                    missing.remove(flag.as_str());
                }
            }
        }
        missing.is_empty()
    }

    /// Sets (or with `None`, removes) a user's grant.
    pub fn set_user(&mut self, user_id: &str, level: Option<AccessLevel>, flags: Vec<String>) {
        set_entry(&mut self.access.users, user_id, level, flags);
    }

    /// Sets (or with `None`, removes) a group's grant.
    pub fn set_group(&mut self, group_id: &str, level: Option<AccessLevel>, flags: Vec<String>) {
        set_entry(&mut self.access.groups, group_id, level, flags);
    }

    fn user_entry(&self, user: &User) -> Option<&AccessEntry> {
        self.access.users.iter().find(|e| e.id == user.id())
    }

    fn group_entries<'a>(&'a self, user: &'a User) -> impl Iterator<Item = &'a AccessEntry> + 'a {
        self.access
            .groups
            .iter()
            .filter(move |e| user.in_group(&e.id))
    }
}

fn set_entry(
    entries: &mut Vec<AccessEntry>,
    id: &str,
    level: Option<AccessLevel>,
    flags: Vec<String>,
) {
    entries.retain(|e| e.id != id);
    if let Some(level) = level {
        entries.push(AccessEntry {
            id: id.to_string(),
            level,
            flags,
        });
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_fields_are_private() {
        let acl = Acl::from_document(&doc(json!({"_id": "f"}))).unwrap();
        assert!(!acl.has_access(None, AccessLevel::Read));
        assert!(!acl.has_access(Some(&User::new("u1")), AccessLevel::Read));
        assert!(acl.has_access(Some(&User::site_admin("root")), AccessLevel::SiteAdmin));
    }

    #[test]
    fn test_user_grant_levels() {
        let acl = Acl::from_document(&doc(json!({
            "_id": "f",
            "access": {"users": [{"id": "u1", "level": 1}]}
        })))
        .unwrap();
        let user = User::new("u1");
        assert!(acl.has_access(Some(&user), AccessLevel::Read));
        assert!(acl.has_access(Some(&user), AccessLevel::Write));
        assert!(!acl.has_access(Some(&user), AccessLevel::Admin));
        assert!(!acl.has_access(Some(&User::new("u2")), AccessLevel::Read));
    }

    #[test]
    fn test_public_grants_read_only() {
        let acl = Acl::from_document(&doc(json!({"_id": "f", "public": true}))).unwrap();
        assert!(acl.has_access(None, AccessLevel::Read));
        assert!(!acl.has_access(None, AccessLevel::Write));
        assert!(!acl.has_access(Some(&User::new("u1")), AccessLevel::Admin));
    }

    #[test]
    fn test_group_grants() {
        let acl = Acl::from_document(&doc(json!({
            "_id": "f",
            "access": {"groups": [{"id": "g1", "level": 2, "flags": ["export"]}]}
        })))
        .unwrap();
        let member = User::new("u1").with_groups(["g1"]);
        assert!(acl.has_access(Some(&member), AccessLevel::Admin));
        assert!(acl.has_access_flags(Some(&member), &["export"]));
        assert!(!acl.has_access(Some(&User::new("u2")), AccessLevel::Read));
    }

    #[test]
    fn test_flags_combine_sources() {
        let acl = Acl::from_document(&doc(json!({
            "_id": "f",
            "publicFlags": ["preview"],
            "access": {"users": [{"id": "u1", "level": 0, "flags": ["download"]}]}
        })))
        .unwrap();
        let user = User::new("u1");
        assert!(acl.has_access_flags(None, &["preview"]));
        assert!(!acl.has_access_flags(None, &["preview", "download"]));
        assert!(acl.has_access_flags(Some(&user), &["preview", "download"]));
        assert!(!acl.has_access_flags(Some(&user), &["delete"]));
        assert!(acl.has_access_flags::<&str>(None, &[]));
    }

    #[test]
    fn test_set_and_write_back() {
        let mut acl = Acl::default();
        acl.set_user("u1", Some(AccessLevel::Read), vec![]);
        acl.set_user("u1", Some(AccessLevel::Write), vec!["x".to_string()]);
        acl.set_group("g1", Some(AccessLevel::Read), vec![]);
        acl.set_group("g1", None, vec![]);
        assert_eq!(acl.access.users.len(), 1);
        assert!(acl.access.groups.is_empty());

        let mut target = Document::new();
        acl.write_to(&mut target).unwrap();
        assert_eq!(Acl::from_document(&target).unwrap(), acl);
    }

    #[test]
    fn test_malformed_access_is_an_error() {
        let result = Acl::from_document(&doc(json!({"_id": "f", "access": "everyone"})));
        assert!(result.is_err());
    }
}
