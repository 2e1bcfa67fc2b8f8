//! Acting user.

use serde::{Deserialize, Serialize};

/// The user on whose behalf a permission check runs.
///
/// Anonymous requests are represented by passing `None` wherever an
/// `Option<&User>` is expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    id: String,

    /// Site administrators pass every check.
    #[serde(default)]
    admin: bool,

    /// Ids of the groups this user belongs to.
    #[serde(default)]
    groups: Vec<String>,
}

impl User {
    /// Creates a regular user with no group memberships.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            admin: false,
            groups: Vec::new(),
        }
    }

    /// Creates a site administrator.
    pub fn site_admin(id: impl Into<String>) -> Self {
        Self {
            admin: true,
            ..Self::new(id)
        }
    }

    /// Adds group memberships.
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Returns the user id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns `true` for site administrators.
    pub fn is_admin(&self) -> bool {
        self.admin
    }

    /// Returns the ids of the user's groups.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns `true` if the user belongs to the given group.
    pub fn in_group(&self, group_id: &str) -> bool {
        self.groups.iter().any(|g| g == group_id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_defaults() {
        let user: User = serde_json::from_value(json!({"_id": "u1"})).unwrap();
        assert_eq!(user.id(), "u1");
        assert!(!user.is_admin());
        assert!(user.groups().is_empty());
    }

    #[test]
    fn test_group_membership() {
        let user = User::new("u1").with_groups(["g1", "g2"]);
        assert!(user.in_group("g2"));
        assert!(!user.in_group("g3"));
        assert!(User::site_admin("root").is_admin());
    }
}
