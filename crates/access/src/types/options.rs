//! Option types for loads, permission filtering and search.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{AccessLevel, User};

/// Options for loading a document through an access check.
///
/// The defaults mirror a guarded load: `Admin` level, anonymous user, no
/// `force`, all fields.
///
/// # Examples
///
/// ```
/// use helios_access::types::{AccessLevel, LoadOptions, User};
///
/// let user = User::new("u1");
/// let options = LoadOptions::new()
///     .with_user(&user)
///     .with_level(AccessLevel::Read)
///     .with_fields(["name"]);
/// assert!(!options.force);
/// ```
#[derive(Debug, Clone)]
pub struct LoadOptions<'a> {
    /// Level the caller must hold.
    pub level: AccessLevel,
    /// Acting user; `None` is anonymous.
    pub user: Option<&'a User>,
    /// Skip the permission check entirely.
    pub force: bool,
    /// Fields to return besides `_id`; `None` returns everything.
    pub fields: Option<Vec<String>>,
}

impl Default for LoadOptions<'_> {
    fn default() -> Self {
        Self {
            level: AccessLevel::Admin,
            user: None,
            force: false,
            fields: None,
        }
    }
}

impl<'a> LoadOptions<'a> {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that bypass the permission check.
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }

    /// Sets the required level.
    pub fn with_level(mut self, level: AccessLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the acting user.
    pub fn with_user(mut self, user: &'a User) -> Self {
        self.user = Some(user);
        self
    }

    /// Sets the acting user, possibly anonymous.
    pub fn with_optional_user(mut self, user: Option<&'a User>) -> Self {
        self.user = user;
        self
    }

    /// Sets `force`.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Restricts the returned fields.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Options for filtering a cursor by permission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Level each document's owner must grant.
    #[serde(default)]
    pub level: AccessLevel,
    /// Maximum number of documents to yield; `0` is unbounded.
    #[serde(default)]
    pub limit: usize,
    /// Number of granted documents to skip.
    #[serde(default)]
    pub offset: usize,
    /// Top-level keys removed from every yielded document.
    #[serde(default)]
    pub remove_keys: Vec<String>,
    /// Flags each document's owner must grant in addition to `level`.
    #[serde(default)]
    pub flags: Vec<String>,
}

impl FilterOptions {
    /// Creates options requiring `level`, unbounded, with no redaction or flags.
    pub fn new(level: AccessLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Sets the limit (`0` is unbounded).
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the offset.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the keys removed from yielded documents.
    pub fn with_remove_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remove_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the required flags.
    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    Ascending,
    /// Descending order.
    Descending,
}

/// A sort directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    /// The field to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl SortDirective {
    /// Parses a sort value (e.g., "-name" for descending).
    pub fn parse(s: &str) -> Self {
        if let Some(stripped) = s.strip_prefix('-') {
            Self {
                field: stripped.to_string(),
                direction: SortDirection::Descending,
            }
        } else {
            Self {
                field: s.to_string(),
                direction: SortDirection::Ascending,
            }
        }
    }
}

/// A permission-aware text or prefix search.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    /// The search text.
    pub query: String,
    /// Acting user; `None` is anonymous.
    pub user: Option<&'a User>,
    /// Exact-match filters applied before permission filtering.
    pub filters: Map<String, Value>,
    /// Maximum number of results; `0` is unbounded.
    pub limit: usize,
    /// Number of granted results to skip.
    pub offset: usize,
    /// Sort directives.
    pub sort: Vec<SortDirective>,
    /// Fields to return besides `_id`; `None` returns everything.
    pub fields: Option<Vec<String>>,
    /// Level each result's owner must grant.
    pub level: AccessLevel,
}

impl<'a> SearchRequest<'a> {
    /// Creates a search for `query` at read level.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            user: None,
            filters: Map::new(),
            limit: 0,
            offset: 0,
            sort: Vec::new(),
            fields: None,
            level: AccessLevel::Read,
        }
    }

    /// Sets the acting user.
    pub fn with_user(mut self, user: &'a User) -> Self {
        self.user = Some(user);
        self
    }

    /// Adds an exact-match filter.
    pub fn with_filter(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filters.insert(field.into(), value);
        self
    }

    /// Sets the limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the offset.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Adds a sort directive.
    pub fn with_sort(mut self, sort: SortDirective) -> Self {
        self.sort.push(sort);
        self
    }

    /// Restricts the returned fields.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the required level.
    pub fn with_level(mut self, level: AccessLevel) -> Self {
        self.level = level;
        self
    }
}
