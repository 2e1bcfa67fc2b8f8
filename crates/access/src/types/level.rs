//! Access level types.
//!
//! This module defines the ordered permission levels a user can hold on an
//! access-controlled resource.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Permission level required by, or granted on, a resource.
///
/// Levels are totally ordered: a grant at a higher level satisfies any check
/// at a lower one. On the wire they are encoded as integers (`-1`, `0`, `1`,
/// `2`, `100`) so stored ACL entries stay compact.
///
/// # Examples
///
/// ```
/// use helios_access::types::AccessLevel;
///
/// assert!(AccessLevel::Admin > AccessLevel::Write);
/// assert_eq!(AccessLevel::Write.permission_name(), "Write");
/// assert_eq!("read".parse::<AccessLevel>().unwrap(), AccessLevel::Read);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "i32", into = "i32")]
pub enum AccessLevel {
    /// No access.
    None,
    /// Read access.
    #[default]
    Read,
    /// Write access.
    Write,
    /// Administrative access on the resource.
    Admin,
    /// Site-wide administrator.
    SiteAdmin,
}

impl AccessLevel {
    /// Returns the integer code used in stored ACL entries.
    pub fn code(&self) -> i32 {
        match self {
            AccessLevel::None => -1,
            AccessLevel::Read => 0,
            AccessLevel::Write => 1,
            AccessLevel::Admin => 2,
            AccessLevel::SiteAdmin => 100,
        }
    }

    /// Returns the capitalised permission name used in denial messages.
    pub fn permission_name(&self) -> &'static str {
        match self {
            AccessLevel::Read => "Read",
            AccessLevel::Write => "Write",
            AccessLevel::Admin | AccessLevel::SiteAdmin => "Admin",
            AccessLevel::None => "Unknown",
        }
    }
}

impl TryFrom<i32> for AccessLevel {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(AccessLevel::None),
            0 => Ok(AccessLevel::Read),
            1 => Ok(AccessLevel::Write),
            2 => Ok(AccessLevel::Admin),
            100 => Ok(AccessLevel::SiteAdmin),
            other => Err(format!("unknown access level code: {}", other)),
        }
    }
}

impl From<AccessLevel> for i32 {
    fn from(level: AccessLevel) -> Self {
        level.code()
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::None => write!(f, "none"),
            AccessLevel::Read => write!(f, "read"),
            AccessLevel::Write => write!(f, "write"),
            AccessLevel::Admin => write!(f, "admin"),
            AccessLevel::SiteAdmin => write!(f, "site_admin"),
        }
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(AccessLevel::None),
            "read" => Ok(AccessLevel::Read),
            "write" => Ok(AccessLevel::Write),
            "admin" => Ok(AccessLevel::Admin),
            "site_admin" | "site-admin" => Ok(AccessLevel::SiteAdmin),
            other => Err(format!("unknown access level: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(AccessLevel::None < AccessLevel::Read);
        assert!(AccessLevel::Read < AccessLevel::Write);
        assert!(AccessLevel::Write < AccessLevel::Admin);
        assert!(AccessLevel::Admin < AccessLevel::SiteAdmin);
    }

    #[test]
    fn test_permission_names() {
        assert_eq!(AccessLevel::Read.permission_name(), "Read");
        assert_eq!(AccessLevel::Write.permission_name(), "Write");
        assert_eq!(AccessLevel::Admin.permission_name(), "Admin");
        assert_eq!(AccessLevel::SiteAdmin.permission_name(), "Admin");
        assert_eq!(AccessLevel::None.permission_name(), "Unknown");
    }

    #[test]
    fn test_serde_uses_integer_codes() {
        assert_eq!(serde_json::to_string(&AccessLevel::Write).unwrap(), "1");
        let level: AccessLevel = serde_json::from_str("2").unwrap();
        assert_eq!(level, AccessLevel::Admin);
        assert!(serde_json::from_str::<AccessLevel>("7").is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!("WRITE".parse::<AccessLevel>().unwrap(), AccessLevel::Write);
        assert_eq!(
            "site-admin".parse::<AccessLevel>().unwrap(),
            AccessLevel::SiteAdmin
        );
        assert!("owner".parse::<AccessLevel>().is_err());
    }
}
