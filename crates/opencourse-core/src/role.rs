//! User roles.
//!
//! The role set is closed: every authorization decision matches on it
//! exhaustively, so adding a variant forces every policy function to take a
//! position on it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The role a user holds for the lifetime of their account.
///
/// Roles are assigned at registration and never change afterwards; there is
/// no role-change operation anywhere in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can browse the course catalog, enroll, and read public chapters of
    /// enrolled courses.
    Student,
    /// Can create courses and manage the chapters of courses they own.
    Instructor,
}

impl Role {
    /// Returns the role name as stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Instructor => "instructor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "instructor" => Ok(Self::Instructor),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Student, Role::Instructor] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_parse_rejects_unknown() {
        let err = "admin".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "unknown role: admin");
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Student).unwrap(), "\"student\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"instructor\"").unwrap(),
            Role::Instructor
        );
    }
}
