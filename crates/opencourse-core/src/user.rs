//! User accounts.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::role::Role;

/// A registered user.
///
/// The email is the login handle and globally unique; matching is exact on
/// the stored string, no case folding. The password hash is an argon2id PHC
/// string and must never reach an API response — use [`User::profile`] when
/// serializing a user for the outside world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: Uuid,

    /// Login handle, globally unique.
    pub email: String,

    /// Display name; not unique.
    pub username: String,

    /// Argon2id PHC hash of the password.
    pub password_hash: String,

    /// Role assigned at registration, immutable afterwards.
    pub role: Role,

    /// Inactive users cannot authenticate or act.
    pub is_active: bool,

    /// When the account was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the account was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Creates a new active user with a fresh UUID.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            username: username.into(),
            password_hash: password_hash.into(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if the user holds the instructor role.
    #[must_use]
    pub fn is_instructor(&self) -> bool {
        self.role == Role::Instructor
    }

    /// Returns `true` if the user holds the student role.
    #[must_use]
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    /// The API-facing view of this user, without the password hash.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// Public view of a user, safe to embed in API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique identifier.
    pub id: Uuid,
    /// Login handle.
    pub email: String,
    /// Display name.
    pub username: String,
    /// Account role.
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_active() {
        let user = User::new("ada@example.com", "ada", "$argon2id$...", Role::Instructor);
        assert!(user.is_active);
        assert!(user.is_instructor());
        assert!(!user.is_student());
    }

    #[test]
    fn test_profile_omits_password_hash() {
        let user = User::new("ada@example.com", "ada", "$argon2id$secret", Role::Student);
        let json = serde_json::to_string(&user.profile()).unwrap();
        assert!(json.contains("ada@example.com"));
        assert!(!json.contains("argon2id"));
    }

    #[test]
    fn test_profile_carries_role() {
        let user = User::new("bob@example.com", "bob", "h", Role::Student);
        let profile = user.profile();
        assert_eq!(profile.role, Role::Student);
        assert_eq!(profile.id, user.id);
    }
}
