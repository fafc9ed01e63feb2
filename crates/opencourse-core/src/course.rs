//! Courses.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A course owned by exactly one instructor.
///
/// Ownership is the write gate: only the owning instructor may mutate or
/// delete the course, and chapter mutability is derived from it. Students
/// gain read access transitively through enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Unique identifier.
    pub id: Uuid,

    /// Course title.
    pub title: String,

    /// Free-form description, may be empty.
    pub description: String,

    /// The owning instructor.
    pub instructor_id: Uuid,

    /// When the course was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the course was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Course {
    /// Returns `true` if the given user id owns this course.
    #[must_use]
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.instructor_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership_check() {
        let owner = Uuid::new_v4();
        let course = Course {
            id: Uuid::new_v4(),
            title: "Rust 101".to_string(),
            description: String::new(),
            instructor_id: owner,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        assert!(course.is_owned_by(owner));
        assert!(!course.is_owned_by(Uuid::new_v4()));
    }
}
