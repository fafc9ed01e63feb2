//! Chapters and their visibility.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Who may see a chapter, layered on top of enrollment.
///
/// Enrollment grants a student access to a course; visibility then decides
/// which of its chapters they can read. Instructors who own the parent
/// course see every chapter regardless of this flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to enrolled students.
    Public,
    /// Visible to the owning instructor only.
    Private,
}

impl Visibility {
    /// Returns the visibility name as stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown visibility name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown visibility: {0}")]
pub struct ParseVisibilityError(pub String);

impl FromStr for Visibility {
    type Err = ParseVisibilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(ParseVisibilityError(other.to_string())),
        }
    }
}

/// A chapter inside a course.
///
/// Content is an opaque structured document — the server stores and returns
/// it without interpreting anything beyond "it is a JSON object". Chapters
/// are ordered within a course by `position`, ties broken by creation time.
/// The API calls the position field `order`; the struct avoids the SQL
/// keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    /// Unique identifier.
    pub id: Uuid,

    /// Parent course; chapters are cascade-deleted with it.
    pub course_id: Uuid,

    /// Chapter title.
    pub title: String,

    /// Opaque document body.
    pub content: serde_json::Value,

    /// Visibility gate for enrolled students.
    pub visibility: Visibility,

    /// Display position within the course.
    #[serde(rename = "order")]
    pub position: i32,

    /// When the chapter was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the chapter was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Chapter {
    /// Returns `true` if enrolled students may read this chapter.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_round_trip() {
        for v in [Visibility::Public, Visibility::Private] {
            assert_eq!(v.as_str().parse::<Visibility>().unwrap(), v);
        }
    }

    #[test]
    fn test_visibility_parse_rejects_unknown() {
        assert!("hidden".parse::<Visibility>().is_err());
    }

    #[test]
    fn test_position_serializes_as_order() {
        let chapter = Chapter {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            title: "Intro".to_string(),
            content: serde_json::json!({}),
            visibility: Visibility::Public,
            position: 3,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json: serde_json::Value = serde_json::to_value(&chapter).unwrap();
        assert_eq!(json["order"], 3);
        assert!(json.get("position").is_none());
    }
}
