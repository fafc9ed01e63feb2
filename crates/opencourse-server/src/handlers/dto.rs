//! Request and response payloads.
//!
//! Request fields are `Option` so that missing input surfaces as a 400
//! validation error instead of a deserialization failure; handlers do the
//! field checks. Response shapes embed related records the way the API
//! promises them: courses carry their instructor, chapters their course
//! title, enrollments both.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use opencourse_core::{Chapter, Course, Enrollment, UserProfile, Visibility};
use opencourse_auth::TokenPair;

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Confirmation; must match `password`.
    pub password2: Option<String>,
    /// Defaults to "student".
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

/// Returned by register and login: the user plus a fresh token pair.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserProfile,
    pub refresh: String,
    pub access: String,
}

impl SessionResponse {
    #[must_use]
    pub fn new(user: UserProfile, pair: TokenPair) -> Self {
        Self {
            user,
            refresh: pair.refresh,
            access: pair.access,
        }
    }
}

/// Returned by the refresh endpoint.
#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub access: String,
}

// ============================================================================
// Courses
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CourseCreateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CourseUpdateRequest {
    /// Absent fields keep their current value.
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructor: UserProfile,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl CourseResponse {
    #[must_use]
    pub fn new(course: Course, instructor: UserProfile) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            instructor,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

/// Returned by the join action.
#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub message: &'static str,
}

// ============================================================================
// Chapters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChapterCreateRequest {
    /// Parent course id.
    pub course: Option<Uuid>,
    pub title: Option<String>,
    /// Opaque document body; must be a JSON object. Defaults to `{}`.
    pub content: Option<serde_json::Value>,
    /// Defaults to "public".
    pub visibility: Option<String>,
    /// Display position; defaults to 0.
    #[serde(rename = "order")]
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ChapterUpdateRequest {
    pub title: Option<String>,
    pub content: Option<serde_json::Value>,
    pub visibility: Option<String>,
    #[serde(rename = "order")]
    pub position: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ChapterResponse {
    pub id: Uuid,
    pub course: Uuid,
    pub course_title: String,
    pub title: String,
    pub content: serde_json::Value,
    pub visibility: Visibility,
    #[serde(rename = "order")]
    pub position: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ChapterResponse {
    #[must_use]
    pub fn new(chapter: Chapter, course_title: impl Into<String>) -> Self {
        Self {
            id: chapter.id,
            course: chapter.course_id,
            course_title: course_title.into(),
            title: chapter.title,
            content: chapter.content,
            visibility: chapter.visibility,
            position: chapter.position,
            created_at: chapter.created_at,
            updated_at: chapter.updated_at,
        }
    }
}

// ============================================================================
// Enrollments
// ============================================================================

#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub id: Uuid,
    pub student: UserProfile,
    pub course: CourseResponse,
    #[serde(with = "time::serde::rfc3339")]
    pub enrolled_at: OffsetDateTime,
}

impl EnrollmentResponse {
    #[must_use]
    pub fn new(
        enrollment: Enrollment,
        course: Course,
        instructor: UserProfile,
        student: UserProfile,
    ) -> Self {
        Self {
            id: enrollment.id,
            student,
            course: CourseResponse::new(course, instructor),
            enrolled_at: enrollment.enrolled_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencourse_core::{Role, User};

    fn instructor_profile() -> UserProfile {
        User::new("ada@example.com", "ada", "hash", Role::Instructor).profile()
    }

    fn sample_course(instructor: &UserProfile) -> Course {
        Course {
            id: Uuid::new_v4(),
            title: "Rust 101".to_string(),
            description: "intro".to_string(),
            instructor_id: instructor.id,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn test_course_response_embeds_instructor() {
        let instructor = instructor_profile();
        let course = sample_course(&instructor);
        let json = serde_json::to_value(CourseResponse::new(course, instructor)).unwrap();

        assert_eq!(json["title"], "Rust 101");
        assert_eq!(json["instructor"]["email"], "ada@example.com");
        assert_eq!(json["instructor"]["role"], "instructor");
        assert!(json.get("instructor_id").is_none());
    }

    #[test]
    fn test_chapter_response_field_names() {
        let chapter = Chapter {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            title: "Intro".to_string(),
            content: serde_json::json!({"blocks": []}),
            visibility: Visibility::Private,
            position: 2,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_value(ChapterResponse::new(chapter, "Rust 101")).unwrap();

        assert_eq!(json["course_title"], "Rust 101");
        assert_eq!(json["order"], 2);
        assert_eq!(json["visibility"], "private");
        assert!(json.get("position").is_none());
    }

    #[test]
    fn test_chapter_request_accepts_order_field() {
        let req: ChapterCreateRequest = serde_json::from_str(
            r#"{"course": "b5c4f5e0-7f9a-4d4a-9a66-16e5a2f3d5a1", "title": "Intro", "order": 7}"#,
        )
        .unwrap();
        assert_eq!(req.position, Some(7));
        assert!(req.content.is_none());
    }

    #[test]
    fn test_register_request_tolerates_missing_fields() {
        let req: RegisterRequest = serde_json::from_str("{}").unwrap();
        assert!(req.email.is_none());
        assert!(req.role.is_none());
    }
}
