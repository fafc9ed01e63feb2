//! Enrollment storage.
//!
//! The join operation is the one place in the system with a concurrency
//! contract: concurrent joins for the same (student, course) pair must
//! produce exactly one row. That is enforced here with the table's unique
//! constraint plus `INSERT ... ON CONFLICT DO NOTHING` — never with a
//! read-then-write from the application tier.

use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use opencourse_core::{Course, Enrollment, UserProfile};

use crate::user::profile_from_tuple;
use crate::{PgPool, StorageResult};

/// What an idempotent join actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A new enrollment row was inserted.
    Created,
    /// The pair already existed; nothing changed.
    AlreadyEnrolled,
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Enrollment joined with its course and the course's instructor profile.
type EnrollmentJoinTuple = (
    Uuid,
    Uuid,
    Uuid,
    OffsetDateTime,
    String,
    String,
    OffsetDateTime,
    OffsetDateTime,
    Uuid,
    String,
    String,
    String,
);

fn enrollment_join_from_tuple(
    row: EnrollmentJoinTuple,
) -> StorageResult<(Enrollment, Course, UserProfile)> {
    let (
        id,
        student_id,
        course_id,
        enrolled_at,
        course_title,
        course_description,
        course_created_at,
        course_updated_at,
        uid,
        email,
        username,
        role,
    ) = row;

    let instructor = profile_from_tuple((uid, email, username, role))?;
    let enrollment = Enrollment {
        id,
        student_id,
        course_id,
        enrolled_at,
    };
    let course = Course {
        id: course_id,
        title: course_title,
        description: course_description,
        instructor_id: instructor.id,
        created_at: course_created_at,
        updated_at: course_updated_at,
    };
    Ok((enrollment, course, instructor))
}

// =============================================================================
// Enrollment Storage
// =============================================================================

/// Enrollment storage operations.
pub struct EnrollmentStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> EnrollmentStorage<'a> {
    /// Create a new enrollment storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Atomically enroll a student in a course.
    ///
    /// Safe under concurrent duplicate submissions: the unique constraint
    /// makes at most one insert win, and every caller learns which side it
    /// was on.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn join_course(&self, student_id: Uuid, course_id: Uuid) -> StorageResult<JoinOutcome> {
        let result = query(
            r#"
            INSERT INTO enrollments (id, student_id, course_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (student_id, course_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(course_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            Ok(JoinOutcome::Created)
        } else {
            Ok(JoinOutcome::AlreadyEnrolled)
        }
    }

    /// Is the student enrolled in the course?
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_enrolled(&self, student_id: Uuid, course_id: Uuid) -> StorageResult<bool> {
        let row: (bool,) = query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM enrollments WHERE student_id = $1 AND course_id = $2
            )
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.0)
    }

    /// List a student's enrollments, newest first, with course and
    /// instructor details for the API payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_student(
        &self,
        student_id: Uuid,
    ) -> StorageResult<Vec<(Enrollment, Course, UserProfile)>> {
        let rows: Vec<EnrollmentJoinTuple> = query_as(
            r#"
            SELECT e.id, e.student_id, e.course_id, e.enrolled_at,
                   c.title, c.description, c.created_at, c.updated_at,
                   u.id, u.email, u.username, u.role
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            JOIN users u ON u.id = c.instructor_id
            WHERE e.student_id = $1
            ORDER BY e.enrolled_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(enrollment_join_from_tuple).collect()
    }
}
