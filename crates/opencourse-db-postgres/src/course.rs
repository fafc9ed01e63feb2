//! Course storage.
//!
//! Courses are listed newest-first and always carry the owning instructor's
//! public profile, which the API embeds in every course payload.

use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use opencourse_core::{Course, UserProfile};

use crate::user::profile_from_tuple;
use crate::{PgPool, StorageResult};

// =============================================================================
// Row Mapping
// =============================================================================

type CourseTuple = (Uuid, String, String, Uuid, OffsetDateTime, OffsetDateTime);

fn course_from_tuple(row: CourseTuple) -> Course {
    let (id, title, description, instructor_id, created_at, updated_at) = row;
    Course {
        id,
        title,
        description,
        instructor_id,
        created_at,
        updated_at,
    }
}

type CourseJoinTuple = (
    Uuid,
    String,
    String,
    Uuid,
    OffsetDateTime,
    OffsetDateTime,
    Uuid,
    String,
    String,
    String,
);

fn course_join_from_tuple(row: CourseJoinTuple) -> StorageResult<(Course, UserProfile)> {
    let (id, title, description, instructor_id, created_at, updated_at, uid, email, username, role) =
        row;
    let course = course_from_tuple((id, title, description, instructor_id, created_at, updated_at));
    let instructor = profile_from_tuple((uid, email, username, role))?;
    Ok((course, instructor))
}

// =============================================================================
// Course Storage
// =============================================================================

/// Course storage operations.
pub struct CourseStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> CourseStorage<'a> {
    /// Create a new course storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a course by id, with its instructor's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<(Course, UserProfile)>> {
        let row: Option<CourseJoinTuple> = query_as(
            r#"
            SELECT c.id, c.title, c.description, c.instructor_id, c.created_at, c.updated_at,
                   u.id, u.email, u.username, u.role
            FROM courses c
            JOIN users u ON u.id = c.instructor_id
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(course_join_from_tuple).transpose()
    }

    /// List the whole catalog, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_all(&self) -> StorageResult<Vec<(Course, UserProfile)>> {
        let rows: Vec<CourseJoinTuple> = query_as(
            r#"
            SELECT c.id, c.title, c.description, c.instructor_id, c.created_at, c.updated_at,
                   u.id, u.email, u.username, u.role
            FROM courses c
            JOIN users u ON u.id = c.instructor_id
            ORDER BY c.created_at DESC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(course_join_from_tuple).collect()
    }

    /// List courses owned by one instructor, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_instructor(
        &self,
        instructor_id: Uuid,
    ) -> StorageResult<Vec<(Course, UserProfile)>> {
        let rows: Vec<CourseJoinTuple> = query_as(
            r#"
            SELECT c.id, c.title, c.description, c.instructor_id, c.created_at, c.updated_at,
                   u.id, u.email, u.username, u.role
            FROM courses c
            JOIN users u ON u.id = c.instructor_id
            WHERE c.instructor_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(instructor_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(course_join_from_tuple).collect()
    }

    /// Create a new course.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        instructor_id: Uuid,
        title: &str,
        description: &str,
    ) -> StorageResult<Course> {
        let row: CourseTuple = query_as(
            r#"
            INSERT INTO courses (id, title, description, instructor_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, instructor_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(description)
        .bind(instructor_id)
        .fetch_one(self.pool)
        .await?;

        Ok(course_from_tuple(row))
    }

    /// Update a course. `None` fields keep their current value.
    ///
    /// Returns `None` if the course doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update(
        &self,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
    ) -> StorageResult<Option<Course>> {
        let row: Option<CourseTuple> = query_as(
            r#"
            UPDATE courses
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, instructor_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(course_from_tuple))
    }

    /// Delete a course. Chapters and enrollments go with it by cascade.
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let result = query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
