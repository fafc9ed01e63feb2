//! Chapter storage.
//!
//! All listings come back in display order: `"position"` ascending, ties
//! broken by creation time.

use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use opencourse_core::{Chapter, Course, Visibility};

use crate::{PgPool, StorageError, StorageResult};

// =============================================================================
// Row Mapping
// =============================================================================

type ChapterTuple = (
    Uuid,
    Uuid,
    String,
    serde_json::Value,
    String,
    i32,
    OffsetDateTime,
    OffsetDateTime,
);

fn chapter_from_tuple(row: ChapterTuple) -> StorageResult<Chapter> {
    let (id, course_id, title, content, visibility, position, created_at, updated_at) = row;
    let visibility = visibility
        .parse()
        .map_err(|e| StorageError::corrupt_row(format!("chapter {id}: {e}")))?;
    Ok(Chapter {
        id,
        course_id,
        title,
        content,
        visibility,
        position,
        created_at,
        updated_at,
    })
}

/// Chapter plus its parent course's title, for list payloads.
type ChapterTitleTuple = (
    Uuid,
    Uuid,
    String,
    serde_json::Value,
    String,
    i32,
    OffsetDateTime,
    OffsetDateTime,
    String,
);

fn chapter_title_from_tuple(row: ChapterTitleTuple) -> StorageResult<(Chapter, String)> {
    let (id, course_id, title, content, visibility, position, created_at, updated_at, course_title) =
        row;
    let chapter = chapter_from_tuple((
        id, course_id, title, content, visibility, position, created_at, updated_at,
    ))?;
    Ok((chapter, course_title))
}

// =============================================================================
// Chapter Storage
// =============================================================================

/// Chapter storage operations.
pub struct ChapterStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> ChapterStorage<'a> {
    /// Create a new chapter storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a chapter by id, together with its parent course.
    ///
    /// The parent is what authorization decisions key on, so every point
    /// lookup resolves both in one round trip.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<(Chapter, Course)>> {
        type Row = (
            Uuid,
            Uuid,
            String,
            serde_json::Value,
            String,
            i32,
            OffsetDateTime,
            OffsetDateTime,
            Uuid,
            String,
            String,
            Uuid,
            OffsetDateTime,
            OffsetDateTime,
        );

        let row: Option<Row> = query_as(
            r#"
            SELECT ch.id, ch.course_id, ch.title, ch.content, ch.visibility, ch."position",
                   ch.created_at, ch.updated_at,
                   c.id, c.title, c.description, c.instructor_id, c.created_at, c.updated_at
            FROM chapters ch
            JOIN courses c ON c.id = ch.course_id
            WHERE ch.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| {
            let chapter = chapter_from_tuple((r.0, r.1, r.2, r.3, r.4, r.5, r.6, r.7))?;
            let course = Course {
                id: r.8,
                title: r.9,
                description: r.10,
                instructor_id: r.11,
                created_at: r.12,
                updated_at: r.13,
            };
            Ok((chapter, course))
        })
        .transpose()
    }

    /// List the chapters of one course in display order, optionally only the
    /// public ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_course(
        &self,
        course_id: Uuid,
        only_public: bool,
    ) -> StorageResult<Vec<Chapter>> {
        let rows: Vec<ChapterTuple> = query_as(
            r#"
            SELECT id, course_id, title, content, visibility, "position", created_at, updated_at
            FROM chapters
            WHERE course_id = $1
              AND ($2 = FALSE OR visibility = 'public')
            ORDER BY "position", created_at
            "#,
        )
        .bind(course_id)
        .bind(only_public)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(chapter_from_tuple).collect()
    }

    /// List every chapter of every course an instructor owns.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_owned_by(
        &self,
        instructor_id: Uuid,
    ) -> StorageResult<Vec<(Chapter, String)>> {
        let rows: Vec<ChapterTitleTuple> = query_as(
            r#"
            SELECT ch.id, ch.course_id, ch.title, ch.content, ch.visibility, ch."position",
                   ch.created_at, ch.updated_at, c.title
            FROM chapters ch
            JOIN courses c ON c.id = ch.course_id
            WHERE c.instructor_id = $1
            ORDER BY ch."position", ch.created_at
            "#,
        )
        .bind(instructor_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(chapter_title_from_tuple).collect()
    }

    /// List the public chapters of every course a student is enrolled in.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_enrolled_public(
        &self,
        student_id: Uuid,
    ) -> StorageResult<Vec<(Chapter, String)>> {
        let rows: Vec<ChapterTitleTuple> = query_as(
            r#"
            SELECT ch.id, ch.course_id, ch.title, ch.content, ch.visibility, ch."position",
                   ch.created_at, ch.updated_at, c.title
            FROM chapters ch
            JOIN courses c ON c.id = ch.course_id
            JOIN enrollments e ON e.course_id = ch.course_id
            WHERE e.student_id = $1
              AND ch.visibility = 'public'
            ORDER BY ch."position", ch.created_at
            "#,
        )
        .bind(student_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(chapter_title_from_tuple).collect()
    }

    /// Create a new chapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        course_id: Uuid,
        title: &str,
        content: &serde_json::Value,
        visibility: Visibility,
        position: i32,
    ) -> StorageResult<Chapter> {
        let row: ChapterTuple = query_as(
            r#"
            INSERT INTO chapters (id, course_id, title, content, visibility, "position")
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, course_id, title, content, visibility, "position", created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(title)
        .bind(content)
        .bind(visibility.as_str())
        .bind(position)
        .fetch_one(self.pool)
        .await?;

        chapter_from_tuple(row)
    }

    /// Update a chapter. `None` fields keep their current value.
    ///
    /// Returns `None` if the chapter doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update(
        &self,
        id: Uuid,
        title: Option<&str>,
        content: Option<&serde_json::Value>,
        visibility: Option<Visibility>,
        position: Option<i32>,
    ) -> StorageResult<Option<Chapter>> {
        let row: Option<ChapterTuple> = query_as(
            r#"
            UPDATE chapters
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                visibility = COALESCE($4, visibility),
                "position" = COALESCE($5, "position"),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, course_id, title, content, visibility, "position", created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .bind(visibility.map(|v| v.as_str()))
        .bind(position)
        .fetch_optional(self.pool)
        .await?;

        row.map(chapter_from_tuple).transpose()
    }

    /// Delete a chapter.
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let result = query("DELETE FROM chapters WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
