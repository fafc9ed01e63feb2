//! PostgreSQL storage backend for OpenCourse.
//!
//! Provides persistent storage for:
//!
//! - Users (accounts with role and active flag)
//! - Courses (owned by an instructor)
//! - Chapters (content, visibility, ordering)
//! - Enrollments (unique student/course pairs)
//!
//! The schema lives in embedded migrations run at startup; see
//! [`migrations`]. All queries go through a shared connection pool.
//!
//! # Example
//!
//! ```ignore
//! use opencourse_db_postgres::PostgresStorage;
//!
//! let storage = PostgresStorage::connect(&config).await?;
//! let user = storage.users().find_by_email("ada@example.com").await?;
//! ```

pub mod adapter;
pub mod chapter;
pub mod config;
pub mod course;
pub mod enrollment;
pub mod migrations;
pub mod pool;
pub mod user;

use std::sync::Arc;

use sqlx_core::pool::Pool;
use sqlx_postgres::Postgres;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

pub use chapter::ChapterStorage;
pub use config::PostgresConfig;
pub use course::CourseStorage;
pub use enrollment::{EnrollmentStorage, JoinOutcome};
pub use user::UserStorage;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),

    /// Requested row was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row already exists (unique constraint violation).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored value could not be mapped back into a domain type.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),
}

impl StorageError {
    /// Create a `NotFound` error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create a `CorruptRow` error.
    #[must_use]
    pub fn corrupt_row(message: impl Into<String>) -> Self {
        Self::CorruptRow(message.into())
    }

    /// Returns `true` if this is a `NotFound` error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` if this is a `Conflict` error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns `true` if this is a client error (4xx equivalent).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Conflict(_))
    }

    /// Returns `true` if this is a server error (5xx equivalent).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// PostgreSQL Storage
// =============================================================================

/// PostgreSQL storage backend.
///
/// Holds the connection pool and hands out per-entity storage types.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    /// Create new storage with an existing connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create new storage by connecting with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(config: &PostgresConfig) -> StorageResult<Self> {
        let pool = pool::create_pool(config).await?;
        Ok(Self::new(Arc::new(pool)))
    }

    /// Create new storage whose connections are established on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection URL cannot be parsed.
    pub fn connect_lazy(config: &PostgresConfig) -> StorageResult<Self> {
        let pool = pool::create_pool_lazy(config)?;
        Ok(Self::new(Arc::new(pool)))
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails to execute.
    pub async fn migrate(&self) -> StorageResult<()> {
        migrations::run(&self.pool).await
    }

    /// Checks database connectivity with a trivial query.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn ping(&self) -> StorageResult<()> {
        sqlx_core::query::query("SELECT 1").execute(&*self.pool).await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Storage Accessors
    // -------------------------------------------------------------------------

    /// Get user storage operations.
    #[must_use]
    pub fn users(&self) -> UserStorage<'_> {
        UserStorage::new(&self.pool)
    }

    /// Get course storage operations.
    #[must_use]
    pub fn courses(&self) -> CourseStorage<'_> {
        CourseStorage::new(&self.pool)
    }

    /// Get chapter storage operations.
    #[must_use]
    pub fn chapters(&self) -> ChapterStorage<'_> {
        ChapterStorage::new(&self.pool)
    }

    /// Get enrollment storage operations.
    #[must_use]
    pub fn enrollments(&self) -> EnrollmentStorage<'_> {
        EnrollmentStorage::new(&self.pool)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_not_found() {
        let err = StorageError::not_found("Course abc123");
        assert!(err.is_not_found());
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert_eq!(err.to_string(), "Not found: Course abc123");
    }

    #[test]
    fn test_storage_error_conflict() {
        let err = StorageError::conflict("email already registered");
        assert!(err.is_conflict());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_storage_error_corrupt_row_is_server_error() {
        let err = StorageError::corrupt_row("unknown role: admin");
        assert!(!err.is_client_error());
        assert!(err.is_server_error());
    }
}
