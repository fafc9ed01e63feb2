//! User storage.

use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use opencourse_core::{User, UserProfile};

use crate::{PgPool, StorageError, StorageResult};

// =============================================================================
// Row Mapping
// =============================================================================

/// Full user row as selected from the `users` table.
pub(crate) type UserTuple = (
    Uuid,
    String,
    String,
    String,
    String,
    bool,
    OffsetDateTime,
    OffsetDateTime,
);

pub(crate) fn user_from_tuple(row: UserTuple) -> StorageResult<User> {
    let (id, email, username, password_hash, role, is_active, created_at, updated_at) = row;
    let role = role
        .parse()
        .map_err(|e| StorageError::corrupt_row(format!("user {id}: {e}")))?;
    Ok(User {
        id,
        email,
        username,
        password_hash,
        role,
        is_active,
        created_at,
        updated_at,
    })
}

/// Public profile columns, used when embedding a user into another row.
pub(crate) type ProfileTuple = (Uuid, String, String, String);

pub(crate) fn profile_from_tuple(row: ProfileTuple) -> StorageResult<UserProfile> {
    let (id, email, username, role) = row;
    let role = role
        .parse()
        .map_err(|e| StorageError::corrupt_row(format!("user {id}: {e}")))?;
    Ok(UserProfile {
        id,
        email,
        username,
        role,
    })
}

// =============================================================================
// User Storage
// =============================================================================

/// User storage operations.
pub struct UserStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> UserStorage<'a> {
    /// Create a new user storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        let row: Option<UserTuple> = query_as(
            r#"
            SELECT id, email, username, password_hash, role, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(user_from_tuple).transpose()
    }

    /// Find a user by email.
    ///
    /// Matching is exact on the stored string: no case folding, no trimming.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let row: Option<UserTuple> = query_as(
            r#"
            SELECT id, email, username, password_hash, role, is_active, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(user_from_tuple).transpose()
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the email is already registered, or an error if
    /// the insert fails.
    pub async fn create(&self, user: &User) -> StorageResult<()> {
        query(
            r#"
            INSERT INTO users (id, email, username, password_hash, role, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx_core::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StorageError::conflict(format!(
                    "user with email '{}' already exists",
                    user.email
                ));
            }
            StorageError::from(e)
        })?;

        Ok(())
    }
}
