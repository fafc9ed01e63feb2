//! Adapter implementing the auth crate's storage trait.
//!
//! The bearer-token extractor needs to load the acting user without knowing
//! which backend is in play; this bridges it to [`PostgresStorage`].

use async_trait::async_trait;
use uuid::Uuid;

use opencourse_auth::{AuthError, UserStore};
use opencourse_core::User;

use crate::PostgresStorage;

#[async_trait]
impl UserStore for PostgresStorage {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        self.users()
            .find_by_id(id)
            .await
            .map_err(|e| AuthError::storage(e.to_string()))
    }
}
