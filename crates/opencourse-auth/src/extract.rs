//! Bearer token authentication extractor.
//!
//! Resolves `Authorization: Bearer <token>` to the acting [`User`]. The
//! token must be an access token (refresh tokens are rejected here), the
//! user row must still exist, and the account must be active.
//!
//! # Example
//!
//! ```ignore
//! use opencourse_auth::{AuthState, CurrentUser};
//!
//! async fn handler(CurrentUser(user): CurrentUser) -> String {
//!     format!("Hello, {}!", user.username)
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use opencourse_core::User;

use crate::error::AuthError;
use crate::token::{TokenService, TokenUse};

/// Read access to user accounts, implemented by the storage backend.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by id. Returns `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;
}

/// State required for bearer token authentication.
///
/// Include this in the application state and expose it to the extractor via
/// `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// Token service for access-token validation.
    pub tokens: Arc<TokenService>,

    /// User store for loading the acting user.
    pub users: Arc<dyn UserStore>,
}

impl AuthState {
    /// Creates a new auth state.
    #[must_use]
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }
}

/// Axum extractor carrying the authenticated acting user.
///
/// Handlers take the identity as an explicit argument; there is no ambient
/// request context to read it from.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| AuthError::unauthorized("Missing Authorization header"))?;

        let claims = auth_state
            .tokens
            .decode(token, TokenUse::Access)
            .map_err(|e| {
                tracing::debug!(error = %e, "failed to validate access token");
                AuthError::from(e)
            })?;

        let user = auth_state
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| {
                tracing::warn!(subject = %claims.sub, "token subject no longer exists");
                AuthError::invalid_token("Unknown user")
            })?;

        if !user.is_active {
            tracing::debug!(user_id = %user.id, "inactive user presented a valid token");
            return Err(AuthError::invalid_token("User is inactive"));
        }

        Ok(CurrentUser(user))
    }
}

/// Extracts the token from an `Authorization` header value.
fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("abc.def.ghi"), None);
    }
}
