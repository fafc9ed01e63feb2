//! Shared application state.

use std::sync::Arc;

use axum::extract::FromRef;

use opencourse_auth::{AuthState, TokenService};
use opencourse_db_postgres::PostgresStorage;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend.
    pub db: PostgresStorage,

    /// Token issuing and validation.
    pub tokens: Arc<TokenService>,

    /// State for the bearer-token extractor.
    pub auth: AuthState,
}

impl AppState {
    /// Creates the application state, wiring the storage backend into the
    /// auth extractor.
    #[must_use]
    pub fn new(db: PostgresStorage, tokens: Arc<TokenService>) -> Self {
        let auth = AuthState::new(Arc::clone(&tokens), Arc::new(db.clone()));
        Self { db, tokens, auth }
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
