//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::token::JwtError;

/// Errors that can occur while authenticating a request or a login attempt.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The email/password pair did not check out. Unknown email, inactive
    /// account, and wrong password all collapse into this variant so the
    /// caller cannot enumerate accounts.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The request lacks usable authentication credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of what is missing.
        message: String,
    },

    /// The bearer token is malformed, mis-signed, or of the wrong kind.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// An error occurred while loading auth data from storage.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (401 category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::Unauthorized { .. }
                | Self::InvalidToken { .. }
                | Self::TokenExpired
        )
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => Self::TokenExpired,
            other => Self::invalid_token(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage/internal details stay in the logs, not in the response.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "authentication failed with server error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_message() {
        // The body must not distinguish unknown email from wrong password.
        assert_eq!(AuthError::InvalidCredentials.to_string(), "Invalid credentials");
    }

    #[test]
    fn test_client_errors_map_to_401() {
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::unauthorized("Missing Authorization header").status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_storage_maps_to_500() {
        let err = AuthError::storage("connection refused");
        assert!(!err.is_client_error());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_jwt_expiry_conversion() {
        let err = AuthError::from(JwtError::Expired);
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn test_response_body_shape() {
        let response = AuthError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_server_error_body_is_opaque() {
        let response = AuthError::storage("password=hunter2 leaked").into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }
}
