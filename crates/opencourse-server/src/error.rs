//! Request-level error taxonomy and its HTTP mapping.
//!
//! Every failure a handler can produce collapses into [`ApiError`]:
//! validation (400), authentication (401), permission (403), absence (404),
//! or an uncaught server-side error (500). All are request-local and
//! surfaced directly; there are no retries.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use opencourse_auth::{AuthError, JwtError, PolicyDenial};
use opencourse_db_postgres::StorageError;

/// An error surfaced to the API caller.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Field-keyed validation failure, rendered as `{"field": "message"}`.
    #[error("Validation failed")]
    Validation {
        /// Messages keyed by the offending field.
        errors: BTreeMap<String, String>,
    },

    /// Malformed request that isn't tied to a single field,
    /// rendered as `{"error": "message"}`.
    #[error("{message}")]
    BadRequest {
        /// Description of the problem.
        message: String,
    },

    /// Missing or bad credentials.
    #[error("{message}")]
    Unauthorized {
        /// Description of the problem.
        message: String,
    },

    /// Authenticated, but the role/ownership check failed.
    #[error("{message}")]
    Forbidden {
        /// Description of the denial.
        message: String,
    },

    /// The addressed resource does not exist.
    #[error("{message}")]
    NotFound {
        /// Description of what is missing.
        message: String,
    },

    /// An unexpected server-side failure. The message stays in the logs.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl ApiError {
    /// Creates a validation error for a single field.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.into(), message.into());
        Self::Validation { errors }
    }

    /// Creates a new `BadRequest` error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
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

    /// The HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PolicyDenial> for ApiError {
    fn from(denial: PolicyDenial) -> Self {
        Self::forbidden(denial.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_client_error() {
            Self::unauthorized(err.to_string())
        } else {
            Self::internal(err.to_string())
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        if err.is_validation_error() {
            Self::unauthorized(err.to_string())
        } else {
            // Decoding garbage input is still the caller's fault.
            match err {
                JwtError::Decoding { .. } => Self::unauthorized(err.to_string()),
                other => Self::internal(other.to_string()),
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(message) => Self::NotFound { message },
            StorageError::Conflict(message) => Self::BadRequest { message },
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            Self::Validation { errors } => json!(errors),
            Self::Internal { message } => {
                tracing::error!(error = %message, "request failed with internal error");
                json!({ "error": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_validation_renders_field_keyed() {
        let (status, json) =
            body_json(ApiError::validation("password", "Password fields didn't match.")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["password"], "Password fields didn't match.");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, json) = body_json(ApiError::not_found("Course not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Course not found");
    }

    #[tokio::test]
    async fn test_internal_body_is_opaque() {
        let (status, json) = body_json(ApiError::internal("pool exhausted at 10.0.0.3")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_policy_denial_maps_to_403() {
        let (status, json) =
            body_json(ApiError::from(PolicyDenial::CourseCreateRequiresInstructor)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "Only instructors can create courses");
    }

    #[test]
    fn test_storage_error_mapping() {
        let err = ApiError::from(StorageError::not_found("Course x"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::from(StorageError::conflict("duplicate"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(StorageError::corrupt_row("bad role"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_jwt_error_mapping() {
        assert_eq!(
            ApiError::from(JwtError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(JwtError::decoding("not a jwt")).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
