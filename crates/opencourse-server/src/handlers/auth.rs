//! Registration, login, and token refresh.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use opencourse_auth::{hash_password, validate_strength, verify_login};
use opencourse_core::{Role, User};

use crate::error::{ApiError, ApiResult};
use crate::handlers::dto::{
    AccessResponse, LoginRequest, RefreshRequest, RegisterRequest, SessionResponse,
};
use crate::handlers::validate::{FieldErrors, check_email, require_text};
use crate::state::AppState;

/// POST /register
///
/// Creates a user and signs them in. Role defaults to student. All field
/// problems come back together as a field-keyed 400.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut errors = FieldErrors::new();

    let email = require_text(&mut errors, "email", req.email);
    if let Some(ref email) = email {
        check_email(&mut errors, "email", email);
    }
    let username = require_text(&mut errors, "username", req.username);
    let password = require_text(&mut errors, "password", req.password);
    let password2 = require_text(&mut errors, "password2", req.password2);

    let role = match req.role {
        None => Role::Student,
        Some(ref s) => s.parse().unwrap_or_else(|_| {
            errors.insert("role".to_string(), format!("\"{s}\" is not a valid choice."));
            Role::Student
        }),
    };

    if let (Some(password), Some(password2)) = (&password, &password2) {
        if password != password2 {
            errors.insert(
                "password".to_string(),
                "Password fields didn't match.".to_string(),
            );
        } else if let Err(policy_err) = validate_strength(password) {
            errors.insert("password".to_string(), policy_err.to_string());
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation { errors });
    }

    // All required fields are present past this point.
    let (email, username, password) = match (email, username, password) {
        (Some(e), Some(u), Some(p)) => (e, u, p),
        _ => return Err(ApiError::internal("validated fields missing")),
    };

    let password_hash =
        hash_password(&password).map_err(|e| ApiError::internal(format!("hashing failed: {e}")))?;
    let user = User::new(email, username, password_hash, role);

    if let Err(e) = state.db.users().create(&user).await {
        if e.is_conflict() {
            return Err(ApiError::validation(
                "email",
                "A user with this email already exists.",
            ));
        }
        return Err(e.into());
    }

    tracing::info!(user_id = %user.id, role = %user.role, "user registered");

    let pair = state
        .tokens
        .issue_pair(&user)
        .map_err(|e| ApiError::internal(format!("token issuance failed: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::new(user.profile(), pair)),
    ))
}

/// POST /login
///
/// Exchanges credentials for a token pair. Unknown email, inactive account,
/// and wrong password are indistinguishable in the response.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let candidate = state.db.users().find_by_email(&email).await?;
    let user = verify_login(candidate.as_ref(), &password)?;

    let pair = state
        .tokens
        .issue_pair(user)
        .map_err(|e| ApiError::internal(format!("token issuance failed: {e}")))?;

    tracing::debug!(user_id = %user.id, "login succeeded");

    Ok(Json(SessionResponse::new(user.profile(), pair)))
}

/// POST /token/refresh
///
/// Exchanges a refresh token for a new access token.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let Some(token) = req.refresh else {
        return Err(ApiError::validation("refresh", "This field is required."));
    };

    let access = state.tokens.refresh_access(&token)?;

    Ok(Json(AccessResponse { access }))
}
