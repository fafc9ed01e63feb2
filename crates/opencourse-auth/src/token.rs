//! JWT token generation and validation.
//!
//! Tokens are stateless HS256-signed credentials: nothing is persisted
//! server-side and there is no revocation list. A token pair consists of a
//! short-lived access token and a longer-lived refresh token, told apart by
//! the `token_use` claim so a refresh token can never authenticate a request
//! directly.
//!
//! ## Example
//!
//! ```ignore
//! use opencourse_auth::token::{TokenService, TokenUse};
//!
//! let service = TokenService::new("secret", "https://lms.example.com");
//! let pair = service.issue_pair(&user)?;
//! let claims = service.decode(&pair.access, TokenUse::Access)?;
//! ```

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use opencourse_core::{Role, User};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    Encoding {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    Decoding {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid (wrong issuer, missing claim, ...).
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why claims are invalid.
        message: String,
    },

    /// A token of one kind was presented where the other was required.
    #[error("Wrong token kind: expected {expected} token, got {actual} token")]
    WrongUse {
        /// The kind the operation required.
        expected: TokenUse,
        /// The kind actually presented.
        actual: TokenUse,
    },
}

impl JwtError {
    /// Creates a new `Encoding` error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Creates a new `Decoding` error.
    #[must_use]
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a validation failure rather than an
    /// encoding problem.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Expired | Self::InvalidSignature | Self::InvalidClaims { .. } | Self::WrongUse { .. }
        )
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::InvalidAudience
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            _ => Self::decoding(err.to_string()),
        }
    }
}

// ============================================================================
// Claims
// ============================================================================

/// The kind of token a set of claims belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    /// Short-lived token that authenticates API requests.
    Access,
    /// Longer-lived token exchanged for fresh access tokens.
    Refresh,
}

impl fmt::Display for TokenUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Issuer (server URL).
    pub iss: String,

    /// Subject: the user's UUID.
    pub sub: Uuid,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Unique token identifier.
    pub jti: String,

    /// Whether this is an access or a refresh token.
    pub token_use: TokenUse,

    /// The subject's role at issue time.
    pub role: Role,

    /// The subject's email, carried on access tokens for log context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// An access/refresh token pair returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// The access token.
    pub access: String,
    /// The refresh token.
    pub refresh: String,
}

// ============================================================================
// Token Service
// ============================================================================

/// Service for issuing and validating token pairs.
///
/// Thread-safe (`Send + Sync`); share it behind an `Arc`.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenService {
    /// Default access token lifetime.
    pub const DEFAULT_ACCESS_LIFETIME: Duration = Duration::minutes(30);

    /// Default refresh token lifetime.
    pub const DEFAULT_REFRESH_LIFETIME: Duration = Duration::days(7);

    /// Creates a new token service with default lifetimes.
    #[must_use]
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            access_lifetime: Self::DEFAULT_ACCESS_LIFETIME,
            refresh_lifetime: Self::DEFAULT_REFRESH_LIFETIME,
        }
    }

    /// Sets the access token lifetime.
    #[must_use]
    pub fn with_access_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_lifetime = lifetime;
        self
    }

    /// Sets the refresh token lifetime.
    #[must_use]
    pub fn with_refresh_lifetime(mut self, lifetime: Duration) -> Self {
        self.refresh_lifetime = lifetime;
        self
    }

    /// Returns the issuer URL.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issues an access/refresh pair for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, JwtError> {
        let access = self.encode(self.claims_for(user, TokenUse::Access, self.access_lifetime))?;
        let refresh = self.encode(self.claims_for(user, TokenUse::Refresh, self.refresh_lifetime))?;
        Ok(TokenPair { access, refresh })
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Fails if the refresh token is expired, malformed, mis-signed, or is
    /// actually an access token.
    pub fn refresh_access(&self, refresh_token: &str) -> Result<String, JwtError> {
        let claims = self.decode(refresh_token, TokenUse::Refresh)?;

        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.encode(TokenClaims {
            iss: self.issuer.clone(),
            sub: claims.sub,
            exp: now + self.access_lifetime.whole_seconds(),
            iat: now,
            jti: Uuid::new_v4().to_string(),
            token_use: TokenUse::Access,
            role: claims.role,
            email: claims.email,
        })
    }

    /// Decodes and validates a token, requiring the given kind.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding or validation fails, or if the token is
    /// of the other kind.
    pub fn decode(&self, token: &str, expected: TokenUse) -> Result<TokenClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = true;
        validation.validate_aud = false; // No audience claim in these tokens
        // Expiry is exact; no clock-skew allowance.
        validation.leeway = 0;

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;
        let claims = data.claims;

        if claims.token_use != expected {
            return Err(JwtError::WrongUse {
                expected,
                actual: claims.token_use,
            });
        }

        Ok(claims)
    }

    fn claims_for(&self, user: &User, token_use: TokenUse, lifetime: Duration) -> TokenClaims {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        TokenClaims {
            iss: self.issuer.clone(),
            sub: user.id,
            exp: now + lifetime.whole_seconds(),
            iat: now,
            jti: Uuid::new_v4().to_string(),
            token_use,
            role: user.role,
            email: Some(user.email.clone()),
        }
    }

    fn encode(&self, claims: TokenClaims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::encoding(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User::new("ada@example.com", "ada", "hash", Role::Instructor)
    }

    fn service() -> TokenService {
        TokenService::new("test-secret", "https://lms.example.com")
    }

    #[test]
    fn test_issue_and_decode_pair() {
        let service = service();
        let user = test_user();

        let pair = service.issue_pair(&user).unwrap();

        let access = service.decode(&pair.access, TokenUse::Access).unwrap();
        assert_eq!(access.sub, user.id);
        assert_eq!(access.role, Role::Instructor);
        assert_eq!(access.email.as_deref(), Some("ada@example.com"));
        assert_eq!(access.iss, "https://lms.example.com");

        let refresh = service.decode(&pair.refresh, TokenUse::Refresh).unwrap();
        assert_eq!(refresh.sub, user.id);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let service = service();
        let pair = service.issue_pair(&test_user()).unwrap();

        let err = service.decode(&pair.refresh, TokenUse::Access).unwrap_err();
        assert!(matches!(
            err,
            JwtError::WrongUse {
                expected: TokenUse::Access,
                actual: TokenUse::Refresh,
            }
        ));
    }

    #[test]
    fn test_refresh_flow_issues_new_access() {
        let service = service();
        let user = test_user();
        let pair = service.issue_pair(&user).unwrap();

        let access = service.refresh_access(&pair.refresh).unwrap();
        let claims = service.decode(&access, TokenUse::Access).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Instructor);
    }

    #[test]
    fn test_access_token_cannot_refresh() {
        let service = service();
        let pair = service.issue_pair(&test_user()).unwrap();

        let err = service.refresh_access(&pair.access).unwrap_err();
        assert!(matches!(err, JwtError::WrongUse { .. }));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = service().with_access_lifetime(Duration::seconds(-10));
        let pair = service.issue_pair(&test_user()).unwrap();

        let err = service.decode(&pair.access, TokenUse::Access).unwrap_err();
        assert!(matches!(err, JwtError::Expired));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuing = service();
        let verifying = TokenService::new("other-secret", "https://lms.example.com");
        let pair = issuing.issue_pair(&test_user()).unwrap();

        let err = verifying.decode(&pair.access, TokenUse::Access).unwrap_err();
        assert!(matches!(err, JwtError::InvalidSignature));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let issuing = TokenService::new("test-secret", "https://other.example.com");
        let verifying = service();
        let pair = issuing.issue_pair(&test_user()).unwrap();

        let err = verifying.decode(&pair.access, TokenUse::Access).unwrap_err();
        assert!(matches!(err, JwtError::InvalidClaims { .. }));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = service();
        let pair = service.issue_pair(&test_user()).unwrap();

        let mut tampered = pair.access.clone();
        tampered.pop();
        assert!(service.decode(&tampered, TokenUse::Access).is_err());
    }

    #[test]
    fn test_jti_unique_per_token() {
        let service = service();
        let user = test_user();
        let a = service.issue_pair(&user).unwrap();
        let b = service.issue_pair(&user).unwrap();

        let ja = service.decode(&a.access, TokenUse::Access).unwrap().jti;
        let jb = service.decode(&b.access, TokenUse::Access).unwrap().jti;
        assert_ne!(ja, jb);
    }
}
