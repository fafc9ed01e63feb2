//! # opencourse-auth
//!
//! Authentication and authorization for the OpenCourse server.
//!
//! This crate provides:
//!
//! - Password hashing and the registration strength policy
//! - Credential verification with enumeration-safe failure
//! - Stateless JWT token pairs (access + refresh) and their validation
//! - The access policy engine: pure allow/deny/filter decisions per role
//! - An axum extractor that resolves a bearer token to the acting user
//!
//! ## Modules
//!
//! - [`password`] - argon2 hashing, verification, strength policy
//! - [`token`] - JWT encoding/decoding and the token service
//! - [`policy`] - pure authorization decisions, no I/O
//! - [`extract`] - bearer-token axum extractor and the `UserStore` trait

pub mod error;
pub mod extract;
pub mod password;
pub mod policy;
pub mod token;

pub use error::AuthError;
pub use extract::{AuthState, CurrentUser, UserStore};
pub use password::{PasswordPolicyError, hash_password, validate_strength, verify_login};
pub use policy::{
    ChapterAction, ChapterListFilter, CourseAction, CourseListFilter, EnrollmentListFilter,
    GlobalChapterFilter, PolicyDenial,
};
pub use token::{JwtError, TokenClaims, TokenPair, TokenService, TokenUse};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;
