//! Password hashing, verification, and the registration strength policy.
//!
//! Hashing uses Argon2id with per-password random salts (OsRng). Login
//! verification is enumeration-safe: when the email is unknown or the
//! account inactive, a hash verification still runs so the failure path
//! costs the same as a wrong password.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::OnceLock;

use opencourse_core::User;

use crate::error::AuthError;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password for storage using Argon2id.
///
/// Returns a PHC-formatted hash string suitable for the `password_hash`
/// column.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash.
///
/// Returns `Ok(true)` if the password matches, `Ok(false)` if it doesn't.
/// Returns `Err` only if the stored hash is not parseable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

/// A hash no real password produced, used to equalize the cost of failed
/// lookups.
fn decoy_hash() -> &'static str {
    static DECOY: OnceLock<String> = OnceLock::new();
    DECOY.get_or_init(|| {
        hash_password("decoy-password-for-timing").expect("argon2 hashing cannot fail on static input")
    })
}

/// Verify a login attempt.
///
/// Takes the result of the email lookup; `None` means the email is unknown.
/// All failure modes return [`AuthError::InvalidCredentials`] so the caller
/// cannot tell an unknown email, an inactive account, and a wrong password
/// apart, and each runs exactly one argon2 verification.
///
/// # Errors
///
/// `InvalidCredentials` on any mismatch; `Internal` if the stored hash is
/// corrupt.
pub fn verify_login<'a>(candidate: Option<&'a User>, password: &str) -> Result<&'a User, AuthError> {
    let Some(user) = candidate else {
        let _ = verify_password(password, decoy_hash());
        return Err(AuthError::InvalidCredentials);
    };

    let matches = verify_password(password, &user.password_hash)
        .map_err(|e| AuthError::internal(format!("stored password hash unreadable: {e}")))?;

    if !matches || !user.is_active {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user)
}

/// Errors from the password strength policy.
///
/// Messages mirror the validator chain the registration flow delegates to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordPolicyError {
    /// The password is shorter than [`MIN_PASSWORD_LEN`].
    #[error("This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters.")]
    TooShort,

    /// The password contains only digits.
    #[error("This password is entirely numeric.")]
    EntirelyNumeric,
}

/// Check a new password against the strength policy.
///
/// # Errors
///
/// Returns the first policy violation found.
pub fn validate_strength(password: &str) -> Result<(), PasswordPolicyError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordPolicyError::TooShort);
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(PasswordPolicyError::EntirelyNumeric);
    }
    Ok(())
}
