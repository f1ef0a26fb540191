//! Operator password policy, hashing and verification.
//!
//! Hashes are Argon2id with a per-hash random salt.

use crate::error::OpsError;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Shortest password accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Registration policy: at least [`MIN_PASSWORD_LEN`] characters, not
/// blank, and not the account's own email address.
pub fn check_new_password(password: &str, email: &str) -> Result<(), OpsError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(OpsError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password.trim().is_empty() {
        return Err(OpsError::validation("password cannot be blank"));
    }
    if password.eq_ignore_ascii_case(email) {
        return Err(OpsError::validation("password cannot be the email address"));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// Returns the PHC-formatted hash string suitable for storage.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
