//! One-way credential hashing.
//!
//! Passwords are stored as argon2 PHC strings. Plaintext only ever lives in
//! the request that carried it.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Prefix shared by every argon2 PHC string.
const ARGON2_PREFIX: &str = "$argon2";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing error: {0}")]
    Hash(String),
}

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

/// Verify a plaintext password against a stored hash.
///
/// Returns `false` for a malformed hash rather than erroring: a record we
/// cannot parse can never authenticate anyone.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Check whether a stored secret is already an argon2 hash.
pub fn is_hashed(secret: &str) -> bool {
    secret.starts_with(ARGON2_PREFIX)
}
