//! Booth password hashing.
//!
//! Hashes are Argon2id PHC strings with a random salt. Verification only ever looks at
//! the stored hash.

use crate::errors::{Error, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hashes a plaintext password into a PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Credential {
            message: format!("Failed to hash password: {e}"),
        })
}

/// Checks a plaintext password against a stored PHC string.
///
/// A wrong password is `Ok(false)`; only a malformed stored hash is an error.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash).map_err(|e| Error::Credential {
        message: format!("Stored password hash is malformed: {e}"),
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("pumpkin").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("pumpkin", &hash).unwrap());
        assert!(!verify_password("squash", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let first = hash_password("pumpkin").unwrap();
        let second = hash_password("pumpkin").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_is_error() {
        let result = verify_password("pumpkin", "pumpkin");
        assert!(matches!(result, Err(Error::Credential { .. })));
    }
}
