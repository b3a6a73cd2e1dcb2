//! Password hashing.
//!
//! Argon2id with default parameters and a random salt per hash, stored in
//! PHC string format.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use accounts_core::HashedPassword;

use crate::error::AccountError;

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AccountError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<HashedPassword, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| HashedPassword::new(hash.to_string()))
        .map_err(|_| AccountError::PasswordHash)
}

/// Hash checked when there is no stored hash to check against, so a lookup
/// miss costs the same Argon2 work as a wrong password.
static DUMMY_HASH: LazyLock<Option<HashedPassword>> =
    LazyLock::new(|| hash_password("no account has this password").ok());

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AccountError::InvalidCredentials` if the password does not match
/// or the stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &HashedPassword) -> Result<(), AccountError> {
    let parsed_hash =
        PasswordHash::new(hash.as_str()).map_err(|_| AccountError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AccountError::InvalidCredentials)
}

/// Run a full verification against a throwaway hash and discard the result.
pub fn verify_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_ref() {
        let _ = verify_password(password, hash);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_not_plaintext() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(!hash.as_str().contains("s3cret-pass"));
        assert!(hash.as_str().starts_with("$argon2id$"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(verify_password("s3cret-pass", &hash).is_ok());
        assert!(matches!(
            verify_password("S3cret-pass", &hash),
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_garbage_hash() {
        let hash = HashedPassword::new("not-a-phc-string".to_owned());
        assert!(matches!(
            verify_password("anything", &hash),
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_dummy_hash_is_argon2() {
        let hash = DUMMY_HASH.as_ref().unwrap();
        assert!(hash.as_str().starts_with("$argon2id$"));
        assert!(verify_password("anything", hash).is_err());
        verify_dummy("anything");
    }
}
