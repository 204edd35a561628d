//! Password hashing. Digests are Argon2id PHC strings with a random salt.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use tracing::{error, warn};

use crate::error::{Result, StoreError};

pub fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash secret: {}", e);
            StoreError::Credential(e.to_string())
        })
}

/// A malformed digest never verifies.
pub fn verify_secret(secret: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored digest could not be parsed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let digest = hash_secret("123456").unwrap();
        assert!(digest.starts_with("$argon2id$"));
        assert!(verify_secret("123456", &digest));
        assert!(!verify_secret("654321", &digest));
    }

    #[test]
    fn test_same_secret_gets_different_salts() {
        let a = hash_secret("secret").unwrap();
        let b = hash_secret("secret").unwrap();
        assert_ne!(a, b);
        assert!(verify_secret("secret", &a));
        assert!(verify_secret("secret", &b));
    }

    #[test]
    fn test_malformed_digest_is_rejected() {
        assert!(!verify_secret("secret", "plaintext"));
        assert!(!verify_secret("secret", ""));
    }
}
