//! Room password hashing utilities using Argon2id.
//!
//! Rooms may carry an optional 4-digit password. The raw digits are never
//! persisted; only a salted Argon2id hash is stored, and verification is
//! constant-time.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Error type for room password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash room password: {0}")]
    HashError(String),

    #[error("Failed to verify room password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Argon2id parameters following OWASP recommendations (2024).
/// - Memory: 19456 KiB (19 MiB)
/// - Iterations: 2
/// - Parallelism: 1
const MEMORY_COST: u32 = 19456;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;
const OUTPUT_LEN: usize = 32;

fn create_argon2() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST, TIME_COST, PARALLELISM, Some(OUTPUT_LEN))
        .map_err(|e| PasswordError::HashError(format!("Failed to create Argon2 params: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a room password.
///
/// Returns a PHC-formatted string that includes the algorithm, parameters,
/// salt, and hash, so the stored value is self-describing and survives
/// future parameter upgrades.
pub fn hash_room_password(raw: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = create_argon2()?;

    argon2
        .hash_password(raw.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a room password attempt against a stored hash.
///
/// Constant-time with respect to the password bytes.
pub fn verify_room_password(raw: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    // The stored hash carries its own parameters, so defaults suffice here
    let argon2 = Argon2::default();

    match argon2.verify_password(raw.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_returns_phc_format() {
        let hash = hash_room_password("4271").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("$v=19$"));
        assert!(hash.contains("m=19456"));
        assert!(hash.contains("t=2"));
        assert!(hash.contains("p=1"));
    }

    #[test]
    fn test_hash_produces_unique_hashes() {
        let hash1 = hash_room_password("0000").unwrap();
        let hash2 = hash_room_password("0000").unwrap();
        // Different salts produce different hashes
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_correct_password() {
        let hash = hash_room_password("8812").unwrap();
        assert!(verify_room_password("8812", &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_room_password("8812").unwrap();
        assert!(!verify_room_password("8821", &hash).unwrap());
    }

    #[test]
    fn test_verify_leading_zeros_matter() {
        let hash = hash_room_password("0042").unwrap();
        assert!(verify_room_password("0042", &hash).unwrap());
        assert!(!verify_room_password("42", &hash).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash() {
        let result = verify_room_password("1234", "not_a_phc_string");
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }

    #[test]
    fn test_password_error_display() {
        let err = PasswordError::HashError("boom".to_string());
        assert!(format!("{}", err).contains("boom"));

        let err = PasswordError::InvalidHashFormat;
        assert!(format!("{}", err).contains("Invalid password hash format"));
    }
}
