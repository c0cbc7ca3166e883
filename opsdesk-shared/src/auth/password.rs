/// Password hashing using Argon2id
///
/// Hashes are produced in PHC string format with a per-password random
/// salt, so the same password never hashes to the same string twice.
/// Verification is constant-time.
///
/// # Example
///
/// ```
/// use opsdesk_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("hunter2hunter2")?;
/// assert!(verify_password("hunter2hunter2", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Error type for password operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password against a stored hash
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not valid PHC format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a plaintext password with Argon2id and a fresh random salt
///
/// Returns a PHC string (`$argon2id$...`) embedding algorithm, parameters,
/// salt, and digest. The default Argon2id parameters are used.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a plaintext password against a stored PHC hash
///
/// `Ok(false)` means the password simply did not match; errors indicate a
/// malformed hash or a verification failure, which the caller should treat
/// as an internal error rather than bad credentials.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_produces_phc_format() {
        let hash = hash_password("secret-password").expect("hash should succeed");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_same_password_different_salts() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(verify_password("anything", "not-a-hash").is_err());
        assert!(verify_password("anything", "$argon2id$broken").is_err());
    }
}
