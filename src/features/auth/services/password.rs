//! Password hashing and verification (Argon2id, PHC-format strings).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::core::error::{AppError, Result};

/// Hash a plaintext password with a random salt. Returns a PHC-format
/// string (e.g. `$argon2id$v=19$m=19456,t=2,p=1$...`) for the `password`
/// column of the `users` table.
pub fn hash_password(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-format digest.
/// `Ok(false)` on mismatch; `Err` only if the stored digest is malformed.
pub fn verify_password(plaintext: &str, digest: &str) -> Result<bool> {
    let parsed = PasswordHash::new(digest)
        .map_err(|e| AppError::Internal(format!("Invalid password digest: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok())
}
