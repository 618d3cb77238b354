use crate::error::{AppError, AppResult};

/// Hash a plaintext password for storage.
pub fn hash(plaintext: &str) -> AppResult<String> {
    bcrypt::hash(plaintext, bcrypt::DEFAULT_COST).map_err(|e| AppError::Internal(e.to_string()))
}

/// Verify a plaintext password against a stored hash - constant-time via bcrypt.
pub fn verify(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}
