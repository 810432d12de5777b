//! bcrypt password hashing.

pub use bcrypt::DEFAULT_COST;

/// Lowest cost bcrypt accepts.
pub const MIN_COST: u32 = 4;

/// # Errors
/// `BcryptError` if `cost` is outside bcrypt's range.
pub fn hash_password(plain: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, cost)
}

/// `Ok(false)` for a wrong password.
///
/// # Errors
/// `BcryptError` if `hash` is not a bcrypt hash.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(plain, hash)
}
