//! Password hashing (bcrypt).

use anyhow::Result;

use goras_core::errors::GorasError;

/// Hash a plaintext password. `cost` falls back to the bcrypt default
/// when `None`; tests pass the minimum cost to stay fast.
pub fn hash_password(plain: &str, cost: Option<u32>) -> Result<String> {
    let cost = cost.unwrap_or(bcrypt::DEFAULT_COST);
    bcrypt::hash(plain, cost).map_err(|e| GorasError::general_error(e.to_string()).into_anyhow())
}

/// Check a plaintext password against a stored hash.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(plain, hash).map_err(|e| GorasError::general_error(e.to_string()).into_anyhow())
}
