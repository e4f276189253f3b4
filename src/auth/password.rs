//! Account passwords
//!
//! Stored as Argon2id PHC strings. Verification reads the algorithm,
//! parameters and salt back out of the stored string, so hashes written under
//! older parameters keep verifying after [`account_hasher`] changes.

use argon2::password_hash::{
    self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::types::GateError;

/// Argon2id v0x13 with the crate's default cost parameters
fn account_hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Hash a new account password under a fresh salt
pub fn hash_password(password: &str) -> Result<String, GateError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = account_hasher()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| GateError::Auth(format!("Password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// `Ok(false)` for a wrong password; `Err` when the stored hash is unusable
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, GateError> {
    let stored = PasswordHash::new(stored_hash)
        .map_err(|e| GateError::Auth(format!("Stored password hash unreadable: {e}")))?;

    match account_hasher().verify_password(password.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(GateError::Auth(format!("Stored password hash unusable: {e}"))),
    }
}
