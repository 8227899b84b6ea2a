//! Password hashing with Argon2id.
//!
//! Digests are PHC strings (`$argon2id$v=19$...`) carrying their own salt and
//! parameters, so verification needs nothing but the stored digest.

use anyhow::Result;
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

/// Digest checked when no account matches, so unknown emails cost the same
/// as wrong passwords. Uses the same parameters as [`hash_password`] and
/// matches no password.
pub const UNKNOWN_ACCOUNT_DIGEST: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c2NhbHBlcmJsb2NrLWRteQ$MLDzoL19DMBget5vDt01dNBFvSV33LSOVp1xl5pc1pw";

/// Hash a password with a fresh random salt.
///
/// # Errors
/// Returns an error if Argon2 rejects the input.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!("failed to hash password: {err}"))?;
    Ok(digest.to_string())
}

/// Check a password against a digest produced by [`hash_password`].
///
/// Malformed digests never verify.
#[must_use]
pub fn verify_password(password: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
