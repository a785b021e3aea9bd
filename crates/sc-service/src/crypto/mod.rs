//! Cryptographic primitives for sessions, CSRF tokens and passwords.
//!
//! - Randomness comes from `ring::rand::SystemRandom` (OS CSPRNG).
//! - Token comparison is constant-time via `ring::hmac::verify`.
//! - Passwords are verified against stored bcrypt hashes.

use crate::errors::ScError;
use ring::{
    hmac,
    rand::{SecureRandom, SystemRandom},
};
use std::sync::OnceLock;
use tracing::instrument;

/// Bytes of randomness behind a CSRF token (hex-encoded to 64 chars).
pub const CSRF_TOKEN_BYTES: usize = 32;

/// Bytes of randomness behind a session identifier.
pub const SESSION_ID_BYTES: usize = 32;

/// Bcrypt hash verified when the email is unknown, so a miss costs the same
/// as a wrong password. Computed once, at bcrypt's default cost.
static DUMMY_PASSWORD_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Generate cryptographically secure random bytes
pub fn generate_random_bytes(len: usize) -> Result<Vec<u8>, ScError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|e| ScError::Crypto(format!("Random bytes generation failed: {}", e)))?;
    Ok(bytes)
}

/// Generate a CSRF token (32 random bytes, hex-encoded).
pub fn generate_csrf_token() -> Result<String, ScError> {
    Ok(hex::encode(generate_random_bytes(CSRF_TOKEN_BYTES)?))
}

/// Generate an opaque session identifier (32 random bytes, hex-encoded).
pub fn generate_session_id() -> Result<String, ScError> {
    Ok(hex::encode(generate_random_bytes(SESSION_ID_BYTES)?))
}

/// Compare two secrets in constant time.
///
/// Both sides are MACed under a throwaway key and the tags compared with
/// `hmac::verify`, so neither content nor length leaks through timing.
/// Key generation failure compares unequal.
pub fn constant_time_eq(expected: &str, candidate: &str) -> bool {
    let rng = SystemRandom::new();
    let key = match hmac::Key::generate(hmac::HMAC_SHA256, &rng) {
        Ok(key) => key,
        Err(_) => return false,
    };
    let tag = hmac::sign(&key, expected.as_bytes());
    hmac::verify(&key, candidate.as_bytes(), tag.as_ref()).is_ok()
}

/// Verify a password against a stored bcrypt hash.
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ScError> {
    bcrypt::verify(password, hash)
        .map_err(|e| ScError::Crypto(format!("Password verification failed: {}", e)))
}

/// Burn one bcrypt verification against a fixed hash.
///
/// Called on the unknown-email path of login; the result is discarded.
#[instrument(skip_all)]
pub fn verify_dummy_password(password: &str) {
    let hash = DUMMY_PASSWORD_HASH.get_or_init(|| {
        generate_csrf_token()
            .ok()
            .and_then(|seed| bcrypt::hash(seed, bcrypt::DEFAULT_COST).ok())
    });
    if let Some(hash) = hash {
        let _ = bcrypt::verify(password, hash);
    }
}
