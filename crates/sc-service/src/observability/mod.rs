//! Observability for the society service.
//!
//! # Privacy by Default
//!
//! Instrumented functions use `#[instrument(skip_all)]` and allow-list their
//! fields. Fields fall into three groups:
//! - **SAFE**: logged as-is (user ids, roles, scope ids, outcomes)
//! - **HASHED**: SHA-256 prefix for correlation (emails)
//! - **NEVER**: passwords, password hashes, session ids, CSRF tokens
//!
//! Log targets: `sc.access`, `sc.auth`, `sc.session`, `sc.csrf`, `sc.funds`,
//! `sc.activity`.

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a value for log correlation (SHA-256, first 8 hex chars).
///
/// One-way and truncated; for correlating log lines, not for secrets.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(digest.iter().take(4).copied().collect::<Vec<u8>>())
}
