//! SHA-256 fingerprints of serializable values.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Fingerprint a value by hashing its JSON form.
///
/// Callers must serialize through ordered containers (`BTreeMap`, sorted
/// `Vec`) for the fingerprint to be stable. Returns 64 lowercase hex chars.
pub fn compute_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(value)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

/// First 12 hex chars of a fingerprint, for log lines.
pub fn short_hash(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}
