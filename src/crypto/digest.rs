//! SHA-256 digest computation.

use sha2::{Digest, Sha256};

/// Algorithm tag prefixed to device hashes.
pub const SHA256_TAG: &str = "SHA256:";

/// Compute SHA-256 of `data` and return lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Format a tagged digest: `SHA256:<hex>`.
pub fn format_tagged_digest(data: &[u8]) -> String {
    format!("{}{}", SHA256_TAG, sha256_hex(data))
}
