//! Content-derived identifiers

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// UUID built from the first 16 bytes of the SHA-256 of `content`.
///
/// Identical inputs always map to the same id, so repeated upserts of the
/// same question or document overwrite rather than duplicate.
pub fn content_uuid(content: &str) -> Uuid {
    let digest = Sha256::digest(content.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}
