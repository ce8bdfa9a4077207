//! Content hashing for tile identity.
//!
//! The digest identifies a single tile's exact bytes (for display, caching,
//! export file indexes). Duplicate detection does not use it: near-identical
//! tiles hash differently and still have to merge.

use sha2::{Digest, Sha256};

use crate::types::PixelBuffer;

/// SHA-256 of the raw RGBA bytes, as a lowercase hex string.
pub fn content_hash(pixels: &PixelBuffer) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pixels.as_bytes());
    format!("{:x}", hasher.finalize())
}
