//! Hashing utilities.
//!
//! SHA-256 backs every identifier that ends up in emitted code, so digests
//! are identical across builds and platforms.

use sha2::{Digest, Sha256};

/// Full SHA-256 digest of `data` as lowercase hex (64 characters).
pub fn digest_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Raw SHA-256 digest of `data`.
pub fn digest_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 digest of `data` truncated to `len` lowercase hex characters.
///
/// `len` is clamped to the 64 characters a SHA-256 digest provides.
pub fn short_digest(data: &str, len: usize) -> String {
    let mut hex = digest_hex(data.as_bytes());
    hex.truncate(len.min(64));
    hex
}

/// Encode bytes as lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}
