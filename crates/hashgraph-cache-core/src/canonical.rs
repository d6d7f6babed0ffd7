//! Canonical encoding
//!
//! Hashed and exchanged values use postcard serialization with the same
//! constraints everywhere:
//! - No maps/hashmaps; use vectors sorted by key
//! - Field order is Rust struct field order

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialize a value to canonical bytes using postcard.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    postcard::to_allocvec(value).map_err(Error::from)
}

/// Decode a value previously produced by [`canonical_bytes`].
pub fn from_canonical_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    postcard::from_bytes(bytes).map_err(Error::from)
}

/// Domain-separated BLAKE3 over the canonical bytes of `value`.
pub fn canonical_hash<T: Serialize>(domain: &[u8], value: &T) -> Result<[u8; 32]> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain);
    hasher.update(&canonical_bytes(value)?);
    Ok(*hasher.finalize().as_bytes())
}
