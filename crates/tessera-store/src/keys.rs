//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions to encode and decode keys for the primary
//! records and the user index. All keys support efficient prefix scans.

use tessera_core::UserId;

/// Encode a user key (the big-endian user ID).
#[must_use]
pub fn user_key(user_id: &UserId) -> Vec<u8> {
    user_id.to_be_bytes().to_vec()
}

/// Encode an identity key: `len(provider) as u32 || provider || subject`.
///
/// The length prefix keeps `("ab", "c")` and `("a", "bc")` distinct.
#[must_use]
pub fn identity_key(provider: &str, subject: &str) -> Vec<u8> {
    let provider_len = u32::try_from(provider.len()).unwrap_or(u32::MAX);
    let mut key = Vec::with_capacity(4 + provider.len() + subject.len());
    key.extend_from_slice(&provider_len.to_be_bytes());
    key.extend_from_slice(provider.as_bytes());
    key.extend_from_slice(subject.as_bytes());
    key
}

/// Encode a user-identity index key: `user_id || identity_key`.
#[must_use]
pub fn user_identity_key(user_id: &UserId, identity_key: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + identity_key.len());
    key.extend_from_slice(&user_id.to_be_bytes());
    key.extend_from_slice(identity_key);
    key
}

/// Encode a user prefix for scanning all authentications of a user.
#[must_use]
pub fn user_prefix(user_id: &UserId) -> Vec<u8> {
    user_key(user_id)
}

/// Extract the identity key from a user-identity index key.
///
/// Returns `None` if the key is shorter than the user ID prefix.
#[must_use]
pub fn extract_identity_key(key: &[u8]) -> Option<&[u8]> {
    key.get(8..)
}

/// Decode a big-endian counter value.
#[must_use]
pub fn decode_counter(value: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = value.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}
