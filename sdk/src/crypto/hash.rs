//! # Hashing Utilities
//!
//! The network identifies a submitted transaction by the SHA-384 digest of
//! its signed envelope bytes. That is the only hash the SDK computes.

use sha2::{Digest, Sha384};

/// Length of a SHA-384 digest in bytes.
pub const TRANSACTION_HASH_LENGTH: usize = 48;

/// SHA-384 of `data`.
///
/// # Example
///
/// ```
/// use ledger_sdk::crypto::sha384;
///
/// let hash = sha384(b"envelope");
/// assert_eq!(hash.len(), 48);
/// ```
pub fn sha384(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha384::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}
