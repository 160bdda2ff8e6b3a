//! # Cryptographic Primitives
//!
//! Thin wrappers over audited implementations: `ed25519-dalek` for
//! signatures and `sha2` for the transaction hash. Nothing clever happens
//! here, and nothing clever should.

pub mod hash;
pub mod keys;

pub use hash::sha384;
pub use keys::{PrivateKey, PublicKey};
