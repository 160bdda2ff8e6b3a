//! Signer registry.
//!
//! Signing is deferred: `sign` only records who signs, and the signatures
//! are produced when an envelope is built for submission or serialization.
//! That way a signer added after freeze still covers every envelope, and a
//! body that has to be rebuilt is re-signed automatically.
//!
//! Keys are unique. Registering a key twice is a no-op, which is what makes
//! `sign` idempotent.

use std::fmt;
use std::sync::Arc;

use crate::crypto::{PrivateKey, PublicKey};
use crate::wire::{SignaturePair, SignedTransaction};

/// A signing callback: body bytes in, signature bytes out.
pub type SignerFn = Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

/// Wraps a private key as a [`SignerFn`].
pub fn signer_for(key: &PrivateKey) -> SignerFn {
    let key = key.clone();
    Arc::new(move |message: &[u8]| key.sign(message))
}

#[derive(Clone)]
struct SignerEntry {
    public_key: PublicKey,
    /// `None` for keys whose signatures arrived pre-computed.
    signer: Option<SignerFn>,
}

/// Ordered, de-duplicated list of the keys that sign a transaction.
#[derive(Clone, Default)]
pub(crate) struct Signers {
    entries: Vec<SignerEntry>,
}

impl Signers {
    pub(crate) fn contains(&self, key: &PublicKey) -> bool {
        self.entries.iter().any(|entry| entry.public_key == *key)
    }

    /// Registers `key`. Returns `false` if it was already present, in which
    /// case nothing changes.
    pub(crate) fn register(&mut self, public_key: PublicKey, signer: Option<SignerFn>) -> bool {
        if self.contains(&public_key) {
            return false;
        }
        self.entries.push(SignerEntry { public_key, signer });
        true
    }

    /// Adds signatures from every callback signer missing from `envelope`.
    pub(crate) fn sign_envelope(&self, envelope: &mut SignedTransaction) {
        for entry in &self.entries {
            let Some(signer) = &entry.signer else {
                continue;
            };
            if envelope.sig_map.contains(&entry.public_key) {
                continue;
            }
            let signature = signer(&envelope.body_bytes);
            envelope.sig_map.pairs.push(SignaturePair {
                public_key: entry.public_key,
                signature,
            });
        }
    }

    pub(crate) fn public_keys(&self) -> impl Iterator<Item = PublicKey> + '_ {
        self.entries.iter().map(|entry| entry.public_key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for Signers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.public_keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::SignatureMap;

    fn envelope(body: &[u8]) -> SignedTransaction {
        SignedTransaction {
            body_bytes: body.to_vec(),
            sig_map: SignatureMap::default(),
        }
    }

    #[test]
    fn registering_twice_is_a_noop() {
        let key = PrivateKey::generate();
        let mut signers = Signers::default();
        assert!(signers.register(key.public_key(), Some(signer_for(&key))));
        assert!(!signers.register(key.public_key(), Some(signer_for(&key))));
        assert_eq!(signers.len(), 1);
    }

    #[test]
    fn signs_each_envelope_once() {
        let key = PrivateKey::generate();
        let mut signers = Signers::default();
        signers.register(key.public_key(), Some(signer_for(&key)));

        let mut env = envelope(b"body");
        signers.sign_envelope(&mut env);
        signers.sign_envelope(&mut env);

        assert_eq!(env.sig_map.pairs.len(), 1);
        let pair = &env.sig_map.pairs[0];
        assert!(key.public_key().verify(b"body", &pair.signature));
    }

    #[test]
    fn detached_keys_do_not_sign() {
        let key = PrivateKey::generate();
        let mut signers = Signers::default();
        signers.register(key.public_key(), None);

        let mut env = envelope(b"body");
        signers.sign_envelope(&mut env);
        assert!(env.sig_map.pairs.is_empty());
        assert!(signers.contains(&key.public_key()));
    }

    #[test]
    fn signature_order_follows_registration_order() {
        let first = PrivateKey::generate();
        let second = PrivateKey::generate();
        let mut signers = Signers::default();
        signers.register(first.public_key(), Some(signer_for(&first)));
        signers.register(second.public_key(), Some(signer_for(&second)));

        let mut env = envelope(b"body");
        signers.sign_envelope(&mut env);
        let keys: Vec<_> = env.sig_map.pairs.iter().map(|p| p.public_key).collect();
        assert_eq!(keys, vec![first.public_key(), second.public_key()]);
    }
}
