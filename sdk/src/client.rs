//! # Client
//!
//! The network context every `freeze_with`, `execute`, and `subscribe`
//! call resolves its defaults from: the node list, the operator (default
//! payer and signer), the retry configuration, and the transport.
//!
//! A `Client` is cheap to clone and safe to share; clones see the same
//! operator and configuration. The operator and config sit behind
//! `parking_lot::RwLock` because reads (every execute) vastly outnumber
//! writes (set once at startup).

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::ClientConfig;
use crate::crypto::{PrivateKey, PublicKey};
use crate::ids::AccountId;
use crate::transport::Transport;

/// Default payer and signer for transactions executed through a client.
#[derive(Debug, Clone)]
pub struct Operator {
    /// Account that pays for transactions with generated ids.
    pub account_id: AccountId,
    /// Key that signs on the payer's behalf.
    pub private_key: PrivateKey,
}

impl Operator {
    /// The operator's public key.
    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }
}

struct ClientInner {
    nodes: Vec<AccountId>,
    transport: Arc<dyn Transport>,
    operator: RwLock<Option<Operator>>,
    config: RwLock<ClientConfig>,
}

/// Shared handle to a ledger network.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Creates a client for `nodes`, talking through `transport`.
    pub fn new(nodes: Vec<AccountId>, transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                nodes,
                transport,
                operator: RwLock::new(None),
                config: RwLock::new(config),
            }),
        }
    }

    /// Sets the default payer and signer.
    pub fn set_operator(&self, account_id: AccountId, private_key: PrivateKey) {
        *self.inner.operator.write() = Some(Operator {
            account_id,
            private_key,
        });
    }

    /// The current operator, if any.
    pub fn operator(&self) -> Option<Operator> {
        self.inner.operator.read().clone()
    }

    /// The operator's account id, if an operator is set.
    pub fn operator_account_id(&self) -> Option<AccountId> {
        self.inner.operator.read().as_ref().map(|op| op.account_id)
    }

    /// A snapshot of the current configuration.
    pub fn config(&self) -> ClientConfig {
        self.inner.config.read().clone()
    }

    /// Mutates the shared configuration in place.
    pub fn update_config(&self, f: impl FnOnce(&mut ClientConfig)) {
        f(&mut self.inner.config.write());
    }

    /// Every node this client knows about, in configuration order.
    pub fn node_account_ids(&self) -> &[AccountId] {
        &self.inner.nodes
    }

    /// The nodes a transaction is frozen against when it has no explicit
    /// node list.
    pub(crate) fn nodes_for_transaction(&self) -> Vec<AccountId> {
        let limit = self
            .inner
            .config
            .read()
            .max_nodes_per_transaction
            .unwrap_or(self.inner.nodes.len());
        self.inner.nodes.iter().copied().take(limit).collect()
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("nodes", &self.inner.nodes)
            .field("operator", &self.operator_account_id())
            .finish_non_exhaustive()
    }
}
