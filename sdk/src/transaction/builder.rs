//! The generic transaction: shared fields, freeze, signing, and envelopes.
//!
//! A [`Transaction`] starts mutable. `freeze` locks its node list and
//! identity, splits chunked payloads, and renders one envelope per
//! (chunk, node) pair:
//!
//! ```text
//! envelopes[chunk * node_count + node]
//!
//!              node 0.0.3   node 0.0.4   node 0.0.5
//! chunk 1/2    [0]          [1]          [2]
//! chunk 2/2    [3]          [4]          [5]
//! ```
//!
//! Envelopes start unsigned. Signatures are attached when an envelope is
//! built for submission or serialization, so every registered signer covers
//! every envelope no matter when it was registered.

use std::time::Duration;

use tracing::debug;

use crate::client::Client;
use crate::config::{DEFAULT_TRANSACTION_VALID_DURATION, MAX_MEMO_LENGTH};
use crate::crypto::{sha384, PrivateKey, PublicKey};
use crate::error::{Error, Result};
use crate::execute::RequestOptions;
use crate::hbar::Hbar;
use crate::ids::AccountId;
use crate::transaction_id::TransactionId;
use crate::wire::{self, SignaturePair, SignatureMap, SignedTransaction, TransactionBody};

use super::chunk::{self, ChunkSeries};
use super::data::{ChunkContext, TransactionData};
use super::signing::{signer_for, SignerFn, Signers};

// ---------------------------------------------------------------------------
// FrozenState
// ---------------------------------------------------------------------------

/// Everything fixed at freeze time.
#[derive(Debug, Clone)]
pub(crate) struct FrozenState {
    pub node_account_ids: Vec<AccountId>,
    /// Current identity of each chunk. Entry 0 is the initial identity.
    pub transaction_ids: Vec<TransactionId>,
    /// Payload ranges for chunked kinds.
    pub series: Option<ChunkSeries>,
    pub transaction_fee: Hbar,
    /// One envelope per (chunk, node), chunk-major.
    pub envelopes: Vec<SignedTransaction>,
}

impl FrozenState {
    pub fn chunk_count(&self) -> usize {
        self.transaction_ids.len()
    }

    pub fn node_count(&self) -> usize {
        self.node_account_ids.len()
    }

    fn envelope_index(&self, chunk: usize, node: usize) -> usize {
        chunk * self.node_count() + node
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A transaction of kind `D`.
#[derive(Debug, Clone)]
pub struct Transaction<D> {
    pub(crate) data: D,
    pub(crate) memo: String,
    pub(crate) max_transaction_fee: Option<Hbar>,
    pub(crate) transaction_valid_duration: Duration,
    pub(crate) transaction_id: Option<TransactionId>,
    pub(crate) node_account_ids: Option<Vec<AccountId>>,
    pub(crate) signers: Signers,
    pub(crate) frozen: Option<FrozenState>,
    pub(crate) options: RequestOptions,
    pub(crate) node_cursor: usize,
}

impl<D: TransactionData + Default> Default for Transaction<D> {
    fn default() -> Self {
        Self::from_data(D::default())
    }
}

impl<D: TransactionData + Default> Transaction<D> {
    /// A fresh, unfrozen transaction.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: TransactionData> Transaction<D> {
    pub(crate) fn from_data(data: D) -> Self {
        Self {
            data,
            memo: String::new(),
            max_transaction_fee: None,
            transaction_valid_duration: DEFAULT_TRANSACTION_VALID_DURATION,
            transaction_id: None,
            node_account_ids: None,
            signers: Signers::default(),
            frozen: None,
            options: RequestOptions::default(),
            node_cursor: 0,
        }
    }

    pub(crate) fn data(&self) -> &D {
        &self.data
    }

    /// Mutable access to the kind's fields, refused once frozen.
    pub(crate) fn data_mut(&mut self, field: &'static str) -> Result<&mut D> {
        self.require_not_frozen(field)?;
        Ok(&mut self.data)
    }

    fn require_not_frozen(&self, field: &'static str) -> Result<()> {
        if self.is_frozen() {
            return Err(Error::Frozen { field });
        }
        Ok(())
    }

    // -- Shared fields -------------------------------------------------------

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn set_memo(&mut self, memo: impl Into<String>) -> Result<&mut Self> {
        self.require_not_frozen("memo")?;
        let memo = memo.into();
        if memo.len() > MAX_MEMO_LENGTH {
            return Err(Error::configuration(format!(
                "memo is {} bytes, at most {MAX_MEMO_LENGTH} are allowed",
                memo.len()
            )));
        }
        self.memo = memo;
        Ok(self)
    }

    /// The fee ceiling. After freeze this is the resolved value.
    pub fn max_transaction_fee(&self) -> Option<Hbar> {
        match &self.frozen {
            Some(frozen) => Some(frozen.transaction_fee),
            None => self.max_transaction_fee,
        }
    }

    pub fn set_max_transaction_fee(&mut self, fee: Hbar) -> Result<&mut Self> {
        self.require_not_frozen("max_transaction_fee")?;
        self.max_transaction_fee = Some(fee);
        Ok(self)
    }

    pub fn transaction_valid_duration(&self) -> Duration {
        self.transaction_valid_duration
    }

    pub fn set_transaction_valid_duration(&mut self, duration: Duration) -> Result<&mut Self> {
        self.require_not_frozen("transaction_valid_duration")?;
        self.transaction_valid_duration = duration;
        Ok(self)
    }

    /// The identity of the first chunk, once known.
    pub fn transaction_id(&self) -> Option<TransactionId> {
        match &self.frozen {
            Some(frozen) => frozen.transaction_ids.first().copied(),
            None => self.transaction_id,
        }
    }

    pub fn set_transaction_id(&mut self, transaction_id: TransactionId) -> Result<&mut Self> {
        self.require_not_frozen("transaction_id")?;
        self.transaction_id = Some(transaction_id);
        Ok(self)
    }

    /// The candidate nodes, once known.
    pub fn node_account_ids(&self) -> Option<&[AccountId]> {
        match &self.frozen {
            Some(frozen) => Some(&frozen.node_account_ids),
            None => self.node_account_ids.as_deref(),
        }
    }

    pub fn set_node_account_ids(&mut self, nodes: Vec<AccountId>) -> Result<&mut Self> {
        self.require_not_frozen("node_account_ids")?;
        if nodes.is_empty() {
            return Err(Error::configuration("node account id list must not be empty"));
        }
        self.node_account_ids = Some(nodes);
        Ok(self)
    }

    // -- Per-call retry overrides ---------------------------------------------

    pub fn set_max_attempts(&mut self, max_attempts: u32) -> &mut Self {
        self.options.max_attempts = Some(max_attempts);
        self
    }

    pub fn set_min_backoff(&mut self, min_backoff: Duration) -> &mut Self {
        self.options.min_backoff = Some(min_backoff);
        self
    }

    pub fn set_max_backoff(&mut self, max_backoff: Duration) -> &mut Self {
        self.options.max_backoff = Some(max_backoff);
        self
    }

    /// Deadline for each individual submission.
    pub fn set_request_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.options.request_timeout = Some(timeout);
        self
    }

    pub fn set_regenerate_transaction_id(&mut self, regenerate: bool) -> &mut Self {
        self.options.regenerate_transaction_id = Some(regenerate);
        self
    }

    // -- Freeze ------------------------------------------------------------------

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Freezes using only what was set explicitly: node ids and a
    /// transaction id are both required.
    pub fn freeze(&mut self) -> Result<&mut Self> {
        self.freeze_inner(None)
    }

    /// Freezes, filling the node list, identity and fee from `client` where
    /// they were not set explicitly. The client's operator, if any, is
    /// registered as a signer.
    pub fn freeze_with(&mut self, client: &Client) -> Result<&mut Self> {
        self.freeze_inner(Some(client))?;
        if let Some(operator) = client.operator() {
            self.sign(&operator.private_key);
        }
        Ok(self)
    }

    fn freeze_inner(&mut self, client: Option<&Client>) -> Result<&mut Self> {
        if self.is_frozen() {
            return Ok(self);
        }
        self.data.validate()?;

        let node_account_ids = match (&self.node_account_ids, client) {
            (Some(nodes), _) => nodes.clone(),
            (None, Some(client)) => client.nodes_for_transaction(),
            (None, None) => {
                return Err(Error::configuration(
                    "node account ids must be set explicitly or a client supplied",
                ))
            }
        };
        if node_account_ids.is_empty() {
            return Err(Error::configuration("no nodes available to freeze against"));
        }

        let initial_transaction_id = match self.transaction_id {
            Some(id) => id,
            None => client
                .and_then(Client::operator_account_id)
                .map(TransactionId::generate)
                .ok_or_else(|| {
                    Error::configuration("transaction id must be set explicitly or an operator configured")
                })?,
        };

        let transaction_fee = self
            .max_transaction_fee
            .or_else(|| client.and_then(|c| c.config().default_max_transaction_fee))
            .unwrap_or_else(|| self.data.default_max_transaction_fee());

        let series = match self.data.chunk_data() {
            Some(chunked) => Some(chunk::split(
                chunked.data.len(),
                chunked.chunk_size,
                chunked.max_chunks,
                initial_transaction_id,
            )?),
            None => None,
        };
        let transaction_ids = match &series {
            Some(series) => series.transaction_ids(),
            None => vec![initial_transaction_id],
        };

        let mut frozen = FrozenState {
            envelopes: Vec::with_capacity(transaction_ids.len() * node_account_ids.len()),
            node_account_ids,
            transaction_ids,
            series,
            transaction_fee,
        };
        for chunk in 0..frozen.chunk_count() {
            for node in 0..frozen.node_count() {
                let body = self.render_body(&frozen, chunk, node)?;
                frozen.envelopes.push(SignedTransaction {
                    body_bytes: wire::encode(&body)?,
                    sig_map: SignatureMap::default(),
                });
            }
        }

        debug!(
            transaction_id = %initial_transaction_id,
            nodes = frozen.node_count(),
            chunks = frozen.chunk_count(),
            fee = %transaction_fee,
            "transaction frozen"
        );

        self.transaction_id = Some(initial_transaction_id);
        self.node_account_ids = Some(frozen.node_account_ids.clone());
        self.frozen = Some(frozen);
        Ok(self)
    }

    pub(crate) fn render_body(
        &self,
        frozen: &FrozenState,
        chunk: usize,
        node: usize,
    ) -> Result<TransactionBody> {
        let transaction_id = *frozen
            .transaction_ids
            .get(chunk)
            .ok_or_else(|| Error::configuration(format!("no chunk at index {chunk}")))?;
        let node_account_id = *frozen
            .node_account_ids
            .get(node)
            .ok_or_else(|| Error::configuration(format!("no node at index {node}")))?;

        let context = match &frozen.series {
            Some(series) => {
                let entry = series
                    .get(chunk)
                    .ok_or_else(|| Error::configuration(format!("no chunk at index {chunk}")))?;
                Some(ChunkContext {
                    number: entry.number,
                    total: entry.total,
                    initial_transaction_id: series.initial_transaction_id().unwrap_or(transaction_id),
                    range: entry.range.clone(),
                })
            }
            None => None,
        };

        Ok(TransactionBody {
            transaction_id: Some(transaction_id),
            node_account_id: Some(node_account_id),
            transaction_fee: frozen.transaction_fee,
            transaction_valid_duration: self.transaction_valid_duration,
            memo: self.memo.clone(),
            data: self.data.to_body_data(context.as_ref()),
        })
    }

    /// The body of an unfrozen transaction: no node, full payload, and a
    /// zero fee when none was set.
    pub(crate) fn draft_body(&self) -> TransactionBody {
        TransactionBody {
            transaction_id: self.transaction_id,
            node_account_id: None,
            transaction_fee: self.max_transaction_fee.unwrap_or(Hbar::ZERO),
            transaction_valid_duration: self.transaction_valid_duration,
            memo: self.memo.clone(),
            data: self.data.to_body_data(None),
        }
    }

    /// Returns the envelope for (chunk, node), signed by every registered
    /// signer.
    ///
    /// The stored envelope is reused as long as its body bytes still match
    /// a fresh render, so signatures collected earlier (including detached
    /// ones) survive. A body that changed, e.g. after its transaction id was
    /// regenerated, gets a new envelope.
    pub(crate) fn build_envelope(&mut self, chunk: usize, node: usize) -> Result<SignedTransaction> {
        let frozen = self.frozen.as_ref().ok_or_else(not_frozen)?;
        let body_bytes = wire::encode(&self.render_body(frozen, chunk, node)?)?;

        let frozen = self.frozen.as_mut().ok_or_else(not_frozen)?;
        let index = frozen.envelope_index(chunk, node);
        let envelope = frozen
            .envelopes
            .get_mut(index)
            .ok_or_else(|| Error::configuration(format!("no envelope at index {index}")))?;

        if envelope.body_bytes != body_bytes {
            debug!(
                chunk,
                node,
                dropped_signatures = envelope.sig_map.pairs.len(),
                "body changed, rebuilding envelope"
            );
            *envelope = SignedTransaction {
                body_bytes,
                sig_map: SignatureMap::default(),
            };
        }
        self.signers.sign_envelope(envelope);
        Ok(envelope.clone())
    }

    // -- Signing -----------------------------------------------------------------

    /// Registers `key` as a signer. Signing with the same key twice is a
    /// no-op.
    pub fn sign(&mut self, key: &PrivateKey) -> &mut Self {
        self.sign_with(key.public_key(), signer_for(key))
    }

    /// Registers a signing callback for `public_key`.
    pub fn sign_with(&mut self, public_key: PublicKey, signer: SignerFn) -> &mut Self {
        if !self.signers.register(public_key, Some(signer)) {
            debug!(public_key = %public_key, "signer already registered");
        }
        self
    }

    /// Signs with the client's operator key.
    pub fn sign_with_operator(&mut self, client: &Client) -> Result<&mut Self> {
        let operator = client
            .operator()
            .ok_or_else(|| Error::configuration("client has no operator"))?;
        Ok(self.sign(&operator.private_key))
    }

    /// Attaches a signature computed elsewhere over this transaction's
    /// single envelope.
    pub fn add_signature(&mut self, public_key: PublicKey, signature: Vec<u8>) -> Result<&mut Self> {
        let frozen = self.frozen.as_mut().ok_or_else(|| {
            Error::configuration("transaction must be frozen before adding a signature")
        })?;
        if frozen.node_count() != 1 {
            return Err(Error::SignatureRequiresSingleNode {
                node_count: frozen.node_count(),
            });
        }
        if frozen.chunk_count() != 1 {
            return Err(Error::configuration(
                "a detached signature cannot cover more than one chunk",
            ));
        }
        if !self.signers.register(public_key, None) {
            return Ok(self);
        }

        for envelope in &mut frozen.envelopes {
            if !envelope.sig_map.contains(&public_key) {
                envelope.sig_map.pairs.push(SignaturePair {
                    public_key,
                    signature: signature.clone(),
                });
            }
        }
        Ok(self)
    }

    /// Public keys of every registered signer, in registration order.
    pub fn signer_public_keys(&self) -> Vec<PublicKey> {
        self.signers.public_keys().collect()
    }

    /// The signatures on the first chunk's envelope for each node.
    pub fn signatures(&mut self) -> Result<Vec<(AccountId, Vec<SignaturePair>)>> {
        let nodes = self
            .frozen
            .as_ref()
            .map(|frozen| frozen.node_account_ids.clone())
            .ok_or_else(not_frozen)?;
        nodes
            .into_iter()
            .enumerate()
            .map(|(index, node)| Ok((node, self.build_envelope(0, index)?.sig_map.pairs)))
            .collect()
    }

    // -- Hashes --------------------------------------------------------------------

    /// SHA-384 of the first envelope, the one sent to the first node.
    pub fn transaction_hash(&mut self) -> Result<Vec<u8>> {
        let envelope = self.build_envelope(0, 0)?;
        Ok(sha384(&wire::encode(&envelope)?))
    }

    /// SHA-384 of the first chunk's envelope for each node.
    pub fn transaction_hash_per_node(&mut self) -> Result<Vec<(AccountId, Vec<u8>)>> {
        let nodes = self
            .frozen
            .as_ref()
            .map(|frozen| frozen.node_account_ids.clone())
            .ok_or_else(not_frozen)?;
        nodes
            .into_iter()
            .enumerate()
            .map(|(index, node)| {
                let envelope = self.build_envelope(0, index)?;
                Ok((node, sha384(&wire::encode(&envelope)?)))
            })
            .collect()
    }
}

fn not_frozen() -> Error {
    Error::configuration("transaction is not frozen")
}
