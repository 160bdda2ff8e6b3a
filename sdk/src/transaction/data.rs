//! Capabilities a transaction kind plugs into the shared lifecycle.
//!
//! [`Transaction<D>`](super::Transaction) owns everything common to all
//! kinds: memo, fee, identity, node list, signers, envelopes. A kind only
//! supplies `D`: its own fields plus the ability to render them into a
//! body. Chunking and scheduling are opt-in.

use std::fmt::Debug;
use std::ops::Range;

use crate::config::DEFAULT_MAX_TRANSACTION_FEE;
use crate::error::Result;
use crate::hbar::Hbar;
use crate::transaction_id::TransactionId;
use crate::wire::{ChunkInfo, SchedulableBodyData, TransactionBodyData};

use super::chunk::ChunkData;

/// Where in a chunk series a body is being rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkContext {
    pub number: u32,
    pub total: u32,
    pub initial_transaction_id: TransactionId,
    /// The payload bytes this chunk carries.
    pub range: Range<usize>,
}

impl ChunkContext {
    /// Wire metadata for this chunk, or `None` for a one-chunk series.
    pub fn info(&self) -> Option<ChunkInfo> {
        (self.total > 1).then_some(ChunkInfo {
            initial_transaction_id: self.initial_transaction_id,
            number: self.number,
            total: self.total,
        })
    }
}

/// The kind-specific half of a transaction.
pub trait TransactionData: Clone + Debug + Send + Sync + 'static {
    /// Fee ceiling used when neither the transaction nor the client has one.
    fn default_max_transaction_fee(&self) -> Hbar {
        DEFAULT_MAX_TRANSACTION_FEE
    }

    /// The chunked payload, for kinds that split large payloads.
    fn chunk_data(&self) -> Option<&ChunkData> {
        None
    }

    fn chunk_data_mut(&mut self) -> Option<&mut ChunkData> {
        None
    }

    /// Checks required fields before freeze.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Renders the body payload. `chunk` is `None` for unchunked kinds and
    /// for drafts, which carry the whole payload.
    fn to_body_data(&self, chunk: Option<&ChunkContext>) -> TransactionBodyData;

    /// Rebuilds the kind from decoded bodies, one per chunk, in order.
    fn from_body_data(chunks: &[TransactionBodyData]) -> Result<Self>;
}

/// Kinds that can be wrapped in a schedule.
pub trait Schedulable: TransactionData {
    fn to_schedulable_body_data(&self) -> SchedulableBodyData;
}

/// The payload slice a chunk context selects, or the whole payload.
pub(crate) fn chunk_payload<'a>(data: &'a ChunkData, chunk: Option<&ChunkContext>) -> &'a [u8] {
    match chunk {
        Some(chunk) => data.data.get(chunk.range.clone()).unwrap_or_default(),
        None => &data.data,
    }
}

/// The decode error for a body of the wrong kind.
pub(crate) fn unexpected_body(expected: &'static str, found: &TransactionBodyData) -> crate::Error {
    crate::Error::Decode(format!(
        "expected a {expected} body, found {}",
        found.kind()
    ))
}
