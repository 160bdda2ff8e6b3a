//! Stitching chunked topic messages back together.
//!
//! Chunks of one logical message share their initial transaction id and may
//! arrive in any order. The collector buffers them per initial id and emits
//! the message once the last one is in. Chunks of other messages can be
//! interleaved freely.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::timestamp::Timestamp;
use crate::transaction_id::TransactionId;
use crate::wire::ConsensusTopicResponse;

/// Largest chunk count a message may claim. Chunks announcing more are
/// dropped before anything is buffered for them.
pub const MAX_CHUNK_TOTAL: u32 = 10_000;

/// Metadata of one received chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessageChunk {
    pub number: u32,
    pub consensus_timestamp: Timestamp,
    pub content_size: usize,
    pub running_hash: Vec<u8>,
    pub sequence_number: u64,
}

/// A complete message delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessage {
    /// Timestamp of the last chunk to arrive.
    pub consensus_timestamp: Timestamp,
    /// Payload, concatenated in chunk order.
    pub contents: Vec<u8>,
    /// Running hash of the last chunk to arrive.
    pub running_hash: Vec<u8>,
    /// Sequence number of the last chunk to arrive.
    pub sequence_number: u64,
    /// Per-chunk metadata in chunk order. `None` for unchunked messages.
    pub chunks: Option<Vec<TopicMessageChunk>>,
    /// The initial transaction id of a chunked message.
    pub transaction_id: Option<TransactionId>,
}

impl TopicMessage {
    fn single(response: ConsensusTopicResponse) -> Self {
        Self {
            consensus_timestamp: response.consensus_timestamp,
            contents: response.message,
            running_hash: response.running_hash,
            sequence_number: response.sequence_number,
            chunks: None,
            transaction_id: response.chunk_info.map(|info| info.initial_transaction_id),
        }
    }

    /// Builds a message from chunks in arrival order.
    fn from_chunks(transaction_id: TransactionId, mut arrivals: Vec<ConsensusTopicResponse>) -> Option<Self> {
        let last = arrivals.last()?.clone();
        arrivals.sort_by_key(|chunk| chunk.chunk_info.map_or(0, |info| info.number));

        let total_len = arrivals.iter().map(|chunk| chunk.message.len()).sum();
        let mut contents = Vec::with_capacity(total_len);
        let mut chunks = Vec::with_capacity(arrivals.len());
        for chunk in arrivals {
            chunks.push(TopicMessageChunk {
                number: chunk.chunk_info.map_or(0, |info| info.number),
                consensus_timestamp: chunk.consensus_timestamp,
                content_size: chunk.message.len(),
                running_hash: chunk.running_hash,
                sequence_number: chunk.sequence_number,
            });
            contents.extend_from_slice(&chunk.message);
        }

        Some(Self {
            consensus_timestamp: last.consensus_timestamp,
            contents,
            running_hash: last.running_hash,
            sequence_number: last.sequence_number,
            chunks: Some(chunks),
            transaction_id: Some(transaction_id),
        })
    }
}

#[derive(Debug)]
struct PendingMessage {
    total: u32,
    arrivals: Vec<ConsensusTopicResponse>,
}

/// Buffers chunks until their message is complete.
#[derive(Debug, Default)]
pub struct ChunkCollector {
    pending: HashMap<TransactionId, PendingMessage>,
}

impl ChunkCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one notification. Returns the message it completes, if any.
    ///
    /// Notifications without chunk metadata, or from a one-chunk series,
    /// are complete on their own. Malformed chunks (a number outside
    /// `1..=total`, a total above [`MAX_CHUNK_TOTAL`], or a total that
    /// disagrees with earlier chunks of the same message) are dropped, as
    /// is a chunk number seen twice for the same message.
    pub fn push(&mut self, response: ConsensusTopicResponse) -> Option<TopicMessage> {
        let info = match response.chunk_info {
            Some(info) if info.total > 1 => info,
            _ => return Some(TopicMessage::single(response)),
        };
        let key = info.initial_transaction_id;

        if info.total > MAX_CHUNK_TOTAL {
            warn!(transaction_id = %key, total = info.total, "dropping chunk with oversized total");
            return None;
        }
        if info.number == 0 || info.number > info.total {
            debug!(
                transaction_id = %key,
                chunk = info.number,
                total = info.total,
                "dropping chunk with out-of-range number"
            );
            return None;
        }

        let pending = self.pending.entry(key).or_insert_with(|| PendingMessage {
            total: info.total,
            arrivals: Vec::new(),
        });

        if info.total != pending.total {
            debug!(
                transaction_id = %key,
                chunk = info.number,
                total = info.total,
                expected = pending.total,
                "dropping chunk with mismatched total"
            );
            return None;
        }

        let duplicate = pending
            .arrivals
            .iter()
            .any(|seen| seen.chunk_info.map(|i| i.number) == Some(info.number));
        if duplicate {
            debug!(transaction_id = %key, chunk = info.number, "dropping duplicate chunk");
            return None;
        }
        pending.arrivals.push(response);

        if pending.arrivals.len() < pending.total as usize {
            return None;
        }
        let complete = self.pending.remove(&key)?;
        TopicMessage::from_chunks(key, complete.arrivals)
    }

    /// Number of messages still waiting for chunks.
    pub fn pending_messages(&self) -> usize {
        self.pending.len()
    }
}
