//! Publishing messages to a consensus topic.
//!
//! Messages larger than the chunk size (1024 bytes by default) are split
//! into up to `max_chunks` sibling transactions. Each sibling's body names
//! its position and the initial transaction id so subscribers can
//! reassemble the original message.

use crate::config::DEFAULT_TOPIC_MESSAGE_CHUNK_SIZE;
use crate::error::{Error, Result};
use crate::ids::TopicId;
use crate::transaction::chunk::ChunkData;
use crate::transaction::data::{chunk_payload, unexpected_body};
use crate::transaction::{ChunkContext, Schedulable, Transaction, TransactionData};
use crate::wire::{ConsensusSubmitMessageBody, SchedulableBodyData, TransactionBodyData};

/// Submits a message to a topic.
pub type TopicMessageSubmitTransaction = Transaction<TopicMessageSubmitData>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessageSubmitData {
    topic_id: Option<TopicId>,
    chunk: ChunkData,
}

impl Default for TopicMessageSubmitData {
    fn default() -> Self {
        Self {
            topic_id: None,
            chunk: ChunkData::with_chunk_size(DEFAULT_TOPIC_MESSAGE_CHUNK_SIZE),
        }
    }
}

impl TopicMessageSubmitData {
    fn body(&self, chunk: Option<&ChunkContext>) -> ConsensusSubmitMessageBody {
        ConsensusSubmitMessageBody {
            topic_id: self.topic_id,
            message: chunk_payload(&self.chunk, chunk).to_vec(),
            chunk_info: chunk.and_then(ChunkContext::info),
        }
    }
}

impl TransactionData for TopicMessageSubmitData {
    fn chunk_data(&self) -> Option<&ChunkData> {
        Some(&self.chunk)
    }

    fn chunk_data_mut(&mut self) -> Option<&mut ChunkData> {
        Some(&mut self.chunk)
    }

    fn validate(&self) -> Result<()> {
        if self.topic_id.is_none() {
            return Err(Error::configuration("topic id is required"));
        }
        Ok(())
    }

    fn to_body_data(&self, chunk: Option<&ChunkContext>) -> TransactionBodyData {
        TransactionBodyData::ConsensusSubmitMessage(self.body(chunk))
    }

    fn from_body_data(chunks: &[TransactionBodyData]) -> Result<Self> {
        let mut topic_id = None;
        let mut slices = Vec::with_capacity(chunks.len());
        for data in chunks {
            let TransactionBodyData::ConsensusSubmitMessage(body) = data else {
                return Err(unexpected_body("ConsensusSubmitMessage", data));
            };
            topic_id = topic_id.or(body.topic_id);
            slices.push(body.message.as_slice());
        }

        Ok(Self {
            topic_id,
            chunk: ChunkData::from_slices(slices, DEFAULT_TOPIC_MESSAGE_CHUNK_SIZE),
        })
    }
}

impl Schedulable for TopicMessageSubmitData {
    fn to_schedulable_body_data(&self) -> SchedulableBodyData {
        SchedulableBodyData::ConsensusSubmitMessage(self.body(None))
    }
}

impl Transaction<TopicMessageSubmitData> {
    pub fn topic_id(&self) -> Option<TopicId> {
        self.data().topic_id
    }

    pub fn set_topic_id(&mut self, topic_id: TopicId) -> Result<&mut Self> {
        self.data_mut("topic_id")?.topic_id = Some(topic_id);
        Ok(self)
    }

    /// The whole message, across all chunks.
    pub fn message(&self) -> &[u8] {
        &self.data().chunk.data
    }

    pub fn set_message(&mut self, message: impl Into<Vec<u8>>) -> Result<&mut Self> {
        self.data_mut("message")?.chunk.data = message.into();
        Ok(self)
    }

    pub fn chunk_size(&self) -> usize {
        self.data().chunk.chunk_size
    }

    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Result<&mut Self> {
        self.data_mut("chunk_size")?.chunk.chunk_size = chunk_size;
        Ok(self)
    }

    pub fn max_chunks(&self) -> usize {
        self.data().chunk.max_chunks
    }

    pub fn set_max_chunks(&mut self, max_chunks: usize) -> Result<&mut Self> {
        self.data_mut("max_chunks")?.chunk.max_chunks = max_chunks;
        Ok(self)
    }
}
