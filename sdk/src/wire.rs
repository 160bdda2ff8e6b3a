//! # Wire Schema
//!
//! The binary structures exchanged with nodes. Everything here is plain
//! data with a `bincode` encoding; the lifecycle logic lives in
//! [`crate::transaction`].
//!
//! ```text
//! TransactionList
//!   └─ WireTransaction            one per (chunk, node)
//!        └─ signed_transaction_bytes ── SignedTransaction
//!                                         ├─ body_bytes ── TransactionBody
//!                                         └─ sig_map    ── [SignaturePair]
//! ```
//!
//! Body bytes are the unit of signing. Because the encoding is
//! deterministic, re-rendering an unchanged body yields identical bytes,
//! which is what lets a deserialized transaction re-serialize bit-exactly.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::crypto::PublicKey;
use crate::error::{Error, Result};
use crate::hbar::Hbar;
use crate::ids::{AccountId, FileId, ScheduleId, TopicId};
use crate::status::Status;
use crate::timestamp::Timestamp;
use crate::transaction_id::TransactionId;

/// Encodes a wire structure.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(Error::encode)
}

/// Decodes a wire structure.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(Error::decode)
}

// ---------------------------------------------------------------------------
// Transaction bodies
// ---------------------------------------------------------------------------

/// The signable body of a transaction, rendered once per (chunk, node).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBody {
    /// Payer and valid-start. Absent only in unfrozen drafts.
    pub transaction_id: Option<TransactionId>,
    /// The node this body is addressed to. Absent only in unfrozen drafts.
    pub node_account_id: Option<AccountId>,
    /// Fee ceiling. Zero means "not set" in drafts.
    pub transaction_fee: Hbar,
    /// Validity window length.
    pub transaction_valid_duration: Duration,
    /// Free-form memo.
    pub memo: String,
    /// The kind-specific payload.
    pub data: TransactionBodyData,
}

/// Kind-discriminated payload of a [`TransactionBody`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionBodyData {
    CryptoTransfer(CryptoTransferBody),
    ConsensusSubmitMessage(ConsensusSubmitMessageBody),
    FileAppend(FileAppendBody),
    ScheduleCreate(ScheduleCreateBody),
}

impl TransactionBodyData {
    /// Stable name of the body kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CryptoTransfer(_) => "CryptoTransfer",
            Self::ConsensusSubmitMessage(_) => "ConsensusSubmitMessage",
            Self::FileAppend(_) => "FileAppend",
            Self::ScheduleCreate(_) => "ScheduleCreate",
        }
    }
}

/// A single debit or credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAmount {
    pub account_id: AccountId,
    pub amount: Hbar,
}

/// Moves value between accounts. Amounts must sum to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoTransferBody {
    pub transfers: Vec<AccountAmount>,
}

/// Position of one chunk inside a chunked payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkInfo {
    /// Identity of chunk 1; shared by every sibling.
    pub initial_transaction_id: TransactionId,
    /// 1-based position.
    pub number: u32,
    /// Chunks in the series.
    pub total: u32,
}

/// Publishes a message (or one chunk of it) to a topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusSubmitMessageBody {
    pub topic_id: Option<TopicId>,
    pub message: Vec<u8>,
    pub chunk_info: Option<ChunkInfo>,
}

/// Appends bytes (or one chunk of them) to a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAppendBody {
    pub file_id: Option<FileId>,
    pub contents: Vec<u8>,
}

/// Wraps another body for deferred, multi-party execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleCreateBody {
    pub scheduled_transaction_body: Option<SchedulableTransactionBody>,
    pub memo: String,
    pub payer_account_id: Option<AccountId>,
}

/// The subset of a [`TransactionBody`] that can be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulableTransactionBody {
    pub transaction_fee: Hbar,
    pub memo: String,
    pub data: SchedulableBodyData,
}

/// Body kinds that may appear inside a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulableBodyData {
    CryptoTransfer(CryptoTransferBody),
    ConsensusSubmitMessage(ConsensusSubmitMessageBody),
    FileAppend(FileAppendBody),
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// One signature over a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePair {
    pub public_key: PublicKey,
    pub signature: Vec<u8>,
}

/// Ordered signatures attached to one body. Order is preserved on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureMap {
    pub pairs: Vec<SignaturePair>,
}

impl SignatureMap {
    /// Whether `key` already signed.
    pub fn contains(&self, key: &PublicKey) -> bool {
        self.pairs.iter().any(|pair| pair.public_key == *key)
    }
}

/// Body bytes plus signatures: the signable envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub body_bytes: Vec<u8>,
    pub sig_map: SignatureMap,
}

/// What a node actually receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTransaction {
    pub signed_transaction_bytes: Vec<u8>,
}

/// The serialized form produced by `to_bytes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionList {
    pub transactions: Vec<WireTransaction>,
}

/// A node's synchronous answer to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecheckResponse {
    pub node_transaction_precheck_code: Status,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// A request served by a single node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Query {
    TransactionGetReceipt { transaction_id: TransactionId },
}

/// The answer to a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub precheck_code: Status,
    pub receipt: Option<ReceiptBody>,
}

/// Outcome of a transaction after consensus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptBody {
    pub status: Status,
    pub account_id: Option<AccountId>,
    pub file_id: Option<FileId>,
    pub schedule_id: Option<ScheduleId>,
    pub scheduled_transaction_id: Option<TransactionId>,
    pub topic_sequence_number: u64,
    pub topic_running_hash: Vec<u8>,
}

impl ReceiptBody {
    /// A receipt carrying only a status.
    pub fn with_status(status: Status) -> Self {
        Self {
            status,
            account_id: None,
            file_id: None,
            schedule_id: None,
            scheduled_transaction_id: None,
            topic_sequence_number: 0,
            topic_running_hash: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Topic streams
// ---------------------------------------------------------------------------

/// Subscription request for a topic's message stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusTopicQuery {
    pub topic_id: TopicId,
    pub consensus_start_time: Option<Timestamp>,
    pub consensus_end_time: Option<Timestamp>,
    /// Zero means unlimited.
    pub limit: u64,
}

/// One server-pushed notification: a whole message or one chunk of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusTopicResponse {
    pub consensus_timestamp: Timestamp,
    pub message: Vec<u8>,
    pub running_hash: Vec<u8>,
    pub sequence_number: u64,
    pub chunk_info: Option<ChunkInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;

    fn sample_body() -> TransactionBody {
        TransactionBody {
            transaction_id: Some(TransactionId::with_valid_start(
                AccountId::from(2),
                Timestamp::new(1_700_000_000, 0),
            )),
            node_account_id: Some(AccountId::from(3)),
            transaction_fee: Hbar::from_tinybars(100_000),
            transaction_valid_duration: Duration::from_secs(120),
            memo: "hi".into(),
            data: TransactionBodyData::ConsensusSubmitMessage(ConsensusSubmitMessageBody {
                topic_id: Some(TopicId::from(9)),
                message: b"hello".to_vec(),
                chunk_info: None,
            }),
        }
    }

    #[test]
    fn body_encoding_is_deterministic() {
        let a = encode(&sample_body()).unwrap();
        let b = encode(&sample_body()).unwrap();
        assert_eq!(a, b);
        assert_eq!(decode::<TransactionBody>(&a).unwrap(), sample_body());
    }

    #[test]
    fn node_field_changes_body_bytes() {
        let mut other = sample_body();
        other.node_account_id = Some(AccountId::from(4));
        assert_ne!(encode(&sample_body()).unwrap(), encode(&other).unwrap());
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode::<SignedTransaction>(&[0xff; 3]).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn signature_map_lookup() {
        let key = PrivateKey::generate().public_key();
        let mut map = SignatureMap::default();
        assert!(!map.contains(&key));
        map.pairs.push(SignaturePair {
            public_key: key,
            signature: vec![1; 64],
        });
        assert!(map.contains(&key));
    }

    #[test]
    fn body_kind_names() {
        assert_eq!(sample_body().data.kind(), "ConsensusSubmitMessage");
        assert_eq!(
            TransactionBodyData::CryptoTransfer(CryptoTransferBody::default()).kind(),
            "CryptoTransfer"
        );
    }
}
