//! Error types for the SDK.
//!
//! Every fallible operation returns [`Error`]. The variants fall into four
//! families that callers usually branch on:
//!
//! - **Configuration**: something required before any network call is
//!   missing or locked (no operator, no nodes, transaction already frozen).
//!   Never retried.
//! - **Transport**: the node could not be reached or the stream broke.
//!   Retried by the execution engine until the attempt budget runs out.
//! - **Precheck / receipt status**: the network looked at the request and
//!   said no. A small set of codes is retryable; the rest are final.
//! - **Malformed input**: bad bytes or an oversized payload, detected
//!   locally before anything is sent.

use std::time::Duration;

use thiserror::Error;

use crate::ids::AccountId;
use crate::status::Status;
use crate::transaction_id::TransactionId;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// Failures reported by a [`Transport`](crate::transport::Transport)
/// implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The node refused the connection or is otherwise unreachable.
    #[error("node unavailable: {0}")]
    Unavailable(String),

    /// An established stream was torn down mid-flight.
    #[error("stream reset: {0}")]
    StreamReset(String),

    /// The per-attempt deadline elapsed before the node answered.
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// The transport itself is broken in a way retrying will not fix.
    #[error("internal transport failure: {0}")]
    Internal(String),
}

impl TransportError {
    /// Whether a fresh attempt (possibly against another node) could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors returned by the SDK.
#[derive(Debug, Error)]
pub enum Error {
    /// Required context (client, operator, node list, fee) is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A setter was called after `freeze`. The node list, identity and
    /// body fields are locked once envelopes exist.
    #[error("transaction is frozen; {field} can no longer be modified")]
    Frozen {
        /// The field the caller tried to change.
        field: &'static str,
    },

    /// Detached signatures only make sense when every envelope signs the
    /// same bytes, which requires a single target node.
    #[error("detached signatures require exactly one node, transaction targets {node_count}")]
    SignatureRequiresSingleNode {
        /// How many nodes the transaction was frozen against.
        node_count: usize,
    },

    /// The node could not be reached or the stream failed.
    #[error("transport error from node {node_account_id}: {source}")]
    Transport {
        /// The node the attempt was sent to.
        node_account_id: AccountId,
        /// What went wrong underneath.
        #[source]
        source: TransportError,
    },

    /// A topic subscription stream failed and could not be resumed.
    #[error("topic stream failed: {source}")]
    Stream {
        /// The last stream failure.
        #[source]
        source: TransportError,
    },

    /// The node rejected the request before consensus.
    #[error("precheck failed with status {status}")]
    PrecheckStatus {
        /// The decoded precheck code.
        status: Status,
        /// The transaction the rejection refers to, if any.
        transaction_id: Option<TransactionId>,
    },

    /// The transaction reached consensus but did not succeed.
    #[error("receipt for transaction {transaction_id} has status {status}")]
    ReceiptStatus {
        /// The receipt status.
        status: Status,
        /// The transaction the receipt belongs to.
        transaction_id: TransactionId,
    },

    /// The payload would need more chunks than the transaction kind allows.
    #[error("payload needs {chunks} chunks but at most {max_chunks} are allowed")]
    ChunkLimitExceeded {
        /// Chunks required at the configured chunk size.
        chunks: usize,
        /// The configured maximum.
        max_chunks: usize,
    },

    /// `from_bytes` was handed nothing to decode.
    #[error("cannot decode a transaction from an empty byte array")]
    EmptyBytes,

    /// A serialized transaction list contains entries of different kinds.
    #[error("transaction list mixes body types: {first} and {other}")]
    MixedTransactionTypes {
        /// Body kind of the first entry.
        first: &'static str,
        /// The first entry whose kind differs.
        other: &'static str,
    },

    /// Bytes could not be decoded into the expected wire structure.
    #[error("failed to decode wire data: {0}")]
    Decode(String),

    /// A wire structure could not be encoded.
    #[error("failed to encode wire data: {0}")]
    Encode(String),

    /// A string did not parse as the requested identifier.
    #[error("failed to parse {kind} from {input:?}")]
    Parse {
        /// The identifier kind being parsed.
        kind: &'static str,
        /// The offending input.
        input: String,
    },

    /// Key bytes were not a valid Ed25519 key or signature.
    #[error("invalid key material: {0}")]
    Key(String),

    /// The whole call exceeded its deadline.
    #[error("timed out after {timeout:?}")]
    TimedOut {
        /// The deadline that elapsed.
        timeout: Duration,
        /// The last attempt error observed before the deadline, if any.
        last_error: Option<Box<Error>>,
    },
}

impl Error {
    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    pub(crate) fn encode(err: impl std::fmt::Display) -> Self {
        Self::Encode(err.to_string())
    }

    /// `true` for errors raised because required context was missing or
    /// locked. These are detected before any network call.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Frozen { .. } | Self::SignatureRequiresSingleNode { .. }
        )
    }

    /// `true` for bad local input: oversized payloads and undecodable bytes.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::ChunkLimitExceeded { .. }
                | Self::EmptyBytes
                | Self::MixedTransactionTypes { .. }
                | Self::Decode(_)
                | Self::Parse { .. }
        )
    }

    /// The network status behind a precheck or receipt failure.
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::PrecheckStatus { status, .. } | Self::ReceiptStatus { status, .. } => {
                Some(*status)
            }
            Self::TimedOut {
                last_error: Some(inner),
                ..
            } => inner.status(),
            _ => None,
        }
    }

    /// The precheck code, for rejections that happened before consensus.
    pub fn precheck_status(&self) -> Option<Status> {
        match self {
            Self::PrecheckStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` when a transport failure could succeed on another attempt.
    pub fn is_retryable_transport(&self) -> bool {
        match self {
            Self::Transport { source, .. } | Self::Stream { source } => source.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_family() {
        assert!(Error::configuration("no operator").is_configuration());
        assert!(Error::Frozen { field: "memo" }.is_configuration());
        assert!(Error::SignatureRequiresSingleNode { node_count: 3 }.is_configuration());
        assert!(!Error::EmptyBytes.is_configuration());
    }

    #[test]
    fn malformed_input_family() {
        assert!(Error::EmptyBytes.is_malformed_input());
        assert!(Error::ChunkLimitExceeded {
            chunks: 30,
            max_chunks: 20
        }
        .is_malformed_input());
        assert!(!Error::configuration("x").is_malformed_input());
    }

    #[test]
    fn status_reaches_through_timeout() {
        let err = Error::TimedOut {
            timeout: Duration::from_secs(1),
            last_error: Some(Box::new(Error::PrecheckStatus {
                status: Status::Busy,
                transaction_id: None,
            })),
        };
        assert_eq!(err.status(), Some(Status::Busy));
        assert_eq!(err.precheck_status(), None);
    }

    #[test]
    fn receipt_failures_have_no_precheck_status() {
        let id = TransactionId::with_valid_start(AccountId::from(2), crate::Timestamp::new(5, 0));
        let err = Error::ReceiptStatus {
            status: Status::InvalidSignature,
            transaction_id: id,
        };
        assert_eq!(err.status(), Some(Status::InvalidSignature));
        assert_eq!(err.precheck_status(), None);
    }

    #[test]
    fn retryable_transport_classification() {
        let wrapped = |source| Error::Transport {
            node_account_id: AccountId::from(3),
            source,
        };
        assert!(wrapped(TransportError::StreamReset("rst".into())).is_retryable_transport());
        assert!(!wrapped(TransportError::Internal("bug".into())).is_retryable_transport());
        assert!(!Error::EmptyBytes.is_retryable_transport());
    }

    #[test]
    fn internal_transport_failures_are_final() {
        assert!(TransportError::Unavailable("refused".into()).is_retryable());
        assert!(TransportError::StreamReset("rst".into()).is_retryable());
        assert!(TransportError::DeadlineExceeded(Duration::from_secs(1)).is_retryable());
        assert!(!TransportError::Internal("bug".into()).is_retryable());
    }

    #[test]
    fn transport_error_display_names_node() {
        let err = Error::Transport {
            node_account_id: AccountId::new(0, 0, 3),
            source: TransportError::Unavailable("connection refused".into()),
        };
        assert_eq!(
            err.to_string(),
            "transport error from node 0.0.3: node unavailable: connection refused"
        );
    }
}
