//! Network-reported status codes.
//!
//! The full table has hundreds of entries; the SDK only needs to recognise
//! the handful that drive retry decisions and the common rejections callers
//! branch on. Anything else round-trips as [`Status::Unrecognized`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// A precheck or receipt status returned by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Status {
    Ok,
    InvalidTransaction,
    PayerAccountNotFound,
    InvalidNodeAccount,
    TransactionExpired,
    InvalidTransactionStart,
    InvalidTransactionDuration,
    InvalidSignature,
    MemoTooLong,
    InsufficientTxFee,
    InsufficientPayerBalance,
    DuplicateTransaction,
    Busy,
    NotSupported,
    InvalidFileId,
    InvalidAccountId,
    InvalidTopicId,
    InvalidChunkNumber,
    InvalidChunkTransactionId,
    MessageSizeTooLarge,
    InvalidScheduleId,
    PlatformTransactionNotCreated,
    PlatformNotActive,
    ReceiptNotFound,
    Unknown,
    Success,
    /// A code this SDK version does not know by name.
    Unrecognized(i32),
}

impl Status {
    /// Precheck codes that mean "this node cannot take it right now";
    /// the same request may succeed on a retry.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Busy | Self::PlatformNotActive | Self::PlatformTransactionNotCreated
        )
    }

    fn name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::InvalidTransaction => "INVALID_TRANSACTION",
            Self::PayerAccountNotFound => "PAYER_ACCOUNT_NOT_FOUND",
            Self::InvalidNodeAccount => "INVALID_NODE_ACCOUNT",
            Self::TransactionExpired => "TRANSACTION_EXPIRED",
            Self::InvalidTransactionStart => "INVALID_TRANSACTION_START",
            Self::InvalidTransactionDuration => "INVALID_TRANSACTION_DURATION",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::MemoTooLong => "MEMO_TOO_LONG",
            Self::InsufficientTxFee => "INSUFFICIENT_TX_FEE",
            Self::InsufficientPayerBalance => "INSUFFICIENT_PAYER_BALANCE",
            Self::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            Self::Busy => "BUSY",
            Self::NotSupported => "NOT_SUPPORTED",
            Self::InvalidFileId => "INVALID_FILE_ID",
            Self::InvalidAccountId => "INVALID_ACCOUNT_ID",
            Self::InvalidTopicId => "INVALID_TOPIC_ID",
            Self::InvalidChunkNumber => "INVALID_CHUNK_NUMBER",
            Self::InvalidChunkTransactionId => "INVALID_CHUNK_TRANSACTION_ID",
            Self::MessageSizeTooLarge => "MESSAGE_SIZE_TOO_LARGE",
            Self::InvalidScheduleId => "INVALID_SCHEDULE_ID",
            Self::PlatformTransactionNotCreated => "PLATFORM_TRANSACTION_NOT_CREATED",
            Self::PlatformNotActive => "PLATFORM_NOT_ACTIVE",
            Self::ReceiptNotFound => "RECEIPT_NOT_FOUND",
            Self::Unknown => "UNKNOWN",
            Self::Success => "SUCCESS",
            Self::Unrecognized(_) => "UNRECOGNIZED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(code) => write!(f, "UNRECOGNIZED({})", code),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_set_is_exactly_the_overload_codes() {
        assert!(Status::Busy.is_transient());
        assert!(Status::PlatformNotActive.is_transient());
        assert!(Status::PlatformTransactionNotCreated.is_transient());
        assert!(!Status::TransactionExpired.is_transient());
        assert!(!Status::InvalidAccountId.is_transient());
        assert!(!Status::Ok.is_transient());
    }

    #[test]
    fn display_uses_wire_names() {
        assert_eq!(Status::InvalidAccountId.to_string(), "INVALID_ACCOUNT_ID");
        assert_eq!(Status::Unrecognized(9999).to_string(), "UNRECOGNIZED(9999)");
    }
}
