//! # SDK Configuration & Constants
//!
//! Every default the SDK relies on lives here. Nothing in the execution
//! engine, the chunking code, or the subscription loop reads a mutable
//! global: the constants below seed [`ClientConfig::default`], and the
//! config struct is handed to the [`Client`](crate::Client) explicitly.
//! Tests that want a 1 ms backoff build their own config instead of
//! poking shared state.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::hbar::Hbar;

// ---------------------------------------------------------------------------
// Retry & Backoff
// ---------------------------------------------------------------------------

/// Delay before the first retry. Doubles on every subsequent retry.
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_millis(250);

/// Ceiling for the doubling backoff. Once reached, every further retry
/// waits exactly this long.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Total attempts (first try included) before the engine gives up and
/// surfaces the last error it saw.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

// ---------------------------------------------------------------------------
// Transaction Defaults
// ---------------------------------------------------------------------------

/// How long a transaction stays valid after its start time.
pub const DEFAULT_TRANSACTION_VALID_DURATION: Duration = Duration::from_secs(120);

/// Fee ceiling applied when neither the transaction nor the client sets one.
pub const DEFAULT_MAX_TRANSACTION_FEE: Hbar = Hbar::from_tinybars(200_000_000);

/// Maximum memo length in bytes accepted by the network.
pub const MAX_MEMO_LENGTH: usize = 100;

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

/// Default slice size for topic message submissions.
pub const DEFAULT_TOPIC_MESSAGE_CHUNK_SIZE: usize = 1024;

/// Default slice size for file appends.
pub const DEFAULT_FILE_APPEND_CHUNK_SIZE: usize = 4096;

/// Upper bound on the number of chunks a single logical payload may span.
pub const DEFAULT_MAX_CHUNKS: usize = 20;

/// Offset between the valid-start times of consecutive chunk siblings.
pub const CHUNK_VALID_START_STEP: Duration = Duration::from_nanos(1);

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Tunable knobs for a [`Client`](crate::Client).
///
/// Defaults mirror the constants above. Individual transactions and queries
/// may override `max_attempts` and the backoff bounds for a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Total attempts per `execute` call, first try included.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub min_backoff: Duration,

    /// Cap for the doubling retry delay.
    pub max_backoff: Duration,

    /// Deadline for a single submission to a single node. `None` waits for
    /// the transport to answer or fail on its own.
    pub request_timeout: Option<Duration>,

    /// Fee ceiling used when a transaction does not carry an explicit one.
    /// `None` falls through to the transaction kind's own default.
    pub default_max_transaction_fee: Option<Hbar>,

    /// Whether an expired transaction id may be replaced with a fresh one
    /// and retried.
    pub regenerate_transaction_id: bool,

    /// Limit on how many nodes a transaction is frozen against when the
    /// node list comes from the client. `None` uses every known node.
    pub max_nodes_per_transaction: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_backoff: DEFAULT_MIN_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            request_timeout: None,
            default_max_transaction_fee: None,
            regenerate_transaction_id: true,
            max_nodes_per_transaction: None,
        }
    }
}
