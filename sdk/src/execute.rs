//! # Execution Engine
//!
//! One retry loop shared by every request kind. A transaction chunk and a
//! receipt query look the same from here: pick a node, build a request for
//! it, send it, classify the answer, and either return, retry elsewhere, or
//! give up.
//!
//! ```text
//!   ┌────────────┐   ┌───────┐   ┌──────────┐
//!   │make_request│──▶│ send  │──▶│ classify │──▶ Success ──▶ make_response
//!   └────────────┘   └───────┘   └──────────┘
//!         ▲                           │
//!         │      backoff + next node  ├──▶ Retry
//!         ├───────────────────────────┘
//!         │      same node, no delay
//!         └────────────────────────────── RegenerateTransactionId
//!                                     └──▶ Fatal ──▶ Err
//! ```
//!
//! Backoff before retry `k` (1-based) is `min(min_backoff * 2^(k-1),
//! max_backoff)`. Regenerating an expired transaction id does not consume
//! an attempt and does not sleep; it has its own budget equal to
//! `max_attempts`.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::{Error, Result, TransportError};
use crate::ids::AccountId;
use crate::status::Status;
use crate::transaction_id::TransactionId;
use crate::transport::Transport;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Per-request overrides of the client's retry configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub max_attempts: Option<u32>,
    pub min_backoff: Option<Duration>,
    pub max_backoff: Option<Duration>,
    pub request_timeout: Option<Duration>,
    pub regenerate_transaction_id: Option<bool>,
}

/// The retry settings in force for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub max_attempts: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub request_timeout: Option<Duration>,
    pub regenerate_transaction_id: bool,
}

impl RetryPolicy {
    pub(crate) fn resolve(config: &ClientConfig, options: &RequestOptions) -> Self {
        Self {
            max_attempts: options.max_attempts.unwrap_or(config.max_attempts),
            min_backoff: options.min_backoff.unwrap_or(config.min_backoff),
            max_backoff: options.max_backoff.unwrap_or(config.max_backoff),
            request_timeout: options.request_timeout.or(config.request_timeout),
            regenerate_transaction_id: options
                .regenerate_transaction_id
                .unwrap_or(config.regenerate_transaction_id),
        }
    }
}

/// Delay before retry number `retry` (1-based).
///
/// ```
/// use ledger_sdk::execute::backoff_delay;
/// use std::time::Duration;
///
/// let min = Duration::from_millis(250);
/// let max = Duration::from_secs(8);
/// assert_eq!(backoff_delay(1, min, max), Duration::from_millis(250));
/// assert_eq!(backoff_delay(3, min, max), Duration::from_secs(1));
/// assert_eq!(backoff_delay(9, min, max), max);
/// ```
pub fn backoff_delay(retry: u32, min_backoff: Duration, max_backoff: Duration) -> Duration {
    let exponent = retry.saturating_sub(1).min(31);
    min_backoff
        .checked_mul(1u32 << exponent)
        .map_or(max_backoff, |delay| delay.min(max_backoff))
}

/// A whole-call deadline shared across every chunk of one execute call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    pub at: Instant,
    pub timeout: Duration,
}

impl Deadline {
    pub(crate) fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
            timeout,
        }
    }
}

// ---------------------------------------------------------------------------
// Execute trait
// ---------------------------------------------------------------------------

/// A request the engine can drive.
#[async_trait]
pub(crate) trait Execute: Send {
    /// What goes on the wire.
    type Request: Send;
    /// Data the response builder needs that the wire request does not keep.
    type Context: Send;
    /// What the node sends back.
    type Response: Send;
    /// What the caller gets on success.
    type Output;

    /// Candidate nodes, in rotation order.
    fn node_account_ids(&self) -> &[AccountId];

    /// Rotation position persisted between execute calls.
    fn node_cursor(&self) -> usize;

    fn set_node_cursor(&mut self, cursor: usize);

    /// The identity errors should refer to.
    fn transaction_id(&self) -> Option<TransactionId>;

    /// Builds the request for the node at `node_index`.
    fn make_request(&mut self, node_index: usize) -> Result<(Self::Request, Self::Context)>;

    async fn send(
        transport: &dyn Transport,
        node: AccountId,
        request: Self::Request,
    ) -> std::result::Result<Self::Response, TransportError>;

    fn precheck_status(response: &Self::Response) -> Status;

    /// Precheck codes worth another attempt.
    fn is_retryable_precheck(status: Status) -> bool {
        status.is_transient()
    }

    /// Retry a response whose precheck passed, e.g. a receipt not yet known.
    fn should_retry(_response: &Self::Response) -> bool {
        false
    }

    /// Swaps in a fresh transaction id after `TRANSACTION_EXPIRED`. Returns
    /// `false` when this request may not regenerate for `operator`.
    fn regenerate_transaction_id(&mut self, _operator: Option<AccountId>) -> bool {
        false
    }

    fn make_response(
        &self,
        response: Self::Response,
        context: Self::Context,
        node_account_id: AccountId,
    ) -> Result<Self::Output>;

    fn make_error(&self, response: &Self::Response) -> Error {
        Error::PrecheckStatus {
            status: Self::precheck_status(response),
            transaction_id: self.transaction_id(),
        }
    }
}

/// Engine bookkeeping for one execute call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExecutionAttempt {
    /// Index into the candidate node list of the next attempt.
    pub node_index: usize,
    /// Attempts made so far.
    pub attempt: u32,
    /// Transaction id regenerations made so far.
    pub regenerations: u32,
    /// Time spent sleeping between attempts.
    pub elapsed_backoff: Duration,
}

impl ExecutionAttempt {
    fn starting_at(node_index: usize) -> Self {
        Self {
            node_index,
            attempt: 0,
            regenerations: 0,
            elapsed_backoff: Duration::ZERO,
        }
    }
}

/// How the engine treats one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Retry,
    RegenerateTransactionId,
    Fatal,
}

fn classify<E: Execute>(response: &E::Response) -> Outcome {
    match E::precheck_status(response) {
        Status::Ok if E::should_retry(response) => Outcome::Retry,
        Status::Ok => Outcome::Success,
        Status::TransactionExpired => Outcome::RegenerateTransactionId,
        status if E::is_retryable_precheck(status) => Outcome::Retry,
        _ => Outcome::Fatal,
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Drives `executable` to completion against `client`'s transport.
pub(crate) async fn execute<E: Execute>(
    client: &Client,
    executable: &mut E,
    options: &RequestOptions,
    deadline: Option<Deadline>,
) -> Result<E::Output> {
    let policy = RetryPolicy::resolve(&client.config(), options);
    let operator = client.operator_account_id();
    let transport = client.transport().as_ref();

    let mut last_error = None;
    let Some(deadline) = deadline else {
        return run_attempts(transport, operator, executable, &policy, &mut last_error).await;
    };

    let outcome = tokio::time::timeout_at(
        deadline.at,
        run_attempts(transport, operator, executable, &policy, &mut last_error),
    )
    .await;

    match outcome {
        Ok(result) => result,
        Err(_) => {
            info!(timeout = ?deadline.timeout, "execution deadline elapsed");
            Err(Error::TimedOut {
                timeout: deadline.timeout,
                last_error: last_error.map(Box::new),
            })
        }
    }
}

async fn run_attempts<E: Execute>(
    transport: &dyn Transport,
    operator: Option<AccountId>,
    executable: &mut E,
    policy: &RetryPolicy,
    last_error: &mut Option<Error>,
) -> Result<E::Output> {
    let node_count = executable.node_account_ids().len();
    if node_count == 0 {
        return Err(Error::configuration("no nodes to send the request to"));
    }

    let mut state = ExecutionAttempt::starting_at(executable.node_cursor() % node_count);
    let mut skip_backoff = true;

    while state.attempt < policy.max_attempts {
        if !skip_backoff {
            let delay = backoff_delay(state.attempt, policy.min_backoff, policy.max_backoff);
            tokio::time::sleep(delay).await;
            state.elapsed_backoff += delay;
        }
        skip_backoff = false;

        let node_index = state.node_index;
        let node = executable.node_account_ids()[node_index];
        let (request, context) = executable.make_request(node_index)?;

        debug!(
            node = %node,
            attempt = state.attempt + 1,
            max_attempts = policy.max_attempts,
            "sending request"
        );

        let sent = match policy.request_timeout {
            Some(limit) => tokio::time::timeout(limit, E::send(transport, node, request))
                .await
                .unwrap_or(Err(TransportError::DeadlineExceeded(limit))),
            None => E::send(transport, node, request).await,
        };

        let response = match sent {
            Ok(response) => response,
            Err(source) if source.is_retryable() => {
                warn!(node = %node, error = %source, "transport failure, trying next node");
                *last_error = Some(Error::Transport {
                    node_account_id: node,
                    source,
                });
                state.attempt += 1;
                advance(executable, &mut state, node_count);
                continue;
            }
            Err(source) => {
                advance(executable, &mut state, node_count);
                return Err(Error::Transport {
                    node_account_id: node,
                    source,
                });
            }
        };

        match classify::<E>(&response) {
            Outcome::Success => {
                advance(executable, &mut state, node_count);
                debug!(
                    node = %node,
                    attempts = state.attempt + 1,
                    regenerations = state.regenerations,
                    backoff = ?state.elapsed_backoff,
                    "request accepted"
                );
                return executable.make_response(response, context, node);
            }
            Outcome::Retry => {
                let error = executable.make_error(&response);
                warn!(node = %node, error = %error, "retryable answer, trying next node");
                *last_error = Some(error);
                state.attempt += 1;
                advance(executable, &mut state, node_count);
            }
            Outcome::RegenerateTransactionId
                if policy.regenerate_transaction_id
                    && state.regenerations < policy.max_attempts
                    && executable.regenerate_transaction_id(operator) =>
            {
                state.regenerations += 1;
                skip_backoff = true;
                info!(
                    node = %node,
                    transaction_id = ?executable.transaction_id().map(|id| id.to_string()),
                    "transaction expired, retrying with a fresh id"
                );
            }
            Outcome::RegenerateTransactionId | Outcome::Fatal => {
                advance(executable, &mut state, node_count);
                return Err(executable.make_error(&response));
            }
        }
    }

    Err(last_error
        .take()
        .unwrap_or_else(|| Error::configuration("max_attempts must be at least 1")))
}

fn advance<E: Execute>(executable: &mut E, state: &mut ExecutionAttempt, node_count: usize) {
    state.node_index = (state.node_index + 1) % node_count;
    executable.set_node_cursor(state.node_index);
}
