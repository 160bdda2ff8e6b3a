//! Long-lived topic subscriptions.
//!
//! `subscribe` spawns a task that owns the stream. The task feeds every
//! notification through a [`ChunkCollector`] and calls the handler with each
//! completed message, one at a time, so a slow handler slows the stream
//! down rather than piling up messages.
//!
//! When the stream breaks with a retryable error the task reconnects after
//! a backoff, resuming just after the last timestamp it saw. Partially
//! collected messages survive the reconnect.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::error::{Error, Result, TransportError};
use crate::execute::backoff_delay;
use crate::ids::TopicId;
use crate::timestamp::Timestamp;
use crate::transport::Transport;
use crate::wire::ConsensusTopicQuery;

use super::reassembly::{ChunkCollector, TopicMessage};

/// Called with every completed message.
pub type MessageHandler = Arc<dyn Fn(TopicMessage) + Send + Sync>;

/// Called once when the subscription gives up.
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Describes which messages to receive.
#[derive(Clone)]
pub struct TopicMessageQuery {
    topic_id: Option<TopicId>,
    start_time: Option<Timestamp>,
    end_time: Option<Timestamp>,
    limit: u64,
    max_attempts: Option<u32>,
    max_backoff: Option<Duration>,
    error_handler: Option<ErrorHandler>,
}

impl Default for TopicMessageQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicMessageQuery {
    pub fn new() -> Self {
        Self {
            topic_id: None,
            start_time: None,
            end_time: None,
            limit: 0,
            max_attempts: None,
            max_backoff: None,
            error_handler: None,
        }
    }

    pub fn set_topic_id(&mut self, topic_id: TopicId) -> &mut Self {
        self.topic_id = Some(topic_id);
        self
    }

    /// Receive messages with consensus timestamps at or after `start`.
    pub fn set_start_time(&mut self, start: Timestamp) -> &mut Self {
        self.start_time = Some(start);
        self
    }

    /// Stop once consensus passes `end`.
    pub fn set_end_time(&mut self, end: Timestamp) -> &mut Self {
        self.end_time = Some(end);
        self
    }

    /// Stop after `limit` notifications. Zero means no limit.
    pub fn set_limit(&mut self, limit: u64) -> &mut Self {
        self.limit = limit;
        self
    }

    /// Reconnect attempts before giving up.
    pub fn set_max_attempts(&mut self, max_attempts: u32) -> &mut Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn set_max_backoff(&mut self, max_backoff: Duration) -> &mut Self {
        self.max_backoff = Some(max_backoff);
        self
    }

    /// Handler invoked with the terminal error when the subscription ends
    /// abnormally. Without one the error is logged.
    pub fn set_error_handler(&mut self, handler: impl Fn(&Error) + Send + Sync + 'static) -> &mut Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Starts delivering messages to `on_message` on a background task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe(
        &self,
        client: &Client,
        on_message: impl Fn(TopicMessage) + Send + Sync + 'static,
    ) -> Result<SubscriptionHandle> {
        let topic_id = self
            .topic_id
            .ok_or_else(|| Error::configuration("topic id is required to subscribe"))?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| Error::configuration("subscribe must be called inside a Tokio runtime"))?;

        let config = client.config();
        let worker = SubscriptionWorker {
            transport: client.transport().clone(),
            query: ConsensusTopicQuery {
                topic_id,
                consensus_start_time: self.start_time,
                consensus_end_time: self.end_time,
                limit: self.limit,
            },
            max_attempts: self.max_attempts.unwrap_or(config.max_attempts),
            min_backoff: config.min_backoff,
            max_backoff: self.max_backoff.unwrap_or(config.max_backoff),
            on_message: Arc::new(on_message),
            error_handler: self.error_handler.clone(),
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = runtime.spawn(worker.run(shutdown_rx));
        info!(topic_id = %topic_id, "topic subscription started");

        Ok(SubscriptionHandle {
            shutdown: shutdown_tx,
            task,
        })
    }
}

impl std::fmt::Debug for TopicMessageQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicMessageQuery")
            .field("topic_id", &self.topic_id)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

/// Controls a running subscription. Dropping the handle cancels it.
#[derive(Debug)]
pub struct SubscriptionHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Stops the subscription. No handler calls start after this returns
    /// control to the runtime; partially received messages are discarded.
    pub fn unsubscribe(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Whether the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the subscription to end on its own: stream completion,
    /// the limit, an unrecoverable error, or `unsubscribe`.
    pub async fn join(self) {
        let Self { shutdown, task } = self;
        if let Err(err) = task.await {
            warn!(error = %err, "topic subscription task failed");
        }
        drop(shutdown);
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

struct SubscriptionWorker {
    transport: Arc<dyn Transport>,
    query: ConsensusTopicQuery,
    max_attempts: u32,
    min_backoff: Duration,
    max_backoff: Duration,
    on_message: MessageHandler,
    error_handler: Option<ErrorHandler>,
}

/// Why one stream connection ended.
enum StreamEnd {
    Completed,
    Cancelled,
    Failed(TransportError),
}

impl SubscriptionWorker {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut collector = ChunkCollector::new();
        let mut attempt = 0u32;
        let mut received = 0u64;
        let mut last_timestamp: Option<Timestamp> = None;

        loop {
            let failure = match self
                .stream_once(&mut shutdown, &mut collector, &mut received, &mut last_timestamp, &mut attempt)
                .await
            {
                StreamEnd::Completed => {
                    debug!(topic_id = %self.query.topic_id, "topic stream completed");
                    return;
                }
                StreamEnd::Cancelled => {
                    debug!(topic_id = %self.query.topic_id, "topic subscription cancelled");
                    return;
                }
                StreamEnd::Failed(error) => error,
            };

            if !failure.is_retryable() || attempt >= self.max_attempts {
                self.report(Error::Stream { source: failure });
                return;
            }
            attempt += 1;

            let delay = backoff_delay(attempt, self.min_backoff, self.max_backoff);
            warn!(
                topic_id = %self.query.topic_id,
                error = %failure,
                attempt,
                delay = ?delay,
                "topic stream failed, reconnecting"
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {
                    debug!(topic_id = %self.query.topic_id, "topic subscription cancelled during backoff");
                    return;
                }
            }

            if let Some(last) = last_timestamp {
                self.query.consensus_start_time = Some(last.plus(Duration::from_nanos(1)));
            }
            if self.query.limit > 0 {
                let remaining = self.query.limit.saturating_sub(received);
                if remaining == 0 {
                    return;
                }
                self.query.limit = remaining;
                received = 0;
            }
        }
    }

    /// Runs one stream connection to its end.
    async fn stream_once(
        &self,
        shutdown: &mut watch::Receiver<bool>,
        collector: &mut ChunkCollector,
        received: &mut u64,
        last_timestamp: &mut Option<Timestamp>,
        attempt: &mut u32,
    ) -> StreamEnd {
        if *shutdown.borrow() {
            return StreamEnd::Cancelled;
        }

        let opened = tokio::select! {
            opened = self.transport.subscribe_topic(self.query.clone()) => opened,
            _ = shutdown.changed() => return StreamEnd::Cancelled,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(error) => return StreamEnd::Failed(error),
        };

        loop {
            let next = tokio::select! {
                next = stream.next() => next,
                _ = shutdown.changed() => return StreamEnd::Cancelled,
            };

            match next {
                None => return StreamEnd::Completed,
                Some(Err(error)) => return StreamEnd::Failed(error),
                Some(Ok(response)) => {
                    *attempt = 0;
                    *received += 1;
                    *last_timestamp = Some(response.consensus_timestamp);
                    if let Some(message) = collector.push(response) {
                        (self.on_message)(message);
                    }
                }
            }
        }
    }

    fn report(&self, error: Error) {
        match &self.error_handler {
            Some(handler) => handler(&error),
            None => warn!(topic_id = %self.query.topic_id, error = %error, "topic subscription ended"),
        }
    }
}
