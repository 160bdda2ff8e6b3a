//! The seam between the SDK and the network.
//!
//! The SDK never opens sockets itself. A [`Transport`] is handed to the
//! [`Client`](crate::Client) and is expected to own a connection pool keyed
//! by node id. The execution engine only needs three calls: submit a
//! transaction, submit a query, and open a topic stream.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::TransportError;
use crate::ids::AccountId;
use crate::wire::{
    ConsensusTopicQuery, ConsensusTopicResponse, PrecheckResponse, Query, QueryResponse,
    WireTransaction,
};

/// Server-push stream of topic notifications.
pub type TopicStream = BoxStream<'static, Result<ConsensusTopicResponse, TransportError>>;

/// A connection to the ledger's nodes.
///
/// Implementations must be safe to share across tasks: many transactions
/// may be executing through the same transport at once.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a signed transaction to `node` and returns its precheck answer.
    async fn submit_transaction(
        &self,
        node: AccountId,
        transaction: WireTransaction,
    ) -> Result<PrecheckResponse, TransportError>;

    /// Sends a query to `node`.
    async fn submit_query(&self, node: AccountId, query: Query) -> Result<QueryResponse, TransportError>;

    /// Opens a topic subscription stream.
    async fn subscribe_topic(&self, query: ConsensusTopicQuery) -> Result<TopicStream, TransportError>;
}
