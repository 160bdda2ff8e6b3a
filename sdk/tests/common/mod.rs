//! Shared helpers for the integration tests: a scripted in-memory transport
//! and a few constructors for clients and keys.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;

use ledger_sdk::config::ClientConfig;
use ledger_sdk::wire::{
    self, ConsensusTopicQuery, ConsensusTopicResponse, PrecheckResponse, Query, QueryResponse,
    ReceiptBody, SignedTransaction, TransactionBody, TransactionList, WireTransaction,
};
use ledger_sdk::{AccountId, Client, PrivateKey, Status, TopicStream, Transport, TransportError};

/// One scripted topic stream.
pub struct ScriptedStream {
    pub events: Vec<Result<ConsensusTopicResponse, TransportError>>,
    /// Keep the stream open after the scripted events instead of ending it.
    pub hang: bool,
}

/// One scripted answer to a submission.
enum SubmitReply {
    Answer(Result<Status, TransportError>),
    /// Never answer.
    Hang,
}

/// A transport that answers from scripts and records every call.
///
/// Unscripted submissions answer `OK`, unscripted receipt queries answer
/// `SUCCESS`, and unscripted subscriptions end immediately.
#[derive(Default)]
pub struct MockTransport {
    prechecks: Mutex<VecDeque<SubmitReply>>,
    receipts: Mutex<VecDeque<QueryResponse>>,
    streams: Mutex<VecDeque<ScriptedStream>>,
    pub submissions: Mutex<Vec<(AccountId, WireTransaction)>>,
    pub queries: Mutex<Vec<(AccountId, Query)>>,
    pub topic_queries: Mutex<Vec<ConsensusTopicQuery>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_precheck(&self, status: Status) {
        self.prechecks.lock().push_back(SubmitReply::Answer(Ok(status)));
    }

    pub fn push_transport_error(&self, error: TransportError) {
        self.prechecks.lock().push_back(SubmitReply::Answer(Err(error)));
    }

    /// The next submission is recorded but never answered.
    pub fn push_hang(&self) {
        self.prechecks.lock().push_back(SubmitReply::Hang);
    }

    pub fn push_receipt(&self, precheck: Status, receipt: Option<Status>) {
        self.receipts.lock().push_back(QueryResponse {
            precheck_code: precheck,
            receipt: receipt.map(ReceiptBody::with_status),
        });
    }

    pub fn push_stream(&self, events: Vec<Result<ConsensusTopicResponse, TransportError>>, hang: bool) {
        self.streams.lock().push_back(ScriptedStream { events, hang });
    }

    /// Nodes the submissions were sent to, in order.
    pub fn submitted_nodes(&self) -> Vec<AccountId> {
        self.submissions.lock().iter().map(|(node, _)| *node).collect()
    }

    /// Decoded bodies of every submission, in order.
    pub fn submitted_bodies(&self) -> Vec<TransactionBody> {
        self.submissions
            .lock()
            .iter()
            .map(|(_, tx)| envelope_of(tx).1)
            .collect()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn submit_transaction(
        &self,
        node: AccountId,
        transaction: WireTransaction,
    ) -> Result<PrecheckResponse, TransportError> {
        self.submissions.lock().push((node, transaction));
        let scripted = self
            .prechecks
            .lock()
            .pop_front()
            .unwrap_or(SubmitReply::Answer(Ok(Status::Ok)));
        match scripted {
            SubmitReply::Answer(answer) => answer.map(|status| PrecheckResponse {
                node_transaction_precheck_code: status,
            }),
            SubmitReply::Hang => futures::future::pending().await,
        }
    }

    async fn submit_query(&self, node: AccountId, query: Query) -> Result<QueryResponse, TransportError> {
        self.queries.lock().push((node, query));
        Ok(self.receipts.lock().pop_front().unwrap_or(QueryResponse {
            precheck_code: Status::Ok,
            receipt: Some(ReceiptBody::with_status(Status::Success)),
        }))
    }

    async fn subscribe_topic(&self, query: ConsensusTopicQuery) -> Result<TopicStream, TransportError> {
        self.topic_queries.lock().push(query);
        let scripted = self.streams.lock().pop_front();
        let Some(ScriptedStream { events, hang }) = scripted else {
            return Ok(futures::stream::empty().boxed());
        };
        let stream = futures::stream::iter(events);
        if hang {
            Ok(stream.chain(futures::stream::pending()).boxed())
        } else {
            Ok(stream.boxed())
        }
    }
}

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// A client over `nodes` with operator `0.0.2`.
pub fn client_with(transport: &Arc<MockTransport>, nodes: &[u64], config: ClientConfig) -> (Client, PrivateKey) {
    let client = Client::new(
        nodes.iter().copied().map(AccountId::from).collect(),
        transport.clone(),
        config,
    );
    let key = PrivateKey::generate();
    client.set_operator(AccountId::from(2), key.clone());
    (client, key)
}

pub fn client(transport: &Arc<MockTransport>, nodes: &[u64]) -> (Client, PrivateKey) {
    client_with(transport, nodes, ClientConfig::default())
}

/// Splits a wire transaction into its signed envelope and decoded body.
pub fn envelope_of(tx: &WireTransaction) -> (SignedTransaction, TransactionBody) {
    let signed: SignedTransaction = wire::decode(&tx.signed_transaction_bytes).unwrap();
    let body: TransactionBody = wire::decode(&signed.body_bytes).unwrap();
    (signed, body)
}

/// Every envelope in serialized `to_bytes` output.
pub fn envelopes_in(bytes: &[u8]) -> Vec<(SignedTransaction, TransactionBody)> {
    let list: TransactionList = wire::decode(bytes).unwrap();
    list.transactions.iter().map(envelope_of).collect()
}
