//! Submitting a frozen transaction, one chunk at a time.
//!
//! Each chunk goes through the execution engine separately. Before the next
//! chunk is sent, the previous one's receipt is awaited so the network
//! applies them in order.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::client::Client;
use crate::crypto::sha384;
use crate::error::{Error, Result, TransportError};
use crate::execute::{self, Deadline, Execute};
use crate::ids::AccountId;
use crate::schedule_create::ScheduleCreateTransaction;
use crate::status::Status;
use crate::transaction_id::TransactionId;
use crate::transport::Transport;
use crate::wire::{self, PrecheckResponse, SchedulableTransactionBody, WireTransaction};

use super::builder::Transaction;
use super::data::{Schedulable, TransactionData};
use super::response::TransactionResponse;

/// One chunk of a transaction, as seen by the engine.
struct ChunkExecution<'a, D> {
    transaction: &'a mut Transaction<D>,
    chunk: usize,
}

impl<'a, D: TransactionData> ChunkExecution<'a, D> {
    fn current_transaction_id(&self) -> Option<TransactionId> {
        self.transaction
            .frozen
            .as_ref()
            .and_then(|frozen| frozen.transaction_ids.get(self.chunk).copied())
    }
}

#[async_trait]
impl<'a, D: TransactionData> Execute for ChunkExecution<'a, D> {
    type Request = WireTransaction;
    type Context = (TransactionId, Vec<u8>);
    type Response = PrecheckResponse;
    type Output = TransactionResponse;

    fn node_account_ids(&self) -> &[AccountId] {
        self.transaction
            .frozen
            .as_ref()
            .map(|frozen| frozen.node_account_ids.as_slice())
            .unwrap_or_default()
    }

    fn node_cursor(&self) -> usize {
        self.transaction.node_cursor
    }

    fn set_node_cursor(&mut self, cursor: usize) {
        self.transaction.node_cursor = cursor;
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        self.current_transaction_id()
    }

    fn make_request(&mut self, node_index: usize) -> Result<(WireTransaction, Self::Context)> {
        let envelope = self.transaction.build_envelope(self.chunk, node_index)?;
        let signed_transaction_bytes = wire::encode(&envelope)?;
        let transaction_hash = sha384(&signed_transaction_bytes);
        let transaction_id = self
            .current_transaction_id()
            .ok_or_else(|| Error::configuration("transaction is not frozen"))?;
        Ok((
            WireTransaction {
                signed_transaction_bytes,
            },
            (transaction_id, transaction_hash),
        ))
    }

    async fn send(
        transport: &dyn Transport,
        node: AccountId,
        request: WireTransaction,
    ) -> std::result::Result<PrecheckResponse, TransportError> {
        transport.submit_transaction(node, request).await
    }

    fn precheck_status(response: &PrecheckResponse) -> Status {
        response.node_transaction_precheck_code
    }

    fn regenerate_transaction_id(&mut self, operator: Option<AccountId>) -> bool {
        let chunk = self.chunk;
        let Some(frozen) = self.transaction.frozen.as_mut() else {
            return false;
        };
        let Some(slot) = frozen.transaction_ids.get_mut(chunk) else {
            return false;
        };
        if operator != Some(slot.account_id) {
            return false;
        }
        *slot = TransactionId::generate(slot.account_id);
        true
    }

    fn make_response(
        &self,
        _response: PrecheckResponse,
        (transaction_id, transaction_hash): Self::Context,
        node_account_id: AccountId,
    ) -> Result<TransactionResponse> {
        Ok(TransactionResponse {
            node_account_id,
            transaction_id,
            transaction_hash,
            validate_status: true,
        })
    }
}

impl<D: TransactionData> Transaction<D> {
    /// Submits the transaction, freezing it against `client` first if
    /// needed, and returns the first chunk's response.
    pub async fn execute(&mut self, client: &Client) -> Result<TransactionResponse> {
        self.execute_chunks(client, None).await.and_then(first_response)
    }

    /// Like [`execute`](Self::execute), bounded by an overall deadline. On
    /// expiry the error carries the last retryable failure seen.
    pub async fn execute_with_timeout(
        &mut self,
        client: &Client,
        timeout: Duration,
    ) -> Result<TransactionResponse> {
        self.execute_chunks(client, Some(Deadline::after(timeout)))
            .await
            .and_then(first_response)
    }

    /// Submits every chunk in order and returns one response per chunk.
    pub async fn execute_all(&mut self, client: &Client) -> Result<Vec<TransactionResponse>> {
        self.execute_chunks(client, None).await
    }

    async fn execute_chunks(
        &mut self,
        client: &Client,
        deadline: Option<Deadline>,
    ) -> Result<Vec<TransactionResponse>> {
        if !self.is_frozen() {
            self.freeze_with(client)?;
        }
        if let Some(operator) = client.operator() {
            self.sign(&operator.private_key);
        }

        let chunk_count = self.frozen.as_ref().map_or(0, |frozen| frozen.chunk_count());
        let options = self.options.clone();
        let mut responses = Vec::with_capacity(chunk_count);

        for chunk in 0..chunk_count {
            let mut execution = ChunkExecution {
                transaction: &mut *self,
                chunk,
            };
            let response = execute::execute(client, &mut execution, &options, deadline).await?;
            info!(
                transaction_id = %response.transaction_id,
                node = %response.node_account_id,
                chunk = chunk + 1,
                chunks = chunk_count,
                "transaction accepted"
            );
            if chunk + 1 < chunk_count {
                response.get_receipt_before(client, deadline).await?;
            }
            responses.push(response);
        }

        Ok(responses)
    }
}

fn first_response(responses: Vec<TransactionResponse>) -> Result<TransactionResponse> {
    responses
        .into_iter()
        .next()
        .ok_or_else(|| Error::configuration("transaction has no chunks to submit"))
}

impl<D: Schedulable> Transaction<D> {
    /// Wraps this transaction's body in a schedule-create transaction.
    ///
    /// The inner transaction's id and node list carry over when set.
    /// Payloads that need more than one chunk cannot be scheduled.
    pub fn schedule(&self) -> Result<ScheduleCreateTransaction> {
        if let Some(chunked) = self.data.chunk_data() {
            if chunked.required_chunks() > 1 {
                return Err(Error::configuration(
                    "a payload spanning several chunks cannot be scheduled",
                ));
            }
        }

        let body = SchedulableTransactionBody {
            transaction_fee: self
                .max_transaction_fee()
                .unwrap_or_else(|| self.data.default_max_transaction_fee()),
            memo: self.memo.clone(),
            data: self.data.to_schedulable_body_data(),
        };

        let mut scheduled = ScheduleCreateTransaction::new();
        scheduled.set_scheduled_transaction_body(body)?;
        if let Some(transaction_id) = self.transaction_id() {
            scheduled.set_transaction_id(transaction_id)?;
        }
        if let Some(nodes) = self.node_account_ids() {
            scheduled.set_node_account_ids(nodes.to_vec())?;
        }
        Ok(scheduled)
    }
}
