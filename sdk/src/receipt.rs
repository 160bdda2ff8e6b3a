//! # Receipts
//!
//! A receipt is the post-consensus outcome of a transaction. Nodes answer
//! `UNKNOWN` until consensus is reached, so the receipt query treats that
//! status as "ask again later" and lets the execution engine back off.

use std::time::Duration;

use async_trait::async_trait;

use crate::client::Client;
use crate::error::{Error, Result, TransportError};
use crate::execute::{self, Deadline, Execute, RequestOptions};
use crate::ids::{AccountId, FileId, ScheduleId};
use crate::status::Status;
use crate::transaction_id::TransactionId;
use crate::transport::Transport;
use crate::wire::{Query, QueryResponse, ReceiptBody};

/// The outcome of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_id: TransactionId,
    pub status: Status,
    pub account_id: Option<AccountId>,
    pub file_id: Option<FileId>,
    pub schedule_id: Option<ScheduleId>,
    pub scheduled_transaction_id: Option<TransactionId>,
    pub topic_sequence_number: u64,
    pub topic_running_hash: Vec<u8>,
}

impl TransactionReceipt {
    pub(crate) fn from_body(transaction_id: TransactionId, body: ReceiptBody) -> Self {
        Self {
            transaction_id,
            status: body.status,
            account_id: body.account_id,
            file_id: body.file_id,
            schedule_id: body.schedule_id,
            scheduled_transaction_id: body.scheduled_transaction_id,
            topic_sequence_number: body.topic_sequence_number,
            topic_running_hash: body.topic_running_hash,
        }
    }

    /// Fails with [`Error::ReceiptStatus`] unless the status is `SUCCESS`.
    pub fn validate_status(self) -> Result<Self> {
        if self.status != Status::Success {
            return Err(Error::ReceiptStatus {
                status: self.status,
                transaction_id: self.transaction_id,
            });
        }
        Ok(self)
    }
}

/// Fetches the receipt of a transaction.
#[derive(Debug, Clone)]
pub struct TransactionReceiptQuery {
    transaction_id: TransactionId,
    node_account_ids: Option<Vec<AccountId>>,
    resolved_nodes: Vec<AccountId>,
    validate_status: bool,
    options: RequestOptions,
    node_cursor: usize,
}

impl TransactionReceiptQuery {
    pub fn new(transaction_id: TransactionId) -> Self {
        Self {
            transaction_id,
            node_account_ids: None,
            resolved_nodes: Vec::new(),
            validate_status: true,
            options: RequestOptions::default(),
            node_cursor: 0,
        }
    }

    /// Restricts the query to these nodes. Defaults to every client node.
    pub fn set_node_account_ids(&mut self, nodes: Vec<AccountId>) -> &mut Self {
        self.node_account_ids = Some(nodes);
        self
    }

    /// Whether a non-success receipt is returned as an error. On by default.
    pub fn set_validate_status(&mut self, validate: bool) -> &mut Self {
        self.validate_status = validate;
        self
    }

    pub fn set_max_attempts(&mut self, max_attempts: u32) -> &mut Self {
        self.options.max_attempts = Some(max_attempts);
        self
    }

    pub fn set_min_backoff(&mut self, min_backoff: Duration) -> &mut Self {
        self.options.min_backoff = Some(min_backoff);
        self
    }

    pub fn set_max_backoff(&mut self, max_backoff: Duration) -> &mut Self {
        self.options.max_backoff = Some(max_backoff);
        self
    }

    pub async fn execute(&mut self, client: &Client) -> Result<TransactionReceipt> {
        self.execute_before(client, None).await
    }

    /// Like [`execute`](Self::execute), bounded by an overall deadline.
    pub async fn execute_with_timeout(
        &mut self,
        client: &Client,
        timeout: Duration,
    ) -> Result<TransactionReceipt> {
        self.execute_before(client, Some(Deadline::after(timeout))).await
    }

    pub(crate) async fn execute_before(
        &mut self,
        client: &Client,
        deadline: Option<Deadline>,
    ) -> Result<TransactionReceipt> {
        self.resolved_nodes = self
            .node_account_ids
            .clone()
            .unwrap_or_else(|| client.node_account_ids().to_vec());
        let options = self.options.clone();
        execute::execute(client, self, &options, deadline).await
    }
}

#[async_trait]
impl Execute for TransactionReceiptQuery {
    type Request = Query;
    type Context = ();
    type Response = QueryResponse;
    type Output = TransactionReceipt;

    fn node_account_ids(&self) -> &[AccountId] {
        &self.resolved_nodes
    }

    fn node_cursor(&self) -> usize {
        self.node_cursor
    }

    fn set_node_cursor(&mut self, cursor: usize) {
        self.node_cursor = cursor;
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        Some(self.transaction_id)
    }

    fn make_request(&mut self, _node_index: usize) -> Result<(Query, ())> {
        Ok((
            Query::TransactionGetReceipt {
                transaction_id: self.transaction_id,
            },
            (),
        ))
    }

    async fn send(
        transport: &dyn Transport,
        node: AccountId,
        request: Query,
    ) -> std::result::Result<QueryResponse, TransportError> {
        transport.submit_query(node, request).await
    }

    fn precheck_status(response: &QueryResponse) -> Status {
        response.precheck_code
    }

    fn is_retryable_precheck(status: Status) -> bool {
        status.is_transient() || matches!(status, Status::Unknown | Status::ReceiptNotFound)
    }

    fn should_retry(response: &QueryResponse) -> bool {
        response
            .receipt
            .as_ref()
            .map_or(true, |receipt| receipt.status == Status::Unknown)
    }

    fn make_response(
        &self,
        response: QueryResponse,
        _context: (),
        _node_account_id: AccountId,
    ) -> Result<TransactionReceipt> {
        let body = response
            .receipt
            .ok_or_else(|| Error::Decode("receipt response carried no receipt".into()))?;
        let receipt = TransactionReceipt::from_body(self.transaction_id, body);
        if self.validate_status {
            return receipt.validate_status();
        }
        Ok(receipt)
    }

    fn make_error(&self, response: &QueryResponse) -> Error {
        match (&response.precheck_code, &response.receipt) {
            (Status::Ok, Some(receipt)) => Error::ReceiptStatus {
                status: receipt.status,
                transaction_id: self.transaction_id,
            },
            (status, _) => Error::PrecheckStatus {
                status: *status,
                transaction_id: Some(self.transaction_id),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::Timestamp;

    fn id() -> TransactionId {
        TransactionId::with_valid_start(AccountId::from(2), Timestamp::new(1_700_000_000, 0))
    }

    #[test]
    fn validate_status_accepts_success_only() {
        let ok = TransactionReceipt::from_body(id(), ReceiptBody::with_status(Status::Success));
        assert!(ok.validate_status().is_ok());

        let failed = TransactionReceipt::from_body(id(), ReceiptBody::with_status(Status::InvalidSignature));
        let err = failed.validate_status().unwrap_err();
        assert_eq!(err.status(), Some(Status::InvalidSignature));
    }

    #[test]
    fn unknown_receipts_are_retried() {
        let pending = QueryResponse {
            precheck_code: Status::Ok,
            receipt: Some(ReceiptBody::with_status(Status::Unknown)),
        };
        let done = QueryResponse {
            precheck_code: Status::Ok,
            receipt: Some(ReceiptBody::with_status(Status::Success)),
        };
        assert!(TransactionReceiptQuery::should_retry(&pending));
        assert!(!TransactionReceiptQuery::should_retry(&done));
        assert!(TransactionReceiptQuery::is_retryable_precheck(Status::ReceiptNotFound));
        assert!(!TransactionReceiptQuery::is_retryable_precheck(Status::InvalidTransaction));
    }

    #[test]
    fn pending_receipt_error_names_receipt_status() {
        let query = TransactionReceiptQuery::new(id());
        let err = query.make_error(&QueryResponse {
            precheck_code: Status::Ok,
            receipt: Some(ReceiptBody::with_status(Status::Unknown)),
        });
        assert!(matches!(
            err,
            Error::ReceiptStatus {
                status: Status::Unknown,
                ..
            }
        ));
    }
}
