//! What a node hands back when it accepts a transaction.

use std::fmt;

use crate::client::Client;
use crate::error::Result;
use crate::execute::Deadline;
use crate::ids::AccountId;
use crate::receipt::{TransactionReceipt, TransactionReceiptQuery};
use crate::transaction_id::TransactionId;

/// Handle to a submitted transaction.
///
/// Acceptance only means the node passed precheck. Whether the transaction
/// actually succeeded is in its receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResponse {
    /// The node that accepted the submission.
    pub node_account_id: AccountId,
    /// The identity the node accepted, which differs from the one frozen
    /// if it had to be regenerated.
    pub transaction_id: TransactionId,
    /// SHA-384 of the submitted envelope bytes.
    pub transaction_hash: Vec<u8>,
    /// Whether `get_receipt` fails on a non-success receipt status.
    pub validate_status: bool,
}

impl TransactionResponse {
    pub fn set_validate_status(&mut self, validate: bool) -> &mut Self {
        self.validate_status = validate;
        self
    }

    /// A receipt query aimed at the node that accepted the transaction.
    pub fn receipt_query(&self) -> TransactionReceiptQuery {
        let mut query = TransactionReceiptQuery::new(self.transaction_id);
        query
            .set_node_account_ids(vec![self.node_account_id])
            .set_validate_status(self.validate_status);
        query
    }

    /// Waits for the receipt.
    pub async fn get_receipt(&self, client: &Client) -> Result<TransactionReceipt> {
        self.receipt_query().execute(client).await
    }

    pub(crate) async fn get_receipt_before(
        &self,
        client: &Client,
        deadline: Option<Deadline>,
    ) -> Result<TransactionReceipt> {
        self.receipt_query().execute_before(client, deadline).await
    }
}

impl fmt::Display for TransactionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} via {} ({})",
            self.transaction_id,
            self.node_account_id,
            hex::encode(&self.transaction_hash)
        )
    }
}
