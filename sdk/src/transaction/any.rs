//! Serialization to and from the `TransactionList` byte form.
//!
//! A frozen transaction serializes every (chunk, node) envelope with its
//! signatures. An unfrozen draft serializes a single unsigned entry with no
//! node id and the whole, unsplit payload. Decoding tells the two apart by
//! whether every entry carries both a node id and a transaction id.

use tracing::debug;

use crate::error::{Error, Result};
use crate::file_append::FileAppendTransaction;
use crate::schedule_create::ScheduleCreateTransaction;
use crate::topic_message_submit::TopicMessageSubmitTransaction;
use crate::transaction_id::TransactionId;
use crate::transfer::TransferTransaction;
use crate::wire::{
    self, SignatureMap, SignedTransaction, TransactionBody, TransactionBodyData, TransactionList,
    WireTransaction,
};

use super::builder::{FrozenState, Transaction};
use super::chunk;
use super::data::TransactionData;
use super::signing::Signers;
use crate::execute::RequestOptions;

/// One decoded list entry.
#[derive(Debug, Clone)]
pub(crate) struct DecodedEntry {
    pub signed: SignedTransaction,
    pub body: TransactionBody,
}

/// Decodes a `TransactionList`, checking that it is non-empty and that
/// every entry has the same body kind.
pub(crate) fn decode_entries(bytes: &[u8]) -> Result<Vec<DecodedEntry>> {
    if bytes.is_empty() {
        return Err(Error::EmptyBytes);
    }
    let list: TransactionList = wire::decode(bytes)?;
    if list.transactions.is_empty() {
        return Err(Error::EmptyBytes);
    }

    let entries = list
        .transactions
        .iter()
        .map(|wire_tx| {
            let signed: SignedTransaction = wire::decode(&wire_tx.signed_transaction_bytes)?;
            let body: TransactionBody = wire::decode(&signed.body_bytes)?;
            Ok(DecodedEntry { signed, body })
        })
        .collect::<Result<Vec<_>>>()?;

    let first = entries[0].body.data.kind();
    if let Some(other) = entries
        .iter()
        .map(|entry| entry.body.data.kind())
        .find(|kind| *kind != first)
    {
        return Err(Error::MixedTransactionTypes { first, other });
    }
    Ok(entries)
}

impl<D: TransactionData> Transaction<D> {
    /// Serializes the transaction.
    ///
    /// Frozen transactions emit every envelope, signed by every registered
    /// signer. Unfrozen ones emit a single unsigned draft entry.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let layout = self
            .frozen
            .as_ref()
            .map(|frozen| (frozen.chunk_count(), frozen.node_count()));

        let transactions = match layout {
            None => {
                let draft = SignedTransaction {
                    body_bytes: wire::encode(&self.draft_body())?,
                    sig_map: SignatureMap::default(),
                };
                vec![WireTransaction {
                    signed_transaction_bytes: wire::encode(&draft)?,
                }]
            }
            Some((chunks, nodes)) => {
                let mut transactions = Vec::with_capacity(chunks * nodes);
                for chunk in 0..chunks {
                    for node in 0..nodes {
                        let envelope = self.build_envelope(chunk, node)?;
                        transactions.push(WireTransaction {
                            signed_transaction_bytes: wire::encode(&envelope)?,
                        });
                    }
                }
                transactions
            }
        };

        wire::encode(&TransactionList { transactions })
    }

    /// Decodes a transaction of kind `D` produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_entries(decode_entries(bytes)?)
    }

    pub(crate) fn from_entries(entries: Vec<DecodedEntry>) -> Result<Self> {
        let is_frozen = entries
            .iter()
            .all(|entry| entry.body.transaction_id.is_some() && entry.body.node_account_id.is_some());

        if is_frozen {
            Self::from_frozen_entries(entries)
        } else {
            Self::from_draft_entries(entries)
        }
    }

    fn from_draft_entries(entries: Vec<DecodedEntry>) -> Result<Self> {
        let mut entries = entries.into_iter();
        let (Some(entry), None) = (entries.next(), entries.next()) else {
            return Err(Error::Decode(
                "an unfrozen transaction must serialize as exactly one entry".into(),
            ));
        };
        let body = entry.body;

        let mut transaction = Self::from_data(D::from_body_data(std::slice::from_ref(&body.data))?);
        transaction.memo = body.memo;
        transaction.max_transaction_fee = (!body.transaction_fee.is_zero()).then_some(body.transaction_fee);
        transaction.transaction_valid_duration = body.transaction_valid_duration;
        transaction.transaction_id = body.transaction_id;
        Ok(transaction)
    }

    fn from_frozen_entries(entries: Vec<DecodedEntry>) -> Result<Self> {
        let layout_error = || Error::Decode("entries are not laid out as chunks by nodes".into());

        let mut transaction_ids: Vec<TransactionId> = Vec::new();
        let mut node_account_ids = Vec::new();
        for entry in &entries {
            let (Some(id), Some(node)) = (entry.body.transaction_id, entry.body.node_account_id) else {
                return Err(layout_error());
            };
            if transaction_ids.last() != Some(&id) {
                transaction_ids.push(id);
            }
            if transaction_ids.len() == 1 {
                node_account_ids.push(node);
            }
        }

        let node_count = node_account_ids.len();
        if node_count == 0 || entries.len() != node_count * transaction_ids.len() {
            return Err(layout_error());
        }
        for (index, entry) in entries.iter().enumerate() {
            if entry.body.transaction_id != Some(transaction_ids[index / node_count])
                || entry.body.node_account_id != Some(node_account_ids[index % node_count])
            {
                return Err(layout_error());
            }
        }

        let chunk_bodies: Vec<TransactionBodyData> = entries
            .iter()
            .step_by(node_count)
            .map(|entry| entry.body.data.clone())
            .collect();
        let mut data = D::from_body_data(&chunk_bodies)?;
        if let (Some(chunked), 1) = (data.chunk_data_mut(), chunk_bodies.len()) {
            // A lone chunk may have been cut with a larger chunk size.
            chunked.chunk_size = chunked.chunk_size.max(chunked.data.len());
        }

        let initial_transaction_id = transaction_ids[0];
        let series = match data.chunk_data() {
            Some(chunked) => {
                let series = chunk::split(
                    chunked.data.len(),
                    chunked.chunk_size,
                    chunked.max_chunks,
                    initial_transaction_id,
                )?;
                if series.len() != transaction_ids.len() {
                    return Err(layout_error());
                }
                Some(series)
            }
            None if transaction_ids.len() == 1 => None,
            None => {
                return Err(Error::Decode(format!(
                    "{} transactions cannot span several chunks",
                    chunk_bodies[0].kind()
                )))
            }
        };

        let mut signers = Signers::default();
        for entry in &entries {
            for pair in &entry.signed.sig_map.pairs {
                signers.register(pair.public_key, None);
            }
        }

        let first = &entries[0].body;
        let transaction_fee = first.transaction_fee;
        let memo = first.memo.clone();
        let transaction_valid_duration = first.transaction_valid_duration;

        debug!(
            transaction_id = %initial_transaction_id,
            nodes = node_count,
            chunks = transaction_ids.len(),
            signers = signers.len(),
            "decoded frozen transaction"
        );

        Ok(Self {
            data,
            memo,
            max_transaction_fee: Some(transaction_fee),
            transaction_valid_duration,
            transaction_id: Some(initial_transaction_id),
            node_account_ids: Some(node_account_ids.clone()),
            signers,
            frozen: Some(FrozenState {
                node_account_ids,
                transaction_ids,
                series,
                transaction_fee,
                envelopes: entries.into_iter().map(|entry| entry.signed).collect(),
            }),
            options: RequestOptions::default(),
            node_cursor: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// AnyTransaction
// ---------------------------------------------------------------------------

/// A decoded transaction of whichever kind the bytes held.
#[derive(Debug, Clone)]
pub enum AnyTransaction {
    Transfer(TransferTransaction),
    TopicMessageSubmit(TopicMessageSubmitTransaction),
    FileAppend(FileAppendTransaction),
    ScheduleCreate(ScheduleCreateTransaction),
}

impl AnyTransaction {
    /// Decodes bytes produced by any kind's `to_bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let entries = decode_entries(bytes)?;
        match &entries[0].body.data {
            TransactionBodyData::CryptoTransfer(_) => {
                Transaction::from_entries(entries).map(Self::Transfer)
            }
            TransactionBodyData::ConsensusSubmitMessage(_) => {
                Transaction::from_entries(entries).map(Self::TopicMessageSubmit)
            }
            TransactionBodyData::FileAppend(_) => {
                Transaction::from_entries(entries).map(Self::FileAppend)
            }
            TransactionBodyData::ScheduleCreate(_) => {
                Transaction::from_entries(entries).map(Self::ScheduleCreate)
            }
        }
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        match self {
            Self::Transfer(tx) => tx.to_bytes(),
            Self::TopicMessageSubmit(tx) => tx.to_bytes(),
            Self::FileAppend(tx) => tx.to_bytes(),
            Self::ScheduleCreate(tx) => tx.to_bytes(),
        }
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        match self {
            Self::Transfer(tx) => tx.transaction_id(),
            Self::TopicMessageSubmit(tx) => tx.transaction_id(),
            Self::FileAppend(tx) => tx.transaction_id(),
            Self::ScheduleCreate(tx) => tx.transaction_id(),
        }
    }

    pub fn is_frozen(&self) -> bool {
        match self {
            Self::Transfer(tx) => tx.is_frozen(),
            Self::TopicMessageSubmit(tx) => tx.is_frozen(),
            Self::FileAppend(tx) => tx.is_frozen(),
            Self::ScheduleCreate(tx) => tx.is_frozen(),
        }
    }
}
