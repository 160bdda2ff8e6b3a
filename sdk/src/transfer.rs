//! Value transfers between accounts.

use crate::error::{Error, Result};
use crate::hbar::Hbar;
use crate::ids::AccountId;
use crate::transaction::data::unexpected_body;
use crate::transaction::{ChunkContext, Schedulable, Transaction, TransactionData};
use crate::wire::{AccountAmount, CryptoTransferBody, SchedulableBodyData, TransactionBodyData};

/// Moves hbar between accounts. Debits are negative amounts.
pub type TransferTransaction = Transaction<TransferData>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferData {
    transfers: Vec<AccountAmount>,
}

impl TransferData {
    fn body(&self) -> CryptoTransferBody {
        CryptoTransferBody {
            transfers: self.transfers.clone(),
        }
    }
}

impl TransactionData for TransferData {
    fn validate(&self) -> Result<()> {
        let sum = self
            .transfers
            .iter()
            .try_fold(0i64, |acc, t| acc.checked_add(t.amount.to_tinybars()));
        match sum {
            Some(0) => Ok(()),
            Some(sum) => Err(Error::configuration(format!(
                "transfers must sum to zero, got {}",
                Hbar::from_tinybars(sum)
            ))),
            None => Err(Error::configuration("transfer amounts overflow")),
        }
    }

    fn to_body_data(&self, _chunk: Option<&ChunkContext>) -> TransactionBodyData {
        TransactionBodyData::CryptoTransfer(self.body())
    }

    fn from_body_data(chunks: &[TransactionBodyData]) -> Result<Self> {
        match chunks {
            [TransactionBodyData::CryptoTransfer(body)] => Ok(Self {
                transfers: body.transfers.clone(),
            }),
            [other, ..] => Err(unexpected_body("CryptoTransfer", other)),
            [] => Err(Error::Decode("no transfer body".into())),
        }
    }
}

impl Schedulable for TransferData {
    fn to_schedulable_body_data(&self) -> SchedulableBodyData {
        SchedulableBodyData::CryptoTransfer(self.body())
    }
}

impl Transaction<TransferData> {
    /// Adds a debit (negative) or credit (positive) for `account_id`.
    pub fn add_hbar_transfer(&mut self, account_id: AccountId, amount: Hbar) -> Result<&mut Self> {
        self.data_mut("transfers")?
            .transfers
            .push(AccountAmount { account_id, amount });
        Ok(self)
    }

    pub fn hbar_transfers(&self) -> &[AccountAmount] {
        &self.data().transfers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::Timestamp;
    use crate::transaction_id::TransactionId;

    fn balanced() -> TransferTransaction {
        let mut tx = TransferTransaction::new();
        tx.add_hbar_transfer(AccountId::from(2), Hbar::new(-1))
            .unwrap()
            .add_hbar_transfer(AccountId::from(7), Hbar::new(1))
            .unwrap();
        tx
    }

    #[test]
    fn unbalanced_transfers_fail_freeze() {
        let mut tx = TransferTransaction::new();
        tx.add_hbar_transfer(AccountId::from(2), Hbar::new(-1)).unwrap();
        tx.set_node_account_ids(vec![AccountId::from(3)]).unwrap();
        tx.set_transaction_id(TransactionId::with_valid_start(
            AccountId::from(2),
            Timestamp::new(1_700_000_000, 0),
        ))
        .unwrap();
        assert!(tx.freeze().unwrap_err().is_configuration());
    }

    #[test]
    fn transfers_lock_after_freeze() {
        let mut tx = balanced();
        tx.set_node_account_ids(vec![AccountId::from(3)]).unwrap();
        tx.set_transaction_id(TransactionId::with_valid_start(
            AccountId::from(2),
            Timestamp::new(1_700_000_000, 0),
        ))
        .unwrap();
        tx.freeze().unwrap();

        let err = tx.add_hbar_transfer(AccountId::from(9), Hbar::ZERO).unwrap_err();
        assert!(matches!(err, Error::Frozen { field: "transfers" }));
        assert_eq!(tx.hbar_transfers().len(), 2);
    }

    #[test]
    fn body_roundtrips_through_body_data() {
        let data = balanced().data().clone();
        let body = data.to_body_data(None);
        assert_eq!(TransferData::from_body_data(&[body]).unwrap(), data);
    }
}
