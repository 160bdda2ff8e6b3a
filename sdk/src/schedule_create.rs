//! Creating a schedule: a transaction body held by the network until
//! enough signatures arrive.

use crate::error::{Error, Result};
use crate::hbar::Hbar;
use crate::ids::AccountId;
use crate::transaction::data::unexpected_body;
use crate::transaction::{ChunkContext, Transaction, TransactionData};
use crate::wire::{SchedulableTransactionBody, ScheduleCreateBody, TransactionBodyData};

/// Creates a schedule around another transaction's body.
///
/// Usually built with [`Transaction::schedule`] rather than by hand.
pub type ScheduleCreateTransaction = Transaction<ScheduleCreateData>;

const SCHEDULE_CREATE_DEFAULT_MAX_FEE: Hbar = Hbar::new(5);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleCreateData {
    scheduled_transaction_body: Option<SchedulableTransactionBody>,
    schedule_memo: String,
    payer_account_id: Option<AccountId>,
}

impl TransactionData for ScheduleCreateData {
    fn default_max_transaction_fee(&self) -> Hbar {
        SCHEDULE_CREATE_DEFAULT_MAX_FEE
    }

    fn validate(&self) -> Result<()> {
        if self.scheduled_transaction_body.is_none() {
            return Err(Error::configuration("scheduled transaction body is required"));
        }
        Ok(())
    }

    fn to_body_data(&self, _chunk: Option<&ChunkContext>) -> TransactionBodyData {
        TransactionBodyData::ScheduleCreate(ScheduleCreateBody {
            scheduled_transaction_body: self.scheduled_transaction_body.clone(),
            memo: self.schedule_memo.clone(),
            payer_account_id: self.payer_account_id,
        })
    }

    fn from_body_data(chunks: &[TransactionBodyData]) -> Result<Self> {
        match chunks {
            [TransactionBodyData::ScheduleCreate(body)] => Ok(Self {
                scheduled_transaction_body: body.scheduled_transaction_body.clone(),
                schedule_memo: body.memo.clone(),
                payer_account_id: body.payer_account_id,
            }),
            [other, ..] => Err(unexpected_body("ScheduleCreate", other)),
            [] => Err(Error::Decode("no schedule body".into())),
        }
    }
}

impl Transaction<ScheduleCreateData> {
    pub fn scheduled_transaction_body(&self) -> Option<&SchedulableTransactionBody> {
        self.data().scheduled_transaction_body.as_ref()
    }

    pub fn set_scheduled_transaction_body(&mut self, body: SchedulableTransactionBody) -> Result<&mut Self> {
        self.data_mut("scheduled_transaction_body")?.scheduled_transaction_body = Some(body);
        Ok(self)
    }

    pub fn schedule_memo(&self) -> &str {
        &self.data().schedule_memo
    }

    pub fn set_schedule_memo(&mut self, memo: impl Into<String>) -> Result<&mut Self> {
        self.data_mut("schedule_memo")?.schedule_memo = memo.into();
        Ok(self)
    }

    pub fn payer_account_id(&self) -> Option<AccountId> {
        self.data().payer_account_id
    }

    /// Account that pays for the scheduled transaction once it executes.
    pub fn set_payer_account_id(&mut self, payer: AccountId) -> Result<&mut Self> {
        self.data_mut("payer_account_id")?.payer_account_id = Some(payer);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TopicId;
    use crate::timestamp::Timestamp;
    use crate::topic_message_submit::TopicMessageSubmitTransaction;
    use crate::transaction_id::TransactionId;
    use crate::transfer::TransferTransaction;
    use crate::wire::SchedulableBodyData;

    #[test]
    fn schedule_wraps_transfer_body() {
        let mut transfer = TransferTransaction::new();
        transfer
            .add_hbar_transfer(AccountId::from(2), Hbar::new(-3))
            .unwrap()
            .add_hbar_transfer(AccountId::from(8), Hbar::new(3))
            .unwrap()
            .set_memo("inner")
            .unwrap();
        let id = TransactionId::with_valid_start(AccountId::from(2), Timestamp::new(1_700_000_000, 0));
        transfer.set_transaction_id(id).unwrap();

        let schedule = transfer.schedule().unwrap();
        let body = schedule.scheduled_transaction_body().unwrap();
        assert_eq!(body.memo, "inner");
        let SchedulableBodyData::CryptoTransfer(inner) = &body.data else {
            panic!("wrong scheduled kind");
        };
        assert_eq!(inner.transfers.len(), 2);
        assert_eq!(schedule.transaction_id(), Some(id));
    }

    #[test]
    fn multi_chunk_message_cannot_be_scheduled() {
        let mut submit = TopicMessageSubmitTransaction::new();
        submit
            .set_topic_id(TopicId::from(9))
            .unwrap()
            .set_message(vec![0u8; 3000])
            .unwrap();
        assert!(submit.schedule().unwrap_err().is_configuration());
    }

    #[test]
    fn schedule_requires_body() {
        assert!(ScheduleCreateData::default().validate().unwrap_err().is_configuration());
    }
}
