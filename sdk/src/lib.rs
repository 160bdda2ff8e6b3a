// Copyright (c) 2026 Ledger SDK Contributors. MIT License.
// See LICENSE for details.

//! # Ledger SDK: Client Library
//!
//! Build, sign, serialize and submit transactions to a consensus ledger,
//! then read back receipts and topic messages.
//!
//! ## Architecture
//!
//! - **transaction**: the shared lifecycle of every transaction kind
//!   (build, freeze, sign, execute, serialize).
//! - **transfer**, **topic_message_submit**, **file_append**,
//!   **schedule_create**: the concrete kinds.
//! - **execute**: the retry engine. Node rotation, backoff, transaction id
//!   regeneration, deadlines.
//! - **receipt**: polling for the consensus outcome of a submission.
//! - **topic_message**: subscribing to a topic and reassembling chunked
//!   messages.
//! - **client**: node list, operator and configuration.
//! - **transport**: the seam to the network. Anything that implements
//!   [`Transport`] can carry requests.
//! - **wire**: the serialized forms of bodies, envelopes and lists.
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn demo(client: ledger_sdk::Client) -> ledger_sdk::Result<()> {
//! use ledger_sdk::{AccountId, Hbar, TransferTransaction};
//!
//! let mut transfer = TransferTransaction::new();
//! transfer
//!     .add_hbar_transfer(AccountId::from(2), Hbar::from_tinybars(-100))?
//!     .add_hbar_transfer(AccountId::from(3), Hbar::from_tinybars(100))?;
//!
//! let response = transfer.execute(&client).await?;
//! let receipt = response.get_receipt(&client).await?;
//! println!("{}", receipt.status);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod execute;
pub mod file_append;
pub mod hbar;
pub mod ids;
pub mod logging;
pub mod receipt;
pub mod schedule_create;
pub mod status;
pub mod timestamp;
pub mod topic_message;
pub mod topic_message_submit;
pub mod transaction;
pub mod transaction_id;
pub mod transfer;
pub mod transport;
pub mod wire;

pub use client::{Client, Operator};
pub use config::ClientConfig;
pub use crypto::{PrivateKey, PublicKey};
pub use error::{Error, Result, TransportError};
pub use execute::RequestOptions;
pub use file_append::{FileAppendData, FileAppendTransaction};
pub use hbar::Hbar;
pub use ids::{AccountId, FileId, ScheduleId, TopicId};
pub use logging::{init_logging, LogFormat};
pub use receipt::{TransactionReceipt, TransactionReceiptQuery};
pub use schedule_create::{ScheduleCreateData, ScheduleCreateTransaction};
pub use status::Status;
pub use timestamp::Timestamp;
pub use topic_message::{SubscriptionHandle, TopicMessage, TopicMessageQuery};
pub use topic_message_submit::{TopicMessageSubmitData, TopicMessageSubmitTransaction};
pub use transaction::{AnyTransaction, Transaction, TransactionResponse};
pub use transaction_id::TransactionId;
pub use transfer::{TransferData, TransferTransaction};
pub use transport::{TopicStream, Transport};
