//! # Transaction Module
//!
//! The lifecycle shared by every transaction kind.
//!
//! ## Architecture
//!
//! ```text
//! data.rs       Capabilities a kind plugs in (TransactionData, Schedulable)
//! builder.rs    Transaction<D>: shared fields, freeze, signing, envelopes
//! signing.rs    Deferred, idempotent signer registry
//! chunk.rs      Splitting large payloads into sibling transactions
//! execution.rs  Submitting chunks through the execution engine; schedule()
//! any.rs        to_bytes / from_bytes and the AnyTransaction dispatcher
//! response.rs   TransactionResponse and receipt lookup
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Build**: set fields on a fresh transaction. Every setter fails with
//!    [`Error::Frozen`](crate::Error::Frozen) once frozen.
//! 2. **Freeze**: lock node list and identity, split chunks, render one
//!    envelope per (chunk, node).
//! 3. **Sign**: register signers. Signatures are produced when envelopes
//!    are built, so order relative to freeze does not matter.
//! 4. **Execute**: submit each chunk with retry and node rotation.
//! 5. **Receipt**: ask the accepting node for the consensus outcome.
//!
//! `to_bytes` works at any point. A frozen transaction round-trips through
//! `from_bytes` byte for byte, signatures included.

pub mod any;
pub mod builder;
pub mod chunk;
pub mod data;
pub mod execution;
pub mod response;
pub mod signing;

pub use any::AnyTransaction;
pub use builder::Transaction;
pub use chunk::{split, Chunk, ChunkData, ChunkSeries};
pub use data::{ChunkContext, Schedulable, TransactionData};
pub use response::TransactionResponse;
pub use signing::{signer_for, SignerFn};
