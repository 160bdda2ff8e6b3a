//! # Topic Messages
//!
//! The receiving side of consensus topics: subscribe to a topic's stream
//! and get whole messages back, however many chunks they were sent in.

pub mod reassembly;
pub mod subscription;

pub use reassembly::{ChunkCollector, TopicMessage, TopicMessageChunk};
pub use subscription::{ErrorHandler, MessageHandler, SubscriptionHandle, TopicMessageQuery};
