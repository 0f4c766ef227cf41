//! # ember_message - Message Routing
//!
//! Per-zone mailbox for the simulation core:
//! - Immediate and delayed message delivery
//! - Duplicate suppression for queued messages
//! - A fixed bank of broadcast signals with subscriber lists

pub mod message;
pub mod router;

pub use message::{Message, MessageKind};
pub use router::{MessageRouter, MessageSink, NUM_SIGNALS};

/// Prelude
pub mod prelude {
    pub use crate::{Message, MessageKind, MessageRouter, MessageSink, NUM_SIGNALS};
}
