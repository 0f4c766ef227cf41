//! Message value type

use ember_core::ActorId;
use serde::{Deserialize, Serialize};

/// The kind of event a message reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// No message
    Nothing,
    /// A waiting period of some sort has ended
    Timeout,
    /// One actor has collided with another
    Collision,
    /// The receiving creature has been attacked
    Attacked,
    /// The receiving creature is under pain of sanity loss
    Sanity,
    /// The receiving actor is subscribed to a signal (index in `int_data`)
    Signal,
}

impl Default for MessageKind {
    fn default() -> Self {
        Self::Nothing
    }
}

/// A message addressed from one actor to another
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// What happened
    pub kind: MessageKind,
    /// Who sent it
    pub sender: ActorId,
    /// Who receives it
    pub recipient: ActorId,
    /// Float payload
    pub float_data: f32,
    /// Integer payload
    pub int_data: i32,
    /// Milliseconds to hold the message before delivery; zero delivers now
    pub time_delay: f64,
    /// Clock reading when the message was handed to the router
    pub timestamp: f64,
    /// Set by the router once the message has been delivered
    pub sent: bool,
}

impl Message {
    /// Create a message with no payload and no delay
    pub fn new(kind: MessageKind, sender: ActorId, recipient: ActorId) -> Self {
        Self {
            kind,
            sender,
            recipient,
            float_data: 0.0,
            int_data: 0,
            time_delay: 0.0,
            timestamp: 0.0,
            sent: false,
        }
    }

    /// Create a signal notification addressed to a subscriber
    pub fn signal(recipient: ActorId, signal_index: i32) -> Self {
        Self::new(MessageKind::Signal, ActorId::INVALID, recipient).with_int(signal_index)
    }

    /// Set the delivery delay in milliseconds
    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.time_delay = delay_ms;
        self
    }

    /// Set the integer payload
    pub fn with_int(mut self, value: i32) -> Self {
        self.int_data = value;
        self
    }

    /// Set the float payload
    pub fn with_float(mut self, value: f32) -> Self {
        self.float_data = value;
        self
    }

    /// Payload equality used for duplicate suppression; ignores timestamps
    pub fn same_payload(&self, other: &Message) -> bool {
        self.kind == other.kind
            && self.sender == other.sender
            && self.recipient == other.recipient
            && self.int_data == other.int_data
            && self.float_data == other.float_data
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new(MessageKind::Nothing, ActorId::INVALID, ActorId::INVALID)
    }
}
