//! Per-zone message router and signal bank

use crate::message::Message;
use ember_core::ActorId;
use log::warn;

/// Number of broadcast signals in the bank
pub const NUM_SIGNALS: usize = 22;

/// Messages leave the router through a sink, so delivery is decoupled from
/// actor storage. Returns false when the recipient does not exist.
pub trait MessageSink {
    /// Hand a message to its recipient
    fn deliver(&mut self, msg: &Message) -> bool;
}

impl<F> MessageSink for F
where
    F: FnMut(&Message) -> bool,
{
    fn deliver(&mut self, msg: &Message) -> bool {
        self(msg)
    }
}

/// Per-zone mailbox: immediate delivery, delayed delivery with duplicate
/// suppression, and a fixed bank of broadcast signals
pub struct MessageRouter {
    /// Messages waiting for their delivery window
    pending: Vec<Message>,
    /// Subscribers per signal, in subscription order
    signal_receivers: [Vec<ActorId>; NUM_SIGNALS],
    /// Milliseconds since each signal was last raised
    signals: [f32; NUM_SIGNALS],
}

impl MessageRouter {
    /// Create a new router with an empty mailbox
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            signal_receivers: Default::default(),
            signals: [0.0; NUM_SIGNALS],
        }
    }

    /// Send a message.
    ///
    /// A zero-delay message is delivered synchronously through the sink.
    /// A delayed message is queued unless an unsent duplicate (same sender,
    /// recipient, kind, and payload) is already waiting, in which case it is
    /// dropped and `false` is returned.
    pub fn send(&mut self, mut msg: Message, now: f64, sink: &mut dyn MessageSink) -> bool {
        msg.sent = false;
        msg.timestamp = now;

        if msg.time_delay == 0.0 {
            Self::mail_it(&msg, sink);
            return true;
        }

        if self
            .pending
            .iter()
            .any(|queued| !queued.sent && queued.same_payload(&msg))
        {
            // Another copy already exists
            return false;
        }

        self.pending.push(msg);
        true
    }

    /// Deliver every queued message whose window has arrived, drop sent
    /// messages, then age the signal bank
    pub fn update(&mut self, delta_ms: f32, now: f64, sink: &mut dyn MessageSink) {
        for msg in &mut self.pending {
            if msg.timestamp + msg.time_delay - now < 1.0 {
                Self::mail_it(msg, sink);
                msg.sent = true;
            }
        }

        self.pending.retain(|msg| !msg.sent);

        for age in &mut self.signals {
            *age += delta_ms;
        }
    }

    /// Raise a signal: notify every subscriber immediately and reset the
    /// signal's age. Negative indices are ignored.
    pub fn raise_signal(&mut self, signal_index: i32, now: f64, sink: &mut dyn MessageSink) {
        if signal_index < 0 {
            return;
        }

        let index = signal_index as usize;
        debug_assert!(index < NUM_SIGNALS, "signal index out of range: {index}");
        if index >= NUM_SIGNALS {
            return;
        }

        let receivers = self.signal_receivers[index].clone();
        for recipient in receivers {
            self.send(Message::signal(recipient, signal_index), now, sink);
        }

        self.signals[index] = 0.0;
    }

    /// Subscribe an actor to a signal; duplicate subscriptions are rejected
    pub fn subscribe_to_signal(&mut self, id: ActorId, signal_index: i32) {
        if signal_index < 0 || signal_index as usize >= NUM_SIGNALS {
            return;
        }

        let receivers = &mut self.signal_receivers[signal_index as usize];
        if !receivers.contains(&id) {
            receivers.push(id);
        }
    }

    /// Remove an actor from every signal's subscriber list
    pub fn unsubscribe_all(&mut self, id: ActorId) {
        for receivers in &mut self.signal_receivers {
            receivers.retain(|subscriber| *subscriber != id);
        }
    }

    /// Milliseconds since a signal was last raised
    pub fn signal_age(&self, signal_index: i32) -> f32 {
        if signal_index < 0 || signal_index as usize >= NUM_SIGNALS {
            return f32::MAX;
        }
        self.signals[signal_index as usize]
    }

    /// Number of messages waiting for delivery
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn mail_it(msg: &Message, sink: &mut dyn MessageSink) {
        let delivered = sink.deliver(msg);
        debug_assert!(delivered, "message recipient {} does not exist", msg.recipient);
        if !delivered {
            warn!(
                "dropping message {:?} for missing recipient {}",
                msg.kind, msg.recipient
            );
        }
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;

    /// Sink that records everything and claims every recipient exists
    #[derive(Default)]
    struct RecordingSink {
        delivered: Vec<Message>,
    }

    impl MessageSink for RecordingSink {
        fn deliver(&mut self, msg: &Message) -> bool {
            self.delivered.push(*msg);
            true
        }
    }

    fn attack_msg(delay: f64) -> Message {
        Message::new(
            MessageKind::Attacked,
            ActorId::from_raw(1),
            ActorId::from_raw(2),
        )
        .with_int(3)
        .with_delay(delay)
    }

    #[test]
    fn test_immediate_delivery() {
        let mut router = MessageRouter::new();
        let mut sink = RecordingSink::default();

        assert!(router.send(attack_msg(0.0), 0.0, &mut sink));
        assert_eq!(sink.delivered.len(), 1);
        assert_eq!(router.pending_count(), 0);
    }

    #[test]
    fn test_delayed_delivery_window() {
        let mut router = MessageRouter::new();
        let mut sink = RecordingSink::default();

        router.send(attack_msg(100.0), 0.0, &mut sink);
        assert_eq!(sink.delivered.len(), 0);

        // Too early: 100 - 50 = 50 >= 1
        router.update(50.0, 50.0, &mut sink);
        assert_eq!(sink.delivered.len(), 0);
        assert_eq!(router.pending_count(), 1);

        // Due: 0 + 100 - 99.5 < 1
        router.update(49.5, 99.5, &mut sink);
        assert_eq!(sink.delivered.len(), 1);
        assert_eq!(router.pending_count(), 0);
    }

    #[test]
    fn test_delayed_duplicates_coalesce() {
        let mut router = MessageRouter::new();
        let mut sink = RecordingSink::default();

        assert!(router.send(attack_msg(100.0), 0.0, &mut sink));
        assert!(!router.send(attack_msg(100.0), 10.0, &mut sink));
        assert_eq!(router.pending_count(), 1);

        router.update(200.0, 200.0, &mut sink);
        assert_eq!(sink.delivered.len(), 1);

        // After delivery the payload may be queued again
        assert!(router.send(attack_msg(100.0), 200.0, &mut sink));
    }

    #[test]
    fn test_different_payloads_not_coalesced() {
        let mut router = MessageRouter::new();
        let mut sink = RecordingSink::default();

        router.send(attack_msg(100.0), 0.0, &mut sink);
        router.send(attack_msg(100.0).with_int(99), 0.0, &mut sink);
        assert_eq!(router.pending_count(), 2);
    }

    #[test]
    fn test_signal_reaches_current_subscribers_only() {
        let mut router = MessageRouter::new();
        let mut sink = RecordingSink::default();

        let a = ActorId::from_raw(10);
        let b = ActorId::from_raw(11);

        router.subscribe_to_signal(a, 3);
        router.subscribe_to_signal(b, 3);
        router.subscribe_to_signal(a, 3); // duplicate, rejected

        router.raise_signal(3, 0.0, &mut sink);
        assert_eq!(sink.delivered.len(), 2);

        router.unsubscribe_all(a);
        sink.delivered.clear();
        router.raise_signal(3, 0.0, &mut sink);
        assert_eq!(sink.delivered.len(), 1);
        assert_eq!(sink.delivered[0].recipient, b);

        // Re-subscribing takes effect again
        router.subscribe_to_signal(a, 3);
        sink.delivered.clear();
        router.raise_signal(3, 0.0, &mut sink);
        assert_eq!(sink.delivered.len(), 2);
    }

    #[test]
    fn test_signal_ages() {
        let mut router = MessageRouter::new();
        let mut sink = RecordingSink::default();

        router.update(250.0, 250.0, &mut sink);
        assert_eq!(router.signal_age(5), 250.0);

        router.raise_signal(5, 250.0, &mut sink);
        assert_eq!(router.signal_age(5), 0.0);
        assert_eq!(router.signal_age(6), 250.0);
    }

    #[test]
    fn test_negative_signal_is_noop() {
        let mut router = MessageRouter::new();
        let mut sink = RecordingSink::default();
        router.raise_signal(-1, 0.0, &mut sink);
        assert!(sink.delivered.is_empty());
    }
}
