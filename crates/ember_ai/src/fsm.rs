//! Cooperative high-level state machine
//!
//! The driver keeps the bookkeeping (current state, pending transition,
//! entry time, cc receiver); concrete behaviors implement [`StateLogic`] as
//! an explicit match ladder over (state, event). Transitions requested with
//! [`StateMachine::set_state`] take effect at the end of the current
//! `process` call, and a state's `Enter` handler may immediately request
//! another transition; the chain is bounded to catch flip-flopping states.

use crate::command::Command;
use ember_core::ActorId;
use ember_message::{Message, MessageKind};
use glam::Vec3;

/// The reserved fallback state polled when the current state declines an event
pub const GLOBAL_STATE: i32 = -1;

/// Maximum chained transitions inside one `process` call
pub const MAX_STATE_CHANGES_PER_PROCESS: u32 = 50;

/// Events dispatched into a state ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmEvent {
    /// Periodic tick; may carry the owner's buffered message
    Update,
    /// Direct message dispatch
    Message,
    /// The state was just entered
    Enter,
    /// The state is about to be left
    Exit,
}

/// The world seam a state ladder drives: owner queries, target queries,
/// order queueing, and messaging. Implemented by the creature update path.
pub trait FsmContext {
    /// Handle of the creature this machine drives
    fn owner_id(&self) -> ActorId;
    /// Zone clock in milliseconds
    fn clock_ms(&self) -> f64;
    /// Owner position
    fn owner_position(&self) -> Vec3;
    /// Point the owner was placed at
    fn owner_spawn_point(&self) -> Vec3;
    /// Current health over maximum health
    fn owner_health_fraction(&self) -> f32;
    /// Whether any orders are pending
    fn owner_has_orders(&self) -> bool;
    /// Whether the owner collided with anything this tick
    fn owner_any_collisions(&self) -> bool;
    /// Append an order to the back of the queue
    fn queue_command(&mut self, cmd: Command) -> bool;
    /// Push an order to the front of the queue, interrupting the current one
    fn inject_command(&mut self, cmd: Command) -> bool;
    /// Empty the order queue
    fn cancel_orders(&mut self);
    /// Planar distance to an actor, minus both cylinder radii; `None` for a
    /// handle that no longer resolves
    fn surface_distance_to(&self, id: ActorId) -> Option<f32>;
    /// Whether the handle resolves to a living creature
    fn is_attackable(&self, id: ActorId) -> bool;
    /// Nearest living player-tagged creature within `range` meters of the
    /// owner, or the invalid handle
    fn closest_attackable(&self, range: f32) -> ActorId;
    /// Route a message through the zone router
    fn send_message(&mut self, msg: Message) -> bool;
    /// Uniform random float in [lo, hi)
    fn random_range(&mut self, lo: f32, hi: f32) -> f32;
    /// Play the owner's attention-grabbing sound effect
    fn play_attention_sound(&mut self);

    /// Send an immediate message from the owner
    fn send_msg(&mut self, kind: MessageKind, receiver: ActorId) -> bool {
        let msg = Message::new(kind, self.owner_id(), receiver);
        self.send_message(msg)
    }

    /// Send a delayed message from the owner
    fn send_delayed_msg(&mut self, delay_ms: f64, kind: MessageKind, receiver: ActorId) -> bool {
        let msg = Message::new(kind, self.owner_id(), receiver).with_delay(delay_ms);
        self.send_message(msg)
    }

    /// Send a delayed message from the owner to itself
    fn send_delayed_msg_to_me(&mut self, delay_ms: f64, kind: MessageKind) -> bool {
        let me = self.owner_id();
        self.send_delayed_msg(delay_ms, kind, me)
    }
}

/// A concrete state ladder. Return true when the event was handled in the
/// given state; an unhandled event is re-dispatched to [`GLOBAL_STATE`].
pub trait StateLogic {
    /// Dispatch one event in one state
    fn states(
        &mut self,
        event: FsmEvent,
        msg: Option<&Message>,
        state: i32,
        machine: &mut StateMachine,
        ctx: &mut dyn FsmContext,
    ) -> bool;
}

/// State machine bookkeeping shared by every ladder
#[derive(Debug, Clone)]
pub struct StateMachine {
    current_state: i32,
    next_state: i32,
    state_change: bool,
    time_on_enter: f64,
    cc_receiver: ActorId,
}

impl StateMachine {
    /// Create a machine resting in state 0
    pub fn new() -> Self {
        Self {
            current_state: 0,
            next_state: 0,
            state_change: false,
            time_on_enter: 0.0,
            cc_receiver: ActorId::INVALID,
        }
    }

    /// Request a transition; takes effect at the end of the current
    /// `process` call, not immediately
    pub fn set_state(&mut self, new_state: i32) {
        self.state_change = true;
        self.next_state = new_state;
    }

    /// The state currently being executed
    pub fn state(&self) -> i32 {
        self.current_state
    }

    /// Milliseconds spent in the current state
    pub fn time_in_state(&self, now: f64) -> f64 {
        now - self.time_on_enter
    }

    /// Forward a copy of every dispatched message to this actor
    pub fn set_cc_receiver(&mut self, id: ActorId) {
        self.cc_receiver = id;
    }

    /// Stop forwarding message copies
    pub fn clear_cc_receiver(&mut self) {
        self.cc_receiver = ActorId::INVALID;
    }

    /// The actor receiving message copies, if any
    pub fn cc_receiver(&self) -> ActorId {
        self.cc_receiver
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// A driver paired with its concrete ladder
pub struct Fsm {
    machine: StateMachine,
    logic: Box<dyn StateLogic + Send + Sync>,
}

impl Fsm {
    /// Pair a fresh driver with a ladder
    pub fn new(logic: Box<dyn StateLogic + Send + Sync>) -> Self {
        Self {
            machine: StateMachine::new(),
            logic,
        }
    }

    /// Enter the initial state
    pub fn initialize(&mut self, ctx: &mut dyn FsmContext) {
        self.process(FsmEvent::Enter, None, ctx);
    }

    /// Run one FSM tick, with the owner's buffered message if one arrived
    pub fn update(&mut self, msg: Option<&Message>, ctx: &mut dyn FsmContext) {
        self.process(FsmEvent::Update, msg, ctx);
    }

    /// Dispatch one event, then settle any requested transitions
    ///
    /// # Panics
    ///
    /// Panics when states keep re-transitioning past
    /// [`MAX_STATE_CHANGES_PER_PROCESS`] within a single call; that is a
    /// behavior-authoring bug, not a recoverable condition.
    pub fn process(&mut self, event: FsmEvent, msg: Option<&Message>, ctx: &mut dyn FsmContext) {
        if event == FsmEvent::Message {
            if let Some(msg) = msg {
                let cc = self.machine.cc_receiver;
                if cc.is_valid() {
                    // CC this message; a side channel, not part of dispatch
                    ctx.send_msg(msg.kind, cc);
                }
            }
        }

        let current = self.machine.current_state;
        if !self.logic.states(event, msg, current, &mut self.machine, ctx) {
            // Current state declined, try the global fallback
            self.logic
                .states(event, msg, GLOBAL_STATE, &mut self.machine, ctx);
        }

        let mut transitions = 0u32;
        while self.machine.state_change {
            transitions += 1;
            assert!(
                transitions < MAX_STATE_CHANGES_PER_PROCESS,
                "state machine states are flip-flopping in an infinite loop"
            );

            self.machine.state_change = false;

            // Let the old state clean up
            let old = self.machine.current_state;
            self.logic
                .states(FsmEvent::Exit, None, old, &mut self.machine, ctx);

            self.machine.current_state = self.machine.next_state;
            self.machine.time_on_enter = ctx.clock_ms();

            // Let the new state initialize; it may request another change
            let new = self.machine.current_state;
            self.logic
                .states(FsmEvent::Enter, None, new, &mut self.machine, ctx);
        }
    }

    /// The driver bookkeeping
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Mutable driver bookkeeping
    pub fn machine_mut(&mut self) -> &mut StateMachine {
        &mut self.machine
    }
}

impl std::fmt::Debug for Fsm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fsm")
            .field("machine", &self.machine)
            .finish()
    }
}
