//! Signal listeners
//!
//! A listener subscribes to a set of signals described by a mini-expression
//! ("any: 1;2" or "all: 1;2") and considers itself triggered while the
//! subscribed signals have been raised recently.

use crate::trigger::Trigger;
use ember_actor::{Actor, Entity, UpdateContext};
use ember_core::{ActorId, PropertyBag};
use ember_message::{Message, MessageKind};
use std::any::Any;
use std::collections::BTreeMap;

/// Milliseconds within which a raised signal counts as fresh
pub const FRESH_SIGNAL_MS: f32 = 1000.0;

/// Age given to subscriptions that have never fired
const STALE_SIGNAL_MS: f32 = 5000.0;

/// Parse a subscription expression into (any-mode, signal indices).
/// Tokens are separated by `:;,` and whitespace; the keywords `any` and
/// `all` select the mode and every number is a signal index.
pub fn parse_expression(expression: &str) -> (bool, Vec<i32>) {
    let mut any_signal = true;
    let mut signals = Vec::new();

    for token in expression.split([':', ';', ',', ' ', '\t', '\n']) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.to_ascii_lowercase().as_str() {
            "any" => any_signal = true,
            "all" => any_signal = false,
            other => {
                if let Ok(index) = other.parse::<i32>() {
                    signals.push(index);
                }
            }
        }
    }

    (any_signal, signals)
}

/// An actor triggered by recently-raised signals
pub struct Listener {
    /// Shared trigger state
    pub base: Trigger,
    /// The subscription expression, kept for persistence and re-sync
    pub expression: String,
    /// OR semantics when true, AND semantics when false
    pub any_signal: bool,
    /// Milliseconds since each subscribed signal was last detected
    signals: BTreeMap<i32, f32>,
}

impl Listener {
    /// Create a listener subscribed to the stock expression
    pub fn new(id: ActorId) -> Self {
        Self {
            base: Trigger::new(id),
            expression: String::from("any: 1 ; 2 ; 3 ; 4 ; 5"),
            any_signal: false,
            signals: BTreeMap::new(),
        }
    }

    /// Parse the stored expression and register the subscriptions
    pub fn setup_signals(&mut self, ctx: &mut UpdateContext) {
        let id = self.base.actor.id;
        ctx.router.unsubscribe_all(id);
        self.signals.clear();

        let (any_signal, indices) = parse_expression(&self.expression);
        self.any_signal = any_signal;

        for index in indices {
            self.signals.insert(index, STALE_SIGNAL_MS);
            ctx.router.subscribe_to_signal(id, index);
        }
    }

    /// Whether the subscribed signals were raised recently
    pub fn poll_conditions(&self) -> bool {
        if self.any_signal {
            self.signals.values().any(|age| *age < FRESH_SIGNAL_MS)
        } else {
            !self.signals.values().any(|age| *age > FRESH_SIGNAL_MS)
        }
    }

    /// Age every subscription
    fn age_signals(&mut self, dt_ms: f32) {
        for age in self.signals.values_mut() {
            *age += dt_ms;
        }
    }

    /// Run the shared listener tick; returns whether the listener fired
    pub fn tick(&mut self, dt_ms: f32, ctx: &mut UpdateContext) -> bool {
        self.base.actor.update(dt_ms, ctx.map);
        let fired = self.poll_conditions();
        self.age_signals(dt_ms);
        fired
    }

    /// Note a signal delivery
    pub fn handle_message(&mut self, msg: &Message) {
        if msg.kind == MessageKind::Signal {
            if let Some(age) = self.signals.get_mut(&msg.int_data) {
                *age = 0.0;
            }
        }
    }

    /// Read listener fields from a bag
    pub fn load_fields(&mut self, bag: &PropertyBag) {
        self.base.load_fields(bag);
        self.expression = bag.get_or("expression", std::mem::take(&mut self.expression));
    }

    /// Write listener fields to a bag
    pub fn save_fields(&self, bag: &mut PropertyBag, defaults: &Listener) {
        self.base.save_fields(bag, &defaults.base);
        bag.set_tidy("expression", &self.expression, &defaults.expression);
    }
}

impl Entity for Listener {
    fn actor(&self) -> &Actor {
        &self.base.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.base.actor
    }

    fn type_name(&self) -> &'static str {
        "listener"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn update(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        if self.tick(dt_ms, ctx) {
            self.base.play_trigger_sound(ctx);
        }
    }

    fn on_message(&mut self, msg: &Message) {
        self.handle_message(msg);
    }

    fn on_spawn(&mut self, ctx: &mut UpdateContext) {
        self.setup_signals(ctx);
    }

    fn load(&mut self, bag: &PropertyBag) {
        self.load_fields(bag);
    }

    fn save_tidy(&self, bag: &mut PropertyBag) {
        self.save_fields(bag, &Listener::new(ActorId::INVALID));
    }
}
