//! Tile gates and gate openers
//!
//! A gate blocks passage by raising its tile's floor out of step range;
//! wall sliding then treats the tile as a wall. The opener is a listener
//! that manipulates its gates by direct method call rather than signals.

use crate::listener::Listener;
use ember_actor::{Actor, Entity, Map, UpdateContext};
use ember_core::{ActorId, PropertyBag};
use std::any::Any;

/// A height transition in progress
#[derive(Debug, Clone, Copy)]
struct Transition {
    from: f32,
    to: f32,
    elapsed_ms: f32,
    duration_ms: f32,
}

/// A gate occupying one tile, locked by elevating that tile
pub struct TileGate {
    /// Base actor state
    pub actor: Actor,
    /// Whether the gate currently blocks passage
    pub locked: bool,
    /// Tile height while locked
    pub locked_height: f32,
    /// Tile height while unlocked
    pub unlocked_height: f32,
    /// Milliseconds the closing transition takes
    pub lock_time: f32,
    /// Milliseconds the opening transition takes
    pub unlock_time: f32,
    /// Milliseconds between the order and the gate reacting
    pub reaction_delay: f32,
    /// Whether the gate starts locked
    pub initially_locked: bool,
    /// Sound on unlock; empty for none
    pub unlock_sfx: String,
    /// Sound on lock; empty for none
    pub lock_sfx: String,
    pending: Option<(f32, bool)>,
    transition: Option<Transition>,
}

impl TileGate {
    /// Create a gate with stock tuning
    pub fn new(id: ActorId) -> Self {
        let mut actor = Actor::new(id);
        actor.solid = false;
        Self {
            actor,
            locked: true,
            locked_height: 2.4,
            unlocked_height: 0.0,
            lock_time: 1000.0,
            unlock_time: 1000.0,
            reaction_delay: 0.0,
            initially_locked: true,
            unlock_sfx: String::new(),
            lock_sfx: String::new(),
            pending: None,
            transition: None,
        }
    }

    /// Open the gate, after the configured reaction delay
    pub fn unlock_gate(&mut self, ctx: &mut UpdateContext) {
        if self.reaction_delay <= f32::EPSILON {
            self.unlock_gate_immediately(ctx);
        } else {
            self.pending = Some((self.reaction_delay, false));
        }
    }

    /// Close the gate, after the configured reaction delay
    pub fn lock_gate(&mut self, ctx: &mut UpdateContext) {
        if self.reaction_delay <= f32::EPSILON {
            self.lock_gate_immediately(ctx);
        } else {
            self.pending = Some((self.reaction_delay, true));
        }
    }

    fn unlock_gate_immediately(&mut self, ctx: &mut UpdateContext) {
        self.locked = false;
        self.begin_transition(ctx.map, self.unlocked_height, self.unlock_time);
        if !self.unlock_sfx.is_empty() {
            let sfx = self.unlock_sfx.clone();
            ctx.services.play_sound_3d(&sfx, self.actor.position);
        }
    }

    fn lock_gate_immediately(&mut self, ctx: &mut UpdateContext) {
        self.locked = true;
        self.begin_transition(ctx.map, self.locked_height, self.lock_time);
        if !self.lock_sfx.is_empty() {
            let sfx = self.lock_sfx.clone();
            ctx.services.play_sound_3d(&sfx, self.actor.position);
        }
    }

    fn begin_transition(&mut self, map: &Map, to: f32, duration_ms: f32) {
        let from = map
            .tile_at(self.actor.position.x, self.actor.position.z)
            .map(|t| t.height)
            .unwrap_or(self.unlocked_height);
        self.transition = Some(Transition {
            from,
            to,
            elapsed_ms: 0.0,
            duration_ms,
        });
    }

    fn snap_tile_height(&mut self, map: &mut Map, height: f32) {
        let x = map.tile_x(self.actor.position.x);
        let z = map.tile_z(self.actor.position.z);
        map.set_height(x, z, height);
    }

    fn run_transition(&mut self, dt_ms: f32, map: &mut Map) {
        let Some(mut t) = self.transition else {
            return;
        };

        t.elapsed_ms += dt_ms;
        if t.elapsed_ms >= t.duration_ms || t.duration_ms <= f32::EPSILON {
            self.snap_tile_height(map, t.to);
            self.transition = None;
        } else {
            let fraction = t.elapsed_ms / t.duration_ms;
            let height = t.from + (t.to - t.from) * fraction;
            self.snap_tile_height(map, height);
            self.transition = Some(t);
        }
    }
}

impl Entity for TileGate {
    fn actor(&self) -> &Actor {
        &self.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }

    fn type_name(&self) -> &'static str {
        "tile_gate"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn update(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        if let Some((mut remaining, lock)) = self.pending.take() {
            remaining -= dt_ms;
            if remaining <= 0.0 {
                if lock {
                    self.lock_gate_immediately(ctx);
                } else {
                    self.unlock_gate_immediately(ctx);
                }
            } else {
                self.pending = Some((remaining, lock));
            }
        }

        self.run_transition(dt_ms, ctx.map);

        // Gates do not move or slide; skip the physics tick
    }

    fn on_spawn(&mut self, ctx: &mut UpdateContext) {
        // The gate's tile blocks by elevation alone
        let x = ctx.map.tile_x(self.actor.position.x);
        let z = ctx.map.tile_z(self.actor.position.z);
        ctx.map.set_passable(x, z, true);

        if self.initially_locked {
            self.lock_gate_immediately(ctx);
        } else {
            self.unlock_gate_immediately(ctx);
        }
        // Apply the end state without waiting out the transition
        let target = if self.locked {
            self.locked_height
        } else {
            self.unlocked_height
        };
        self.snap_tile_height(ctx.map, target);
        self.transition = None;
    }

    fn load(&mut self, bag: &PropertyBag) {
        self.actor.load(bag);
        self.locked_height = bag.get_or("lockedHeight", self.locked_height);
        self.unlocked_height = bag.get_or("unlockedHeight", self.unlocked_height);
        self.lock_time = bag.get_or("lockTime", self.lock_time);
        self.unlock_time = bag.get_or("unlockTime", self.unlock_time);
        self.reaction_delay = bag.get_or("reactionDelay", self.reaction_delay);
        self.initially_locked = bag.get_or("initiallyLocked", self.initially_locked);
        self.unlock_sfx = bag.get_or("unlockSfx", String::new());
        self.lock_sfx = bag.get_or("lockSfx", String::new());
    }

    fn save_tidy(&self, bag: &mut PropertyBag) {
        let defaults = TileGate::new(ActorId::INVALID);
        self.actor.save_tidy(bag, &defaults.actor);
        bag.set_tidy("lockedHeight", &self.locked_height, &defaults.locked_height);
        bag.set_tidy(
            "unlockedHeight",
            &self.unlocked_height,
            &defaults.unlocked_height,
        );
        bag.set_tidy("lockTime", &self.lock_time, &defaults.lock_time);
        bag.set_tidy("unlockTime", &self.unlock_time, &defaults.unlock_time);
        bag.set_tidy("reactionDelay", &self.reaction_delay, &defaults.reaction_delay);
        bag.set_tidy(
            "initiallyLocked",
            &self.initially_locked,
            &defaults.initially_locked,
        );
        bag.set_tidy("unlockSfx", &self.unlock_sfx, &defaults.unlock_sfx);
        bag.set_tidy("lockSfx", &self.lock_sfx, &defaults.lock_sfx);
    }
}

/// A listener that opens or closes named gates by direct method call
pub struct GateOpener {
    /// Shared listener state
    pub listener: Listener,
    /// Name of the gates to manipulate
    pub gate_name: String,
    /// True opens the gates; false closes them
    pub open: bool,
}

impl GateOpener {
    /// Create an opener with no gates configured
    pub fn new(id: ActorId) -> Self {
        Self {
            listener: Listener::new(id),
            gate_name: String::new(),
            open: true,
        }
    }

    fn on_trigger(&mut self, ctx: &mut UpdateContext) {
        let gates = ctx.actors.get_by_name(&self.gate_name);

        for id in gates {
            // Split the context so the gate can reach the map and services
            let mut gate = match ctx.actors.take(id) {
                Some(g) => g,
                None => continue,
            };
            if let Some(gate) = gate.downcast_mut::<TileGate>() {
                if self.open {
                    gate.unlock_gate(ctx);
                } else {
                    gate.lock_gate(ctx);
                }
            }
            ctx.actors.put_back(gate);
        }
    }
}

impl Entity for GateOpener {
    fn actor(&self) -> &Actor {
        &self.listener.base.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.listener.base.actor
    }

    fn type_name(&self) -> &'static str {
        "gate_opener"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn update(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        if self.listener.tick(dt_ms, ctx) {
            self.on_trigger(ctx);
        }
    }

    fn on_message(&mut self, msg: &ember_message::Message) {
        self.listener.handle_message(msg);
    }

    fn on_spawn(&mut self, ctx: &mut UpdateContext) {
        self.listener.setup_signals(ctx);
    }

    fn load(&mut self, bag: &PropertyBag) {
        self.listener.load_fields(bag);
        self.gate_name = bag.get_or("gateName", std::mem::take(&mut self.gate_name));
        self.open = bag.get_or("open", self.open);
    }

    fn save_tidy(&self, bag: &mut PropertyBag) {
        let defaults = GateOpener::new(ActorId::INVALID);
        self.listener.save_fields(bag, &defaults.listener);
        bag.set_tidy("gateName", &self.gate_name, &defaults.gate_name);
        bag.set_tidy("open", &self.open, &defaults.open);
    }
}
