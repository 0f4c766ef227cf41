//! Signal-raising detectors

use crate::trigger::Trigger;
use ember_actor::{Actor, Entity, UpdateContext};
use ember_core::{ActorId, PropertyBag};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// What a detector watches for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorCondition {
    /// Always satisfied; useful with trip-once for one-shot script starts
    Always,
    /// Any player inside the trigger radius
    PlayerProximity,
}

/// Raises one signal while its condition holds and another while it does
/// not. With bouncing disallowed (the default) the success signal fires
/// only on the condition's rising edge.
pub struct Detector {
    /// Shared trigger state
    pub base: Trigger,
    /// What to watch for
    pub condition: DetectorCondition,
    /// Signal raised on trigger; negative disables
    pub signal_success: i32,
    /// Signal raised on non-trigger; negative disables
    pub signal_fail: i32,
    /// Makes the first success permanent
    pub only_trip_once: bool,
    /// When false the success signal re-fires every tick the condition holds
    pub disallow_bounce: bool,
    triggered_once: bool,
    debounce: bool,
}

impl Detector {
    /// Create a detector that is always satisfied
    pub fn new(id: ActorId) -> Self {
        Self {
            base: Trigger::new(id),
            condition: DetectorCondition::Always,
            signal_success: -1,
            signal_fail: -1,
            only_trip_once: false,
            disallow_bounce: true,
            triggered_once: false,
            debounce: false,
        }
    }

    /// Create a player-proximity detector
    pub fn proximity(id: ActorId) -> Self {
        let mut d = Self::new(id);
        d.condition = DetectorCondition::PlayerProximity;
        d
    }

    fn poll(&self, ctx: &UpdateContext) -> bool {
        match self.condition {
            DetectorCondition::Always => true,
            DetectorCondition::PlayerProximity => self.base.poll_conditions(ctx),
        }
    }

    fn on_trigger(&mut self, ctx: &mut UpdateContext) {
        if self.only_trip_once && self.triggered_once {
            return;
        }
        ctx.raise_signal(self.signal_success);
        self.triggered_once = true;
    }

    fn on_doesnt_trigger(&mut self, ctx: &mut UpdateContext) {
        ctx.raise_signal(self.signal_fail);
    }
}

impl Entity for Detector {
    fn actor(&self) -> &Actor {
        &self.base.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.base.actor
    }

    fn type_name(&self) -> &'static str {
        match self.condition {
            DetectorCondition::Always => "detector",
            DetectorCondition::PlayerProximity => "proximity_detector",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn update(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        self.base.actor.update(dt_ms, ctx.map);

        if self.poll(ctx) {
            if !self.debounce || !self.disallow_bounce {
                self.debounce = true;
                self.on_trigger(ctx);
            }
        } else {
            self.debounce = false;
            self.on_doesnt_trigger(ctx);
        }
    }

    fn load(&mut self, bag: &PropertyBag) {
        self.base.load_fields(bag);
        self.signal_success = bag.get_or("signalSuccess", self.signal_success);
        self.signal_fail = bag.get_or("signalFail", self.signal_fail);
        self.only_trip_once = bag.get_or("onlyTripOnce", self.only_trip_once);
        self.disallow_bounce = bag.get_or("disallowBounce", self.disallow_bounce);
    }

    fn save_tidy(&self, bag: &mut PropertyBag) {
        let defaults = Detector::new(ActorId::INVALID);
        self.base.save_fields(bag, &defaults.base);
        bag.set_tidy("signalSuccess", &self.signal_success, &defaults.signal_success);
        bag.set_tidy("signalFail", &self.signal_fail, &defaults.signal_fail);
        bag.set_tidy("onlyTripOnce", &self.only_trip_once, &defaults.only_trip_once);
        bag.set_tidy(
            "disallowBounce",
            &self.disallow_bounce,
            &defaults.disallow_bounce,
        );
    }
}
