//! Use-activated switches

use crate::trigger::Trigger;
use ember_actor::{Actor, Entity, UpdateContext};
use ember_core::{ActorId, PropertyBag};
use std::any::Any;

/// A trigger that never fires from passive polling: only an explicit
/// player "use" in proximity activates it. While a player is near, a
/// fading prompt names the action.
pub struct Switch {
    /// Shared trigger state
    pub base: Trigger,
    /// Verb shown in the prompt ("Press [use] to ...")
    pub action_label: String,
    /// Milliseconds the prompt lingers after the player walks away
    pub time: f32,
    fade_timer: f32,
    prompt_handle: i32,
}

impl Switch {
    /// Create a switch with the stock prompt
    pub fn new(id: ActorId) -> Self {
        Self {
            base: Trigger::new(id),
            action_label: String::from("flip the switch."),
            time: 1000.0,
            fade_timer: 1000.0,
            prompt_handle: -1,
        }
    }

    /// Shared prompt-and-fade tick for switch-like entities
    pub fn tick_prompt(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        self.fade_timer -= dt_ms;

        if self.base.player_in_proximity(ctx).is_some() {
            // Keep the countdown pinned while a player is near
            self.fade_timer = self.time;

            if self.prompt_handle == -1 {
                let message = format!("Press [use] to {}", self.action_label);
                self.prompt_handle = ctx.services.prompt_add(&message, self.fade_timer);
            } else {
                ctx.services.prompt_renew(self.prompt_handle);
            }
        }

        if self.fade_timer < 0.0 {
            self.fade_timer = 0.0;
            ctx.services.prompt_remove(self.prompt_handle);
            self.prompt_handle = -1;
        }
    }

    /// Shared use reaction: drop the prompt and play the trigger sound
    pub fn fire(&mut self, ctx: &mut UpdateContext) {
        ctx.services.prompt_remove(self.prompt_handle);
        self.prompt_handle = -1;
        self.base.play_trigger_sound(ctx);
    }

    /// Read switch fields from a bag
    pub fn load_fields(&mut self, bag: &PropertyBag) {
        self.base.load_fields(bag);
        self.action_label = bag.get_or("actionLabel", std::mem::take(&mut self.action_label));
        self.time = bag.get_or("time", self.time);
        self.fade_timer = self.time;
    }

    /// Write switch fields to a bag
    pub fn save_fields(&self, bag: &mut PropertyBag, defaults: &Switch) {
        self.base.save_fields(bag, &defaults.base);
        bag.set_tidy("actionLabel", &self.action_label, &defaults.action_label);
        bag.set_tidy("time", &self.time, &defaults.time);
    }
}

impl Entity for Switch {
    fn actor(&self) -> &Actor {
        &self.base.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.base.actor
    }

    fn type_name(&self) -> &'static str {
        "switch"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn update(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        self.tick_prompt(dt_ms, ctx);
        self.base.actor.update(dt_ms, ctx.map);
    }

    fn use_radius(&self) -> Option<f32> {
        Some(self.base.trigger_radius)
    }

    fn on_use(&mut self, _user: ActorId, ctx: &mut UpdateContext) {
        self.fire(ctx);
    }

    fn load(&mut self, bag: &PropertyBag) {
        self.load_fields(bag);
    }

    fn save_tidy(&self, bag: &mut PropertyBag) {
        self.save_fields(bag, &Switch::new(ActorId::INVALID));
    }
}
