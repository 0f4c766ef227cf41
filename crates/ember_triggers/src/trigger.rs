//! Proximity trigger base

use ember_actor::{Actor, Entity, UpdateContext};
use ember_core::{ActorId, PropertyBag};
use std::any::Any;

/// A proximity-activated actor. Polls "any player within reach" every tick
/// and plays one of its configured sounds while the condition holds. The
/// rest of the family embeds this state and replaces the reaction.
pub struct Trigger {
    /// Base actor state
    pub actor: Actor,
    /// Reach of the proximity test, in addition to the visitor's radius
    pub trigger_radius: f32,
    /// Candidate sound effects; one is chosen at random per firing
    pub sounds: Vec<String>,
}

impl Trigger {
    /// Create a trigger with the stock reach
    pub fn new(id: ActorId) -> Self {
        Self {
            actor: Actor::new(id),
            trigger_radius: 2.0,
            sounds: Vec::new(),
        }
    }

    /// First player inside the trigger's reach
    pub fn player_in_proximity(&self, ctx: &UpdateContext) -> Option<ActorId> {
        ctx.player_in_proximity(&self.actor, self.trigger_radius)
    }

    /// Default poll: is any player in reach
    pub fn poll_conditions(&self, ctx: &UpdateContext) -> bool {
        self.player_in_proximity(ctx).is_some()
    }

    /// Play one of the configured sounds at the trigger's position
    pub fn play_trigger_sound(&self, ctx: &mut UpdateContext) {
        if self.sounds.is_empty() {
            return;
        }
        let index = ctx.random_index(self.sounds.len());
        let sfx = self.sounds[index].clone();
        ctx.services.play_sound_3d(&sfx, self.actor.position);
    }

    /// Read the shared trigger fields from a bag
    pub fn load_fields(&mut self, bag: &PropertyBag) {
        self.actor.load(bag);
        self.sounds = bag.get_list("sounds");
        // Reach defaults to the body's own radius
        self.trigger_radius = bag.get_or("triggerRadius", self.actor.cylinder_radius);
    }

    /// Write the shared trigger fields to a bag
    pub fn save_fields(&self, bag: &mut PropertyBag, defaults: &Trigger) {
        self.actor.save_tidy(bag, &defaults.actor);
        bag.set_list("sounds", &self.sounds);
        bag.set_tidy("triggerRadius", &self.trigger_radius, &defaults.trigger_radius);
    }
}

impl Entity for Trigger {
    fn actor(&self) -> &Actor {
        &self.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }

    fn type_name(&self) -> &'static str {
        "trigger"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn update(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        self.actor.update(dt_ms, ctx.map);

        if self.poll_conditions(ctx) {
            self.play_trigger_sound(ctx);
        }
    }

    fn load(&mut self, bag: &PropertyBag) {
        self.load_fields(bag);
    }

    fn save_tidy(&self, bag: &mut PropertyBag) {
        self.save_fields(bag, &Trigger::new(ActorId::INVALID));
    }
}
