//! Pickups

use crate::switch::Switch;
use ember_actor::{Actor, Entity, UpdateContext};
use ember_combat::Creature;
use ember_core::{ActorId, PropertyBag};
use std::any::Any;

/// A use-activated pickup that restores health and removes itself
pub struct PowerupHeal {
    /// Shared switch state (prompt + use routing)
    pub switch: Switch,
    /// Health restored on pickup
    pub heal_value: i32,
}

impl PowerupHeal {
    /// Create a heal pickup with the stock value
    pub fn new(id: ActorId) -> Self {
        let mut switch = Switch::new(id);
        switch.action_label = String::from("pick it up.");
        switch.base.actor.solid = false;
        Self {
            switch,
            heal_value: 30,
        }
    }
}

impl Entity for PowerupHeal {
    fn actor(&self) -> &Actor {
        &self.switch.base.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.switch.base.actor
    }

    fn type_name(&self) -> &'static str {
        "powerup_heal"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn update(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        self.switch.tick_prompt(dt_ms, ctx);
        self.switch.base.actor.update(dt_ms, ctx.map);

        // Pickups hover at chest height above their tile
        let actor = &mut self.switch.base.actor;
        if let Some(tile) = ctx.map.tile_at(actor.position.x, actor.position.z) {
            actor.position.y = tile.height + actor.sphere_radius;
        }
    }

    fn use_radius(&self) -> Option<f32> {
        Some(self.switch.base.trigger_radius)
    }

    fn on_use(&mut self, user: ActorId, ctx: &mut UpdateContext) {
        self.switch.fire(ctx);

        if let Some(player) = ctx
            .actors
            .get_mut(user)
            .and_then(|e| e.downcast_mut::<Creature>())
        {
            player.heal(self.heal_value, ctx.services);
        }

        // Disappear after use
        self.switch.base.actor.zombie = true;
    }

    fn load(&mut self, bag: &PropertyBag) {
        self.switch.load_fields(bag);
        self.heal_value = bag.get_or("healValue", self.heal_value);
    }

    fn save_tidy(&self, bag: &mut PropertyBag) {
        let defaults = PowerupHeal::new(ActorId::INVALID);
        self.switch.save_fields(bag, &defaults.switch);
        bag.set_tidy("healValue", &self.heal_value, &defaults.heal_value);
    }
}
