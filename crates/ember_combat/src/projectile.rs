//! Fired projectiles
//!
//! A projectile flies in a straight line, never collides with its firer,
//! and converts its first contact into damage before removing itself.

use crate::creature::Creature;
use ember_actor::{Actor, CollisionTag, Entity, UpdateContext};
use ember_core::{ActorId, PropertyBag};
use std::any::Any;

/// A straight-line projectile with an owner exclusion
pub struct Projectile {
    /// Base actor state; the collision tag carries the owner
    pub actor: Actor,
    /// Damage dealt on contact
    pub damage: i32,
    /// Milliseconds before the projectile expires on its own
    pub life_ms: f32,
}

impl Projectile {
    /// Create a projectile fired by `owner`
    pub fn new(id: ActorId, owner: ActorId, damage: i32) -> Self {
        let mut actor = Actor::new(id);
        actor.tag = CollisionTag::projectile(owner);
        actor.floating = true;
        // Projectiles coast; friction would stop them mid-flight
        actor.friction_acceleration = 0.0;
        actor.set_height(0.25);

        Self {
            actor,
            damage,
            life_ms: 2000.0,
        }
    }

    /// The actor that fired this projectile
    pub fn owner(&self) -> ActorId {
        self.actor.tag.owner
    }
}

impl Entity for Projectile {
    fn actor(&self) -> &Actor {
        &self.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }

    fn type_name(&self) -> &'static str {
        "projectile"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn update(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        self.life_ms -= dt_ms;
        if self.life_ms <= 0.0 {
            self.actor.zombie = true;
        }

        // Contacts found by the previous tick's collision passes
        if !self.actor.zombie {
            if let Some(&hit) = self.actor.collisions.first() {
                let owner = self.owner();
                if let Some(creature) = ctx
                    .actors
                    .get_mut(hit)
                    .and_then(|e| e.downcast_mut::<Creature>())
                {
                    creature.damage(self.damage, owner, Some(self.actor.position), ctx.services);
                }
                self.actor.zombie = true;
            }
        }

        self.actor.update(dt_ms, ctx.map);
    }

    fn load(&mut self, bag: &PropertyBag) {
        self.actor.load(bag);
        self.damage = bag.get_or("damage", self.damage);
        self.life_ms = bag.get_or("lifeMs", self.life_ms);
    }
}
