//! The entity trait implemented by everything the actor set owns

use crate::actor::Actor;
use crate::context::UpdateContext;
use ember_core::{ActorId, PropertyBag};
use ember_message::Message;
use std::any::Any;

/// A simulated entity. The actor set is the sole owner of entity lifetime;
/// everything else refers to entities by [`ActorId`].
pub trait Entity {
    /// Base actor state
    fn actor(&self) -> &Actor;

    /// Mutable base actor state
    fn actor_mut(&mut self) -> &mut Actor;

    /// Data-driven type name, matching the entity factory registration
    fn type_name(&self) -> &'static str;

    /// Upcast for consumers that need the concrete type
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Run one simulation tick
    fn update(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        self.actor_mut().update(dt_ms, ctx.map);
    }

    /// Run one editor-mode tick: the frozen-world refresh path, with no
    /// physics, sliding, or collision
    fn update_for_editor(&mut self, dt_ms: f32, ctx: &mut UpdateContext) {
        self.actor_mut().update_for_editor(dt_ms, ctx.map);
    }

    /// Receive a routed message
    fn on_message(&mut self, msg: &Message) {
        debug_assert_eq!(
            self.actor().id,
            msg.recipient,
            "message was mailed to the wrong actor"
        );
    }

    /// The other participant of a collision this tick
    fn on_collision(&mut self, _other: ActorId) {}

    /// Reach within which a player may explicitly use this entity;
    /// `None` for entities that cannot be used
    fn use_radius(&self) -> Option<f32> {
        None
    }

    /// A player explicitly used this entity
    fn on_use(&mut self, _user: ActorId, _ctx: &mut UpdateContext) {}

    /// Called once after the entity is loaded, placed, and inserted;
    /// signal subscriptions and other zone-coupled setup happen here
    fn on_spawn(&mut self, _ctx: &mut UpdateContext) {}

    /// Read state from a property bag
    fn load(&mut self, bag: &PropertyBag) {
        self.actor_mut().load(bag);
    }

    /// Write state to a property bag, omitting inherited defaults
    fn save_tidy(&self, bag: &mut PropertyBag) {
        let defaults = Actor::new(ActorId::INVALID);
        self.actor().save_tidy(bag, &defaults);
    }
}

impl<'e> dyn Entity + 'e {
    /// Downcast to a concrete entity type
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Downcast to a mutable concrete entity type
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }

    /// Check the concrete entity type
    pub fn is<T: 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// A plain actor with no behavior of its own: scenery, props, markers
#[derive(Debug, Clone)]
pub struct BasicActor {
    actor: Actor,
}

impl BasicActor {
    /// Create a basic actor
    pub fn new(id: ActorId) -> Self {
        Self {
            actor: Actor::new(id),
        }
    }
}

impl Entity for BasicActor {
    fn actor(&self) -> &Actor {
        &self.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }

    fn type_name(&self) -> &'static str {
        "actor"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
