//! Entity construction by data-driven type name

use ember_actor::{BasicActor, Entity};
use ember_combat::{Creature, Projectile};
use ember_core::{ActorId, FactoryError, FactoryRegistry};
use ember_triggers::{
    Detector, GateOpener, Listener, PowerupHeal, Spawner, Switch, Teleporter, TileGate, Trigger,
};

/// Registry mapping data-file type names to entity constructors
pub struct EntityFactory {
    inner: FactoryRegistry<Box<dyn Entity>>,
}

impl EntityFactory {
    /// Create an empty factory
    pub fn new() -> Self {
        Self {
            inner: FactoryRegistry::new(),
        }
    }

    /// Create a factory with every stock entity type registered
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();

        factory.register("actor", |id| Box::new(BasicActor::new(id)));
        factory.register("creature", |id| Box::new(Creature::new(id)));
        factory.register("player", |id| Box::new(Creature::new_player(id)));
        factory.register("projectile", |id| {
            Box::new(Projectile::new(id, ActorId::INVALID, 0))
        });
        factory.register("trigger", |id| Box::new(Trigger::new(id)));
        factory.register("detector", |id| Box::new(Detector::new(id)));
        factory.register("proximity_detector", |id| Box::new(Detector::proximity(id)));
        factory.register("listener", |id| Box::new(Listener::new(id)));
        factory.register("switch", |id| Box::new(Switch::new(id)));
        factory.register("tile_gate", |id| Box::new(TileGate::new(id)));
        factory.register("gate_opener", |id| Box::new(GateOpener::new(id)));
        factory.register("powerup_heal", |id| Box::new(PowerupHeal::new(id)));
        factory.register("teleporter", |id| Box::new(Teleporter::new(id)));
        factory.register("spawner", |id| Box::new(Spawner::new(id)));

        factory
    }

    /// Register an entity constructor under a type name
    pub fn register<F>(&mut self, name: &str, ctor: F)
    where
        F: Fn(ActorId) -> Box<dyn Entity> + Send + Sync + 'static,
    {
        if self.inner.register(name, ctor).is_err() {
            log::warn!("entity type registered twice: {name}");
        }
    }

    /// Construct an entity of the named type
    pub fn create(&self, name: &str, id: ActorId) -> Result<Box<dyn Entity>, FactoryError> {
        self.inner.create(name, id)
    }

    /// Check whether a type name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }
}

impl Default for EntityFactory {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for EntityFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityFactory")
            .field("inner", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let factory = EntityFactory::with_builtins();
        for name in [
            "actor",
            "creature",
            "player",
            "trigger",
            "detector",
            "proximity_detector",
            "listener",
            "switch",
            "tile_gate",
            "gate_opener",
            "powerup_heal",
            "teleporter",
            "spawner",
        ] {
            assert!(factory.contains(name), "missing builtin: {name}");
        }
    }

    #[test]
    fn test_created_entities_report_their_type() {
        let factory = EntityFactory::with_builtins();
        let entity = factory.create("listener", ActorId::from_raw(5)).unwrap();
        assert_eq!(entity.type_name(), "listener");
        assert_eq!(entity.actor().id.raw(), 5);
    }

    #[test]
    fn test_unknown_type_errors() {
        let factory = EntityFactory::with_builtins();
        assert!(factory.create("wisp", ActorId::from_raw(1)).is_err());
    }
}
