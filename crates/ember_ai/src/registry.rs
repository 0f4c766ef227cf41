//! Named state machine factory
//!
//! Creatures name their high-level behavior in data ("monster", "none");
//! the registry turns the name into a fresh [`Fsm`]. An unknown name
//! degrades to no machine rather than failing the load.

use crate::fsm::{Fsm, StateLogic};
use crate::monster::MonsterFsm;
use ember_core::{ActorId, FactoryRegistry};
use log::warn;

/// The name that explicitly requests no state machine
pub const FSM_NONE: &str = "none";

/// Registry of named state machine ladders
pub struct FsmRegistry {
    inner: FactoryRegistry<Box<dyn StateLogic + Send + Sync>>,
}

impl FsmRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: FactoryRegistry::new(),
        }
    }

    /// Create a registry with the stock ladders registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("monster", |_| Box::new(MonsterFsm::new()));
        registry
    }

    /// Register a ladder constructor under a name. Re-registering a name is
    /// a data-authoring bug and is ignored with a warning.
    pub fn register<F>(&mut self, name: &str, ctor: F)
    where
        F: Fn(ActorId) -> Box<dyn StateLogic + Send + Sync> + Send + Sync + 'static,
    {
        if self.inner.register(name, ctor).is_err() {
            warn!("state machine type registered twice: {name}");
        }
    }

    /// Build the named machine for an owner, or `None` for the literal
    /// "none" or an unknown name (the latter is logged)
    pub fn create(&self, name: &str, owner: ActorId) -> Option<Fsm> {
        if name == FSM_NONE {
            return None;
        }

        match self.inner.create(name, owner) {
            Ok(logic) => Some(Fsm::new(logic)),
            Err(_) => {
                warn!("unknown state machine type {name:?}; creature {owner} gets no FSM");
                None
            }
        }
    }

    /// Check whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }
}

impl Default for FsmRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for FsmRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsmRegistry")
            .field("inner", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_monster() {
        let registry = FsmRegistry::with_builtins();
        assert!(registry.contains("monster"));
        assert!(registry.create("monster", ActorId::from_raw(1)).is_some());
    }

    #[test]
    fn test_none_and_unknown_fall_back() {
        let registry = FsmRegistry::with_builtins();
        assert!(registry.create("none", ActorId::from_raw(1)).is_none());
        assert!(registry.create("haunted", ActorId::from_raw(1)).is_none());
    }
}
