//! Name-keyed factory registries
//!
//! Replaces runtime type identification with an explicit mapping from
//! string type-names to constructor closures. Both the entity factory and
//! the state machine factory are instances of this registry.

use crate::id::ActorId;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by a factory registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    /// No constructor registered under the requested name
    #[error("unknown type name: {0}")]
    UnknownType(String),
    /// A constructor is already registered under this name
    #[error("type name already registered: {0}")]
    AlreadyRegistered(String),
}

/// Constructor closure for a registered type
pub type Constructor<T> = Box<dyn Fn(ActorId) -> T + Send + Sync>;

/// Registry mapping string type-names to constructor closures
pub struct FactoryRegistry<T> {
    constructors: BTreeMap<String, Constructor<T>>,
}

impl<T> FactoryRegistry<T> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Register a constructor under a type name
    pub fn register<F>(&mut self, name: impl Into<String>, ctor: F) -> Result<(), FactoryError>
    where
        F: Fn(ActorId) -> T + Send + Sync + 'static,
    {
        let name = name.into();
        if self.constructors.contains_key(&name) {
            return Err(FactoryError::AlreadyRegistered(name));
        }
        self.constructors.insert(name, Box::new(ctor));
        Ok(())
    }

    /// Create an instance of a registered type
    pub fn create(&self, name: &str, id: ActorId) -> Result<T, FactoryError> {
        match self.constructors.get(name) {
            Some(ctor) => Ok(ctor(id)),
            None => Err(FactoryError::UnknownType(name.into())),
        }
    }

    /// Check if a type name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Iterate over all registered type names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Get the number of registered types
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl<T> Default for FactoryRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for FactoryRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("types", &self.constructors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Widget {
        id: ActorId,
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = FactoryRegistry::new();
        registry.register("widget", |id| Widget { id }).unwrap();

        assert!(registry.contains("widget"));

        let w = registry.create("widget", ActorId::from_raw(7)).unwrap();
        assert_eq!(w.id.raw(), 7);
    }

    #[test]
    fn test_unknown_type() {
        let registry: FactoryRegistry<Widget> = FactoryRegistry::new();
        let err = registry.create("ghost", ActorId::INVALID).unwrap_err();
        assert_eq!(err, FactoryError::UnknownType("ghost".into()));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = FactoryRegistry::new();
        registry.register("widget", |id| Widget { id }).unwrap();
        let err = registry.register("widget", |id| Widget { id }).unwrap_err();
        assert_eq!(err, FactoryError::AlreadyRegistered("widget".into()));
    }
}
