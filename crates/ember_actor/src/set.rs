//! The actor set: sole owner of entity lifetime
//!
//! Iteration is in id order so a tick is reproducible. Entities are only
//! inserted and removed at tick boundaries, never while a pass is running.

use crate::actor::Actor;
use crate::collision::{is_collision, CollisionShape};
use crate::entity::Entity;
use ember_core::{ActorId, ActorIdAllocator};
use ember_message::{Message, MessageSink};
use std::collections::BTreeMap;

/// Owning map from id to entity
pub struct ActorSet {
    actors: BTreeMap<ActorId, Box<dyn Entity>>,
    allocator: ActorIdAllocator,
}

impl ActorSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            actors: BTreeMap::new(),
            allocator: ActorIdAllocator::new(),
        }
    }

    /// Reserve a fresh id for an entity about to be constructed
    pub fn allocate_id(&mut self) -> ActorId {
        self.allocator.next()
    }

    /// Insert a constructed entity under its own id
    pub fn add(&mut self, entity: Box<dyn Entity>) -> ActorId {
        let id = entity.actor().id;
        debug_assert!(id.is_valid(), "entity has no id");
        debug_assert!(!self.actors.contains_key(&id), "duplicate actor id {id}");
        self.actors.insert(id, entity);
        id
    }

    /// Allocate an id and insert the entity the constructor builds for it
    pub fn spawn_with<F>(&mut self, ctor: F) -> ActorId
    where
        F: FnOnce(ActorId) -> Box<dyn Entity>,
    {
        let id = self.allocate_id();
        self.add(ctor(id))
    }

    /// Whether an id refers to an owned entity
    pub fn is_member(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Borrow an entity
    pub fn get(&self, id: ActorId) -> Option<&dyn Entity> {
        self.actors.get(&id).map(|e| e.as_ref())
    }

    /// Mutably borrow an entity
    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut (dyn Entity + 'static)> {
        self.actors.get_mut(&id).map(|e| e.as_mut())
    }

    /// Borrow an entity's base actor state
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id).map(|e| e.actor())
    }

    /// Mutably borrow an entity's base actor state
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id).map(|e| e.actor_mut())
    }

    /// Check an entity out of the set for its update
    pub fn take(&mut self, id: ActorId) -> Option<Box<dyn Entity>> {
        self.actors.remove(&id)
    }

    /// Check an entity back in after its update
    pub fn put_back(&mut self, entity: Box<dyn Entity>) {
        self.actors.insert(entity.actor().id, entity);
    }

    /// Remove an entity outright
    pub fn remove(&mut self, id: ActorId) -> Option<Box<dyn Entity>> {
        self.actors.remove(&id)
    }

    /// All ids, in id order
    pub fn ids(&self) -> Vec<ActorId> {
        self.actors.keys().copied().collect()
    }

    /// Iterate over entities in id order
    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &dyn Entity)> {
        self.actors.iter().map(|(id, e)| (*id, e.as_ref()))
    }

    /// Ids of actors matching a name, case-insensitively
    pub fn get_by_name(&self, name: &str) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|(_, e)| e.actor().name.eq_ignore_ascii_case(name))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Ids of entities of a concrete type
    pub fn ids_of_type<T: 'static>(&self) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|(_, e)| e.as_ref().is::<T>())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of owned entities
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Drop every zombie entity; call only between ticks. Returns the
    /// number collected.
    pub fn garbage_collect(&mut self) -> usize {
        let before = self.actors.len();
        self.actors.retain(|_, e| !e.actor().zombie);
        before - self.actors.len()
    }

    /// Collision snapshots for every entity
    pub fn shapes(&self) -> Vec<CollisionShape> {
        self.actors
            .values()
            .map(|e| e.actor().collision_shape())
            .collect()
    }

    /// Phase one: every actor's collision list is computed against a
    /// consistent snapshot of everyone's position. Must complete for the
    /// whole set before any response runs.
    pub fn collision_detection_pass(&mut self) {
        let shapes = self.shapes();

        for entity in self.actors.values_mut() {
            let actor = entity.actor_mut();
            if actor.zombie {
                actor.collisions.clear();
                continue;
            }

            let mine = actor.collision_shape();
            actor.collisions = shapes
                .iter()
                .filter(|other| is_collision(&mine, other))
                .map(|other| other.id)
                .collect();
        }
    }

    /// Phase two: exchange collision callbacks, then commit or roll back
    /// each actor's position
    pub fn collision_response_pass(&mut self) {
        for id in self.ids() {
            let Some(actor) = self.actor(id) else { continue };
            if actor.zombie {
                continue;
            }
            let partners = actor.collisions.clone();

            // Both participants hear about the contact
            for partner in &partners {
                if let Some(other) = self.get_mut(*partner) {
                    other.on_collision(id);
                }
                if let Some(me) = self.get_mut(id) {
                    me.on_collision(*partner);
                }
            }

            if let Some(actor) = self.actor_mut(id) {
                if actor.collisions.is_empty() {
                    actor.record_validated_pos();
                } else {
                    actor.revert_to_validated_pos();
                }
            }
        }
    }
}

impl Default for ActorSet {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSink for ActorSet {
    fn deliver(&mut self, msg: &Message) -> bool {
        match self.get_mut(msg.recipient) {
            Some(entity) => {
                entity.on_message(msg);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for ActorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorSet")
            .field("actors", &self.actors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::BasicActor;
    use glam::Vec3;

    fn add_basic(set: &mut ActorSet, pos: Vec3, radius: f32) -> ActorId {
        set.spawn_with(|id| {
            let mut e = BasicActor::new(id);
            e.actor_mut().place(pos);
            e.actor_mut().cylinder_radius = radius;
            Box::new(e)
        })
    }

    #[test]
    fn test_membership_and_lookup() {
        let mut set = ActorSet::new();
        let id = add_basic(&mut set, Vec3::ZERO, 0.5);

        assert!(set.is_member(id));
        assert!(!set.is_member(ActorId::from_raw(999)));
        assert_eq!(set.actor(id).unwrap().cylinder_radius, 0.5);
    }

    #[test]
    fn test_get_by_name_is_case_insensitive() {
        let mut set = ActorSet::new();
        let id = add_basic(&mut set, Vec3::ZERO, 0.5);
        set.actor_mut(id).unwrap().name = String::from("NorthGate");

        assert_eq!(set.get_by_name("northgate"), vec![id]);
        assert!(set.get_by_name("southgate").is_empty());
    }

    #[test]
    fn test_detection_fills_collision_lists() {
        let mut set = ActorSet::new();
        let a = add_basic(&mut set, Vec3::ZERO, 1.0);
        let b = add_basic(&mut set, Vec3::new(1.0, 0.0, 0.0), 1.0);
        let far = add_basic(&mut set, Vec3::new(10.0, 0.0, 0.0), 1.0);

        set.collision_detection_pass();

        assert_eq!(set.actor(a).unwrap().collisions, vec![b]);
        assert_eq!(set.actor(b).unwrap().collisions, vec![a]);
        assert!(set.actor(far).unwrap().collisions.is_empty());
    }

    #[test]
    fn test_response_commits_or_rolls_back() {
        let mut set = ActorSet::new();
        let a = add_basic(&mut set, Vec3::ZERO, 1.0);
        let b = add_basic(&mut set, Vec3::new(5.0, 0.0, 0.0), 1.0);

        // Move a into b without validating
        set.actor_mut(a).unwrap().position = Vec3::new(4.5, 0.0, 0.0);

        set.collision_detection_pass();
        set.collision_response_pass();

        // a rolled back to its last validated position
        assert_eq!(set.actor(a).unwrap().position, Vec3::ZERO);
        // b also collided and rolled back to where it stood
        assert_eq!(set.actor(b).unwrap().position, Vec3::new(5.0, 0.0, 0.0));

        // With the rollback applied, the next tick is collision free and
        // positions commit
        set.collision_detection_pass();
        set.collision_response_pass();
        assert!(set.actor(a).unwrap().collisions.is_empty());
    }

    #[test]
    fn test_garbage_collect_removes_zombies() {
        let mut set = ActorSet::new();
        let a = add_basic(&mut set, Vec3::ZERO, 0.5);
        let b = add_basic(&mut set, Vec3::ZERO, 0.5);

        set.actor_mut(a).unwrap().zombie = true;
        assert_eq!(set.garbage_collect(), 1);
        assert!(!set.is_member(a));
        assert!(set.is_member(b));
    }
}
