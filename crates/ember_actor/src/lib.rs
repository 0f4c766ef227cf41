//! # ember_actor - Simulated Entities
//!
//! The base entity layer of the simulation core:
//! - `Actor`: transform, velocity, friction, terrain snapping, wall sliding
//! - Two-phase collision detection and response with position rollback
//! - `ActorSet`: the sole owner of entity lifetime
//! - `UpdateContext`: the per-tick world view handed to updating entities

pub mod actor;
pub mod collision;
pub mod context;
pub mod entity;
pub mod map;
pub mod orientation;
pub mod services;
pub mod set;

pub use actor::Actor;
pub use collision::{CollisionGroup, CollisionShape, CollisionTag, COLLISION_SHRINK};
pub use context::{PendingStrike, SpawnRequest, UpdateContext};
pub use entity::{BasicActor, Entity};
pub use map::{Map, Tile};
pub use orientation::Basis;
pub use services::{NullServices, RecordingServices, WorldServices};
pub use set::ActorSet;

/// Prelude
pub mod prelude {
    pub use crate::{
        Actor, ActorSet, Basis, CollisionGroup, CollisionTag, Entity, Map, Tile, UpdateContext,
        WorldServices,
    };
}
