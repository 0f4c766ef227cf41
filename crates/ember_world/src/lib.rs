//! # ember_world - Zone Orchestration
//!
//! The top of the simulation core: a `Zone` owns the actor set, message
//! router, tile map, services, and clock, and steps them in the strict
//! per-tick order the collision and messaging protocols require.

pub mod factory;
pub mod zone;

pub use factory::EntityFactory;
pub use zone::Zone;

pub use ember_actor::{NullServices, RecordingServices, WorldServices};

/// Prelude
pub mod prelude {
    pub use crate::{EntityFactory, NullServices, WorldServices, Zone};
}
