//! # ember_combat - Creatures and Combat
//!
//! Creatures extend actors with health, combat stats, knockback, a
//! stun/freeze/death state machine, and the command-queue executor that
//! turns high-level FSM orders into movement and attacks.

pub mod creature;
pub mod projectile;

pub use creature::{deliver_strike, Creature, CreatureState, DamageResult};
pub use projectile::Projectile;

/// Prelude
pub mod prelude {
    pub use crate::{Creature, CreatureState, Projectile};
}
