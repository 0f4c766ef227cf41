//! Actor-versus-actor collision rules
//!
//! Collision tests run against per-tick snapshots so that detection reads a
//! consistent picture of everyone's position. Pair exclusions (a projectile
//! passing through its firer, players passing through each other) are
//! carried by a [`CollisionTag`] on each actor rather than concrete-type
//! checks.

use ember_core::ActorId;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Shrink factor applied to the combined cylinder radii: cylinders must
/// overlap fairly deeply before a collision registers
pub const COLLISION_SHRINK: f32 = 0.70;

/// Broad collision class of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollisionGroup {
    /// Ordinary solid actor
    #[default]
    Default,
    /// Player-controlled; players never collide with each other
    Player,
    /// Fired projectile; never collides with its owner
    Projectile,
}

/// Pluggable collision-exclusion policy data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollisionTag {
    /// Broad class
    pub group: CollisionGroup,
    /// For projectiles, the actor that fired it
    pub owner: ActorId,
}

impl CollisionTag {
    /// Tag for a player-controlled actor
    pub fn player() -> Self {
        Self {
            group: CollisionGroup::Player,
            owner: ActorId::INVALID,
        }
    }

    /// Tag for a projectile fired by `owner`
    pub fn projectile(owner: ActorId) -> Self {
        Self {
            group: CollisionGroup::Projectile,
            owner,
        }
    }
}

/// Per-actor snapshot used by the detection pass
#[derive(Debug, Clone, Copy)]
pub struct CollisionShape {
    /// Actor handle
    pub id: ActorId,
    /// Position at the start of the detection pass
    pub position: Vec3,
    /// Cylinder radius
    pub cylinder_radius: f32,
    /// Whether the actor takes part in collision at all
    pub solid: bool,
    /// Whether the actor is awaiting removal
    pub zombie: bool,
    /// Exclusion policy data
    pub tag: CollisionTag,
}

/// Distance between two points ignoring the vertical axis
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    let delta = a - b;
    Vec3::new(delta.x, 0.0, delta.z).length()
}

/// Whether the exclusion policy rules this pair out
fn is_excluded(a: &CollisionShape, b: &CollisionShape) -> bool {
    if a.tag.group == CollisionGroup::Player && b.tag.group == CollisionGroup::Player {
        return true;
    }
    if a.tag.group == CollisionGroup::Projectile && a.tag.owner == b.id {
        return true;
    }
    if b.tag.group == CollisionGroup::Projectile && b.tag.owner == a.id {
        return true;
    }
    false
}

/// The full collision test between two snapshots
pub fn is_collision(a: &CollisionShape, b: &CollisionShape) -> bool {
    if a.id == b.id {
        return false; // cannot collide with self
    }
    if a.zombie || b.zombie {
        return false; // cannot collide with zombies
    }
    if !a.solid || !b.solid {
        return false; // cannot collide with non-solid actors
    }

    let min_dist = (a.cylinder_radius + b.cylinder_radius) * COLLISION_SHRINK;
    if planar_distance(a.position, b.position) - min_dist > 0.0 {
        // An intersection assuredly did not occur
        return false;
    }

    !is_excluded(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(id: i64, x: f32) -> CollisionShape {
        CollisionShape {
            id: ActorId::from_raw(id),
            position: Vec3::new(x, 0.0, 0.0),
            cylinder_radius: 1.0,
            solid: true,
            zombie: false,
            tag: CollisionTag::default(),
        }
    }

    #[test]
    fn test_deep_overlap_required() {
        let a = shape(1, 0.0);
        // Combined radii 2.0, shrunk threshold 1.4
        let b = shape(2, 1.5);
        assert!(!is_collision(&a, &b));

        let c = shape(3, 1.3);
        assert!(is_collision(&a, &c));
    }

    #[test]
    fn test_self_zombie_nonsolid_carveouts() {
        let a = shape(1, 0.0);
        assert!(!is_collision(&a, &a));

        let mut z = shape(2, 0.0);
        z.zombie = true;
        assert!(!is_collision(&a, &z));

        let mut n = shape(3, 0.0);
        n.solid = false;
        assert!(!is_collision(&a, &n));
    }

    #[test]
    fn test_vertical_offset_ignored() {
        let a = shape(1, 0.0);
        let mut b = shape(2, 0.5);
        b.position.y = 100.0;
        assert!(is_collision(&a, &b));
    }

    #[test]
    fn test_projectile_skips_owner_only() {
        let owner = shape(1, 0.0);
        let bystander = shape(2, 0.3);

        let mut bullet = shape(3, 0.1);
        bullet.tag = CollisionTag::projectile(ActorId::from_raw(1));

        assert!(!is_collision(&bullet, &owner));
        assert!(!is_collision(&owner, &bullet));
        assert!(is_collision(&bullet, &bystander));
    }

    #[test]
    fn test_players_pass_through_each_other() {
        let mut a = shape(1, 0.0);
        let mut b = shape(2, 0.2);
        a.tag = CollisionTag::player();
        b.tag = CollisionTag::player();

        assert!(!is_collision(&a, &b));

        let npc = shape(3, 0.2);
        assert!(is_collision(&a, &npc));
    }
}
