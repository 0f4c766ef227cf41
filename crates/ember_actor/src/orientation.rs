//! Orthonormal orientation basis

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// An orthonormal triad describing actor orientation. By convention the
/// local Z axis points from a faced target back toward the actor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Basis {
    /// Local X axis
    pub x: Vec3,
    /// Local Y axis (up)
    pub y: Vec3,
    /// Local Z axis
    pub z: Vec3,
}

impl Basis {
    /// The identity orientation
    pub const IDENTITY: Basis = Basis {
        x: Vec3::X,
        y: Vec3::Y,
        z: Vec3::Z,
    };

    /// Build a basis whose Z axis is the given planar direction
    pub fn from_planar_z(z: Vec3) -> Self {
        let z = Vec3::new(z.x, 0.0, z.z).normalize_or_zero();
        if z == Vec3::ZERO {
            return Self::IDENTITY;
        }
        let y = Vec3::Y;
        let x = y.cross(z);
        Self { x, y, z }
    }

    /// Orient so the actor at `position` faces `center`
    pub fn looking_at(position: Vec3, center: Vec3) -> Self {
        Self::from_planar_z(position - center)
    }

    /// Angle in radians between world X and the local X axis
    pub fn real_angle_y(&self) -> f32 {
        self.x.normalize_or_zero().dot(Vec3::X).clamp(-1.0, 1.0).acos()
    }
}

impl Default for Basis {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity() {
        let b = Basis::default();
        assert_eq!(b.z, Vec3::Z);
    }

    #[test]
    fn test_looking_at_is_planar() {
        let b = Basis::looking_at(Vec3::new(0.0, 5.0, 0.0), Vec3::new(3.0, 0.0, 0.0));
        assert_relative_eq!(b.z.y, 0.0);
        assert_relative_eq!(b.z.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(b.z.length(), 1.0, epsilon = 1e-6);
        // Right-handed triad
        assert_relative_eq!(b.x.dot(b.z), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_direction_falls_back() {
        let b = Basis::looking_at(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(b, Basis::IDENTITY);
    }
}
