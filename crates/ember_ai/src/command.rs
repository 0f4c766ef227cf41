//! Low-level AI orders
//!
//! A `Command` is an immutable value describing one order. Creatures own a
//! FIFO deque of pending commands; the front is the current order and the
//! high-level FSM is the only producer.

use ember_core::ActorId;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Milliseconds until an order is cancelled when no timeout is given
pub const DEFAULT_COMMAND_TIMEOUT_MS: f32 = 2000.0;

/// The action a creature will attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// Stand in place, facing the target
    Freeze,
    /// Move to an actor
    MoveToTarget,
    /// Move to a point in space
    MoveToPos,
    /// Swing at the target if in range
    Attack,
    /// Move to an actor and use it
    Use,
    /// Flee from the target until the proximity distance is exceeded
    Flee,
}

/// One low-level AI order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// The action to perform
    pub kind: CommandKind,
    /// Goal point for position-based orders
    pub position: Vec3,
    /// Goal actor for target-based orders
    pub target: ActorId,
    /// Fraction of top speed to move at, in [-1, 1]
    pub desired_speed: f32,
    /// Distance from the goal at which it counts as reached
    pub desired_proximity: f32,
    /// Milliseconds until the order is cancelled
    pub timeout_ms: f32,
}

impl Command {
    fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            position: Vec3::ZERO,
            target: ActorId::INVALID,
            desired_speed: 1.0,
            desired_proximity: 1.0,
            timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
        }
    }

    /// Stand in place for `timeout_ms`, facing `target`
    pub fn freeze(target: ActorId, timeout_ms: f32) -> Self {
        Self::new(CommandKind::Freeze)
            .with_target(target)
            .with_timeout(timeout_ms)
    }

    /// Move toward an actor
    pub fn move_to_target(target: ActorId) -> Self {
        Self::new(CommandKind::MoveToTarget).with_target(target)
    }

    /// Move toward a point in space
    pub fn move_to_pos(position: Vec3) -> Self {
        Self::new(CommandKind::MoveToPos).with_position(position)
    }

    /// Chase and swing at an actor
    pub fn attack(target: ActorId) -> Self {
        Self::new(CommandKind::Attack).with_target(target)
    }

    /// Move to an actor and use it
    pub fn use_target(target: ActorId) -> Self {
        Self::new(CommandKind::Use).with_target(target)
    }

    /// Run from an actor until `desired_proximity` is exceeded
    pub fn flee(target: ActorId, desired_proximity: f32) -> Self {
        Self::new(CommandKind::Flee)
            .with_target(target)
            .with_proximity(desired_proximity)
    }

    /// Set the goal actor
    pub fn with_target(mut self, target: ActorId) -> Self {
        self.target = target;
        self
    }

    /// Set the goal point
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the movement speed fraction
    pub fn with_speed(mut self, speed: f32) -> Self {
        debug_assert!((-1.0..=1.0).contains(&speed), "speed out of range: {speed}");
        self.desired_speed = speed.clamp(-1.0, 1.0);
        self
    }

    /// Set the goal proximity
    pub fn with_proximity(mut self, proximity: f32) -> Self {
        self.desired_proximity = proximity;
        self
    }

    /// Set the cancellation timeout in milliseconds
    pub fn with_timeout(mut self, timeout_ms: f32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}
