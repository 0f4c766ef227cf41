//! # ember_triggers - Level Scripting Entities
//!
//! Proximity- and signal-driven actors that couple the simulation to level
//! scripts: triggers, detectors, listeners, switches, gates, powerups,
//! teleporters, and spawners. Two coupling styles coexist here: broadcast
//! signals through the message router for loose coupling, and direct method
//! calls (gate opener onto gates) for tight level-scripted effects.

pub mod detector;
pub mod gate;
pub mod listener;
pub mod powerup;
pub mod spawner;
pub mod switch;
pub mod teleporter;
pub mod trigger;

pub use detector::{Detector, DetectorCondition};
pub use gate::{GateOpener, TileGate};
pub use listener::Listener;
pub use powerup::PowerupHeal;
pub use spawner::Spawner;
pub use switch::Switch;
pub use teleporter::Teleporter;
pub use trigger::Trigger;

/// Prelude
pub mod prelude {
    pub use crate::{
        Detector, GateOpener, Listener, PowerupHeal, Spawner, Switch, Teleporter, TileGate,
        Trigger,
    };
}
