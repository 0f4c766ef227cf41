//! World services consumed by the simulation core
//!
//! Sound, particles, animation, prompts, and camera visibility are owned by
//! other engine layers; the core only ever fires requests at them and never
//! branches on completion, except where an animation's reported duration
//! gates attack timing. Passing the services in explicitly keeps the core
//! testable without those layers.

use ember_core::ActorId;
use glam::Vec3;

/// Fire-and-forget surface of the excluded engine layers
pub trait WorldServices {
    /// Play a 2D sound effect
    fn play_sound(&mut self, _name: &str) {}

    /// Play a positioned sound effect
    fn play_sound_3d(&mut self, _name: &str, _pos: Vec3) {}

    /// Start a particle effect
    fn spawn_pfx(&mut self, _file: &str, _pos: Vec3) {}

    /// Request an animation change on an actor's model
    fn change_animation(&mut self, _actor: ActorId, _name: &str, _speed: f32) {}

    /// Length of a named animation in milliseconds
    fn animation_length_ms(&mut self, _actor: ActorId, _name: &str) -> f32 {
        1000.0
    }

    /// Show an on-screen prompt; returns a handle, or -1 when unsupported
    fn prompt_add(&mut self, _text: &str, _fade_ms: f32) -> i32 {
        -1
    }

    /// Reset a prompt's fade countdown
    fn prompt_renew(&mut self, _handle: i32) {}

    /// Remove a prompt
    fn prompt_remove(&mut self, _handle: i32) {}

    /// Whether a bounding sphere is inside the camera frustum. Headless
    /// runs report false, so corpse despawn is purely timer-gated.
    fn is_visible(&self, _pos: Vec3, _radius: f32) -> bool {
        false
    }
}

/// Services that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullServices;

impl WorldServices for NullServices {}

/// Services that record every request, for tests
#[derive(Debug, Default)]
pub struct RecordingServices {
    /// Every sound requested, 2D and 3D
    pub sounds: Vec<String>,
    /// Every particle effect requested
    pub pfx: Vec<(String, Vec3)>,
    /// Every animation change requested
    pub animations: Vec<(ActorId, String)>,
    /// Every prompt shown
    pub prompts: Vec<String>,
    /// Length reported for any animation
    pub animation_length: f32,
    /// Visibility reported for any probe
    pub visible: bool,
    next_prompt: i32,
}

impl RecordingServices {
    /// Create a recorder reporting 1000 ms animations and no visibility
    pub fn new() -> Self {
        Self {
            animation_length: 1000.0,
            ..Default::default()
        }
    }
}

impl WorldServices for RecordingServices {
    fn play_sound(&mut self, name: &str) {
        self.sounds.push(name.into());
    }

    fn play_sound_3d(&mut self, name: &str, _pos: Vec3) {
        self.sounds.push(name.into());
    }

    fn spawn_pfx(&mut self, file: &str, pos: Vec3) {
        self.pfx.push((file.into(), pos));
    }

    fn change_animation(&mut self, actor: ActorId, name: &str, _speed: f32) {
        self.animations.push((actor, name.into()));
    }

    fn animation_length_ms(&mut self, _actor: ActorId, _name: &str) -> f32 {
        self.animation_length
    }

    fn prompt_add(&mut self, text: &str, _fade_ms: f32) -> i32 {
        self.prompts.push(text.into());
        self.next_prompt += 1;
        self.next_prompt
    }

    fn is_visible(&self, _pos: Vec3, _radius: f32) -> bool {
        self.visible
    }
}
