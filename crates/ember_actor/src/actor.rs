//! Base simulated entity state and movement

use crate::collision::{planar_distance, CollisionShape, CollisionTag};
use crate::map::Map;
use crate::orientation::Basis;
use ember_core::{ActorId, PropertyBag};
use glam::Vec3;

/// Shrink factor for the wall-sliding disc; tuned independently of the
/// actor-vs-actor collision shrink
const WALL_FUDGE: f32 = 0.7;

/// Neighbor tiles more than this far above or below a grounded actor are
/// treated as impassable walls
const MAX_STEP_HEIGHT: f32 = 0.5;

/// Base state shared by every simulated entity
#[derive(Debug, Clone)]
pub struct Actor {
    /// Handle of this actor within its zone
    pub id: ActorId,
    /// Display / lookup name
    pub name: String,
    /// World position
    pub position: Vec3,
    /// Where the actor was placed; wander targets orbit this point
    pub spawn_point: Vec3,
    /// Last known non-colliding position
    pub validated_pos: Vec3,
    /// Orientation basis
    pub orientation: Basis,
    /// Velocity in meters per second; the vertical component is always zero
    pub velocity: Vec3,
    /// Full speed in meters per second
    pub top_speed: f32,
    /// Deceleration applied against the velocity every tick
    pub friction_acceleration: f32,
    /// Speeds below this play the idle animation rather than the walk
    pub min_walking_velocity: f32,
    /// Requested model height in meters; radii derive from it
    pub desired_height: f32,
    /// Model scale derived from the desired height
    pub scale: f32,
    /// Bounding sphere radius
    pub sphere_radius: f32,
    /// Collision cylinder radius
    pub cylinder_radius: f32,
    /// Whether the actor collides and wall-slides
    pub solid: bool,
    /// Floating actors skip terrain height snapping
    pub floating: bool,
    /// Marked for removal at the next garbage collection
    pub zombie: bool,
    /// Collision-exclusion policy data
    pub tag: CollisionTag,
    /// Actors colliding with this one; valid only within the current tick
    pub collisions: Vec<ActorId>,
    /// Whether wall sliding adjusted the position this tick
    pub slid_on_wall: bool,
    /// Whether the position changed this tick
    pub has_moved: bool,
}

impl Actor {
    /// Create an actor with default tuning
    pub fn new(id: ActorId) -> Self {
        Self {
            id,
            name: String::from("unnamed"),
            position: Vec3::ZERO,
            spawn_point: Vec3::ZERO,
            validated_pos: Vec3::ZERO,
            orientation: Basis::IDENTITY,
            velocity: Vec3::ZERO,
            top_speed: 2.0,
            friction_acceleration: 32.0,
            min_walking_velocity: 0.5,
            desired_height: 1.0,
            scale: 1.0,
            sphere_radius: 0.5,
            cylinder_radius: 0.35,
            solid: true,
            floating: false,
            zombie: false,
            tag: CollisionTag::default(),
            collisions: Vec::new(),
            slid_on_wall: false,
            has_moved: true,
        }
    }

    /// Set the position, spawn point, and validated position together
    pub fn place(&mut self, pos: Vec3) {
        self.position = pos;
        self.spawn_point = pos;
        self.validated_pos = pos;
    }

    /// Orient to face a point
    pub fn look_at(&mut self, center: Vec3) {
        self.orientation = Basis::looking_at(self.position, center);
    }

    /// Set the desired height and rederive scale and collision radii.
    /// Without mesh data the placeholder cylinder proportions are used.
    pub fn set_height(&mut self, height: f32) {
        self.desired_height = height;
        self.scale = height;
        self.sphere_radius = height * 0.5;
        self.cylinder_radius = height * 0.35;
    }

    /// Run one tick of movement: integrate, apply friction, snap to the
    /// terrain, and slide along impassable tile edges
    pub fn update(&mut self, dt_ms: f32, map: &Map) {
        let time_step = dt_ms / 1000.0;

        self.has_moved = false;
        self.slid_on_wall = false;

        // Movement is planar
        self.velocity.y = 0.0;

        if self.velocity.length() > f32::EPSILON {
            self.position += self.velocity * time_step;
            self.has_moved = true;
        } else {
            self.velocity = Vec3::ZERO;
        }

        // Friction never reverses direction
        let frictional_delta = self.friction_acceleration * time_step;
        if frictional_delta > f32::EPSILON {
            if frictional_delta < self.velocity.length() {
                self.velocity -= self.velocity.normalize() * frictional_delta;
            } else {
                self.velocity = Vec3::ZERO;
            }
        }

        // Stand on the tile underneath
        if !self.floating {
            if let Some(tile) = map.tile_at(self.position.x, self.position.z) {
                self.position.y = tile.height;
            }
        }

        if self.solid {
            self.slide_against_walls(map);
        }
    }

    /// Editor tick: the world is frozen, so velocity, friction, wall
    /// sliding, and collision are all skipped. The actor is revalidated
    /// where it stands and re-snapped to the terrain, so dragging it
    /// around in the editor keeps it on the floor.
    pub fn update_for_editor(&mut self, _dt_ms: f32, map: &Map) {
        self.sync();

        // Set our elevation to that of the tile we are standing on
        if !self.floating {
            if let Some(tile) = map.tile_at(self.position.x, self.position.z) {
                self.position.y = tile.height;
            }
        }

        self.has_moved = true;
    }

    /// Clamp the position so the actor's disc cannot overlap an impassable
    /// neighbor tile. A purely local, per-edge approximation.
    pub fn slide_against_walls(&mut self, map: &Map) {
        self.slid_on_wall = false;

        let x = map.tile_x(self.position.x);
        let z = map.tile_z(self.position.z);

        // Bail out if we aren't even over a tile
        if !map.on_a_tile(x, z) {
            return;
        }

        let side = map.tile_meters();
        let wall_left = side * x as f32;
        let wall_bottom = side * z as f32;
        let wall_right = side * (x + 1) as f32;
        let wall_top = side * (z + 1) as f32;

        let r = self.cylinder_radius * WALL_FUDGE;
        let actor_left = self.position.x - r;
        let actor_right = self.position.x + r;
        let actor_bottom = self.position.z - r;
        let actor_top = self.position.z + r;

        // How far the disc has crossed each edge of the occupied tile
        let overlap_top = actor_top - wall_top;
        let overlap_bottom = wall_bottom - actor_bottom;
        let overlap_left = wall_left - actor_left;
        let overlap_right = actor_right - wall_right;

        if overlap_top > 0.0 && !self.is_neighbor_tile_passable(map, x, z + 1) {
            self.position.z = wall_top - r;
            self.slid_on_wall = true;
        }
        if overlap_bottom > 0.0 && !self.is_neighbor_tile_passable(map, x, z - 1) {
            self.position.z = wall_bottom + r;
            self.slid_on_wall = true;
        }
        if overlap_left > 0.0 && !self.is_neighbor_tile_passable(map, x - 1, z) {
            self.position.x = wall_left + r;
            self.slid_on_wall = true;
        }
        if overlap_right > 0.0 && !self.is_neighbor_tile_passable(map, x + 1, z) {
            self.position.x = wall_right - r;
            self.slid_on_wall = true;
        }
    }

    /// A neighbor tile is passable when its flag allows it and its elevation
    /// is compatible: floating actors may cross tiles below them, grounded
    /// actors require a small step
    pub fn is_neighbor_tile_passable(&self, map: &Map, x: i32, z: i32) -> bool {
        match map.tile(x, z) {
            Some(tile) => {
                let palatable_elevation = if self.floating {
                    self.position.y > tile.height
                } else {
                    (self.position.y - tile.height).abs() < MAX_STEP_HEIGHT
                };
                tile.passable && palatable_elevation
            }
            None => false,
        }
    }

    /// Commit the current position as known-good
    pub fn record_validated_pos(&mut self) {
        self.validated_pos = self.position;
    }

    /// Undo the tick's movement entirely
    pub fn revert_to_validated_pos(&mut self) {
        self.position = self.validated_pos;
    }

    /// Whether anything collided with this actor this tick
    pub fn any_collisions(&self) -> bool {
        !self.collisions.is_empty()
    }

    /// Whether a specific actor collided with this one this tick
    pub fn was_collision(&self, id: ActorId) -> bool {
        self.collisions.contains(&id)
    }

    /// Shrink-free planar proximity test against another cylinder
    pub fn is_in_proximity(&self, other_pos: Vec3, other_radius: f32, trigger_radius: f32) -> bool {
        let min_dist = trigger_radius + other_radius;
        planar_distance(self.position, other_pos) - min_dist < 0.0
    }

    /// Snapshot for the collision detection pass
    pub fn collision_shape(&self) -> CollisionShape {
        CollisionShape {
            id: self.id,
            position: self.position,
            cylinder_radius: self.cylinder_radius,
            solid: self.solid,
            zombie: self.zombie,
            tag: self.tag,
        }
    }

    /// After loading, the current position is by definition valid
    pub fn sync(&mut self) {
        self.set_height(self.desired_height);
        self.validated_pos = self.position;
    }

    /// Read base fields from a property bag
    pub fn load(&mut self, bag: &PropertyBag) {
        self.name = bag.get_or("name", std::mem::take(&mut self.name));
        if let Some(height) = bag.get::<f32>("height") {
            self.set_height(height);
        }
        self.top_speed = bag.get_or("speed", self.top_speed);
        self.solid = bag.get_or("solid", self.solid);
        self.floating = bag.get_or("floating", self.floating);
        self.friction_acceleration =
            bag.get_or("frictionAcceleration", self.friction_acceleration);

        if let Some(look) = bag.get::<[f32; 3]>("look") {
            self.orientation = Basis::from_planar_z(Vec3::from_array(look));
        }
        if let Some(pos) = bag.get::<[f32; 3]>("pos") {
            self.place(Vec3::from_array(pos));
        }
    }

    /// Write base fields to a property bag, omitting inherited defaults
    pub fn save_tidy(&self, bag: &mut PropertyBag, defaults: &Actor) {
        bag.set_tidy("name", &self.name, &defaults.name);
        bag.set_tidy("height", &self.desired_height, &defaults.desired_height);
        bag.set_tidy("speed", &self.top_speed, &defaults.top_speed);
        bag.set_tidy("solid", &self.solid, &defaults.solid);
        bag.set_tidy("floating", &self.floating, &defaults.floating);
        bag.set_tidy(
            "frictionAcceleration",
            &self.friction_acceleration,
            &defaults.friction_acceleration,
        );
        bag.set("pos", &self.position.to_array());
        bag.set_tidy(
            "look",
            &self.orientation.z.to_array(),
            &defaults.orientation.z.to_array(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn open_map() -> Map {
        Map::new(8, 8, 1.0)
    }

    fn actor_at(x: f32, z: f32) -> Actor {
        let mut a = Actor::new(ActorId::from_raw(1));
        a.place(Vec3::new(x, 0.0, z));
        a
    }

    #[test]
    fn test_integration_is_planar() {
        let map = open_map();
        let mut a = actor_at(4.0, 4.0);
        a.velocity = Vec3::new(1.0, 5.0, 0.0);

        a.update(1000.0, &map);

        assert_relative_eq!(a.position.x, 5.0);
        // Vertical velocity is discarded and Y snaps to the tile
        assert_relative_eq!(a.position.y, 0.0);
        assert!(a.has_moved);
    }

    #[test]
    fn test_friction_stops_without_reversing() {
        let map = open_map();
        let mut a = actor_at(4.0, 4.0);
        a.velocity = Vec3::new(2.0, 0.0, 0.0);

        // friction 32 m/s^2 over 100 ms removes 3.2 m/s > 2.0 m/s
        a.update(100.0, &map);
        assert_eq!(a.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_terrain_snap_and_floating() {
        let mut map = open_map();
        map.set_height(4, 4, 2.0);

        let mut grounded = actor_at(4.5, 4.5);
        grounded.update(16.0, &map);
        assert_relative_eq!(grounded.position.y, 2.0);

        let mut floater = actor_at(4.5, 4.5);
        floater.position.y = 5.0;
        floater.floating = true;
        floater.update(16.0, &map);
        assert_relative_eq!(floater.position.y, 5.0);
    }

    #[test]
    fn test_wall_slide_clamps_disc() {
        let mut map = open_map();
        map.set_passable(5, 4, false);

        let mut a = actor_at(4.5, 4.5);
        a.cylinder_radius = 0.5;

        // Walk right into the wall tile at x=5
        a.position.x = 4.9;
        a.slide_against_walls(&map);

        let r = 0.5 * 0.7;
        assert!(a.slid_on_wall);
        assert_relative_eq!(a.position.x, 5.0 - r);
    }

    #[test]
    fn test_wall_slide_allows_open_edges() {
        let map = open_map();
        let mut a = actor_at(4.9, 4.5);
        a.cylinder_radius = 0.5;
        a.slide_against_walls(&map);
        assert!(!a.slid_on_wall);
        assert_relative_eq!(a.position.x, 4.9);
    }

    #[test]
    fn test_elevation_blocks_step() {
        let mut map = open_map();
        map.set_height(5, 4, 1.0); // a ledge, passable but too tall

        let mut a = actor_at(4.9, 4.5);
        a.cylinder_radius = 0.5;
        a.slide_against_walls(&map);
        assert!(a.slid_on_wall);
    }

    #[test]
    fn test_editor_update_skips_physics_and_sliding() {
        let mut map = open_map();
        map.set_height(4, 4, 2.0);
        map.set_passable(5, 4, false);

        // Overlapping the wall tile and carrying velocity; a runtime tick
        // would integrate, decelerate, and slide
        let mut a = actor_at(4.9, 4.5);
        a.cylinder_radius = 0.5;
        a.velocity = Vec3::new(3.0, 0.0, 0.0);

        a.update_for_editor(16.0, &map);

        // Frozen in place, but revalidated and standing on its tile
        assert_relative_eq!(a.position.x, 4.9);
        assert_relative_eq!(a.position.y, 2.0);
        assert_eq!(a.velocity, Vec3::new(3.0, 0.0, 0.0));
        assert!(!a.slid_on_wall);
        assert_relative_eq!(a.validated_pos.x, 4.9);
        assert_relative_eq!(a.validated_pos.z, 4.5);
    }

    #[test]
    fn test_proximity_is_shrink_free() {
        let a = actor_at(0.0, 0.0);
        // trigger radius 1.0 + other radius 0.5 = 1.5 threshold
        assert!(a.is_in_proximity(Vec3::new(1.4, 0.0, 0.0), 0.5, 1.0));
        assert!(!a.is_in_proximity(Vec3::new(1.6, 0.0, 0.0), 0.5, 1.0));
    }

    #[test]
    fn test_save_tidy_omits_defaults() {
        let defaults = Actor::new(ActorId::INVALID);
        let mut a = Actor::new(ActorId::from_raw(1));
        a.name = String::from("brazier");
        a.top_speed = 3.5;

        let mut bag = PropertyBag::new();
        a.save_tidy(&mut bag, &defaults);

        assert_eq!(bag.get::<String>("name").as_deref(), Some("brazier"));
        assert_eq!(bag.get::<f32>("speed"), Some(3.5));
        assert!(!bag.contains("solid"));
        assert!(!bag.contains("floating"));
    }

    #[test]
    fn test_load_roundtrip() {
        let mut bag = PropertyBag::new();
        bag.set("name", &"crate".to_string());
        bag.set("height", &2.0f32);
        bag.set("pos", &[3.0f32, 0.0, 4.0]);

        let mut a = Actor::new(ActorId::from_raw(2));
        a.load(&bag);

        assert_eq!(a.name, "crate");
        assert_eq!(a.desired_height, 2.0);
        assert_eq!(a.cylinder_radius, 0.7);
        assert_eq!(a.position, Vec3::new(3.0, 0.0, 4.0));
        assert_eq!(a.validated_pos, a.position);
    }
}
