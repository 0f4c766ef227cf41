//! Tile map queries
//!
//! The simulation needs very little from the world map: per-tile height and
//! passability on a uniform grid. Rendering and materials live elsewhere.

use serde::{Deserialize, Serialize};

/// One map tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Floor elevation in meters
    pub height: f32,
    /// Whether actors may occupy this tile
    pub passable: bool,
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            height: 0.0,
            passable: true,
        }
    }
}

/// A uniform grid of tiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Map {
    width: i32,
    depth: i32,
    tile_meters: f32,
    tiles: Vec<Tile>,
}

impl Map {
    /// Create a flat, fully passable map
    pub fn new(width: i32, depth: i32, tile_meters: f32) -> Self {
        assert!(width > 0 && depth > 0, "map must have positive extent");
        assert!(tile_meters > 0.0, "tile size must be positive");
        Self {
            width,
            depth,
            tile_meters,
            tiles: vec![Tile::default(); (width * depth) as usize],
        }
    }

    /// Tile side length in meters
    pub fn tile_meters(&self) -> f32 {
        self.tile_meters
    }

    /// Map width in tiles
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Map depth in tiles
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Tile column for a world X coordinate
    pub fn tile_x(&self, world_x: f32) -> i32 {
        (world_x / self.tile_meters).floor() as i32
    }

    /// Tile row for a world Z coordinate
    pub fn tile_z(&self, world_z: f32) -> i32 {
        (world_z / self.tile_meters).floor() as i32
    }

    /// Whether tile coordinates fall inside the map
    pub fn on_a_tile(&self, x: i32, z: i32) -> bool {
        x >= 0 && x < self.width && z >= 0 && z < self.depth
    }

    /// Whether a world position falls inside the map
    pub fn on_a_tile_world(&self, world_x: f32, world_z: f32) -> bool {
        self.on_a_tile(self.tile_x(world_x), self.tile_z(world_z))
    }

    /// Tile at tile coordinates; out-of-bounds yields `None`
    pub fn tile(&self, x: i32, z: i32) -> Option<&Tile> {
        if !self.on_a_tile(x, z) {
            return None;
        }
        self.tiles.get((z * self.width + x) as usize)
    }

    /// Mutable tile at tile coordinates
    pub fn tile_mut(&mut self, x: i32, z: i32) -> Option<&mut Tile> {
        if !self.on_a_tile(x, z) {
            return None;
        }
        self.tiles.get_mut((z * self.width + x) as usize)
    }

    /// Tile under a world position
    pub fn tile_at(&self, world_x: f32, world_z: f32) -> Option<&Tile> {
        self.tile(self.tile_x(world_x), self.tile_z(world_z))
    }

    /// Set a tile's passability
    pub fn set_passable(&mut self, x: i32, z: i32, passable: bool) {
        if let Some(tile) = self.tile_mut(x, z) {
            tile.passable = passable;
        }
    }

    /// Set a tile's floor height
    pub fn set_height(&mut self, x: i32, z: i32, height: f32) {
        if let Some(tile) = self.tile_mut(x, z) {
            tile.height = height;
        }
    }
}
