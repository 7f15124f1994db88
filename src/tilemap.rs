//! Multi-layer tile grid consumed by collision, flow-field, and the run
//! controller's procedural generation.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

pub const TILE_EMPTY: u8 = 0;
pub const TILE_WALL: u8 = 1;
pub const TILE_FLOOR: u8 = 2;
pub const TILE_HALF_WALL: u8 = 3;
pub const TILE_LAVA: u8 = 4;
pub const TILE_MUD: u8 = 5;
pub const TILE_BRAMBLE: u8 = 6;

pub const LAVA_PATHFIND_COST: u32 = 10;
pub const BRAMBLE_PATHFIND_COST: u32 = 5;
pub const MUD_PATHFIND_COST: u32 = 3;
pub const FLOOR_PATHFIND_COST: u32 = 1;

/// One data layer of the tilemap: layer 0 is the solid layer, layer 1 is
/// the floor/hazard layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileLayer {
    pub solid: bool,
    pub data: Vec<u8>,
}

/// Multi-layer 2D tile grid. Owned by the world and regenerated wholesale
/// by the run controller at each stage/camp transition.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct Tilemap {
    pub width: u16,
    pub height: u16,
    pub tile_size: u16,
    pub layers: Vec<TileLayer>,
}

impl Tilemap {
    /// A flat, empty floor of the given size. Used as the deterministic
    /// fallback when no tilemap has been supplied at world init.
    pub fn fallback(width: u16, height: u16, tile_size: u16) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            tile_size,
            layers: vec![
                TileLayer { solid: true, data: vec![TILE_EMPTY; len] },
                TileLayer { solid: false, data: vec![TILE_FLOOR; len] },
            ],
        }
    }

    #[inline]
    pub fn in_bounds(&self, tx: i32, ty: i32) -> bool {
        tx >= 0 && ty >= 0 && (tx as u16) < self.width && (ty as u16) < self.height
    }

    #[inline]
    fn index(&self, tx: i32, ty: i32) -> usize {
        ty as usize * self.width as usize + tx as usize
    }

    /// Whether the tile is solid (layer 0). Out-of-bounds is solid.
    pub fn is_solid(&self, tx: i32, ty: i32) -> bool {
        if !self.in_bounds(tx, ty) {
            return true;
        }
        let idx = self.index(tx, ty);
        self.layers[0].data[idx] == TILE_WALL
    }

    /// Whether the tile is a half-wall: solid for grounded entities only.
    pub fn is_half_wall(&self, tx: i32, ty: i32) -> bool {
        if !self.in_bounds(tx, ty) {
            return false;
        }
        let idx = self.index(tx, ty);
        self.layers[0].data[idx] == TILE_HALF_WALL
    }

    /// Floor tile type at a coordinate (layer 1). 0 (empty) out of bounds.
    pub fn floor_tile(&self, tx: i32, ty: i32) -> u8 {
        if !self.in_bounds(tx, ty) {
            return TILE_EMPTY;
        }
        let idx = self.index(tx, ty);
        self.layers[1].data[idx]
    }

    pub fn set_solid(&mut self, tx: i32, ty: i32, tile: u8) {
        if !self.in_bounds(tx, ty) {
            return;
        }
        let idx = self.index(tx, ty);
        self.layers[0].data[idx] = tile;
    }

    pub fn set_floor(&mut self, tx: i32, ty: i32, tile: u8) {
        if !self.in_bounds(tx, ty) {
            return;
        }
        let idx = self.index(tx, ty);
        self.layers[1].data[idx] = tile;
    }

    /// Walkable means not solid. Half-walls are walkable by grounded path
    /// planning (the flow field only cares about ground traversal).
    pub fn is_walkable(&self, tx: i32, ty: i32) -> bool {
        self.in_bounds(tx, ty) && !self.is_solid(tx, ty)
    }

    /// Pathfinding transition cost entering this tile, or `None` if the
    /// tile is unreachable (solid or out of bounds).
    pub fn tile_cost(&self, tx: i32, ty: i32) -> Option<u32> {
        if !self.is_walkable(tx, ty) {
            return None;
        }
        Some(match self.floor_tile(tx, ty) {
            TILE_LAVA => LAVA_PATHFIND_COST,
            TILE_BRAMBLE => BRAMBLE_PATHFIND_COST,
            TILE_MUD => MUD_PATHFIND_COST,
            _ => FLOOR_PATHFIND_COST,
        })
    }

    /// World-space (center of origin tile) to tile coordinates.
    pub fn world_to_tile(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.tile_size as f32).floor() as i32,
            (y / self.tile_size as f32).floor() as i32,
        )
    }

    pub fn tile_to_world_center(&self, tx: i32, ty: i32) -> (f32, f32) {
        let ts = self.tile_size as f32;
        (tx as f32 * ts + ts * 0.5, ty as f32 * ts + ts * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_flat_walkable_floor() {
        let map = Tilemap::fallback(10, 10, 32);
        assert!(map.is_walkable(5, 5));
        assert!(!map.is_solid(5, 5));
        assert_eq!(map.tile_cost(5, 5), Some(FLOOR_PATHFIND_COST));
    }

    #[test]
    fn out_of_bounds_is_solid_and_unreachable() {
        let map = Tilemap::fallback(4, 4, 32);
        assert!(map.is_solid(-1, 0));
        assert!(map.is_solid(100, 100));
        assert_eq!(map.tile_cost(-1, 0), None);
    }

    #[test]
    fn lava_costs_ten() {
        let mut map = Tilemap::fallback(4, 4, 32);
        map.set_floor(1, 1, TILE_LAVA);
        assert_eq!(map.tile_cost(1, 1), Some(LAVA_PATHFIND_COST));
    }

    #[test]
    fn world_to_tile_roundtrips_center() {
        let map = Tilemap::fallback(4, 4, 32);
        let (tx, ty) = map.world_to_tile(40.0, 40.0);
        assert_eq!((tx, ty), (1, 1));
        let (cx, cy) = map.tile_to_world_center(tx, ty);
        assert_eq!((cx, cy), (48.0, 48.0));
    }
}
