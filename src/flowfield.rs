//! Multi-source BFS flow field used by enemy chase steering.
//!
//! Recomputed only when the sorted set of seed tiles (alive player tile
//! coordinates) changes. All buffers are reused across recomputes; the
//! scratch frontier is cleared and refilled rather than reallocated.

use crate::tilemap::Tilemap;
use bevy_ecs::prelude::*;
use std::collections::VecDeque;

pub const UNREACHABLE: u32 = 0xFFFF;

const CARDINALS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONALS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const INV_SQRT2: f32 = std::f32::consts::FRAC_1_SQRT_2;

#[derive(Resource, Debug, Default)]
pub struct FlowField {
    width: u16,
    height: u16,
    dist: Vec<u32>,
    dir_x: Vec<f32>,
    dir_y: Vec<f32>,
    seed_key: Vec<(i32, i32)>,
}

impl FlowField {
    pub fn distance(&self, tx: i32, ty: i32) -> u32 {
        match self.index(tx, ty) {
            Some(i) => self.dist[i],
            None => UNREACHABLE,
        }
    }

    pub fn direction(&self, tx: i32, ty: i32) -> (f32, f32) {
        match self.index(tx, ty) {
            Some(i) => (self.dir_x[i], self.dir_y[i]),
            None => (0.0, 0.0),
        }
    }

    fn index(&self, tx: i32, ty: i32) -> Option<usize> {
        if tx < 0 || ty < 0 || tx as u16 >= self.width || ty as u16 >= self.height {
            return None;
        }
        Some(ty as usize * self.width as usize + tx as usize)
    }

    /// Recompute the field from `seed_tiles` (one per alive player) if the
    /// sorted seed set differs from the last recompute. Returns whether a
    /// recompute happened.
    pub fn recompute_if_changed(&mut self, map: &Tilemap, seed_tiles: &[(i32, i32)]) -> bool {
        let mut key: Vec<(i32, i32)> = seed_tiles.to_vec();
        key.sort_unstable();
        key.dedup();

        if key == self.seed_key && self.width == map.width && self.height == map.height {
            return false;
        }

        self.recompute(map, &key);
        self.seed_key = key;
        true
    }

    fn recompute(&mut self, map: &Tilemap, seeds: &[(i32, i32)]) {
        let w = map.width;
        let h = map.height;
        let len = w as usize * h as usize;

        self.width = w;
        self.height = h;
        self.dist.clear();
        self.dist.resize(len, UNREACHABLE);
        self.dir_x.clear();
        self.dir_x.resize(len, 0.0);
        self.dir_y.clear();
        self.dir_y.resize(len, 0.0);

        let mut parent: Vec<i32> = vec![-1; len];
        let idx = |tx: i32, ty: i32| -> usize { ty as usize * w as usize + tx as usize };

        let mut queue: VecDeque<(i32, i32)> = VecDeque::new();
        for &(sx, sy) in seeds {
            if !map.is_walkable(sx, sy) {
                continue;
            }
            let i = idx(sx, sy);
            if self.dist[i] != 0 {
                self.dist[i] = 0;
                queue.push_back((sx, sy));
            }
        }

        while let Some((cx, cy)) = queue.pop_front() {
            let ci = idx(cx, cy);
            let cur_dist = self.dist[ci];

            for &(dx, dy) in &CARDINALS {
                let (nx, ny) = (cx + dx, cy + dy);
                let Some(cost) = map.tile_cost(nx, ny) else { continue };
                let ni = idx(nx, ny);
                let nd = cur_dist.saturating_add(cost);
                if nd < self.dist[ni] {
                    self.dist[ni] = nd;
                    parent[ni] = ci as i32;
                    queue.push_back((nx, ny));
                }
            }

            for &(dx, dy) in &DIAGONALS {
                let (nx, ny) = (cx + dx, cy + dy);
                // No corner cutting: both adjacent cardinals must be open.
                if !map.is_walkable(cx + dx, cy) || !map.is_walkable(cx, cy + dy) {
                    continue;
                }
                let Some(cost) = map.tile_cost(nx, ny) else { continue };
                let ni = idx(nx, ny);
                let nd = cur_dist.saturating_add(cost);
                if nd < self.dist[ni] {
                    self.dist[ni] = nd;
                    parent[ni] = ci as i32;
                    queue.push_back((nx, ny));
                }
            }
        }

        for ty in 0..h as i32 {
            for tx in 0..w as i32 {
                let i = idx(tx, ty);
                let p = parent[i];
                if p < 0 {
                    continue;
                }
                let ptx = (p as usize % w as usize) as i32;
                let pty = (p as usize / w as usize) as i32;
                let dx = ptx - tx;
                let dy = pty - ty;
                let (ux, uy) = match (dx, dy) {
                    (0, 0) => (0.0, 0.0),
                    (dx, 0) => (dx as f32, 0.0),
                    (0, dy) => (0.0, dy as f32),
                    _ => (dx as f32 * INV_SQRT2, dy as f32 * INV_SQRT2),
                };
                self.dir_x[i] = ux;
                self.dir_y[i] = uy;
            }
        }
    }
}
