//! Stage/wave/camp run state machine, and the procedural map + POI
//! generators it drives at each stage and camp transition.

use crate::components::{EnemyKind, EnemyTier};
use crate::interaction::{InteractableLayout, Stash};
use crate::rng::Rng;
use crate::tilemap::{Tilemap, TILE_EMPTY, TILE_FLOOR, TILE_WALL};
use bevy_ecs::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    None,
    Active,
    Clearing,
    Camp,
    Completed,
}

#[derive(Debug, Clone)]
pub struct WaveConfig {
    pub fodder_budget: u32,
    pub fodder_pool: Vec<(EnemyKind, u32, u8)>, // (kind, weight, budget cost)
    pub max_fodder_alive: u32,
    pub threats: Vec<(EnemyKind, u32)>, // (kind, count)
    pub spawn_delay: f32,
    pub threat_clear_ratio: f32,
}

#[derive(Debug, Clone)]
pub struct ObstacleTemplate {
    pub tile: u8,
    pub radius: i32,
}

#[derive(Debug, Clone)]
pub struct ObstacleSpec {
    pub count: u32,
    pub min_spacing: i32,
    pub templates: Vec<ObstacleTemplate>,
}

#[derive(Debug, Clone)]
pub struct HazardSpec {
    pub tile_type: u8,
    pub noise_threshold: f32,
    pub noise_cell_size: f32,
    pub max_coverage: f32,
}

#[derive(Debug, Clone)]
pub struct MapConfig {
    pub width: u16,
    pub height: u16,
    pub tile_size: u16,
    pub center_clear_radius: i32,
    pub obstacles: ObstacleSpec,
    pub hazards: Vec<HazardSpec>,
}

#[derive(Debug, Clone)]
pub struct StageConfig {
    pub map: MapConfig,
    pub waves: Vec<WaveConfig>,
}

#[derive(Resource, Debug, Clone)]
pub struct RunState {
    pub phase: RunPhase,
    pub stage_index: u32,
    pub total_stages: u32,
    pub wave_index: u32,
    pub wave_timer: f32,
    pub fodder_budget_remaining: u32,
    pub fodder_alive: u32,
    pub threats_alive: u32,
    pub threat_kills: u32,
    pub threats_total: u32,
    /// Set once the wave's threats have been spawned, so the one-shot
    /// threat spawn and budget reset in the wave spawner never re-fire
    /// for a wave configured with zero threats.
    pub threats_spawned_this_wave: bool,
}

impl RunState {
    pub fn new(total_stages: u32) -> Self {
        Self {
            phase: RunPhase::None,
            stage_index: 0,
            total_stages,
            wave_index: 0,
            wave_timer: 0.0,
            fodder_budget_remaining: 0,
            fodder_alive: 0,
            threats_alive: 0,
            threat_kills: 0,
            threats_total: 0,
            threats_spawned_this_wave: false,
        }
    }

    /// A wave advances once threats killed is at least the ceiling of
    /// `total * clearRatio`, and no fodder remain alive.
    pub fn wave_cleared(&self, clear_ratio: f32) -> bool {
        if self.threats_total == 0 {
            return self.fodder_alive == 0;
        }
        let required = (self.threats_total as f32 * clear_ratio).ceil() as u32;
        self.threat_kills >= required && self.fodder_alive == 0
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct StageTable {
    pub stages: Vec<StageConfig>,
    pub camp_map: MapConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            tile_size: 32,
            center_clear_radius: 4,
            obstacles: ObstacleSpec { count: 0, min_spacing: 0, templates: Vec::new() },
            hazards: Vec::new(),
        }
    }
}

/// The camp layout is a fixed, obstacle-free room with a single salesman
/// parked at its center and no stashes; unlike `generate_poi` it never
/// rolls randomness, since every camp visit should look the same.
pub fn generate_camp_layout(map: &Tilemap) -> InteractableLayout {
    let (cx, cy) = map.tile_to_world_center(map.width as i32 / 2, map.height as i32 / 2);
    InteractableLayout { salesman: Some((cx, cy)), stashes: Vec::new() }
}

/// Procedurally generate a tilemap for a stage: border walls, Poisson-like
/// obstacle placement rejecting the center clearance and mutual minimum
/// spacing, bilinear value-noise hazard scatter capped per hazard type,
/// then iterative flood-fill reconnection of isolated pockets.
pub fn generate_map(config: &MapConfig, base_seed: u32, stage_index: u32) -> Tilemap {
    let mut rng = Rng::new(base_seed).derive(stage_index).derive_named("map");
    let mut map = Tilemap::fallback(config.width, config.height, config.tile_size);

    for tx in 0..config.width as i32 {
        map.set_solid(tx, 0, TILE_WALL);
        map.set_solid(tx, config.height as i32 - 1, TILE_WALL);
    }
    for ty in 0..config.height as i32 {
        map.set_solid(0, ty, TILE_WALL);
        map.set_solid(config.width as i32 - 1, ty, TILE_WALL);
    }

    let cx = config.width as i32 / 2;
    let cy = config.height as i32 / 2;
    let mut placed: Vec<(i32, i32, i32)> = Vec::new(); // x, y, radius

    let mut attempts = 0u32;
    let max_attempts = config.obstacles.count * 30 + 10;
    while (placed.len() as u32) < config.obstacles.count && attempts < max_attempts {
        attempts += 1;
        let tx = 1 + rng.next_int(config.width as u32 - 2) as i32;
        let ty = 1 + rng.next_int(config.height as u32 - 2) as i32;

        let dist_from_center = (((tx - cx).pow(2) + (ty - cy).pow(2)) as f32).sqrt();
        if dist_from_center < config.center_clear_radius as f32 {
            continue;
        }

        let template = &config.obstacles.templates[rng.next_int(config.obstacles.templates.len() as u32) as usize];
        let too_close = placed.iter().any(|&(ox, oy, oradius)| {
            let d = (((tx - ox).pow(2) + (ty - oy).pow(2)) as f32).sqrt();
            d < (config.obstacles.min_spacing + oradius + template.radius) as f32
        });
        if too_close {
            continue;
        }

        for dy in -template.radius..=template.radius {
            for dx in -template.radius..=template.radius {
                if dx * dx + dy * dy <= template.radius * template.radius {
                    map.set_solid(tx + dx, ty + dy, template.tile);
                }
            }
        }
        placed.push((tx, ty, template.radius));
    }

    for hazard in &config.hazards {
        let mut hazard_rng = rng.derive_named("hazard");
        let mut coverage = 0usize;
        let total = config.width as usize * config.height as usize;
        let max_tiles = (total as f32 * hazard.max_coverage) as usize;

        for ty in 1..(config.height as i32 - 1) {
            for tx in 1..(config.width as i32 - 1) {
                if map.is_solid(tx, ty) {
                    continue;
                }
                if coverage >= max_tiles {
                    break;
                }
                let n = bilinear_value_noise(&mut hazard_rng, tx as f32, ty as f32, hazard.noise_cell_size);
                if n > hazard.noise_threshold {
                    map.set_floor(tx, ty, hazard.tile_type);
                    coverage += 1;
                }
            }
        }
    }

    reconnect_unreachable_pockets(&mut map, cx, cy);
    map
}

/// Deterministic bilinear value noise at integer tile coordinates,
/// sampled over a grid of `cell_size` tiles per noise lattice cell.
fn bilinear_value_noise(rng: &mut Rng, x: f32, y: f32, cell_size: f32) -> f32 {
    let gx = x / cell_size;
    let gy = y / cell_size;
    let x0 = gx.floor() as i32;
    let y0 = gy.floor() as i32;
    let fx = gx - x0 as f32;
    let fy = gy - y0 as f32;

    let lattice = |ix: i32, iy: i32| -> f32 {
        let mut r = (*rng).derive((ix as u32).wrapping_mul(73856093) ^ (iy as u32).wrapping_mul(19349663));
        r.next() as f32
    };

    let v00 = lattice(x0, y0);
    let v10 = lattice(x0 + 1, y0);
    let v01 = lattice(x0, y0 + 1);
    let v11 = lattice(x0 + 1, y0 + 1);

    let top = v00 + (v10 - v00) * fx;
    let bottom = v01 + (v11 - v01) * fx;
    top + (bottom - top) * fy
}

/// Flood-fill from the center tile; any walkable tile not reached is an
/// isolated pocket. Remove one wall adjacent to such a pocket per
/// iteration and re-flood, up to 10 iterations or until stable.
fn reconnect_unreachable_pockets(map: &mut Tilemap, cx: i32, cy: i32) {
    for _ in 0..10 {
        let reachable = flood_fill_reachable(map, cx, cy);
        let mut changed = false;

        for ty in 1..(map.height as i32 - 1) {
            for tx in 1..(map.width as i32 - 1) {
                if map.is_solid(tx, ty) || reachable[(ty as usize * map.width as usize) + tx as usize] {
                    continue;
                }
                // Unreachable walkable pocket tile: knock down a neighboring
                // wall to open a path toward the reachable region.
                for &(dx, dy) in &[(1, 0), (-1, 0), (0, 1), (0, -1)] {
                    let (nx, ny) = (tx + dx, ty + dy);
                    if map.is_solid(nx, ny) {
                        map.set_solid(nx, ny, TILE_EMPTY);
                        map.set_floor(nx, ny, TILE_FLOOR);
                        changed = true;
                        break;
                    }
                }
            }
        }

        if !changed {
            break;
        }
    }
}

fn flood_fill_reachable(map: &Tilemap, start_x: i32, start_y: i32) -> Vec<bool> {
    let len = map.width as usize * map.height as usize;
    let mut reached = vec![false; len];
    if !map.is_walkable(start_x, start_y) {
        return reached;
    }
    let mut stack = vec![(start_x, start_y)];
    reached[start_y as usize * map.width as usize + start_x as usize] = true;

    while let Some((x, y)) = stack.pop() {
        for &(dx, dy) in &[(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let (nx, ny) = (x + dx, y + dy);
            if !map.is_walkable(nx, ny) {
                continue;
            }
            let idx = ny as usize * map.width as usize + nx as usize;
            if !reached[idx] {
                reached[idx] = true;
                stack.push((nx, ny));
            }
        }
    }
    reached
}

/// Place the salesman and stash points from walkable tiles, using a
/// derived PRNG distinct from map generation. Stashes use tiered minimum
/// spacing (6, then 4, then 2 tiles) as more are placed, and must stay at
/// least `min_salesman_distance` tiles from the salesman.
pub fn generate_poi(
    map: &Tilemap,
    base_seed: u32,
    stage_index: u32,
    stash_count: usize,
    min_salesman_distance: f32,
) -> InteractableLayout {
    let mut rng = Rng::new(base_seed).derive(stage_index).derive_named("poi");

    let walkable: Vec<(i32, i32)> = (1..(map.height as i32 - 1))
        .flat_map(|ty| (1..(map.width as i32 - 1)).map(move |tx| (tx, ty)))
        .filter(|&(tx, ty)| map.is_walkable(tx, ty))
        .collect();

    if walkable.is_empty() {
        let (cx, cy) = map.tile_to_world_center(map.width as i32 / 2, map.height as i32 / 2);
        return InteractableLayout { salesman: Some((cx, cy)), stashes: Vec::new() };
    }

    let salesman_tile = walkable[rng.next_int(walkable.len() as u32) as usize];
    let salesman = map.tile_to_world_center(salesman_tile.0, salesman_tile.1);

    let spacing_tiers = [6.0_f32, 4.0, 2.0];
    let mut placed: Vec<(i32, i32)> = Vec::new();

    for i in 0..stash_count {
        let tier = spacing_tiers[i.min(spacing_tiers.len() - 1)];
        let mut chosen = None;
        for _ in 0..200 {
            let candidate = walkable[rng.next_int(walkable.len() as u32) as usize];
            let far_enough_from_salesman = {
                let d = (((candidate.0 - salesman_tile.0).pow(2) + (candidate.1 - salesman_tile.1).pow(2)) as f32).sqrt();
                d >= min_salesman_distance
            };
            let far_enough_from_others = placed.iter().all(|&(px, py)| {
                let d = (((candidate.0 - px).pow(2) + (candidate.1 - py).pow(2)) as f32).sqrt();
                d >= tier
            });
            if far_enough_from_salesman && far_enough_from_others {
                chosen = Some(candidate);
                break;
            }
        }
        if let Some(tile) = chosen {
            placed.push(tile);
        }
    }

    let stashes = placed
        .into_iter()
        .map(|(tx, ty)| {
            let (x, y) = map.tile_to_world_center(tx, ty);
            Stash { x, y, opened: false }
        })
        .collect();

    InteractableLayout { salesman: Some(salesman), stashes }
}

/// Classification used by the wave spawner to decide whether an entity
/// still counts toward `fodder_alive`/`threats_alive` bookkeeping.
pub fn tier_of(kind: EnemyKind) -> EnemyTier {
    match kind {
        EnemyKind::Boss => EnemyTier::Threat,
        _ => EnemyTier::Fodder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> MapConfig {
        MapConfig {
            width: 20,
            height: 20,
            tile_size: 32,
            center_clear_radius: 3,
            obstacles: ObstacleSpec {
                count: 8,
                min_spacing: 2,
                templates: vec![ObstacleTemplate { tile: TILE_WALL, radius: 1 }],
            },
            hazards: vec![],
        }
    }

    #[test]
    fn generated_map_has_border_walls() {
        let map = generate_map(&small_config(), 42, 0);
        for tx in 0..20 {
            assert!(map.is_solid(tx, 0));
            assert!(map.is_solid(tx, 19));
        }
    }

    #[test]
    fn generated_map_keeps_center_clear() {
        let map = generate_map(&small_config(), 42, 0);
        assert!(map.is_walkable(10, 10));
    }

    #[test]
    fn map_generation_is_deterministic_for_same_seed() {
        let map_a = generate_map(&small_config(), 7, 2);
        let map_b = generate_map(&small_config(), 7, 2);
        assert_eq!(map_a.layers[0].data, map_b.layers[0].data);
    }

    #[test]
    fn wave_cleared_requires_fodder_empty_and_threat_ratio() {
        let mut state = RunState::new(3);
        state.threats_total = 4;
        state.threat_kills = 4;
        state.fodder_alive = 1;
        assert!(!state.wave_cleared(1.0));
        state.fodder_alive = 0;
        assert!(state.wave_cleared(1.0));
    }

    #[test]
    fn poi_salesman_and_stashes_are_on_walkable_tiles() {
        let map = generate_map(&small_config(), 1, 0);
        let layout = generate_poi(&map, 1, 0, 3, 4.0);
        assert!(layout.salesman.is_some());
    }
}
