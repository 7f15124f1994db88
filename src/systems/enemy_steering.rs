//! Step 13: combines flow-field seek, preferred-range orbit for ranged
//! enemies, separation against nearby enemies, and lava avoidance into a
//! single desired velocity (§4.10). Runs after the spatial hash has been
//! rebuilt for this tick (step 12), so separation queries see current
//! positions.

use crate::components::*;
use crate::flowfield::FlowField;
use crate::spatial::SpatialGrid;
use crate::systems::enemy_tables::stats_for;
use crate::tilemap::Tilemap;
use bevy_ecs::prelude::*;

const GOLDEN_ANGLE: f32 = 2.399963; // radians; breaks exact-coincidence ties deterministically.

/// ## Data Access
/// - Reads: FlowField, Tilemap, SpatialGrid, Position of targets
/// - Writes: Velocity
pub fn enemy_steering_system(
    map: Res<Tilemap>,
    field: Res<FlowField>,
    grid: Res<SpatialGrid>,
    mut enemies: Query<(Entity, &Position, &Enemy, &EnemyAI, &Steering, &MoveSpeed, &mut Velocity)>,
    targets: Query<&Position, With<Player>>,
) {
    for (entity, pos, enemy, ai, steering, speed, mut vel) in enemies.iter_mut() {
        if !matches!(ai.state, EnemyAIState::Chase) {
            continue;
        }
        let Some(target) = ai.target.and_then(|t| targets.get(t).ok()) else {
            vel.x = 0.0;
            vel.y = 0.0;
            continue;
        };

        let (tx, ty) = map.world_to_tile(pos.x, pos.y);
        let (mut seek_x, mut seek_y) = field.direction(tx, ty);
        if seek_x == 0.0 && seek_y == 0.0 {
            let dx = target.x - pos.x;
            let dy = target.y - pos.y;
            let d = (dx * dx + dy * dy).sqrt().max(1e-4);
            seek_x = dx / d;
            seek_y = dy / d;
        }

        let stats = stats_for(enemy.kind);
        if stats.is_ranged && steering.preferred_range > 0.0 {
            let dx = target.x - pos.x;
            let dy = target.y - pos.y;
            let d = (dx * dx + dy * dy).sqrt();
            if d < steering.preferred_range - 30.0 {
                seek_x = -seek_x;
                seek_y = -seek_y;
            } else if (d - steering.preferred_range).abs() <= 30.0 {
                let (ox, oy) = (seek_x, seek_y);
                seek_x = -oy;
                seek_y = ox;
            }
        }

        let mut sep_x = 0.0;
        let mut sep_y = 0.0;
        grid.for_each_in_radius(pos.x, pos.y, steering.separation_radius, |other| {
            if other.entity == entity {
                return;
            }
            let dx = pos.x - other.x;
            let dy = pos.y - other.y;
            let d = (dx * dx + dy * dy).sqrt();
            if d >= steering.separation_radius {
                return;
            }
            if d < 1e-4 {
                let angle = GOLDEN_ANGLE * entity.index() as f32;
                sep_x += angle.cos();
                sep_y += angle.sin();
            } else {
                let strength = (steering.separation_radius - d) / steering.separation_radius;
                sep_x += (dx / d) * strength;
                sep_y += (dy / d) * strength;
            }
        });

        let (ahead_x, ahead_y) = (pos.x + seek_x * map.tile_size as f32, pos.y + seek_y * map.tile_size as f32);
        let (atx, aty) = map.world_to_tile(ahead_x, ahead_y);
        if map.floor_tile(atx, aty) == crate::tilemap::TILE_LAVA {
            if let Some((rtx, rty)) = lowest_distance_non_lava_neighbor(&map, &field, tx, ty) {
                let dx = (rtx - tx) as f32;
                let dy = (rty - ty) as f32;
                let d = (dx * dx + dy * dy).sqrt().max(1e-4);
                seek_x = dx / d;
                seek_y = dy / d;
            }
        }

        let mut desired_x = seek_x * steering.seek_weight + sep_x * steering.separation_weight;
        let mut desired_y = seek_y * steering.seek_weight + sep_y * steering.separation_weight;
        let mag = (desired_x * desired_x + desired_y * desired_y).sqrt();
        if mag > 1e-4 {
            desired_x /= mag;
            desired_y /= mag;
        } else {
            desired_x = 0.0;
            desired_y = 0.0;
        }

        vel.x = desired_x * speed.0;
        vel.y = desired_y * speed.0;
    }
}

fn lowest_distance_non_lava_neighbor(map: &Tilemap, field: &FlowField, tx: i32, ty: i32) -> Option<(i32, i32)> {
    let mut best: Option<((i32, i32), u32)> = None;
    for &(dx, dy) in &[(1, 0), (-1, 0), (0, 1), (0, -1)] {
        let (nx, ny) = (tx + dx, ty + dy);
        if !map.is_walkable(nx, ny) || map.floor_tile(nx, ny) == crate::tilemap::TILE_LAVA {
            continue;
        }
        let d = field.distance(nx, ny);
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some(((nx, ny), d));
        }
    }
    best.map(|(p, _)| p)
}
