//! Step 10: target acquisition and loss. Re-validating an existing
//! target is cheap and happens every tick; acquiring a brand new target
//! for a line-of-sight-requiring enemy is staggered across `entity id %
//! 5` ticks so the whole roster doesn't raycast on the same frame.

use crate::components::*;
use crate::systems::enemy_tables::stats_for;
use crate::tilemap::Tilemap;
use bevy_ecs::prelude::*;

/// ## Data Access
/// - Reads: Tilemap, SimTick, Position, Health of players and enemies
/// - Writes: EnemyAI.target
pub fn enemy_detection_system(
    map: Res<Tilemap>,
    tick: Res<SimTick>,
    mut enemies: Query<(Entity, &Position, &Enemy, &Detection, &mut EnemyAI)>,
    players: Query<(Entity, &Position, &Health), (With<Player>, Without<Dead>)>,
) {
    for (entity, pos, enemy, detection, mut ai) in enemies.iter_mut() {
        let leash = detection.aggro_range * 2.0;

        if let Some(target) = ai.target {
            match players.get(target) {
                Ok((_, tpos, thealth)) if thealth.is_alive() => {
                    let d = ((tpos.x - pos.x).powi(2) + (tpos.y - pos.y).powi(2)).sqrt();
                    if d > leash {
                        ai.target = None;
                    }
                }
                _ => ai.target = None,
            }
            continue;
        }

        let stagger = entity.index() as u64 % 5;
        if detection.los_required && tick.0 % 5 != stagger {
            continue;
        }

        let stats = stats_for(enemy.kind);
        let mut best: Option<(Entity, f32)> = None;
        for (pe, ppos, phealth) in players.iter() {
            if !phealth.is_alive() {
                continue;
            }
            let d2 = (ppos.x - pos.x).powi(2) + (ppos.y - pos.y).powi(2);
            if d2 > detection.aggro_range * detection.aggro_range {
                continue;
            }
            if stats.los_required && !has_line_of_sight(&map, pos.x, pos.y, ppos.x, ppos.y) {
                continue;
            }
            if best.map_or(true, |(_, bd)| d2 < bd) {
                best = Some((pe, d2));
            }
        }

        if let Some((target, _)) = best {
            ai.target = Some(target);
        }
    }
}

/// Bresenham line walk in tile space; a solid tile blocks sight. Diagonal
/// steps are treated as blocked when both adjacent cardinal tiles are
/// solid, matching the flow field's no-corner-cut rule.
fn has_line_of_sight(map: &Tilemap, x0: f32, y0: f32, x1: f32, y1: f32) -> bool {
    let (mut tx, mut ty) = map.world_to_tile(x0, y0);
    let (ex, ey) = map.world_to_tile(x1, y1);

    let dx = (ex - tx).abs();
    let dy = -(ey - ty).abs();
    let sx = if tx < ex { 1 } else { -1 };
    let sy = if ty < ey { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if map.is_solid(tx, ty) {
            return false;
        }
        if tx == ex && ty == ey {
            return true;
        }
        let e2 = 2 * err;
        let (step_x, step_y) = (e2 >= dy, e2 <= dx);
        if step_x && step_y {
            if map.is_solid(tx + sx, ty) && map.is_solid(tx, ty + sy) {
                return false;
            }
        }
        if step_x {
            err += dy;
            tx += sx;
        }
        if step_y {
            err += dx;
            ty += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::TILE_WALL;

    #[test]
    fn los_is_blocked_by_a_solid_tile_between() {
        let mut map = Tilemap::fallback(10, 10, 32);
        map.set_solid(5, 5, TILE_WALL);
        assert!(!has_line_of_sight(&map, 0.0, 5.0 * 32.0 + 16.0, 9.0 * 32.0, 5.0 * 32.0 + 16.0));
    }

    #[test]
    fn los_is_clear_on_an_open_map() {
        let map = Tilemap::fallback(10, 10, 32);
        assert!(has_line_of_sight(&map, 16.0, 16.0, 9.0 * 32.0 + 16.0, 16.0));
    }
}
