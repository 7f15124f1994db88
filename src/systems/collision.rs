//! Step 19: tilemap-circle push-out and entity-entity push-out (§4.5).
//! Runs last in the tick so every other system's movement and spawns are
//! resolved against a final, non-overlapping layout. Bullets never appear
//! here; their collision is step 16.

use crate::components::*;
use crate::spatial::SpatialGrid;
use crate::tilemap::Tilemap;
use bevy_ecs::prelude::*;

const MAX_PUSHOUT_ITERATIONS: u32 = 4;

/// ## Data Access
/// - Reads: Tilemap, ZPosition, SimScope
/// - Writes: Position
pub fn tilemap_collision_system(
    map: Res<Tilemap>,
    scope: Res<SimScope>,
    mut query: Query<(Entity, &mut Position, &Collider, Option<&ZPosition>)>,
) {
    for (entity, mut pos, collider, z) in query.iter_mut() {
        if let SimScope::LocalPlayer(local) = *scope {
            if entity != local {
                continue;
            }
        }
        let airborne = z.map_or(false, |z| z.is_airborne());

        for _ in 0..MAX_PUSHOUT_ITERATIONS {
            let mut push_x = 0.0;
            let mut push_y = 0.0;
            let mut hits = 0;

            let min_tx = ((pos.x - collider.radius) / map.tile_size as f32).floor() as i32;
            let max_tx = ((pos.x + collider.radius) / map.tile_size as f32).floor() as i32;
            let min_ty = ((pos.y - collider.radius) / map.tile_size as f32).floor() as i32;
            let max_ty = ((pos.y + collider.radius) / map.tile_size as f32).floor() as i32;

            for ty in min_ty..=max_ty {
                for tx in min_tx..=max_tx {
                    let solid = map.is_solid(tx, ty) || (!airborne && map.is_half_wall(tx, ty));
                    if !solid {
                        continue;
                    }
                    if let Some((dx, dy)) = circle_vs_tile_penetration(pos.x, pos.y, collider.radius, tx, ty, map.tile_size as f32) {
                        push_x += dx;
                        push_y += dy;
                        hits += 1;
                    }
                }
            }

            if hits == 0 {
                break;
            }
            pos.x += push_x / hits as f32;
            pos.y += push_y / hits as f32;
        }
    }
}

/// Closest-point circle-vs-AABB penetration vector. Returns `None` when
/// the circle does not overlap the tile.
fn circle_vs_tile_penetration(cx: f32, cy: f32, radius: f32, tx: i32, ty: i32, tile_size: f32) -> Option<(f32, f32)> {
    let min_x = tx as f32 * tile_size;
    let min_y = ty as f32 * tile_size;
    let max_x = min_x + tile_size;
    let max_y = min_y + tile_size;

    let closest_x = cx.clamp(min_x, max_x);
    let closest_y = cy.clamp(min_y, max_y);
    let dx = cx - closest_x;
    let dy = cy - closest_y;
    let d2 = dx * dx + dy * dy;

    if d2 >= radius * radius && !(cx > min_x && cx < max_x && cy > min_y && cy < max_y) {
        return None;
    }

    if d2 > 1e-8 {
        let d = d2.sqrt();
        let overlap = radius - d;
        Some((dx / d * overlap, dy / d * overlap))
    } else {
        // Center is exactly on an edge/corner; push out along whichever
        // axis has the smaller tile-edge distance.
        let to_left = cx - min_x;
        let to_right = max_x - cx;
        let to_top = cy - min_y;
        let to_bottom = max_y - cy;
        let min_edge = to_left.min(to_right).min(to_top).min(to_bottom);
        if min_edge == to_left {
            Some((-(to_left + radius), 0.0))
        } else if min_edge == to_right {
            Some((to_right + radius, 0.0))
        } else if min_edge == to_top {
            Some((0.0, -(to_top + radius)))
        } else {
            Some((0.0, to_bottom + radius))
        }
    }
}

/// ## Data Access
/// - Reads: SpatialGrid, Collider, ZPosition, SimScope
/// - Writes: Position
pub fn entity_collision_system(
    grid: Res<SpatialGrid>,
    scope: Res<SimScope>,
    mut query: Query<(Entity, &mut Position, &Collider, Option<&ZPosition>)>,
) {
    let snapshot: Vec<(Entity, f32, f32, f32, ColliderLayer, bool)> = query
        .iter()
        .map(|(entity, pos, collider, z)| (entity, pos.x, pos.y, collider.radius, collider.layer, z.map_or(false, |z| z.is_airborne())))
        .collect();

    for &(entity, ex, ey, eradius, elayer, eairborne) in &snapshot {
        if let SimScope::LocalPlayer(local) = *scope {
            if entity != local {
                continue;
            }
        }
        if eairborne {
            continue;
        }

        let mut push_x = 0.0;
        let mut push_y = 0.0;
        let query_radius = eradius + 40.0;
        grid.for_each_in_radius(ex, ey, query_radius, |other| {
            if other.entity == entity {
                return;
            }
            let Some((_, ox, oy, oradius, olayer, oairborne)) = snapshot.iter().find(|s| s.0 == other.entity).copied() else { return };
            if oairborne || !elayer.pushes(olayer) {
                return;
            }
            let dx = ex - ox;
            let dy = ey - oy;
            let d = (dx * dx + dy * dy).sqrt();
            let min_dist = eradius + oradius;
            if d >= min_dist || d < 1e-5 {
                return;
            }
            let overlap = (min_dist - d) * 0.5;
            push_x += dx / d * overlap;
            push_y += dy / d * overlap;
        });

        if push_x != 0.0 || push_y != 0.0 {
            if let Ok((_, mut pos, _, _)) = query.get_mut(entity) {
                pos.x += push_x;
                pos.y += push_y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::TILE_WALL;

    #[test]
    fn entity_is_pushed_out_of_an_overlapping_wall_tile() {
        let mut world = World::new();
        let mut map = Tilemap::fallback(10, 10, 32);
        map.set_solid(5, 5, TILE_WALL);
        world.insert_resource(map);
        world.insert_resource(SimScope::Authoritative);

        let (cx, cy) = (5.0 * 32.0 + 16.0, 5.0 * 32.0 + 16.0);
        let start_x = cx + 20.0; // tile edge is at cx+16; this overlaps the wall by 6 units given radius 10
        let entity = world.spawn((
            Position::new(start_x, cy),
            Collider { radius: 10.0, layer: ColliderLayer::Player },
        )).id();

        let mut schedule = Schedule::default();
        schedule.add_systems(tilemap_collision_system);
        schedule.run(&mut world);

        let pos = world.get::<Position>(entity).unwrap();
        assert!(pos.x > start_x);
    }

    #[test]
    fn overlapping_entities_on_pushing_layers_separate() {
        let mut world = World::new();
        world.insert_resource(SimScope::Authoritative);

        let a = world.spawn((Position::new(0.0, 0.0), Collider { radius: 10.0, layer: ColliderLayer::Player })).id();
        let b = world.spawn((Position::new(5.0, 0.0), Collider { radius: 10.0, layer: ColliderLayer::Enemy })).id();

        let mut grid = SpatialGrid::new(32.0);
        grid.rebuild(vec![(a, 0.0, 0.0), (b, 5.0, 0.0)]);
        world.insert_resource(grid);

        let mut schedule = Schedule::default();
        schedule.add_systems(entity_collision_system);
        schedule.run(&mut world);

        let pa = world.get::<Position>(a).unwrap();
        let pb = world.get::<Position>(b).unwrap();
        let d = ((pa.x - pb.x).powi(2) + (pa.y - pb.y).powi(2)).sqrt();
        assert!(d >= 19.9);
    }
}
