//! Step 16: swept-circle bullet-vs-entity and bullet-vs-tile collision.
//! Entity resolution runs first and may pierce; whatever survives it is
//! then tested against the tilemap at its new position and four
//! radius-offset probe points. Every removal funnels through
//! `bullet_shared::flush_bullet_removals` so the callback-once and
//! side-table-purge invariants hold no matter which path removed it.

use crate::components::*;
use crate::hooks::{fire_bullet_hit, BulletHitCtx};
use crate::spatial::SpatialGrid;
use crate::systems::bullet_shared::{flush_bullet_removals, BulletRemovalEvent, BulletRemovalReason, PendingBulletRemovals, PierceHits};
use crate::systems::health::{apply_damage, DamageParams};
use crate::tilemap::Tilemap;
use bevy_ecs::prelude::*;

const MAX_COLLIDER_RADIUS: f32 = 28.0;

struct BulletSnapshot {
    entity: Entity,
    owner: Entity,
    damage: f32,
    prev_x: f32,
    prev_y: f32,
    x: f32,
    y: f32,
    radius: f32,
    layer: ColliderLayer,
}

/// ## Data Access
/// - Reads: Position, Collider, Bullet, Health, Invincible, Showdown, SpatialGrid, Tilemap, SimScope
/// - Writes: Health (via applyDamage), PierceHits, PendingBulletRemovals
pub fn bullet_collision_system(world: &mut World) {
    let scope = *world.resource::<crate::components::SimScope>();
    let map = world.resource::<Tilemap>().clone();

    let mut snapshots = Vec::new();
    {
        let mut query_state = world.query::<(Entity, &Position, &Collider, &Bullet)>();
        let grid = world.resource::<SpatialGrid>();
        for (entity, pos, collider, bullet) in query_state.iter(world) {
            if let SimScope::LocalPlayer(local) = scope {
                if bullet.owner != local {
                    continue;
                }
            }
            let travel = ((pos.x - pos.prev_x).powi(2) + (pos.y - pos.prev_y).powi(2)).sqrt();
            let query_radius = collider.radius + MAX_COLLIDER_RADIUS + travel;
            let mut candidates = Vec::new();
            grid.for_each_in_radius(pos.x, pos.y, query_radius, |entry| {
                candidates.push(entry.entity);
            });

            snapshots.push((
                BulletSnapshot {
                    entity,
                    owner: bullet.owner,
                    damage: bullet.damage,
                    prev_x: pos.prev_x,
                    prev_y: pos.prev_y,
                    x: pos.x,
                    y: pos.y,
                    radius: collider.radius,
                    layer: collider.layer,
                },
                candidates,
            ));
        }
    }

    for (bullet, candidates) in snapshots {
        let removed = resolve_entity_hits(world, candidates, &bullet);
        if removed {
            continue;
        }
        resolve_tile_hit(world, &map, &bullet);
    }

    flush_bullet_removals(world);
}

/// Returns true if the bullet was queued for removal (hit without pierce).
fn resolve_entity_hits(world: &mut World, candidates: Vec<Entity>, bullet: &BulletSnapshot) -> bool {
    for candidate in candidates {
        if candidate == bullet.entity || candidate == bullet.owner {
            continue;
        }
        let Some(candidate_collider) = world.get::<Collider>(candidate).copied() else { continue };
        if !bullet.layer.damages(candidate_collider.layer) {
            continue;
        }
        let Some(health) = world.get::<Health>(candidate) else { continue };
        if !health.is_alive() || health.is_immune() {
            continue;
        }
        if world.get::<Invincible>(candidate).is_some() {
            continue;
        }
        if world.get::<PierceHits>(bullet.entity).map_or(false, |p| p.contains(candidate)) {
            continue;
        }
        let Some(candidate_pos) = world.get::<Position>(candidate).copied() else { continue };
        if !segment_hits_circle(bullet.prev_x, bullet.prev_y, bullet.x, bullet.y, bullet.radius, candidate_pos.x, candidate_pos.y, candidate_collider.radius) {
            continue;
        }

        let is_showdown_target = world
            .get::<Showdown>(bullet.owner)
            .map_or(false, |s| s.active && s.target == Some(candidate));
        let owner_showdown_active = world.get::<Showdown>(bullet.owner).map_or(false, |s| s.active);

        let mut damage = bullet.damage;
        if is_showdown_target {
            damage *= crate::systems::showdown::SHOWDOWN_DAMAGE_MULTIPLIER;
        }

        let ctx = fire_bullet_hit(
            world,
            BulletHitCtx { bullet: bullet.entity, owner: bullet.owner, target: candidate, damage, force_pierce: false },
        );

        apply_damage(
            world,
            candidate,
            DamageParams { attacker: Some(bullet.owner), owner_player: Some(bullet.owner), set_iframes: true, ..DamageParams::new(ctx.damage) },
        );

        let pierces = ctx.force_pierce || (owner_showdown_active && !is_showdown_target);
        if pierces {
            if let Some(mut hits) = world.get_mut::<PierceHits>(bullet.entity) {
                hits.0.push(candidate);
            }
            continue;
        }

        world.resource_mut::<PendingBulletRemovals>().events.push(BulletRemovalEvent {
            bullet: bullet.entity,
            reason: BulletRemovalReason::HitEntity,
            x: bullet.x,
            y: bullet.y,
            hit_entity: Some(candidate),
        });
        return true;
    }

    false
}

fn resolve_tile_hit(world: &mut World, map: &Tilemap, bullet: &BulletSnapshot) {
    let (tx, ty) = map.world_to_tile(bullet.x, bullet.y);
    let mut solid = map.is_solid(tx, ty);

    if !solid {
        for &(ox, oy) in &[(bullet.radius, 0.0), (-bullet.radius, 0.0), (0.0, bullet.radius), (0.0, -bullet.radius)] {
            let (ptx, pty) = map.world_to_tile(bullet.x + ox, bullet.y + oy);
            if map.is_solid(ptx, pty) {
                solid = true;
                break;
            }
        }
    }

    if solid {
        world.resource_mut::<PendingBulletRemovals>().events.push(BulletRemovalEvent {
            bullet: bullet.entity,
            reason: BulletRemovalReason::HitWall,
            x: bullet.x,
            y: bullet.y,
            hit_entity: None,
        });
    }
}

/// Closest-point segment-vs-circle test: projects the circle center onto
/// the segment, clamps to its span, and compares distance to the summed
/// radii.
fn segment_hits_circle(x0: f32, y0: f32, x1: f32, y1: f32, seg_radius: f32, cx: f32, cy: f32, c_radius: f32) -> bool {
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 1e-8 { (((cx - x0) * dx + (cy - y0) * dy) / len2).clamp(0.0, 1.0) } else { 0.0 };
    let px = x0 + dx * t;
    let py = y0 + dy * t;
    let d2 = (cx - px).powi(2) + (cy - py).powi(2);
    let r = seg_radius + c_radius;
    d2 <= r * r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookRegistry;

    fn base_world() -> World {
        let mut world = World::new();
        world.insert_resource(HookRegistry::default());
        world.insert_resource(SimScope::Authoritative);
        world.insert_resource(Tilemap::fallback(20, 20, 32));
        world.insert_resource(SpatialGrid::new(32.0));
        world.insert_resource(PendingBulletRemovals::default());
        world
    }

    #[test]
    fn bullet_hitting_an_enemy_damages_it_and_is_removed() {
        let mut world = base_world();
        let owner = world.spawn((Health::new(20.0), Showdown::default())).id();
        let target = world.spawn((
            Position::new(20.0, 0.0),
            Collider { radius: 10.0, layer: ColliderLayer::Enemy },
            Health::new(20.0),
        )).id();

        let mut pos = Position::new(0.0, 0.0);
        pos.prev_x = -5.0;
        let bullet = world.spawn((
            pos,
            Velocity::new(400.0, 0.0),
            Collider { radius: 3.0, layer: ColliderLayer::PlayerBullet },
            Bullet { owner, damage: 10.0, distance_traveled: 5.0, max_range: 500.0, lifetime: 0.0 },
            crate::systems::bullet_shared::BulletCallback(None),
            PierceHits::default(),
        )).id();

        let mut grid = SpatialGrid::new(32.0);
        grid.rebuild(vec![(target, 20.0, 0.0)]);
        world.insert_resource(grid);

        bullet_collision_system(&mut world);

        assert!((world.get::<Health>(target).unwrap().current - 10.0).abs() < 0.01);
        assert!(world.get::<Bullet>(bullet).is_none());
    }

    #[test]
    fn bullet_cannot_hit_its_own_owner() {
        let mut world = base_world();
        let owner = world.spawn((
            Position::new(20.0, 0.0),
            Collider { radius: 10.0, layer: ColliderLayer::Player },
            Health::new(20.0),
        )).id();

        let mut pos = Position::new(0.0, 0.0);
        pos.prev_x = -5.0;
        let bullet = world.spawn((
            pos,
            Velocity::new(400.0, 0.0),
            Collider { radius: 3.0, layer: ColliderLayer::EnemyBullet },
            Bullet { owner, damage: 10.0, distance_traveled: 5.0, max_range: 500.0, lifetime: 0.0 },
            crate::systems::bullet_shared::BulletCallback(None),
            PierceHits::default(),
        )).id();

        let mut grid = SpatialGrid::new(32.0);
        grid.rebuild(vec![(owner, 20.0, 0.0)]);
        world.insert_resource(grid);

        bullet_collision_system(&mut world);

        assert_eq!(world.get::<Health>(owner).unwrap().current, 20.0);
        assert!(world.get::<Bullet>(bullet).is_some());
    }
}
