//! Step 18: slow-debuff decay and hazard ticks. Both are "ambient" damage
//! sources rather than combat hits, so they go through the same shared
//! `apply_damage` helper the bullet and melee paths use, just without
//! attacker attribution.

use crate::components::*;
use crate::config::SimConfig;
use crate::systems::health::{apply_damage, DamageParams};
use crate::tilemap::{Tilemap, TILE_LAVA};
use bevy_ecs::prelude::*;

/// ## Data Access
/// - Reads: DeltaTime
/// - Writes: SlowDebuff.duration, removes expired SlowDebuff
pub fn slow_debuff_system(dt: Res<DeltaTime>, mut commands: Commands, mut query: Query<(Entity, &mut SlowDebuff)>) {
    let delta = dt.0;
    for (entity, mut slow) in query.iter_mut() {
        slow.duration -= delta;
        if slow.duration <= 0.0 {
            commands.entity(entity).remove::<SlowDebuff>();
        }
    }
}

/// ## Data Access
/// - Reads: DeltaTime, Tilemap, SimConfig, Position, ZPosition
/// - Writes: Health (via applyDamage)
pub fn hazard_system(world: &mut World) {
    let delta = world.resource::<DeltaTime>().0;
    let dps = world.resource::<SimConfig>().lava_dps;
    let map = world.resource::<Tilemap>().clone();

    let mut standing_in_lava = Vec::new();
    {
        let mut query = world.query::<(Entity, &Position, Option<&ZPosition>, &Health)>();
        for (entity, pos, z, health) in query.iter(world) {
            if z.map_or(false, |z| z.is_airborne()) {
                continue;
            }
            if !health.is_alive() {
                continue;
            }
            let (tx, ty) = map.world_to_tile(pos.x, pos.y);
            if map.floor_tile(tx, ty) == TILE_LAVA {
                standing_in_lava.push(entity);
            }
        }
    }

    for entity in standing_in_lava {
        apply_damage(
            world,
            entity,
            DamageParams { set_iframes: false, track_attribution: false, ..DamageParams::new(dps * delta) },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookRegistry;

    #[test]
    fn slow_debuff_is_removed_once_its_duration_elapses() {
        let mut world = World::new();
        world.insert_resource(DeltaTime(1.0));
        let entity = world.spawn(SlowDebuff { multiplier: 0.5, duration: 0.5 }).id();

        let mut schedule = Schedule::default();
        schedule.add_systems(slow_debuff_system);
        schedule.run(&mut world);

        assert!(world.get::<SlowDebuff>(entity).is_none());
    }

    #[test]
    fn standing_in_lava_deals_dps_scaled_damage_per_tick() {
        let mut world = World::new();
        world.insert_resource(HookRegistry::default());
        world.insert_resource(DeltaTime(1.0));
        let mut config = SimConfig::default();
        config.lava_dps = 10.0;
        world.insert_resource(config);

        let mut map = Tilemap::fallback(10, 10, 32);
        map.set_floor(2, 2, TILE_LAVA);
        world.insert_resource(map);

        let entity = world.spawn((Position::new(2.0 * 32.0 + 16.0, 2.0 * 32.0 + 16.0), Health::new(20.0))).id();

        hazard_system(&mut world);

        assert!((world.get::<Health>(entity).unwrap().current - 10.0).abs() < 0.01);
    }
}
