//! Step 8: bullet lifetime bookkeeping. Actual entity/wall collision is
//! step 16 (`bullet_collision`); this system only tracks travel distance
//! and queues range/lifetime expiry, sharing the same removal path.

use crate::components::*;
use crate::systems::bullet_shared::{BulletRemovalEvent, BulletRemovalReason, PendingBulletRemovals};
use bevy_ecs::prelude::*;

/// ## Data Access
/// - Reads: DeltaTime, Position, Velocity
/// - Writes: Bullet.distance_traveled/lifetime, PendingBulletRemovals
pub fn bullet_system(
    dt: Res<DeltaTime>,
    mut removals: ResMut<PendingBulletRemovals>,
    mut query: Query<(Entity, &Position, &Velocity, &mut Bullet)>,
) {
    let delta = dt.0;
    for (entity, pos, vel, mut bullet) in query.iter_mut() {
        let step = vel.length() * delta;
        bullet.distance_traveled += step;
        bullet.lifetime += delta;

        if bullet.distance_traveled >= bullet.max_range {
            removals.events.push(BulletRemovalEvent {
                bullet: entity,
                reason: BulletRemovalReason::RangeExpired,
                x: pos.x,
                y: pos.y,
                hit_entity: None,
            });
        } else if bullet.lifetime >= BULLET_LIFETIME_FAILSAFE {
            removals.events.push(BulletRemovalEvent {
                bullet: entity,
                reason: BulletRemovalReason::LifetimeExpired,
                x: pos.x,
                y: pos.y,
                hit_entity: None,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullet_past_max_range_is_queued_for_removal() {
        let mut world = World::new();
        world.insert_resource(DeltaTime(1.0));
        world.insert_resource(PendingBulletRemovals::default());
        world.spawn((
            Position::new(0.0, 0.0),
            Velocity::new(1000.0, 0.0),
            Bullet { owner: Entity::from_raw(99), damage: 1.0, distance_traveled: 0.0, max_range: 500.0, lifetime: 0.0 },
        ));

        let mut schedule = Schedule::default();
        schedule.add_systems(bullet_system);
        schedule.run(&mut world);

        assert_eq!(world.resource::<PendingBulletRemovals>().events.len(), 1);
    }
}
