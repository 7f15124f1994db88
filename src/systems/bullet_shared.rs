//! Types shared between the bullet-lifetime system (step 8) and the
//! bullet-collision system (step 16): every path that removes a bullet
//! funnels through the same removal-event shape so the callback-once and
//! side-table-purge invariants hold regardless of which system fired.

use bevy_ecs::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletRemovalReason {
    HitEntity,
    HitWall,
    RangeExpired,
    LifetimeExpired,
}

#[derive(Debug, Clone, Copy)]
pub struct BulletRemovalEvent {
    pub bullet: Entity,
    pub reason: BulletRemovalReason,
    pub x: f32,
    pub y: f32,
    pub hit_entity: Option<Entity>,
}

pub type BulletCollisionCallback = fn(&mut World, &BulletRemovalEvent);

/// Optional per-bullet callback, registered by the weapon system at spawn
/// time (e.g. for on-hit VFX triggers owned by the renderer side).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct BulletCallback(pub Option<BulletCollisionCallback>);

/// Entities already pierced by a given bullet; checked before a candidate
/// can be hit again by the same bullet.
#[derive(Component, Debug, Clone, Default)]
pub struct PierceHits(pub Vec<Entity>);

impl PierceHits {
    pub fn contains(&self, e: Entity) -> bool {
        self.0.contains(&e)
    }
}

/// Bullets queued for despawn this tick, collected during the read phase
/// of bullet/bullet-collision systems and applied in one pass so no
/// system mutates the same bullet entity twice in the same tick.
#[derive(Resource, Debug, Default)]
pub struct PendingBulletRemovals {
    pub events: Vec<BulletRemovalEvent>,
}

/// Apply every queued removal: invoke its callback exactly once, then
/// despawn the bullet along with its side tables (`PierceHits`,
/// `BulletCallback` are despawned with the entity itself).
pub fn flush_bullet_removals(world: &mut World) {
    let events = std::mem::take(&mut world.resource_mut::<PendingBulletRemovals>().events);
    for event in events {
        if let Some(BulletCallback(Some(cb))) = world.get::<BulletCallback>(event.bullet).copied() {
            cb(world, &event);
        }
        world.despawn(event.bullet);
    }
}
