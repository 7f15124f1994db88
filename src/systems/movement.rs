//! Step 15: integrates velocity into position. `prevX/Y` are snapshotted
//! before the integration so the bullet-collision system (step 16) can
//! sweep from last tick's position to this tick's.

use crate::components::*;
use bevy_ecs::prelude::*;

/// ## Data Access
/// - Reads: DeltaTime, SimScope, Velocity, Bullet.owner
/// - Writes: Position
pub fn movement_system(
    dt: Res<DeltaTime>,
    scope: Res<SimScope>,
    mut movers: Query<(Entity, &mut Position, &Velocity, Option<&Bullet>)>,
) {
    let delta = dt.0;
    for (entity, mut pos, vel, bullet) in movers.iter_mut() {
        if let SimScope::LocalPlayer(local) = *scope {
            let owned_by_local = bullet.map_or(false, |b| b.owner == local);
            if entity != local && !owned_by_local {
                continue;
            }
        }

        pos.prev_x = pos.x;
        pos.prev_y = pos.y;
        pos.x += vel.x * delta;
        pos.y += vel.y * delta;
    }
}
