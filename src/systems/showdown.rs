//! Step 3: the Showdown ability. While active, bullets the owner fires
//! against the marked target deal bonus damage (consumed by the bullet
//! hit system); any other target hit during Showdown pierces instead of
//! stopping the bullet.

use crate::components::*;
use crate::spatial::SpatialGrid;
use bevy_ecs::prelude::*;

pub const SHOWDOWN_DAMAGE_MULTIPLIER: f32 = 2.5;

/// ## Data Access
/// - Reads: PendingInput, Position, SpatialGrid, DeltaTime
/// - Writes: Showdown
pub fn showdown_system(
    dt: Res<DeltaTime>,
    grid: Res<SpatialGrid>,
    mut query: Query<(Entity, &PendingInput, &Position, &Health, &mut Showdown)>,
    enemies: Query<(), With<Enemy>>,
) {
    let delta = dt.0;

    for (entity, input, pos, health, mut showdown) in query.iter_mut() {
        if !health.is_alive() {
            showdown.active = false;
            continue;
        }

        if showdown.cooldown > 0.0 {
            showdown.cooldown -= delta;
        }

        if showdown.active {
            showdown.timer -= delta;
            if showdown.timer <= 0.0 {
                showdown.active = false;
                showdown.cooldown = 6.0;
                showdown.marked.clear();
                showdown.target = None;
            }
            continue;
        }

        if input.0.buttons.contains(InputButtons::ABILITY) && showdown.cooldown <= 0.0 {
            let mut nearest: Option<(Entity, f32)> = None;
            grid.for_each_in_radius(pos.x, pos.y, 500.0, |candidate| {
                if candidate.entity == entity || !enemies.contains(candidate.entity) {
                    return;
                }
                let d2 = (candidate.x - pos.x).powi(2) + (candidate.y - pos.y).powi(2);
                if nearest.map_or(true, |(_, best)| d2 < best) {
                    nearest = Some((candidate.entity, d2));
                }
            });

            if let Some((target, _)) = nearest {
                showdown.active = true;
                showdown.timer = showdown.duration;
                showdown.target = Some(target);
                showdown.marked.clear();
                showdown.marked.insert(target);
            }
        }
    }
}
