//! Step 6: drains developer/test spawn requests queued from outside the
//! tick (console commands, test harnesses). Ships as a resource so the
//! normative system order stays fixed whether or not anything is queued.

use crate::components::*;
use bevy_ecs::prelude::*;

#[derive(Debug, Clone, Copy)]
pub struct DebugSpawnRequest {
    pub kind: EnemyKind,
    pub tier: EnemyTier,
    pub x: f32,
    pub y: f32,
}

#[derive(Resource, Debug, Default)]
pub struct DebugSpawnQueue {
    pub requests: Vec<DebugSpawnRequest>,
}

/// ## Data Access
/// - Reads/Writes: DebugSpawnQueue
/// - Spawns: Enemy entities
pub fn debug_spawn_system(mut commands: Commands, mut queue: ResMut<DebugSpawnQueue>) {
    for req in queue.requests.drain(..) {
        let stats = crate::systems::enemy_tables::stats_for(req.kind);
        commands.spawn(EnemyBundle {
            enemy: Enemy { kind: req.kind, tier: req.tier, budget_cost: stats.budget_cost },
            position: Position::new(req.x, req.y),
            velocity: Velocity::default(),
            z: ZPosition::default(),
            collider: Collider { radius: stats.collider_radius, layer: ColliderLayer::Enemy },
            health: Health::new(stats.max_health),
            ai: EnemyAI::default(),
            detection: Detection { aggro_range: stats.aggro_range, los_required: stats.los_required, stagger_offset: 0 },
            steering: Steering { preferred_range: stats.preferred_range, ..Default::default() },
            speed: MoveSpeed(stats.move_speed),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_request_spawns_exactly_one_enemy() {
        let mut world = World::new();
        world.insert_resource(DebugSpawnQueue {
            requests: vec![DebugSpawnRequest { kind: EnemyKind::Swarmer, tier: EnemyTier::Fodder, x: 1.0, y: 2.0 }],
        });

        let mut schedule = Schedule::default();
        schedule.add_systems(debug_spawn_system);
        schedule.run(&mut world);

        let mut q = world.query::<&Enemy>();
        assert_eq!(q.iter(&world).count(), 1);
    }
}
