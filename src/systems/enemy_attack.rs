//! Step 14: executes the type-specific ATTACK payload once `EnemyAI`
//! reaches `Attack` (entered by step 11 after the telegraph timer expires),
//! then hands off to `Recover`. Melee types hit-test directly against
//! `Health`; ranged types spawn enemy bullets the same way the weapon
//! system spawns player bullets.

use crate::components::*;
use crate::systems::bullet_shared::{BulletCallback, PierceHits};
use crate::systems::enemy_tables::stats_for;
use crate::systems::health::{apply_damage, DamageParams};
use bevy_ecs::prelude::*;

/// ## Data Access
/// - Reads: Position of self and target, enemy tables
/// - Writes: EnemyAI.state/timer, Health (melee), spawns enemy Bullets
pub fn enemy_attack_system(world: &mut World) {
    let mut attackers = Vec::new();
    {
        let mut query = world.query::<(Entity, &Position, &Enemy, &EnemyAI)>();
        for (entity, pos, enemy, ai) in query.iter(world) {
            if ai.state == EnemyAIState::Attack && ai.timer == 0.0 {
                attackers.push((entity, *pos, enemy.kind, ai.target));
            }
        }
    }

    for (entity, pos, kind, target) in attackers {
        let stats = stats_for(kind);

        if let Some(target) = target {
            if stats.is_ranged {
                fire_ranged_attack(world, entity, pos, target, &stats);
            } else if let Some(tpos) = world.get::<Position>(target).copied() {
                let d = ((tpos.x - pos.x).powi(2) + (tpos.y - pos.y).powi(2)).sqrt();
                if d <= stats.attack_range + 4.0 {
                    apply_damage(
                        world,
                        target,
                        DamageParams { attacker: Some(entity), set_iframes: true, ..DamageParams::new(stats.melee_damage) },
                    );
                }
            }
        }

        if let Some(mut ai) = world.get_mut::<EnemyAI>(entity) {
            ai.state = EnemyAIState::Recover;
            ai.timer = stats.recovery_duration;
        }
    }
}

fn fire_ranged_attack(
    world: &mut World,
    owner: Entity,
    pos: Position,
    target: Entity,
    stats: &crate::systems::enemy_tables::EnemyTypeStats,
) {
    let Some(tpos) = world.get::<Position>(target).copied() else { return };
    let dx = tpos.x - pos.x;
    let dy = tpos.y - pos.y;
    let d = (dx * dx + dy * dy).sqrt().max(1e-4);
    let speed = 260.0;

    world
        .spawn(BulletBundle {
            bullet: Bullet { owner, damage: stats.melee_damage, distance_traveled: 0.0, max_range: stats.attack_range + 120.0, lifetime: 0.0 },
            position: Position::new(pos.x, pos.y),
            velocity: Velocity::new(dx / d * speed, dy / d * speed),
            collider: Collider { radius: 4.0, layer: ColliderLayer::EnemyBullet },
        })
        .insert((BulletCallback(None), PierceHits::default()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookRegistry;

    #[test]
    fn melee_attack_in_range_damages_the_target_and_enters_recover() {
        let mut world = World::new();
        world.insert_resource(HookRegistry::default());

        let target = world.spawn((Position::new(10.0, 0.0), Health::new(20.0), Player)).id();
        let mut ai = EnemyAI::default();
        ai.state = EnemyAIState::Attack;
        ai.timer = 0.0;
        ai.target = Some(target);
        let attacker = world
            .spawn((Position::new(0.0, 0.0), Enemy { kind: EnemyKind::Swarmer, tier: EnemyTier::Fodder, budget_cost: 1 }, ai))
            .id();

        enemy_attack_system(&mut world);

        assert!(world.get::<Health>(target).unwrap().current < 20.0);
        assert_eq!(world.get::<EnemyAI>(attacker).unwrap().state, EnemyAIState::Recover);
    }

    #[test]
    fn ranged_attack_spawns_an_enemy_bullet_instead_of_direct_damage() {
        let mut world = World::new();
        world.insert_resource(HookRegistry::default());

        let target = world.spawn((Position::new(200.0, 0.0), Health::new(20.0), Player)).id();
        let mut ai = EnemyAI::default();
        ai.state = EnemyAIState::Attack;
        ai.timer = 0.0;
        ai.target = Some(target);
        world.spawn((Position::new(0.0, 0.0), Enemy { kind: EnemyKind::Ranged, tier: EnemyTier::Fodder, budget_cost: 2 }, ai));

        enemy_attack_system(&mut world);

        assert_eq!(world.get::<Health>(target).unwrap().current, 20.0);
        let mut bullets = world.query::<&Bullet>();
        assert_eq!(bullets.iter(&world).count(), 1);
    }
}
