//! Step 11: the per-enemy state machine (§4.9). Steering (step 13) and
//! the attack payload (step 14) read the state this system sets; this
//! system only owns transitions and their timers.

use crate::components::*;
use crate::systems::enemy_tables::stats_for;
use bevy_ecs::prelude::*;

/// ## Data Access
/// - Reads: DeltaTime, Position of targets, enemy tables
/// - Writes: EnemyAI.state/timer/cooldown
pub fn enemy_ai_system(
    dt: Res<DeltaTime>,
    mut enemies: Query<(&Position, &Enemy, &mut EnemyAI)>,
    targets: Query<&Position, With<Player>>,
) {
    let delta = dt.0;

    for (pos, enemy, mut ai) in enemies.iter_mut() {
        let stats = stats_for(enemy.kind);

        if ai.target.is_none() {
            ai.state = EnemyAIState::Idle;
            continue;
        }

        match ai.state {
            EnemyAIState::Idle => {
                ai.state = EnemyAIState::Chase;
            }
            EnemyAIState::Chase => {
                if let Some(target_pos) = ai.target.and_then(|t| targets.get(t).ok()) {
                    let d = ((target_pos.x - pos.x).powi(2) + (target_pos.y - pos.y).powi(2)).sqrt();
                    if d <= stats.attack_range {
                        ai.state = EnemyAIState::Telegraph;
                        ai.timer = stats.telegraph_duration;
                    }
                }
            }
            EnemyAIState::Telegraph => {
                ai.timer -= delta;
                if ai.timer <= 0.0 {
                    ai.state = EnemyAIState::Attack;
                    ai.timer = 0.0;
                }
            }
            EnemyAIState::Attack => {
                // step 14 (enemy_attack) owns clearing Attack once the
                // type-specific payload has executed; nothing to do here.
            }
            EnemyAIState::Recover => {
                ai.timer -= delta;
                if ai.timer <= 0.0 {
                    ai.state = EnemyAIState::Cooldown;
                    ai.timer = stats.cooldown_duration;
                }
            }
            EnemyAIState::Cooldown => {
                ai.timer -= delta;
                if ai.timer <= 0.0 {
                    ai.state = EnemyAIState::Chase;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquiring_a_target_moves_idle_to_chase() {
        let mut world = World::new();
        world.insert_resource(DeltaTime(1.0 / 60.0));
        let player = world.spawn(Position::new(100.0, 0.0)).id();
        let mut ai = EnemyAI::default();
        ai.target = Some(player);
        world.spawn((Position::new(0.0, 0.0), Enemy { kind: EnemyKind::Swarmer, tier: EnemyTier::Fodder, budget_cost: 1 }, ai));

        let mut schedule = Schedule::default();
        schedule.add_systems(enemy_ai_system);
        schedule.run(&mut world);

        let mut q = world.query::<&EnemyAI>();
        assert_eq!(q.iter(&world).filter(|a| a.state == EnemyAIState::Chase).count(), 1);
    }

    #[test]
    fn chase_transitions_to_telegraph_within_attack_range() {
        let mut world = World::new();
        world.insert_resource(DeltaTime(1.0 / 60.0));
        let player = world.spawn(Position::new(10.0, 0.0)).id();
        let mut ai = EnemyAI::default();
        ai.target = Some(player);
        ai.state = EnemyAIState::Chase;
        world.spawn((Position::new(0.0, 0.0), Enemy { kind: EnemyKind::Swarmer, tier: EnemyTier::Fodder, budget_cost: 1 }, ai));

        let mut schedule = Schedule::default();
        schedule.add_systems(enemy_ai_system);
        schedule.run(&mut world);

        let mut q = world.query::<&EnemyAI>();
        assert_eq!(q.single(&world).state, EnemyAIState::Telegraph);
    }
}
