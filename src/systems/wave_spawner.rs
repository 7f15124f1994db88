//! Step 7: drives `RunState`'s wave timer, threat spawning, fodder
//! trickle-spawning, and wave/stage/camp phase transitions.

use crate::components::*;
use crate::rng::Rng;
use crate::run_controller::{RunPhase, RunState, StageTable};
use bevy_ecs::prelude::*;

/// ## Data Access
/// - Reads: StageTable, DeltaTime, SimSeed, Player positions
/// - Writes: RunState, Tilemap (on camp/stage transition), spawns Enemy entities
pub fn wave_spawner_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    seed: Res<SimSeed>,
    stages: Res<StageTable>,
    mut run: ResMut<RunState>,
    mut rng: Local<Option<Rng>>,
    players: Query<&Position, (With<Player>, Without<Dead>)>,
) {
    if rng.is_none() {
        *rng = Some(Rng::new(seed.0).derive_named("wave_spawner"));
    }
    let rng = rng.as_mut().unwrap();

    if !matches!(run.phase, RunPhase::Active) {
        return;
    }
    let Some(stage) = stages.stages.get(run.stage_index as usize) else { return };
    let Some(wave) = stage.waves.get(run.wave_index as usize) else {
        run.phase = RunPhase::Clearing;
        return;
    };

    if run.wave_timer > 0.0 {
        run.wave_timer -= dt.0;
        return;
    }

    if !run.threats_spawned_this_wave {
        run.threats_spawned_this_wave = true;
        run.threats_total = wave.threats.iter().map(|(_, count)| count).sum();
        let spawn_anchor = players.iter().next().copied().unwrap_or(Position::new(0.0, 0.0));
        for &(kind, count) in &wave.threats {
            for _ in 0..count {
                let offset_angle = rng.next_range(0.0, std::f32::consts::TAU);
                let offset_r = rng.next_range(200.0, 400.0);
                spawn_enemy(
                    &mut commands,
                    kind,
                    EnemyTier::Threat,
                    spawn_anchor.x + offset_angle.cos() * offset_r,
                    spawn_anchor.y + offset_angle.sin() * offset_r,
                );
                run.threats_alive += 1;
            }
        }
        run.fodder_budget_remaining = wave.fodder_budget;
    }

    while run.fodder_alive < wave.max_fodder_alive && run.fodder_budget_remaining > 0 {
        let Some((kind, cost)) = sample_weighted_fodder(rng, &wave.fodder_pool) else { break };
        if cost as u32 > run.fodder_budget_remaining {
            break;
        }
        let spawn_anchor = players.iter().next().copied().unwrap_or(Position::new(0.0, 0.0));
        let offset_angle = rng.next_range(0.0, std::f32::consts::TAU);
        let offset_r = rng.next_range(250.0, 500.0);
        spawn_enemy(
            &mut commands,
            kind,
            EnemyTier::Fodder,
            spawn_anchor.x + offset_angle.cos() * offset_r,
            spawn_anchor.y + offset_angle.sin() * offset_r,
        );
        run.fodder_budget_remaining -= cost as u32;
        run.fodder_alive += 1;
    }

    if run.wave_cleared(wave.threat_clear_ratio) {
        let next_wave = run.wave_index + 1;
        if (next_wave as usize) < stage.waves.len() {
            tracing::debug!(wave = next_wave, "wave cleared, advancing");
            run.wave_index = next_wave;
            run.wave_timer = stage.waves[next_wave as usize].spawn_delay;
            run.threats_total = 0;
            run.threat_kills = 0;
            run.threats_spawned_this_wave = false;
        } else {
            tracing::debug!("final wave cleared, clearing stage");
            run.phase = RunPhase::Clearing;
        }
    }
}

fn sample_weighted_fodder(rng: &mut Rng, pool: &[(EnemyKind, u32, u8)]) -> Option<(EnemyKind, u8)> {
    let total_weight: u32 = pool.iter().map(|(_, w, _)| w).sum();
    if total_weight == 0 {
        return None;
    }
    let mut roll = rng.next_int(total_weight);
    for &(kind, weight, cost) in pool {
        if roll < weight {
            return Some((kind, cost));
        }
        roll -= weight;
    }
    pool.last().map(|&(k, _, c)| (k, c))
}

fn spawn_enemy(commands: &mut Commands, kind: EnemyKind, tier: EnemyTier, x: f32, y: f32) {
    let stats = crate::systems::enemy_tables::stats_for(kind);
    commands.spawn(EnemyBundle {
        enemy: Enemy { kind, tier, budget_cost: stats.budget_cost },
        position: Position::new(x, y),
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
