//! Basic demonstration of the High Noon simulation core.
//!
//! Run with: cargo run --example basic_demo

use highnoon_sim::components::{EnemyKind, EnemyTier, InputButtons, InputState};
use highnoon_sim::run_controller::{MapConfig, ObstacleSpec, StageConfig, StageTable, WaveConfig};
use highnoon_sim::SimWorld;

fn main() {
    println!("=== High Noon - Simulation Demo ===\n");

    let stages = StageTable {
        stages: vec![StageConfig {
            map: MapConfig {
                width: 24,
                height: 24,
                tile_size: 32,
                center_clear_radius: 5,
                obstacles: ObstacleSpec { count: 6, min_spacing: 3, templates: vec![] },
                hazards: vec![],
            },
            waves: vec![WaveConfig {
                fodder_budget: 12,
                fodder_pool: vec![(EnemyKind::Swarmer, 1, 1)],
                max_fodder_alive: 6,
                threats: vec![(EnemyKind::Ranged, 1)],
                spawn_delay: 1.5,
                threat_clear_ratio: 0.8,
            }],
        }],
        camp_map: MapConfig::default(),
    };

    let mut sim = SimWorld::new();
    sim.configure_run(42, stages);

    let player = sim.spawn_player(1, 0.0, 0.0);
    println!("Spawned player {:?}", player);

    println!("\n--- Running 300 ticks (5s at 60 Hz) ---\n");
    let mut input = InputState { move_dir_x: 1.0, buttons: InputButtons::FIRE, ..Default::default() };

    for tick in 0..300u32 {
        input.seq = tick;
        sim.submit_input(player, input).expect("player entity should still exist");
        sim.step(1.0 / 60.0);

        if (tick + 1) % 60 == 0 {
            let snapshot = sim.snapshot();
            println!("--- Tick {} (t={:.1}s) ---", sim.current_tick(), sim.current_time());
            print_snapshot(&snapshot);
        }
    }

    println!("\n--- Queuing a debug Charger spawn ---\n");
    sim.queue_debug_spawn(EnemyKind::Charger, EnemyTier::Threat, 50.0, 50.0);
    sim.step(1.0 / 60.0);

    println!("state_hash = {:#x}", sim.state_hash());

    println!("\n=== Final State (JSON) ===\n");
    println!("{}", sim.snapshot().to_json_pretty().unwrap());
}

fn print_snapshot(snapshot: &highnoon_sim::Snapshot) {
    for player in &snapshot.players {
        println!(
            "  player {}: pos=({:.1}, {:.1}) hp={:.0}/{:.0} rounds={}/{} reloading={} xp={}",
            player.entity,
            player.x,
            player.y,
            player.health,
            player.health_max,
            player.cylinder_rounds,
            player.cylinder_max_rounds,
            player.reloading,
            player.xp,
        );
    }
    for enemy in &snapshot.enemies {
        println!(
            "  enemy {} [{}/{}]: pos=({:.1}, {:.1}) hp={:.0}/{:.0} state={}",
            enemy.entity, enemy.kind, enemy.tier, enemy.x, enemy.y, enemy.health, enemy.health_max, enemy.ai_state,
        );
    }
    if let Some(run) = &snapshot.run {
        println!(
            "  run: phase={} stage={}/{} wave={} fodder_alive={} threats_alive={}",
            run.phase, run.stage_index, run.total_stages, run.wave_index, run.fodder_alive, run.threats_alive,
        );
    }
}
