//! Un-numbered, runs alongside the interaction/economy wiring: drives the
//! `RunState` phase machine for everything the wave spawner (step 7)
//! doesn't own itself — starting the run, clearing leftover fodder,
//! regenerating the camp and the next stage, and healing players back up
//! once everyone confirms "ride out". `clearing`/`camp`/stage-advance are
//! rare, whole-world transitions, so this runs as a full-`World` system
//! rather than a narrow query-based one.

use crate::components::*;
use crate::interaction::InteractableLayout;
use crate::run_controller::{generate_camp_layout, generate_map, generate_poi, RunPhase, RunState, StageTable};
use crate::tilemap::Tilemap;
use bevy_ecs::prelude::*;

/// Fodder despawned per tick while `clearing`, so the transition reads as
/// a brief mop-up rather than an instant wipe.
const CLEARING_DESPAWNS_PER_TICK: usize = 3;

const CAMP_STASH_COUNT: usize = 3;
const CAMP_MIN_SALESMAN_DISTANCE: f32 = 4.0;

/// ## Data Access
/// - Reads: StageTable, SimSeed
/// - Writes: RunState, Tilemap, InteractableLayout, Health (camp heal), Dead, ReadyToDepart
pub fn run_controller_system(world: &mut World) {
    let phase = world.resource::<RunState>().phase;
    match phase {
        RunPhase::None => start_run(world),
        RunPhase::Active => {}
        RunPhase::Clearing => advance_clearing(world),
        RunPhase::Camp => advance_camp(world),
        RunPhase::Completed => {}
    }
}

fn start_run(world: &mut World) {
    let stage_index = world.resource::<RunState>().stage_index;
    regenerate_stage(world, stage_index);
    let mut run = world.resource_mut::<RunState>();
    run.phase = RunPhase::Active;
    run.wave_timer = 0.0;
}

fn advance_clearing(world: &mut World) {
    let mut fodder = Vec::new();
    {
        let mut query = world.query::<(Entity, &Enemy)>();
        for (entity, enemy) in query.iter(world) {
            if enemy.tier == EnemyTier::Fodder {
                fodder.push(entity);
            }
        }
    }

    if fodder.is_empty() {
        enter_camp(world);
        return;
    }

    for entity in fodder.into_iter().take(CLEARING_DESPAWNS_PER_TICK) {
        world.despawn(entity);
        world.resource_mut::<RunState>().fodder_alive = world.resource::<RunState>().fodder_alive.saturating_sub(1);
    }
}

fn enter_camp(world: &mut World) {
    tracing::debug!("stage cleared, entering camp");
    let map = generate_map(&world.resource::<StageTable>().camp_map, world.resource::<SimSeed>().0, u32::MAX);
    let layout = generate_camp_layout(&map);
    world.insert_resource(map);
    world.insert_resource(layout);

    let mut revived = Vec::new();
    {
        let mut query = world.query_filtered::<Entity, With<Player>>();
        for entity in query.iter(world) {
            revived.push(entity);
        }
    }
    for entity in revived {
        if let Some(mut health) = world.get_mut::<Health>(entity) {
            health.current = health.max;
        }
        world.entity_mut(entity).remove::<Dead>();
        if let Some(mut ready) = world.get_mut::<ReadyToDepart>(entity) {
            ready.0 = false;
        }
    }

    world.resource_mut::<RunState>().phase = RunPhase::Camp;
}

fn advance_camp(world: &mut World) {
    let mut any_player = false;
    let mut all_ready = true;
    {
        let mut query = world.query_filtered::<&ReadyToDepart, With<Player>>();
        for ready in query.iter(world) {
            any_player = true;
            all_ready &= ready.0;
        }
    }
    if !any_player || !all_ready {
        return;
    }

    let next_stage = world.resource::<RunState>().stage_index + 1;
    let total_stages = world.resource::<RunState>().total_stages;
    if next_stage >= total_stages {
        world.resource_mut::<RunState>().phase = RunPhase::Completed;
        return;
    }

    tracing::debug!(stage = next_stage, "departing camp for next stage");
    regenerate_stage(world, next_stage);
    let mut run = world.resource_mut::<RunState>();
    run.stage_index = next_stage;
    run.phase = RunPhase::Active;
    run.wave_index = 0;
    run.wave_timer = 0.0;
    run.threats_total = 0;
    run.threat_kills = 0;
    run.threats_alive = 0;
    run.fodder_alive = 0;
    run.fodder_budget_remaining = 0;
    run.threats_spawned_this_wave = false;
}

fn regenerate_stage(world: &mut World, stage_index: u32) {
    let seed = world.resource::<SimSeed>().0;
    let Some(stage) = world.resource::<StageTable>().stages.get(stage_index as usize).cloned() else {
        return;
    };
    let map = generate_map(&stage.map, seed, stage_index);
    let layout = generate_poi(&map, seed, stage_index, CAMP_STASH_COUNT, CAMP_MIN_SALESMAN_DISTANCE);
    world.insert_resource(map);
    world.insert_resource(layout);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_controller::{MapConfig, ObstacleSpec, StageConfig, WaveConfig};

    fn small_stage_table() -> StageTable {
        StageTable {
            stages: vec![StageConfig {
                map: MapConfig { width: 12, height: 12, tile_size: 32, center_clear_radius: 3, obstacles: ObstacleSpec { count: 0, min_spacing: 0, templates: vec![] }, hazards: vec![] },
                waves: vec![WaveConfig { fodder_budget: 0, fodder_pool: vec![], max_fodder_alive: 0, threats: vec![], spawn_delay: 0.0, threat_clear_ratio: 1.0 }],
            }],
            camp_map: MapConfig { width: 8, height: 8, tile_size: 32, center_clear_radius: 3, obstacles: ObstacleSpec { count: 0, min_spacing: 0, templates: vec![] }, hazards: vec![] },
        }
    }

    #[test]
    fn none_phase_generates_the_first_stage_and_goes_active() {
        let mut world = World::new();
        world.insert_resource(SimSeed(1));
        world.insert_resource(small_stage_table());
        world.insert_resource(RunState::new(2));

        run_controller_system(&mut world);

        assert_eq!(world.resource::<RunState>().phase, RunPhase::Active);
        assert!(world.get_resource::<Tilemap>().is_some());
        assert!(world.get_resource::<InteractableLayout>().is_some());
    }

    #[test]
    fn clearing_despawns_fodder_then_enters_camp_and_heals_players() {
        let mut world = World::new();
        world.insert_resource(SimSeed(1));
        world.insert_resource(small_stage_table());
        let mut run = RunState::new(2);
        run.phase = RunPhase::Clearing;
        world.insert_resource(run);

        let player = world.spawn((Player, Health { current: 0.0, max: 30.0, iframes: 0.0, iframe_duration: 0.5 }, Dead, ReadyToDepart(false))).id();
        let fodder = world.spawn(Enemy { kind: EnemyKind::Swarmer, tier: EnemyTier::Fodder, budget_cost: 1 }).id();

        run_controller_system(&mut world);
        assert!(world.get::<Enemy>(fodder).is_none());

        run_controller_system(&mut world);
        assert_eq!(world.resource::<RunState>().phase, RunPhase::Camp);
        assert_eq!(world.get::<Health>(player).unwrap().current, 30.0);
        assert!(world.get::<Dead>(player).is_none());
    }

    #[test]
    fn camp_waits_for_every_player_to_be_ready_before_advancing() {
        let mut world = World::new();
        world.insert_resource(SimSeed(1));
        world.insert_resource(small_stage_table());
        let mut run = RunState::new(2);
        run.phase = RunPhase::Camp;
        world.insert_resource(run);

        let a = world.spawn((Player, ReadyToDepart(true))).id();
        let b = world.spawn((Player, ReadyToDepart(false))).id();

        run_controller_system(&mut world);
        assert_eq!(world.resource::<RunState>().phase, RunPhase::Camp);

        world.get_mut::<ReadyToDepart>(b).unwrap().0 = true;
        run_controller_system(&mut world);
        assert_eq!(world.resource::<RunState>().phase, RunPhase::Active);
        assert_eq!(world.resource::<RunState>().stage_index, 1);
        let _ = a;
    }
}
