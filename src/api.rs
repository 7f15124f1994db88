//! Public API for the simulation.
//!
//! This module provides the main interface for a server host or a client
//! predictor to drive the arena run simulation.
//!
//! ## Fixed Timestep
//!
//! The simulation uses a fixed timestep internally (default 60 Hz). When
//! `step(dt)` is called, the simulation accumulates time and runs fixed
//! updates as needed. This ensures deterministic behavior regardless of
//! frame rate.
//!
//! ## Normative system order
//!
//! `with_config` builds a single `Schedule` containing the 19 normative
//! steps in a `.chain()` (see [`crate::systems`] for the full table),
//! followed by the interaction/economy and run-controller systems that run
//! after them. Nothing in this schedule runs in parallel: the ordering is
//! load-bearing, not a style choice.

use crate::components::*;
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::flowfield::FlowField;
use crate::hooks::HookRegistry;
use crate::interaction::{InteractableLayout, PendingStashRewards, PlayerEconomy, PlayerInteractionState};
use crate::progression::{ContentTables, Inventory, PlayerProgression, SkillState};
use crate::profiler::Profiler;
use crate::run_controller::{RunState, StageTable};
use crate::spatial::{spatial_hash_rebuild_system, SpatialGrid};
use crate::systems::bullet_shared::PendingBulletRemovals;
use crate::systems::*;
use crate::tilemap::Tilemap;
use crate::world::Snapshot;
use bevy_ecs::prelude::*;

/// The main simulation world container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Initializing the simulation
/// - Stepping the simulation forward
/// - Extracting state snapshots
/// - Submitting per-player input and issuing commands
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    tick: u64,
    time: f64,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
    #[cfg(any(test, feature = "profile"))]
    profiler: Profiler,
}

impl SimWorld {
    /// Create a new simulation world with default tunables, no stages
    /// configured, and no players spawned.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Create a new simulation world with custom configuration.
    pub fn with_config(config: SimConfig) -> Self {
        let mut world = World::new();

        let spatial_cell_size = config.spatial_cell_size;
        world.insert_resource(DeltaTime(config.fixed_timestep));
        world.insert_resource(SpatialGrid::new(spatial_cell_size));
        world.insert_resource(config);

        world.insert_resource(SimTick(0));
        world.insert_resource(SimTime(0.0));
        world.insert_resource(SimSeed(0));
        world.insert_resource(SimScope::default());

        // A flat fallback floor so systems that read `Tilemap` never panic
        // before a run is configured; `configure_run` + `run_controller_system`
        // replace it with the first stage's procedurally generated map.
        world.insert_resource(Tilemap::fallback(20, 20, 32));
        world.insert_resource(FlowField::default());
        world.insert_resource(RunState::new(0));
        world.insert_resource(StageTable::default());
        world.insert_resource(InteractableLayout::default());
        world.insert_resource(PendingStashRewards::default());
        world.insert_resource(PendingBulletRemovals::default());
        world.insert_resource(DebugSpawnQueue::default());
        world.insert_resource(ContentTables::default());
        world.insert_resource(HookRegistry::default());

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                player_input_system,
                roll_system,
                showdown_system,
                cylinder_system,
                weapon_system,
                debug_spawn_system,
                wave_spawner_system,
                bullet_system,
                flow_field_system,
                enemy_detection_system,
                enemy_ai_system,
                spatial_hash_rebuild_system,
                enemy_steering_system,
                enemy_attack_system,
                movement_system,
                bullet_collision_system,
                health_system,
                (slow_debuff_system, hazard_system),
                (tilemap_collision_system, entity_collision_system),
            )
                .chain(),
        );
        schedule.add_systems((interaction_system, stash_reward_system, run_controller_system).chain());

        Self {
            world,
            schedule,
            tick: 0,
            time: 0.0,
            time_accumulator: 0.0,
            #[cfg(any(test, feature = "profile"))]
            profiler: Profiler::new(),
        }
    }

    /// Configure the stage table and seed that drive the run controller.
    /// Resets `RunState` to `RunPhase::None`, so the next tick generates
    /// the first stage's map and POI layout.
    pub fn configure_run(&mut self, seed: u32, stages: StageTable) {
        let total_stages = stages.stages.len() as u32;
        self.world.insert_resource(SimSeed(seed));
        self.world.insert_resource(stages);
        self.world.insert_resource(RunState::new(total_stages));
    }

    /// Swap in the skill tree and item content tables.
    pub fn set_content_tables(&mut self, tables: ContentTables) {
        self.world.insert_resource(tables);
    }

    /// Restrict movement/collision/bullet systems to one local player plus
    /// their own bullets, for client-side prediction. Pass `None` to
    /// return to authoritative (server) scope.
    pub fn set_local_player_scope(&mut self, player: Option<Entity>) {
        let scope = match player {
            Some(entity) => SimScope::LocalPlayer(entity),
            None => SimScope::Authoritative,
        };
        self.world.insert_resource(scope);
    }

    /// Register a gameplay event handler (see [`crate::hooks`]).
    pub fn hooks_mut(&mut self) -> Mut<HookRegistry> {
        self.world.resource_mut::<HookRegistry>()
    }

    /// Spawn a player-controlled entity with a full complement of
    /// progression/economy/interaction components attached.
    pub fn spawn_player(&mut self, character_id: u16, x: f32, y: f32) -> Entity {
        self.world
            .spawn((
                PlayerBundle {
                    player: Player,
                    character: PlayerCharacter { character_id },
                    position: Position::new(x, y),
                    velocity: Velocity::default(),
                    z: ZPosition::default(),
                    collider: Collider { radius: 14.0, layer: ColliderLayer::Player },
                    health: Health::new(100.0),
                    state: PlayerState::default(),
                    net: PlayerNetworkState::default(),
                    pending_input: PendingInput::default(),
                    last_hit: LastHitDirection::default(),
                    roll: Roll::default(),
                    showdown: Showdown::default(),
                    weapon: Weapon::default(),
                    cylinder: Cylinder::new(6, 1.2),
                    jump: Jump::default(),
                    speed: MoveSpeed(220.0),
                    ready: ReadyToDepart::default(),
                },
                PlayerProgression::default(),
                SkillState::default(),
                Inventory::default(),
                PlayerEconomy::default(),
                PlayerInteractionState::default(),
            ))
            .id()
    }

    /// Queue a developer/test enemy spawn, drained by step 6 next tick.
    pub fn queue_debug_spawn(&mut self, kind: EnemyKind, tier: EnemyTier, x: f32, y: f32) {
        self.world.resource_mut::<DebugSpawnQueue>().requests.push(DebugSpawnRequest { kind, tier, x, y });
    }

    /// Submit one player's input for the next tick. Also advances their
    /// `PlayerNetworkState.last_acked_seq`, since the input carries the
    /// sequence number the client has already had acknowledged.
    pub fn submit_input(&mut self, player: Entity, input: InputState) -> SimResult<()> {
        let seq = input.seq;
        let mut pending = self
            .world
            .get_mut::<PendingInput>(player)
            .ok_or(SimError::MissingComponent { entity: player, component: "PendingInput" })?;
        pending.0 = input;
        drop(pending);
        if let Some(mut net) = self.world.get_mut::<PlayerNetworkState>(player) {
            net.last_acked_seq = seq;
        }
        Ok(())
    }

    /// Mark (or unmark) a player as having confirmed "ride out" while
    /// parked in camp.
    pub fn set_ready_to_depart(&mut self, player: Entity, ready: bool) -> SimResult<()> {
        let mut component = self
            .world
            .get_mut::<ReadyToDepart>(player)
            .ok_or(SimError::MissingComponent { entity: player, component: "ReadyToDepart" })?;
        component.0 = ready;
        Ok(())
    }

    /// Grant XP to a player, possibly unlocking pending skill points.
    pub fn add_xp(&mut self, player: Entity, amount: u32) -> SimResult<()> {
        let mut progression = self
            .world
            .get_mut::<PlayerProgression>(player)
            .ok_or(SimError::MissingComponent { entity: player, component: "PlayerProgression" })?;
        progression.add_xp(amount);
        Ok(())
    }

    /// Attempt to take a skill-tree node for a player, per
    /// `ContentTables::can_take`'s prerequisite rules.
    pub fn take_skill_node(&mut self, player: Entity, node_id: u32) -> SimResult<()> {
        let tables = self.world.resource::<ContentTables>().clone();
        let mut query = self.world.query::<(&mut PlayerProgression, &mut SkillState)>();
        let (mut progression, mut skills) =
            query.get_mut(&mut self.world, player).map_err(|_| SimError::UnknownPlayer(player))?;
        tables.take_node(&mut progression, &mut skills, node_id)
    }

    /// Step the simulation forward by `dt` seconds.
    ///
    /// Uses fixed timestep internally: accumulates time and runs fixed
    /// updates as needed. This ensures deterministic behavior regardless
    /// of frame rate.
    pub fn step(&mut self, dt: f32) {
        let fixed_dt = self.world.resource::<SimConfig>().fixed_timestep;

        self.time_accumulator += dt;
        while self.time_accumulator >= fixed_dt {
            self.fixed_update(fixed_dt);
            self.time_accumulator -= fixed_dt;
        }
    }

    /// Run a single fixed timestep update.
    fn fixed_update(&mut self, dt: f32) {
        self.world.resource_mut::<DeltaTime>().0 = dt;
        self.world.resource_mut::<SimTick>().increment();

        self.schedule.run(&mut self.world);

        self.tick += 1;
        self.time += dt as f64;
        self.world.resource_mut::<SimTime>().0 = self.time;
    }

    /// Step with profiling — returns the time taken for the fixed update.
    ///
    /// Useful for stress tests to measure per-tick performance.
    #[cfg(any(test, feature = "profile"))]
    pub fn step_profiled(&mut self, dt: f32) -> std::time::Duration {
        let fixed_dt = self.world.resource::<SimConfig>().fixed_timestep;

        self.time_accumulator += dt;
        let mut total_duration = std::time::Duration::ZERO;

        while self.time_accumulator >= fixed_dt {
            self.profiler.begin_section("fixed_update");
            let start = std::time::Instant::now();
            self.fixed_update(fixed_dt);
            total_duration += start.elapsed();
            self.profiler.end_section();
            self.profiler.tick();
            self.time_accumulator -= fixed_dt;
        }

        total_duration
    }

    /// Print the accumulated per-section profiler summary to stdout.
    #[cfg(any(test, feature = "profile"))]
    pub fn print_profile_summary(&self) {
        self.profiler.print_summary();
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world, self.tick, self.time)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Hash of the observable component columns this tick, for desync
    /// detection: two worlds fed the same `(seed, input stream)` must
    /// produce identical hashes at every tick.
    pub fn state_hash(&mut self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let json = self.snapshot().to_json().unwrap_or_default();
        let mut hasher = DefaultHasher::new();
        json.hash(&mut hasher);
        hasher.finish()
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Get the elapsed simulation time.
    pub fn current_time(&self) -> f64 {
        self.time
    }

    /// Get the spatial grid reference (for debugging/visualization).
    pub fn spatial_grid(&self) -> Option<&SpatialGrid> {
        self.world.get_resource::<SpatialGrid>()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_controller::{MapConfig, ObstacleSpec, StageConfig, WaveConfig};

    fn single_stage_table() -> StageTable {
        StageTable {
            stages: vec![StageConfig {
                map: MapConfig {
                    width: 16,
                    height: 16,
                    tile_size: 32,
                    center_clear_radius: 4,
                    obstacles: ObstacleSpec { count: 0, min_spacing: 0, templates: vec![] },
                    hazards: vec![],
                },
                waves: vec![WaveConfig {
                    fodder_budget: 0,
                    fodder_pool: vec![],
                    max_fodder_alive: 0,
                    threats: vec![],
                    spawn_delay: 0.0,
                    threat_clear_ratio: 1.0,
                }],
            }],
            camp_map: MapConfig::default(),
        }
    }

    #[test]
    fn new_world_starts_at_tick_zero() {
        let sim = SimWorld::new();
        assert_eq!(sim.current_tick(), 0);
    }

    #[test]
    fn step_advances_tick_at_fixed_rate() {
        let mut sim = SimWorld::new();
        sim.step(1.0 / 60.0);
        assert_eq!(sim.current_tick(), 1);
        sim.step(1.0 / 60.0);
        assert_eq!(sim.current_tick(), 2);
    }

    #[test]
    fn stationary_player_with_zero_input_keeps_full_health() {
        let mut sim = SimWorld::new();
        sim.configure_run(42, single_stage_table());
        let player = sim.spawn_player(0, 256.0, 256.0);

        for _ in 0..60 {
            sim.step(1.0 / 60.0);
        }

        let snapshot = sim.snapshot();
        let snap = snapshot.players.iter().find(|p| p.entity == player.index()).unwrap();
        assert_eq!(snap.health, snap.health_max);
    }

    #[test]
    fn two_identical_worlds_produce_identical_state_hashes() {
        let mut sim_a = SimWorld::new();
        sim_a.configure_run(7, single_stage_table());
        sim_a.spawn_player(0, 100.0, 100.0);

        let mut sim_b = SimWorld::new();
        sim_b.configure_run(7, single_stage_table());
        sim_b.spawn_player(0, 100.0, 100.0);

        for _ in 0..10 {
            sim_a.step(1.0 / 60.0);
            sim_b.step(1.0 / 60.0);
        }

        assert_eq!(sim_a.state_hash(), sim_b.state_hash());
    }

    #[test]
    fn xp_grants_eventually_unlock_a_pending_point() {
        let mut sim = SimWorld::new();
        let player = sim.spawn_player(0, 0.0, 0.0);
        sim.add_xp(player, 150).unwrap();

        let snapshot = sim.snapshot();
        let snap = snapshot.players.iter().find(|p| p.entity == player.index()).unwrap();
        assert!(snap.pending_points > 0);
    }

    #[test]
    fn debug_spawn_queue_drains_into_an_enemy_next_tick() {
        let mut sim = SimWorld::new();
        sim.configure_run(1, single_stage_table());
        sim.queue_debug_spawn(EnemyKind::Swarmer, EnemyTier::Fodder, 40.0, 40.0);
        sim.step(1.0 / 60.0);

        let snapshot = sim.snapshot();
        assert_eq!(snapshot.enemies.len(), 1);
    }
}
