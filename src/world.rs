//! Simulation world container and snapshot types.
//!
//! The `Snapshot` struct provides a serializable, read-only view of
//! everything a renderer or HUD needs: per-entity component columns, the
//! current wave/stage status, per-player interaction prompts, and the
//! HUD figures (HP, XP, shovels, gold, cylinder rounds, reload %, ability
//! timers) called out as exposed state.

use crate::components::*;
use crate::interaction::{InteractableLayout, PlayerEconomy, PlayerInteractionState};
use crate::progression::PlayerProgression;
use crate::run_controller::{RunPhase, RunState};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single player's state for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub entity: u32,
    pub character_id: u16,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub health_max: f32,
    pub iframes: f32,
    pub state: String,
    pub dead: bool,
    pub ready_to_depart: bool,
    pub cylinder_rounds: u8,
    pub cylinder_max_rounds: u8,
    pub reloading: bool,
    pub reload_percent: f32,
    pub roll_active: bool,
    pub showdown_active: bool,
    pub showdown_cooldown: f32,
    pub xp: u32,
    pub level: u32,
    pub pending_points: u32,
    pub gold: u32,
    pub shovels: u32,
    pub interaction_prompt: Option<String>,
    pub interaction_hold_progress: f32,
}

/// Snapshot of a single enemy's state for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemySnapshot {
    pub entity: u32,
    pub kind: String,
    pub tier: String,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub health_max: f32,
    pub ai_state: String,
}

/// Current wave/stage/camp status, derived from `RunState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatusSnapshot {
    pub phase: String,
    pub stage_index: u32,
    pub total_stages: u32,
    pub wave_index: u32,
    pub fodder_alive: u32,
    pub threats_alive: u32,
    pub threat_kills: u32,
    pub threats_total: u32,
}

/// Salesman and stash positions, for the HUD to render interaction prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StashSnapshot {
    pub x: f32,
    pub y: f32,
    pub opened: bool,
}

/// Complete simulation state snapshot for a renderer/HUD.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f64,
    pub players: Vec<PlayerSnapshot>,
    pub enemies: Vec<EnemySnapshot>,
    pub run: Option<RunStatusSnapshot>,
    pub salesman: Option<(f32, f32)>,
    pub stashes: Vec<StashSnapshot>,
}

fn player_state_str(state: PlayerStateKind) -> &'static str {
    match state {
        PlayerStateKind::Idle => "Idle",
        PlayerStateKind::Moving => "Moving",
        PlayerStateKind::Rolling => "Rolling",
        PlayerStateKind::Landing => "Landing",
        PlayerStateKind::Dead => "Dead",
    }
}

fn enemy_kind_str(kind: EnemyKind) -> &'static str {
    match kind {
        EnemyKind::Swarmer => "Swarmer",
        EnemyKind::Ranged => "Ranged",
        EnemyKind::Charger => "Charger",
        EnemyKind::Dynamite => "Dynamite",
        EnemyKind::Boss => "Boss",
    }
}

fn enemy_tier_str(tier: EnemyTier) -> &'static str {
    match tier {
        EnemyTier::Fodder => "Fodder",
        EnemyTier::Threat => "Threat",
    }
}

fn enemy_ai_state_str(state: EnemyAIState) -> &'static str {
    match state {
        EnemyAIState::Idle => "Idle",
        EnemyAIState::Chase => "Chase",
        EnemyAIState::Telegraph => "Telegraph",
        EnemyAIState::Attack => "Attack",
        EnemyAIState::Recover => "Recover",
        EnemyAIState::Cooldown => "Cooldown",
    }
}

fn run_phase_str(phase: RunPhase) -> &'static str {
    match phase {
        RunPhase::None => "None",
        RunPhase::Active => "Active",
        RunPhase::Clearing => "Clearing",
        RunPhase::Camp => "Camp",
        RunPhase::Completed => "Completed",
    }
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, tick: u64, time: f64) -> Self {
        let mut players = Vec::new();
        let mut query = world.query::<(
            Entity,
            &PlayerCharacter,
            &Position,
            &Health,
            &PlayerState,
            Option<&Dead>,
            &ReadyToDepart,
            &Cylinder,
            &Roll,
            &Showdown,
            Option<&PlayerProgression>,
            Option<&PlayerEconomy>,
            Option<&PlayerInteractionState>,
        )>();

        for (entity, character, pos, health, state, dead, ready, cylinder, roll, showdown, progression, economy, interaction) in
            query.iter(world)
        {
            let reload_percent = if cylinder.reloading && cylinder.reload_time > 0.0 {
                (cylinder.reload_timer / cylinder.reload_time).clamp(0.0, 1.0)
            } else {
                0.0
            };

            players.push(PlayerSnapshot {
                entity: entity.index(),
                character_id: character.character_id,
                x: pos.x,
                y: pos.y,
                health: health.current,
                health_max: health.max,
                iframes: health.iframes,
                state: player_state_str(state.state).to_string(),
                dead: dead.is_some(),
                ready_to_depart: ready.0,
                cylinder_rounds: cylinder.rounds,
                cylinder_max_rounds: cylinder.max_rounds,
                reloading: cylinder.reloading,
                reload_percent,
                roll_active: roll.timer > 0.0,
                showdown_active: showdown.active,
                showdown_cooldown: showdown.cooldown,
                xp: progression.map_or(0, |p| p.xp),
                level: progression.map_or(0, |p| p.level),
                pending_points: progression.map_or(0, |p| p.pending_points),
                gold: economy.map_or(0, |e| e.gold),
                shovels: economy.map_or(0, |e| e.shovels),
                interaction_prompt: interaction.and_then(|i| i.feedback_text).map(|s| s.to_string()),
                interaction_hold_progress: interaction.map_or(0.0, |i| i.hold_ticks as f32),
            });
        }

        let mut enemies = Vec::new();
        let mut enemy_query = world.query::<(Entity, &Enemy, &Position, &Health, &EnemyAI)>();
        for (entity, enemy, pos, health, ai) in enemy_query.iter(world) {
            enemies.push(EnemySnapshot {
                entity: entity.index(),
                kind: enemy_kind_str(enemy.kind).to_string(),
                tier: enemy_tier_str(enemy.tier).to_string(),
                x: pos.x,
                y: pos.y,
                health: health.current,
                health_max: health.max,
                ai_state: enemy_ai_state_str(ai.state).to_string(),
            });
        }

        let run = world.get_resource::<RunState>().map(|run| RunStatusSnapshot {
            phase: run_phase_str(run.phase).to_string(),
            stage_index: run.stage_index,
            total_stages: run.total_stages,
            wave_index: run.wave_index,
            fodder_alive: run.fodder_alive,
            threats_alive: run.threats_alive,
            threat_kills: run.threat_kills,
            threats_total: run.threats_total,
        });

        let (salesman, stashes) = match world.get_resource::<InteractableLayout>() {
            Some(layout) => (
                layout.salesman,
                layout.stashes.iter().map(|s| StashSnapshot { x: s.x, y: s.y, opened: s.opened }).collect(),
            ),
            None => (None, Vec::new()),
        };

        Self { tick, time, players, enemies, run, salesman, stashes }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_captures_player_and_enemy_counts() {
        let mut world = World::new();
        world.spawn(PlayerBundle {
            player: Player,
            character: PlayerCharacter { character_id: 1 },
            position: Position::new(1.0, 2.0),
            velocity: Velocity::default(),
            z: ZPosition::default(),
            collider: Collider { radius: 12.0, layer: ColliderLayer::Player },
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
            speed: MoveSpeed(200.0),
            ready: ReadyToDepart::default(),
        });
        world.spawn(EnemyBundle {
            enemy: Enemy { kind: EnemyKind::Swarmer, tier: EnemyTier::Fodder, budget_cost: 1 },
            position: Position::new(5.0, 5.0),
            velocity: Velocity::default(),
            z: ZPosition::default(),
            collider: Collider { radius: 10.0, layer: ColliderLayer::Enemy },
            health: Health::new(20.0),
            ai: EnemyAI::default(),
            detection: Detection { aggro_range: 100.0, los_required: false, stagger_offset: 0 },
            steering: Steering::default(),
            speed: MoveSpeed(80.0),
        });

        let snapshot = Snapshot::from_world(&mut world, 3, 0.05);
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.enemies.len(), 1);
        assert_eq!(snapshot.players[0].character_id, 1);
        assert_eq!(snapshot.enemies[0].kind, "Swarmer");
    }

    #[test]
    fn snapshot_json_round_trips_through_serde() {
        let snapshot = Snapshot { tick: 7, time: 0.1, ..Default::default() };
        let json = snapshot.to_json().unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tick, 7);
    }
}
