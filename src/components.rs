//! Core ECS components, bundles, and the external input/world-state types
//! shared by every system.
//!
//! Per-entity data lives in the components below; per-player progression
//! and interaction state live in their own modules ([`crate::progression`],
//! [`crate::interaction`]) since they are owned by dedicated subsystems,
//! not the movement/combat core.

use bevy_ecs::prelude::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Height above ground, in world units, at which an entity is considered
/// airborne for collision and attack-targeting purposes.
pub const AIRBORNE_THRESHOLD: f32 = 0.5;

// ---------------------------------------------------------------------
// Spatial components
// ---------------------------------------------------------------------

/// World-space position. `prev_x`/`prev_y` hold the position as observed
/// at the start of the current tick, used for render interpolation and
/// swept bullet collision.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub prev_x: f32,
    pub prev_y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, prev_x: x, prev_y: y }
    }
}

#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

impl Velocity {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Airborne height above ground (z=0 is grounded).
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ZPosition {
    pub z: f32,
    pub z_velocity: f32,
}

impl ZPosition {
    pub fn is_airborne(&self) -> bool {
        self.z > AIRBORNE_THRESHOLD
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColliderLayer {
    Player,
    Enemy,
    PlayerBullet,
    EnemyBullet,
    Neutral,
}

impl ColliderLayer {
    /// Whether push-out collision resolution applies to this pair
    /// (entity-entity, non-damage). Bullets never push.
    pub fn pushes(self, other: ColliderLayer) -> bool {
        use ColliderLayer::*;
        matches!(
            (self, other),
            (Player, Enemy) | (Enemy, Player) | (Player, Neutral) | (Neutral, Player)
                | (Enemy, Neutral) | (Neutral, Enemy)
        )
    }

    /// Whether a bullet of `self` layer may damage a target of `other` layer.
    pub fn damages(self, other: ColliderLayer) -> bool {
        use ColliderLayer::*;
        matches!((self, other), (PlayerBullet, Enemy) | (EnemyBullet, Player))
    }
}

#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Collider {
    pub radius: f32,
    pub layer: ColliderLayer,
}

#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    pub iframes: f32,
    pub iframe_duration: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max, iframes: 0.0, iframe_duration: 0.5 }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    pub fn is_immune(&self) -> bool {
        self.iframes > 0.0
    }
}

// ---------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------

/// Tag marking a player-controlled entity.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

#[derive(Component, Debug, Clone, Copy)]
pub struct PlayerCharacter {
    pub character_id: u16,
}

/// Tracks the last-acked input sequence for this player, used both for
/// reconciliation and for release-edge detection on held buttons (see
/// [`crate::interaction`]).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PlayerNetworkState {
    pub last_acked_seq: u32,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct InputButtons: u16 {
        const FIRE     = 0b0000_0001;
        const ROLL     = 0b0000_0010;
        const RELOAD   = 0b0000_0100;
        const ABILITY  = 0b0000_1000;
        const INTERACT = 0b0001_0000;
        const JUMP     = 0b0010_0000;
    }
}

/// One player's input for one tick, as received from the network or the
/// local controller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InputState {
    pub seq: u32,
    pub buttons: InputButtons,
    pub move_dir_x: f32,
    pub move_dir_y: f32,
    pub aim_angle: f32,
    pub shoot_seq: u32,
    pub client_tick: u64,
    pub client_time_ms: u64,
    pub estimated_server_time_ms: u64,
    pub view_interp_delay_ms: u32,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            seq: 0,
            buttons: InputButtons::empty(),
            move_dir_x: 0.0,
            move_dir_y: 0.0,
            aim_angle: 0.0,
            shoot_seq: 0,
            client_tick: 0,
            client_time_ms: 0,
            estimated_server_time_ms: 0,
            view_interp_delay_ms: 0,
        }
    }
}

/// The most recently submitted input for a player, consumed at the top of
/// the tick by `player_input_system`. Stored as a component so each player
/// entity owns its own pending input, matching the per-entity-column ECS
/// idiom used throughout this crate.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PendingInput(pub InputState);

/// Direction of the last hit this player took, used by hit-reaction VFX
/// hooks and by some skill effects (e.g. retaliation nodes).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct LastHitDirection {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStateKind {
    Idle,
    Moving,
    Rolling,
    Landing,
    Dead,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct PlayerState {
    pub state: PlayerStateKind,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self { state: PlayerStateKind::Idle }
    }
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Jump {
    pub landed: bool,
    pub landing_timer: f32,
}

/// Set while parked in camp once a player has confirmed "ride out". The
/// run controller advances to the next stage once every living player has
/// this set.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ReadyToDepart(pub bool);

/// Tag marking an entity as past its death animation and pending removal.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dead;

// ---------------------------------------------------------------------
// Roll / Showdown
// ---------------------------------------------------------------------

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Roll {
    pub timer: f32,
    pub duration: f32,
    pub dir_x: f32,
    pub dir_y: f32,
}

/// Tag added while a roll's i-frame window is open.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Invincible;

#[derive(Component, Debug, Clone)]
pub struct Showdown {
    pub active: bool,
    pub timer: f32,
    pub cooldown: f32,
    pub duration: f32,
    pub target: Option<Entity>,
    pub marked: HashSet<Entity>,
}

impl Default for Showdown {
    fn default() -> Self {
        Self {
            active: false,
            timer: 0.0,
            cooldown: 0.0,
            duration: 3.0,
            target: None,
            marked: HashSet::new(),
        }
    }
}

// ---------------------------------------------------------------------
// Weapons / bullets
// ---------------------------------------------------------------------

#[derive(Component, Debug, Clone, Copy)]
pub struct Weapon {
    pub fire_rate: f32,
    pub bullet_damage: f32,
    pub bullet_speed: f32,
    pub range: f32,
    pub last_fire_time: f32,
    pub pellet_count: u8,
    pub spread_angle: f32,
    pub min_fire_interval: f32,
    pub hold_fire_rate: f32,
    pub last_round_multiplier: f32,
}

impl Default for Weapon {
    fn default() -> Self {
        Self {
            fire_rate: 3.0,
            bullet_damage: 10.0,
            bullet_speed: 420.0,
            range: 600.0,
            last_fire_time: 0.0,
            pellet_count: 1,
            spread_angle: 0.0,
            min_fire_interval: 0.2,
            hold_fire_rate: 3.0,
            last_round_multiplier: 1.5,
        }
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Cylinder {
    pub rounds: u8,
    pub max_rounds: u8,
    pub reload_time: f32,
    pub reload_timer: f32,
    pub fire_cooldown: f32,
    pub reloading: bool,
    pub first_shot_after_reload: bool,
}

impl Cylinder {
    pub fn new(max_rounds: u8, reload_time: f32) -> Self {
        Self {
            rounds: max_rounds,
            max_rounds,
            reload_time,
            reload_timer: 0.0,
            fire_cooldown: 0.0,
            reloading: false,
            first_shot_after_reload: false,
        }
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Bullet {
    pub owner: Entity,
    pub damage: f32,
    pub distance_traveled: f32,
    pub max_range: f32,
    pub lifetime: f32,
}

pub const BULLET_LIFETIME_FAILSAFE: f32 = 5.0;

// ---------------------------------------------------------------------
// Enemies
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Swarmer,
    Ranged,
    Charger,
    Dynamite,
    Boss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyTier {
    Fodder,
    Threat,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub tier: EnemyTier,
    pub budget_cost: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyAIState {
    Idle,
    Chase,
    Telegraph,
    Attack,
    Recover,
    Cooldown,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct EnemyAI {
    pub state: EnemyAIState,
    pub timer: f32,
    pub cooldown: f32,
    pub target: Option<Entity>,
}

impl Default for EnemyAI {
    fn default() -> Self {
        Self { state: EnemyAIState::Idle, timer: 0.0, cooldown: 0.0, target: None }
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Detection {
    pub aggro_range: f32,
    pub los_required: bool,
    pub stagger_offset: u8,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Steering {
    pub preferred_range: f32,
    pub separation_radius: f32,
    pub seek_weight: f32,
    pub separation_weight: f32,
}

impl Default for Steering {
    fn default() -> Self {
        Self {
            preferred_range: 0.0,
            separation_radius: 24.0,
            seek_weight: 1.0,
            separation_weight: 0.6,
        }
    }
}

/// Enemy movement speed, kept distinct from `Velocity` so steering can
/// scale a unit desired-direction by a per-type constant.
#[derive(Component, Debug, Clone, Copy)]
pub struct MoveSpeed(pub f32);

// ---------------------------------------------------------------------
// Hazards / buffs
// ---------------------------------------------------------------------

#[derive(Component, Debug, Clone, Copy)]
pub struct SlowDebuff {
    pub multiplier: f32,
    pub duration: f32,
}

// ---------------------------------------------------------------------
// World-scoped resources
// ---------------------------------------------------------------------

#[derive(Resource, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 += 1;
    }
}

#[derive(Resource, Debug, Clone, Copy)]
pub struct SimTime(pub f64);

#[derive(Resource, Debug, Clone, Copy)]
pub struct DeltaTime(pub f32);

#[derive(Resource, Debug, Clone, Copy)]
pub struct SimSeed(pub u32);

/// Which entities the movement/collision systems are allowed to advance
/// this tick. `Authoritative` (server, or a client with no local player
/// yet) moves everything; `LocalPlayer` is client-side prediction scope,
/// where only the named player and bullets it owns move, and every other
/// entity is frozen until the next authoritative snapshot replaces it.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimScope {
    #[default]
    Authoritative,
    LocalPlayer(Entity),
}

// ---------------------------------------------------------------------
// Bundles
// ---------------------------------------------------------------------

#[derive(Bundle)]
pub struct PlayerBundle {
    pub player: Player,
    pub character: PlayerCharacter,
    pub position: Position,
    pub velocity: Velocity,
    pub z: ZPosition,
    pub collider: Collider,
    pub health: Health,
    pub state: PlayerState,
    pub net: PlayerNetworkState,
    pub pending_input: PendingInput,
    pub last_hit: LastHitDirection,
    pub roll: Roll,
    pub showdown: Showdown,
    pub weapon: Weapon,
    pub cylinder: Cylinder,
    pub jump: Jump,
    pub speed: MoveSpeed,
    pub ready: ReadyToDepart,
}

#[derive(Bundle)]
pub struct EnemyBundle {
    pub enemy: Enemy,
    pub position: Position,
    pub velocity: Velocity,
    pub z: ZPosition,
    pub collider: Collider,
    pub health: Health,
    pub ai: EnemyAI,
    pub detection: Detection,
    pub steering: Steering,
    pub speed: MoveSpeed,
}

#[derive(Bundle)]
pub struct BulletBundle {
    pub bullet: Bullet,
    pub position: Position,
    pub velocity: Velocity,
    pub collider: Collider,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_new_seeds_prev_from_current() {
        let p = Position::new(3.0, 4.0);
        assert_eq!(p.prev_x, 3.0);
        assert_eq!(p.prev_y, 4.0);
    }

    #[test]
    fn z_position_airborne_threshold() {
        let mut z = ZPosition::default();
        assert!(!z.is_airborne());
        z.z = AIRBORNE_THRESHOLD + 0.01;
        assert!(z.is_airborne());
    }

    #[test]
    fn health_immunity_and_alive() {
        let mut h = Health::new(10.0);
        assert!(h.is_alive());
        assert!(!h.is_immune());
        h.iframes = 0.2;
        assert!(h.is_immune());
        h.current = 0.0;
        assert!(!h.is_alive());
    }

    #[test]
    fn collider_layer_damage_rules() {
        assert!(ColliderLayer::PlayerBullet.damages(ColliderLayer::Enemy));
        assert!(ColliderLayer::EnemyBullet.damages(ColliderLayer::Player));
        assert!(!ColliderLayer::PlayerBullet.damages(ColliderLayer::Player));
        assert!(!ColliderLayer::Player.damages(ColliderLayer::Enemy));
    }

    #[test]
    fn collider_layer_push_rules_exclude_same_layer() {
        assert!(ColliderLayer::Player.pushes(ColliderLayer::Enemy));
        assert!(!ColliderLayer::Player.pushes(ColliderLayer::Player));
        assert!(!ColliderLayer::PlayerBullet.pushes(ColliderLayer::Enemy));
    }

    #[test]
    fn cylinder_new_starts_full() {
        let c = Cylinder::new(6, 1.2);
        assert_eq!(c.rounds, 6);
        assert!(!c.reloading);
    }
}
