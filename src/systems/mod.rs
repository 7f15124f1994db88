//! ECS systems for the arena run simulation.
//!
//! ## Normative tick order
//!
//! Every system below runs once per fixed tick, single-threaded, in this
//! exact order. Later steps depend on state written by earlier ones (e.g.
//! bullet collision sweeps from the position `movement` just wrote), so the
//! order is load-bearing, not a style choice — see [`crate::api`] for the
//! `Schedule` construction that enforces it with `.chain()`.
//!
//! | # | System | Reads | Writes |
//! |---|--------|-------|--------|
//! | 1 | `player_input_system` | PendingInput, SimConfig | Velocity, Weapon aim, Roll/Showdown/Jump intent |
//! | 2 | `roll_system` | Roll, Invincible, SimConfig | Position/Velocity override, Invincible |
//! | 3 | `showdown_system` | Showdown, SimConfig | Showdown.active/timer, Enemy marks |
//! | 4 | `cylinder_system` | Cylinder, DeltaTime | Cylinder.rounds/reload_timer |
//! | 5 | `weapon_system` | Weapon, Cylinder, PendingInput | spawns Bullet entities |
//! | 6 | `debug_spawn_system` | debug console commands | spawns Enemy/Bullet entities |
//! | 7 | `wave_spawner_system` | StageTable, RunState, SimSeed | RunState, spawns Enemy entities |
//! | 8 | `bullet_system` | Bullet, DeltaTime | Bullet.distance_traveled/lifetime, queues removals |
//! | 9 | `flow_field_system` | Tilemap, Enemy/Player positions | FlowField |
//! | 10 | `enemy_detection_system` | Detection, FlowField, Position | EnemyAI.target |
//! | 11 | `enemy_ai_system` | EnemyAI, enemy_tables | EnemyAI.state/timer |
//! | 12 | `spatial_hash_rebuild_system` | Position, Collider | SpatialGrid |
//! | 13 | `enemy_steering_system` | Steering, FlowField, SpatialGrid | Velocity |
//! | 14 | `enemy_attack_system` | EnemyAI, enemy_tables | Health (via applyDamage), spawns enemy Bullet |
//! | 15 | `movement_system` | Velocity, SimScope | Position |
//! | 16 | `bullet_collision_system` | Bullet, SpatialGrid, Tilemap, SimScope | Health (via applyDamage), bullet removals |
//! | 17 | `health_system` | Health | Dead tag, despawns dead enemies/bullets |
//! | 18 | `slow_debuff_system`, `hazard_system` | SlowDebuff, Tilemap | SlowDebuff, Health (via applyDamage) |
//! | 19 | `tilemap_collision_system`, `entity_collision_system` | Tilemap, SpatialGrid, Collider | Position |
//!
//! Two systems run after the normative order and are not part of it,
//! since they react to state the 19 steps above already settled rather
//! than advancing the simulation themselves:
//! - `interaction_system`, `stash_reward_system` — shovel salesman / stash economy.
//! - `run_controller_system` — stage/clearing/camp phase transitions.

pub mod bullet;
pub mod bullet_collision;
pub mod bullet_shared;
pub mod buffs;
pub mod collision;
pub mod cylinder;
pub mod debug_spawn;
pub mod enemy_ai;
pub mod enemy_attack;
pub mod enemy_detection;
pub mod enemy_steering;
pub mod enemy_tables;
pub mod flow_field;
pub mod health;
pub mod interaction_system;
pub mod movement;
pub mod player_input;
pub mod roll;
pub mod run_controller_system;
pub mod showdown;
pub mod weapon;
pub mod wave_spawner;

pub use bullet::*;
pub use bullet_collision::*;
pub use buffs::*;
pub use collision::*;
pub use cylinder::*;
pub use debug_spawn::*;
pub use enemy_ai::*;
pub use enemy_attack::*;
pub use enemy_detection::*;
pub use enemy_steering::*;
pub use flow_field::*;
pub use health::*;
pub use interaction_system::*;
pub use movement::*;
pub use player_input::*;
pub use roll::*;
pub use run_controller_system::*;
pub use showdown::*;
pub use weapon::*;
pub use wave_spawner::*;
