//! High Noon — Simulation Core
//!
//! A deterministic, fixed-timestep, multiplayer-authoritative ECS
//! simulation of a top-down twin-stick arena shooter run: entity/component
//! store, spatial hash, flow-field pathfinding, bullet/collision/damage
//! pipeline, enemy AI, wave/stage/camp progression, and the revolver
//! cylinder reload state machine. Uses `bevy_ecs` for the
//! entity-component-system architecture.

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod flowfield;
pub mod hooks;
pub mod interaction;
pub mod profiler;
pub mod progression;
pub mod rng;
pub mod run_controller;
pub mod spatial;
pub mod systems;
pub mod tilemap;
pub mod world;

pub use api::SimWorld;
pub use components::*;
pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use spatial::{SpatialEntry, SpatialGrid};
pub use systems::*;
pub use world::Snapshot;
