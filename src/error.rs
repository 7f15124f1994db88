//! Structured error types for programmer-invariant violations at the
//! public API boundary. Internal per-tick invariants (a system finding a
//! component it itself guarantees) are asserted with `debug_assert!`
//! instead; only boundary-crossing calls that take caller-supplied ids
//! return `Result`.

use bevy_ecs::prelude::Entity;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("entity {entity:?} is missing required component {component}")]
    MissingComponent { entity: Entity, component: &'static str },

    #[error("unknown enemy type id {0}")]
    UnknownEnemyType(u16),

    #[error("unknown skill node id {0}")]
    UnknownNodeId(u32),

    #[error("unknown item id {0}")]
    UnknownItemId(u32),

    #[error("skill node {node_id} is not yet implemented")]
    ContentNotImplemented { node_id: u32 },

    #[error("unknown player entity {0:?}")]
    UnknownPlayer(Entity),
}

pub type SimResult<T> = Result<T, SimError>;
