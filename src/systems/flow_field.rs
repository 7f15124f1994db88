//! Step 9: recompute the flow field from the tile coordinates of every
//! living player, skipped entirely when that seed set hasn't changed.

use crate::components::*;
use crate::flowfield::FlowField;
use crate::tilemap::Tilemap;
use bevy_ecs::prelude::*;

/// ## Data Access
/// - Reads: Tilemap, Position of alive players
/// - Writes: FlowField
pub fn flow_field_system(
    map: Res<Tilemap>,
    mut field: ResMut<FlowField>,
    players: Query<&Position, (With<Player>, Without<Dead>)>,
) {
    let seeds: Vec<(i32, i32)> = players.iter().map(|p| map.world_to_tile(p.x, p.y)).collect();
    field.recompute_if_changed(&map, &seeds);
}
