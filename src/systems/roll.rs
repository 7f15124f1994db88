//! Step 2: the dodge-roll state machine. A roll locks movement to a
//! fixed direction and speed for its duration, opens an i-frame window
//! for that duration, and unconditionally cancels any in-progress
//! cylinder reload (P6).

use crate::components::*;
use crate::config::SimConfig;
use crate::hooks::{fire_roll, HookRegistry, RollCtx};
use bevy_ecs::prelude::*;

/// ## Data Access
/// - Reads: PendingInput, SimConfig, HookRegistry
/// - Writes: Roll, Velocity, Position (via prev no-op here), Cylinder, PlayerState
pub fn roll_system(world: &mut World) {
    let config = world.resource::<SimConfig>().clone();
    let dt = world.resource::<crate::components::DeltaTime>().0;

    let mut started: Vec<Entity> = Vec::new();

    let mut query = world.query::<(
        Entity,
        &PendingInput,
        &Health,
        &mut Roll,
        &mut Velocity,
        &mut Cylinder,
        &mut PlayerState,
    )>();

    for (entity, input, health, mut roll, mut vel, mut cylinder, mut state) in query.iter_mut(world) {
        if !health.is_alive() {
            continue;
        }

        if roll.timer > 0.0 {
            roll.timer -= dt;
            vel.x = roll.dir_x * config.roll_speed;
            vel.y = roll.dir_y * config.roll_speed;
            if roll.timer <= 0.0 {
                roll.timer = 0.0;
                state.state = PlayerStateKind::Landing;
            }
            continue;
        }

        if input.0.buttons.contains(InputButtons::ROLL) {
            let (dx, dy) = (input.0.move_dir_x, input.0.move_dir_y);
            let mag = (dx * dx + dy * dy).sqrt();
            let (ndx, ndy) = if mag > 1.0e-4 { (dx / mag, dy / mag) } else { (input.0.aim_angle.cos(), input.0.aim_angle.sin()) };

            roll.timer = config.roll_duration;
            roll.duration = config.roll_duration;
            roll.dir_x = ndx;
            roll.dir_y = ndy;
            state.state = PlayerStateKind::Rolling;

            cylinder.reloading = false;
            cylinder.reload_timer = 0.0;

            started.push(entity);
        }
    }

    for entity in started {
        world.entity_mut(entity).insert(Invincible);
        fire_roll(world, RollCtx { player: entity });
    }

    // Clear invincibility once the roll's i-frame window (equal to roll
    // duration) has ended; a still-rolling entity keeps the tag.
    let mut cleanup = world.query_filtered::<(Entity, &Roll), With<Invincible>>();
    let to_clear: Vec<Entity> = cleanup
        .iter(world)
        .filter(|(_, roll)| roll.timer <= 0.0)
        .map(|(e, _)| e)
        .collect();
    for entity in to_clear {
        world.entity_mut(entity).remove::<Invincible>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_player(world: &mut World, rolling_input: bool) -> Entity {
        let mut input = InputState::default();
        if rolling_input {
            input.buttons = InputButtons::ROLL;
            input.move_dir_x = 1.0;
        }
        world.spawn((
            PendingInput(input),
            Health::new(10.0),
            Roll::default(),
            Velocity::default(),
            Cylinder::new(6, 1.2),
            PlayerState::default(),
        )).id()
    }

    fn base_world() -> World {
        let mut world = World::new();
        world.insert_resource(SimConfig::default());
        world.insert_resource(crate::components::DeltaTime(1.0 / 60.0));
        world.insert_resource(HookRegistry::default());
        world
    }

    #[test]
    fn roll_button_starts_roll_and_grants_invincibility() {
        let mut world = base_world();
        let player = spawn_player(&mut world, true);
        roll_system(&mut world);

        let roll = world.get::<Roll>(player).unwrap();
        assert!(roll.timer > 0.0);
        assert!(world.get::<Invincible>(player).is_some());
    }

    #[test]
    fn roll_cancels_in_progress_reload() {
        let mut world = base_world();
        let player = spawn_player(&mut world, true);
        {
            let mut cylinder = world.get_mut::<Cylinder>(player).unwrap();
            cylinder.reloading = true;
            cylinder.reload_timer = 0.5;
        }
        roll_system(&mut world);

        let cylinder = world.get::<Cylinder>(player).unwrap();
        assert!(!cylinder.reloading);
        assert_eq!(cylinder.reload_timer, 0.0);
    }
}
