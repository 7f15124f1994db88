//! Step 1: consume each player's pending input into movement intent and
//! player state. Firing, rolling, reload, and interaction are read from
//! the same `PendingInput` by their own systems later in the tick; this
//! system owns only `Velocity`, `PlayerState`, and jump takeoff.

use crate::components::*;
use bevy_ecs::prelude::*;

/// ## Data Access
/// - Reads: PendingInput, Health, Roll
/// - Writes: Velocity, PlayerState, ZPosition, Jump
pub fn player_input_system(
    mut query: Query<(
        &PendingInput,
        &Health,
        &Roll,
        &mut Velocity,
        &mut PlayerState,
        &mut ZPosition,
        &mut Jump,
        &MoveSpeed,
    )>,
) {
    for (input, health, roll, mut vel, mut state, mut z, mut jump, speed) in query.iter_mut() {
        if !health.is_alive() {
            state.state = PlayerStateKind::Dead;
            vel.x = 0.0;
            vel.y = 0.0;
            continue;
        }

        if roll.timer > 0.0 {
            continue;
        }

        let dir = input.0;
        let mag = (dir.move_dir_x * dir.move_dir_x + dir.move_dir_y * dir.move_dir_y).sqrt();
        if mag > 1.0e-4 {
            vel.x = dir.move_dir_x * speed.0;
            vel.y = dir.move_dir_y * speed.0;
            state.state = PlayerStateKind::Moving;
        } else {
            vel.x = 0.0;
            vel.y = 0.0;
            if matches!(state.state, PlayerStateKind::Moving) {
                state.state = PlayerStateKind::Idle;
            }
        }

        if dir.buttons.contains(InputButtons::JUMP) && !z.is_airborne() && jump.landing_timer <= 0.0 {
            z.z_velocity = 280.0;
            jump.landed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_input_zeroes_velocity() {
        let mut world = World::new();
        world.spawn((
            PendingInput::default(),
            Health::new(10.0),
            Roll::default(),
            Velocity::new(5.0, 5.0),
            PlayerState::default(),
            ZPosition::default(),
            Jump::default(),
            MoveSpeed(200.0),
        ));

        let mut schedule = Schedule::default();
        schedule.add_systems(player_input_system);
        schedule.run(&mut world);

        let mut q = world.query::<&Velocity>();
        let v = q.single(&world);
        assert_eq!(v.x, 0.0);
        assert_eq!(v.y, 0.0);
    }

    #[test]
    fn moving_input_sets_velocity_toward_direction() {
        let mut world = World::new();
        let mut input = InputState::default();
        input.move_dir_x = 1.0;
        world.spawn((
            PendingInput(input),
            Health::new(10.0),
            Roll::default(),
            Velocity::default(),
            PlayerState::default(),
            ZPosition::default(),
            Jump::default(),
            MoveSpeed(200.0),
        ));

        let mut schedule = Schedule::default();
        schedule.add_systems(player_input_system);
        schedule.run(&mut world);

        let mut q = world.query::<(&Velocity, &PlayerState)>();
        let (v, state) = q.single(&world);
        assert!((v.x - 200.0).abs() < 0.01);
        assert_eq!(state.state, PlayerStateKind::Moving);
    }
}
