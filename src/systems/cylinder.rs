//! Step 4: the revolver's three-state reload machine (READY / RELOADING
//! / FIRE_COOLDOWN, the latter tracked by `fire_cooldown > 0` rather than
//! a separate state flag). Roll already cleared any in-progress reload
//! by the time this system runs (step 2 precedes step 4).

use crate::components::*;
use bevy_ecs::prelude::*;

/// ## Data Access
/// - Reads: PendingInput, DeltaTime
/// - Writes: Cylinder
pub fn cylinder_system(dt: Res<DeltaTime>, mut query: Query<(&PendingInput, &mut Cylinder, &Health)>) {
    let delta = dt.0;

    for (input, mut cylinder, health) in query.iter_mut() {
        if !health.is_alive() {
            continue;
        }

        if cylinder.fire_cooldown > 0.0 {
            cylinder.fire_cooldown = (cylinder.fire_cooldown - delta).max(0.0);
        }

        if cylinder.reloading {
            cylinder.reload_timer += delta;
            if cylinder.reload_timer >= cylinder.reload_time {
                cylinder.rounds = cylinder.max_rounds;
                cylinder.reloading = false;
                cylinder.reload_timer = 0.0;
                cylinder.first_shot_after_reload = true;
            }
            continue;
        }

        let wants_reload = input.0.buttons.contains(InputButtons::RELOAD) && cylinder.rounds < cylinder.max_rounds;
        if wants_reload || cylinder.rounds == 0 {
            cylinder.reloading = true;
            cylinder.reload_timer = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with(cylinder: Cylinder, buttons: InputButtons) -> (World, Entity) {
        let mut world = World::new();
        world.insert_resource(DeltaTime(1.0 / 60.0));
        let mut input = InputState::default();
        input.buttons = buttons;
        let e = world.spawn((PendingInput(input), cylinder, Health::new(10.0))).id();
        (world, e)
    }

    #[test]
    fn empty_cylinder_begins_reloading_automatically() {
        let (mut world, player) = world_with(Cylinder::new(6, 1.2), InputButtons::empty());
        world.get_mut::<Cylinder>(player).unwrap().rounds = 0;

        let mut schedule = Schedule::default();
        schedule.add_systems(cylinder_system);
        schedule.run(&mut world);

        assert!(world.get::<Cylinder>(player).unwrap().reloading);
    }

    #[test]
    fn reload_completes_and_refills_rounds() {
        let (mut world, player) = world_with(Cylinder::new(6, 1.0 / 60.0), InputButtons::RELOAD);
        world.get_mut::<Cylinder>(player).unwrap().rounds = 2;

        let mut schedule = Schedule::default();
        schedule.add_systems(cylinder_system);
        schedule.run(&mut world); // begin reload
        schedule.run(&mut world); // reload_timer reaches reload_time

        let cylinder = world.get::<Cylinder>(player).unwrap();
        assert!(!cylinder.reloading);
        assert_eq!(cylinder.rounds, 6);
        assert!(cylinder.first_shot_after_reload);
    }
}
