//! Step 5: weapon firing. Spawns bullet entities from the player's
//! current aim and cylinder state; shotgun-style weapons (`pelletCount >
//! 1`) fan every pellet from a single trigger pull across one round.

use crate::components::*;
use crate::systems::bullet_shared::{BulletCallback, PierceHits};
use bevy_ecs::prelude::*;

/// ## Data Access
/// - Reads: PendingInput, Position, Health
/// - Writes: Cylinder (rounds, fire_cooldown), spawns Bullet entities
pub fn weapon_system(
    mut commands: Commands,
    mut query: Query<(Entity, &PendingInput, &Position, &Health, &mut Weapon, &mut Cylinder)>,
) {
    for (owner, input, pos, health, mut weapon, mut cylinder) in query.iter_mut() {
        if !health.is_alive() {
            continue;
        }
        if cylinder.reloading || cylinder.fire_cooldown > 0.0 || cylinder.rounds == 0 {
            continue;
        }
        if !input.0.buttons.contains(InputButtons::FIRE) {
            continue;
        }

        let is_last_round = cylinder.rounds == 1;
        let base_damage = if is_last_round {
            weapon.bullet_damage * weapon.last_round_multiplier
        } else {
            weapon.bullet_damage
        };

        let pellets = weapon.pellet_count.max(1);
        let spread = weapon.spread_angle;
        let start_angle = input.0.aim_angle - spread * 0.5;
        let step = if pellets > 1 { spread / (pellets as f32 - 1.0) } else { 0.0 };

        for i in 0..pellets {
            let angle = start_angle + step * i as f32;
            commands.spawn(BulletBundle {
                bullet: Bullet {
                    owner,
                    damage: base_damage,
                    distance_traveled: 0.0,
                    max_range: weapon.range,
                    lifetime: 0.0,
                },
                position: Position::new(pos.x, pos.y),
                velocity: Velocity::new(angle.cos() * weapon.bullet_speed, angle.sin() * weapon.bullet_speed),
                collider: Collider { radius: 3.0, layer: ColliderLayer::PlayerBullet },
            }).insert((BulletCallback(None), PierceHits::default()));
        }

        cylinder.rounds -= 1;
        weapon.last_fire_time = 0.0;
        cylinder.fire_cooldown = 1.0 / weapon.fire_rate;
        cylinder.first_shot_after_reload = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firing_spawns_a_bullet_and_decrements_rounds() {
        let mut world = World::new();
        let mut input = InputState::default();
        input.buttons = InputButtons::FIRE;
        world.spawn((
            PendingInput(input),
            Position::new(0.0, 0.0),
            Health::new(10.0),
            Weapon::default(),
            Cylinder::new(6, 1.2),
        ));

        let mut schedule = Schedule::default();
        schedule.add_systems(weapon_system);
        schedule.run(&mut world);

        let mut cylinders = world.query::<&Cylinder>();
        assert_eq!(cylinders.single(&world).rounds, 5);

        let mut bullets = world.query::<&Bullet>();
        assert_eq!(bullets.iter(&world).count(), 1);
    }

    #[test]
    fn last_round_deals_multiplied_damage() {
        let mut world = World::new();
        let mut input = InputState::default();
        input.buttons = InputButtons::FIRE;
        let mut cylinder = Cylinder::new(6, 1.2);
        cylinder.rounds = 1;
        world.spawn((
            PendingInput(input),
            Position::new(0.0, 0.0),
            Health::new(10.0),
            Weapon::default(),
            cylinder,
        ));

        let mut schedule = Schedule::default();
        schedule.add_systems(weapon_system);
        schedule.run(&mut world);

        let mut bullets = world.query::<&Bullet>();
        let bullet = bullets.single(&world);
        assert!((bullet.damage - 15.0).abs() < 0.01); // 10.0 * 1.5 default multiplier
    }
}
