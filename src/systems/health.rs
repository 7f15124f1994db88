//! Step 17: the shared damage-application helper used by every combat
//! system (bullets, melee, hazards), plus the death-processing pass that
//! runs after all of a tick's damage has landed.

use crate::components::*;
use crate::hooks::{self, HealthChangedCtx, KillCtx, PlayerDamagedCtx};
use bevy_ecs::prelude::*;

/// Parameters for [`apply_damage`]. `attacker` is who dealt the hit, for
/// kill attribution; `owner_player` is the player that ultimately owns the
/// damage source (a bullet's owner, or the attacker itself), used when the
/// `onPlayerDamaged` hook needs to credit a player rather than a minion.
pub struct DamageParams {
    pub amount: f32,
    pub attacker: Option<Entity>,
    pub owner_player: Option<Entity>,
    pub set_iframes: bool,
    pub fire_health_changed: bool,
    pub track_attribution: bool,
    pub clamp_to_zero: bool,
}

impl DamageParams {
    pub fn new(amount: f32) -> Self {
        Self {
            amount,
            attacker: None,
            owner_player: None,
            set_iframes: false,
            fire_health_changed: true,
            track_attribution: true,
            clamp_to_zero: true,
        }
    }
}

/// The single entry point for reducing an entity's HP. Every combat system
/// (bullet collision, enemy melee, lava/hazard tick) goes through this
/// function so i-frame immunity, attribution, and hook firing stay
/// consistent regardless of damage source.
pub fn apply_damage(world: &mut World, target: Entity, params: DamageParams) {
    let Some(health) = world.get::<Health>(target) else {
        return;
    };
    if health.is_immune() {
        return;
    }
    if world.get::<Invincible>(target).is_some() {
        return;
    }

    let mut health = world.get_mut::<Health>(target).unwrap();
    let before = health.current;
    let mut new_current = health.current - params.amount;
    if params.clamp_to_zero && new_current < 0.0 {
        new_current = 0.0;
    }
    health.current = new_current;
    if params.set_iframes {
        health.iframes = health.iframe_duration;
    }
    let delta = new_current - before;
    drop(health);

    if params.track_attribution {
        if let Some(attacker) = params.attacker {
            let dir = match (world.get::<Position>(target).copied(), world.get::<Position>(attacker).copied()) {
                (Some(tpos), Some(apos)) => {
                    let dx = tpos.x - apos.x;
                    let dy = tpos.y - apos.y;
                    let d = (dx * dx + dy * dy).sqrt().max(1e-4);
                    Some((dx / d, dy / d))
                }
                _ => None,
            };
            if let (Some((dx, dy)), Some(mut last_hit)) = (dir, world.get_mut::<LastHitDirection>(target)) {
                last_hit.x = dx;
                last_hit.y = dy;
            }
        }
    }

    if params.fire_health_changed {
        hooks::fire_health_changed(world, HealthChangedCtx { entity: target, delta, new_current });
    }

    if world.get::<Player>(target).is_some() {
        if let Some(owner_player) = params.owner_player.or(params.attacker) {
            hooks::fire_player_damaged(world, PlayerDamagedCtx { player: target, amount: params.amount, attacker: Some(owner_player) });
        }
    }
}

/// ## Data Access
/// - Reads: Health, Enemy, Player
/// - Writes: Dead tag, despawns dead enemies, fires onKill
pub fn health_system(world: &mut World) {
    let mut newly_dead = Vec::new();
    {
        let mut query = world.query_filtered::<(Entity, &Health), Without<Dead>>();
        for (entity, health) in query.iter(world) {
            if !health.is_alive() {
                newly_dead.push(entity);
            }
        }
    }

    for entity in newly_dead {
        world.entity_mut(entity).insert(Dead);
        hooks::fire_kill(world, KillCtx { killer: None, victim: entity });
        tracing::debug!(?entity, "entity died");

        let is_enemy = world.get::<Enemy>(entity).is_some();
        let is_bullet = world.get::<Bullet>(entity).is_some();
        if is_enemy || is_bullet {
            world.despawn(entity);
        }
        // Players stay as entities past death (spec: "destroyed... on
        // leave"); Dead marks them for the respawn/camp-heal path instead.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_reduces_health_and_clamps_to_zero() {
        let mut world = World::new();
        world.insert_resource(hooks::HookRegistry::default());
        let target = world.spawn(Health::new(10.0)).id();

        apply_damage(&mut world, target, DamageParams::new(15.0));

        let health = world.get::<Health>(target).unwrap();
        assert_eq!(health.current, 0.0);
    }

    #[test]
    fn damage_against_iframes_is_a_no_op() {
        let mut world = World::new();
        world.insert_resource(hooks::HookRegistry::default());
        let mut health = Health::new(10.0);
        health.iframes = 0.2;
        let target = world.spawn(health).id();

        apply_damage(&mut world, target, DamageParams::new(5.0));

        assert_eq!(world.get::<Health>(target).unwrap().current, 10.0);
    }

    #[test]
    fn dead_enemies_are_despawned_after_health_system_runs() {
        let mut world = World::new();
        world.insert_resource(hooks::HookRegistry::default());
        let enemy = world.spawn((
            Health { current: 0.0, max: 20.0, iframes: 0.0, iframe_duration: 0.5 },
            Enemy { kind: EnemyKind::Swarmer, tier: EnemyTier::Fodder, budget_cost: 1 },
        )).id();

        health_system(&mut world);

        assert!(world.get::<Enemy>(enemy).is_none());
    }

    #[test]
    fn dead_players_keep_their_entity_but_gain_the_dead_tag() {
        let mut world = World::new();
        world.insert_resource(hooks::HookRegistry::default());
        let player = world.spawn((
            Health { current: 0.0, max: 20.0, iframes: 0.0, iframe_duration: 0.5 },
            Player,
        )).id();

        health_system(&mut world);

        assert!(world.get::<Dead>(player).is_some());
    }
}
