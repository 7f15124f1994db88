//! In-process publish/subscribe bus for gameplay events.
//!
//! Handlers are plain function pointers, registered at world init based on
//! which skill nodes or items a player has taken. No dynamic dispatch or
//! heap-boxed closures: every event's handler list is a small contiguous
//! `Vec<fn(...)>`, matching the tagged-variant, no-inheritance style used
//! throughout this crate.

use bevy_ecs::prelude::*;

/// Context passed to `onBulletHit` handlers. Handlers may adjust `damage`
/// and request a pierce; they must not otherwise mutate the world (bullet
/// removal/pierce bookkeeping is owned by the bullet-collision system).
pub struct BulletHitCtx {
    pub bullet: Entity,
    pub owner: Entity,
    pub target: Entity,
    pub damage: f32,
    pub force_pierce: bool,
}

pub struct KillCtx {
    pub killer: Option<Entity>,
    pub victim: Entity,
}

pub struct HealthChangedCtx {
    pub entity: Entity,
    pub delta: f32,
    pub new_current: f32,
}

pub struct PlayerDamagedCtx {
    pub player: Entity,
    pub amount: f32,
    pub attacker: Option<Entity>,
}

pub struct RollCtx {
    pub player: Entity,
}

pub struct BuffEndCtx {
    pub entity: Entity,
    pub buff_id: u32,
}

pub type OnBulletHit = fn(&mut World, &mut BulletHitCtx);
pub type OnKill = fn(&mut World, &KillCtx);
pub type OnHealthChanged = fn(&mut World, &HealthChangedCtx);
pub type OnPlayerDamaged = fn(&mut World, &PlayerDamagedCtx);
pub type OnRoll = fn(&mut World, &RollCtx);
pub type OnBuffEnd = fn(&mut World, &BuffEndCtx);

#[derive(Resource, Default)]
pub struct HookRegistry {
    pub on_bullet_hit: Vec<OnBulletHit>,
    pub on_kill: Vec<OnKill>,
    pub on_health_changed: Vec<OnHealthChanged>,
    pub on_player_damaged: Vec<OnPlayerDamaged>,
    pub on_roll: Vec<OnRoll>,
    pub on_buff_end: Vec<OnBuffEnd>,
}

impl HookRegistry {
    pub fn register_bullet_hit(&mut self, f: OnBulletHit) {
        self.on_bullet_hit.push(f);
    }

    pub fn register_kill(&mut self, f: OnKill) {
        self.on_kill.push(f);
    }

    pub fn register_health_changed(&mut self, f: OnHealthChanged) {
        self.on_health_changed.push(f);
    }

    pub fn register_player_damaged(&mut self, f: OnPlayerDamaged) {
        self.on_player_damaged.push(f);
    }

    pub fn register_roll(&mut self, f: OnRoll) {
        self.on_roll.push(f);
    }

    pub fn register_buff_end(&mut self, f: OnBuffEnd) {
        self.on_buff_end.push(f);
    }
}

/// Fire `onBulletHit` handlers in registration order against a detached
/// context, then return it so the caller can read back adjustments.
/// Handlers that need world access take `&mut World` but must not touch
/// the bullet or target's core combat components directly; they exist for
/// skill-node side effects (e.g. lifesteal, chain sparks).
pub fn fire_bullet_hit(world: &mut World, mut ctx: BulletHitCtx) -> BulletHitCtx {
    let handlers = world.resource::<HookRegistry>().on_bullet_hit.clone();
    for handler in handlers {
        handler(world, &mut ctx);
    }
    ctx
}

pub fn fire_kill(world: &mut World, ctx: KillCtx) {
    let handlers = world.resource::<HookRegistry>().on_kill.clone();
    for handler in handlers {
        handler(world, &ctx);
    }
}

pub fn fire_health_changed(world: &mut World, ctx: HealthChangedCtx) {
    let handlers = world.resource::<HookRegistry>().on_health_changed.clone();
    for handler in handlers {
        handler(world, &ctx);
    }
}

pub fn fire_player_damaged(world: &mut World, ctx: PlayerDamagedCtx) {
    let handlers = world.resource::<HookRegistry>().on_player_damaged.clone();
    for handler in handlers {
        handler(world, &ctx);
    }
}

pub fn fire_roll(world: &mut World, ctx: RollCtx) {
    let handlers = world.resource::<HookRegistry>().on_roll.clone();
    for handler in handlers {
        handler(world, &ctx);
    }
}

pub fn fire_buff_end(world: &mut World, ctx: BuffEndCtx) {
    let handlers = world.resource::<HookRegistry>().on_buff_end.clone();
    for handler in handlers {
        handler(world, &ctx);
    }
}
