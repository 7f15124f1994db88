//! Shovel salesman / stash digging economy.
//!
//! The interactable layout (salesman spawn point, stash locations) is
//! world-owned state regenerated by the run controller at each stage/camp
//! transition. Per-player interaction progress (current target, hold
//! ticks, feedback text) lives on the player entity.

use crate::rng::Rng;
use bevy_ecs::prelude::*;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractableKind {
    Salesman,
    Stash,
}

#[derive(Debug, Clone, Copy)]
pub struct Stash {
    pub x: f32,
    pub y: f32,
    pub opened: bool,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct InteractableLayout {
    pub salesman: Option<(f32, f32)>,
    pub stashes: Vec<Stash>,
}

#[derive(Component, Debug, Clone, Default)]
pub struct PlayerInteractionState {
    pub target: Option<(InteractableKind, usize)>,
    pub hold_ticks: u32,
    pub feedback_timer: f32,
    pub last_seen_seq: u32,
    pub feedback_text: Option<&'static str>,
}

#[derive(Component, Debug, Clone, Default)]
pub struct PlayerEconomy {
    pub gold: u32,
    pub shovels: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct StashReward {
    pub gold: u32,
    pub brass_item: Option<u32>,
    pub silver_item: Option<u32>,
}

#[derive(Resource, Debug, Default)]
pub struct PendingStashRewards {
    pub queue: VecDeque<(Entity, StashReward)>,
}

/// Find the nearest interactable within its own interact radius of
/// `(px, py)`. Salesman and stash radii are independent per spec, so both
/// are checked and the closer eligible one wins.
pub fn find_nearest_interactable(
    layout: &InteractableLayout,
    px: f32,
    py: f32,
    salesman_radius: f32,
    stash_radius: f32,
) -> Option<(InteractableKind, usize, f32)> {
    let mut best: Option<(InteractableKind, usize, f32)> = None;

    if let Some((sx, sy)) = layout.salesman {
        let d = ((sx - px).powi(2) + (sy - py).powi(2)).sqrt();
        if d <= salesman_radius {
            best = Some((InteractableKind::Salesman, 0, d));
        }
    }

    for (i, stash) in layout.stashes.iter().enumerate() {
        if stash.opened {
            continue;
        }
        let d = ((stash.x - px).powi(2) + (stash.y - py).powi(2)).sqrt();
        if d <= stash_radius {
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((InteractableKind::Stash, i, d));
            }
        }
    }

    best
}

/// Resolve a salesman purchase: deducts gold and grants one shovel if
/// affordable and under the cap, otherwise sets feedback text.
pub fn resolve_salesman(
    economy: &mut PlayerEconomy,
    state: &mut PlayerInteractionState,
    stage_index: u32,
    base_price: u32,
    price_step: u32,
    max_shovels: u32,
) {
    let price = base_price + stage_index * price_step;
    if economy.shovels >= max_shovels {
        state.feedback_text = Some("full up on shovels");
        return;
    }
    if economy.gold < price {
        state.feedback_text = Some("not enough gold");
        return;
    }
    economy.gold -= price;
    economy.shovels += 1;
    state.feedback_text = None;
}

/// Resolve digging a stash: consumes one shovel, marks it opened, and
/// enqueues a reward roll (resolved by `roll_stash_reward`).
pub fn resolve_stash(
    economy: &mut PlayerEconomy,
    stash: &mut Stash,
) -> bool {
    if stash.opened || economy.shovels == 0 {
        return false;
    }
    economy.shovels -= 1;
    stash.opened = true;
    true
}

/// Sample a stash's reward from the rarity table:
/// 55% gold only, 25% gold + brass item, 8% gold + silver item,
/// 2% silver item only, 10% rare gold bonus.
pub fn roll_stash_reward(rng: &mut Rng, brass_item_id: u32, silver_item_id: u32) -> StashReward {
    let roll = rng.next();
    let base_gold = 20 + rng.next_int(30);

    if roll < 0.55 {
        StashReward { gold: base_gold, brass_item: None, silver_item: None }
    } else if roll < 0.80 {
        StashReward { gold: base_gold, brass_item: Some(brass_item_id), silver_item: None }
    } else if roll < 0.88 {
        StashReward { gold: base_gold, brass_item: None, silver_item: Some(silver_item_id) }
    } else if roll < 0.90 {
        StashReward { gold: 0, brass_item: None, silver_item: Some(silver_item_id) }
    } else {
        StashReward { gold: base_gold * 3, brass_item: None, silver_item: None }
    }
}
