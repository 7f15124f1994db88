//! Un-numbered, runs after the 19 normative-order systems: the shovel
//! salesman / stash economy. Driven per tick from each alive player's
//! held `INTERACT` button, then a companion pass resolves queued stash
//! reward rolls against the run RNG.

use crate::components::*;
use crate::config::SimConfig;
use crate::interaction::*;
use crate::progression::Inventory;
use crate::rng::Rng;
use crate::run_controller::RunState;
use bevy_ecs::prelude::*;

const BRASS_ITEM_ID: u32 = 1;
const SILVER_ITEM_ID: u32 = 2;

/// ## Data Access
/// - Reads: InteractableLayout, SimConfig, RunState, Position, PendingInput
/// - Writes: PlayerInteractionState, PlayerEconomy, Stash.opened, PendingStashRewards
pub fn interaction_system(
    config: Res<SimConfig>,
    run: Res<RunState>,
    mut layout: ResMut<InteractableLayout>,
    mut rewards: ResMut<PendingStashRewards>,
    mut players: Query<(Entity, &Position, &PendingInput, &mut PlayerInteractionState, &mut PlayerEconomy), (With<Player>, Without<Dead>)>,
) {
    for (entity, pos, input, mut state, mut economy) in players.iter_mut() {
        let held = input.0.buttons.contains(InputButtons::INTERACT);
        state.last_seen_seq = input.0.seq;

        // A release is whatever this tick's input says right now: either a
        // same-tick local reading or the latest acked network input, both
        // of which land in `PendingInput` before this system runs. Never
        // infer a release from silence (an unchanged, re-delivered input),
        // only from an observed button-up.
        if !held {
            state.hold_ticks = 0;
            state.target = None;
            continue;
        }

        let found = find_nearest_interactable(&layout, pos.x, pos.y, config.salesman_interact_radius, config.stash_interact_radius);
        let target = found.map(|(kind, idx, _)| (kind, idx));

        if target != state.target {
            state.target = target;
            state.hold_ticks = 1;
            continue;
        }
        state.hold_ticks += 1;
        if state.hold_ticks < config.interact_hold_ticks {
            continue;
        }

        match target {
            Some((InteractableKind::Salesman, _)) => {
                resolve_salesman(&mut economy, &mut state, run.stage_index, config.shovel_base_price, config.shovel_price_step_per_stage, config.max_shovels);
            }
            Some((InteractableKind::Stash, idx)) => {
                if let Some(stash) = layout.stashes.get_mut(idx) {
                    if resolve_stash(&mut economy, stash) {
                        rewards.queue.push_back((entity, StashReward { gold: 0, brass_item: None, silver_item: None }));
                    }
                }
            }
            None => {}
        }
        state.hold_ticks = 0;
    }
}

/// ## Data Access
/// - Reads: SimSeed, RunState, PendingStashRewards
/// - Writes: PlayerEconomy, Inventory
pub fn stash_reward_system(
    seed: Res<SimSeed>,
    run: Res<RunState>,
    mut rewards: ResMut<PendingStashRewards>,
    mut rng: Local<Option<Rng>>,
    mut players: Query<(&mut PlayerEconomy, Option<&mut Inventory>)>,
) {
    if rewards.queue.is_empty() {
        return;
    }
    if rng.is_none() {
        *rng = Some(Rng::new(seed.0).derive(run.stage_index).derive_named("stash_reward"));
    }
    let rng = rng.as_mut().unwrap();

    while let Some((entity, _)) = rewards.queue.pop_front() {
        let reward = roll_stash_reward(rng, BRASS_ITEM_ID, SILVER_ITEM_ID);
        let Ok((mut economy, inventory)) = players.get_mut(entity) else { continue };
        economy.gold += reward.gold;
        if let Some(mut inventory) = inventory {
            if let Some(item_id) = reward.brass_item {
                *inventory.stacks.entry(item_id).or_insert(0) += 1;
            }
            if let Some(item_id) = reward.silver_item {
                *inventory.stacks.entry(item_id).or_insert(0) += 1;
            }
        }
    }
}
