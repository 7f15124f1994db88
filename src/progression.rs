//! Per-player XP, skill tree, and item inventory. Stats are recomputed
//! from base values plus additive/multiplicative modifiers and written
//! back into the ECS components that the combat systems actually read.

use crate::components::{Cylinder, Health, MoveSpeed, Weapon};
use crate::error::{SimError, SimResult};
use bevy_ecs::prelude::*;
use std::collections::{HashMap, HashSet};

pub const LEVEL_THRESHOLDS: &[u32] = &[0, 100, 250, 450, 700, 1000, 1400, 1900, 2500, 3200, 4000];

#[derive(Component, Debug, Clone, Default)]
pub struct PlayerProgression {
    pub xp: u32,
    pub level: u32,
    pub pending_points: u32,
}

impl PlayerProgression {
    pub fn add_xp(&mut self, amount: u32) {
        self.xp += amount;
        let new_level = LEVEL_THRESHOLDS.iter().filter(|&&t| self.xp >= t).count() as u32 - 1;
        if new_level > self.level {
            self.pending_points += new_level - self.level;
            self.level = new_level;
        }
    }
}

#[derive(Component, Debug, Clone, Default)]
pub struct SkillState {
    pub nodes_taken: HashSet<u32>,
}

#[derive(Component, Debug, Clone, Default)]
pub struct Inventory {
    pub stacks: HashMap<u32, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    MaxHealth,
    BulletDamage,
    FireRate,
    ReloadTime,
    MoveSpeed,
    LastRoundMultiplier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModOp {
    Add,
    Mul,
}

#[derive(Debug, Clone, Copy)]
pub struct StatModifier {
    pub stat: StatKind,
    pub op: ModOp,
    pub value: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackingFn {
    Linear,
    Hyperbolic,
    AdditiveCap,
    Unique,
}

impl StackingFn {
    /// Effective multiplier contribution of `stacks` copies of an item
    /// whose base coefficient is `coef`, to be applied as a `Mul` modifier
    /// of `(1.0 + contribution)`.
    pub fn contribution(self, coef: f32, stacks: u32) -> f32 {
        let s = stacks as f32;
        match self {
            StackingFn::Linear => coef * s,
            StackingFn::Hyperbolic => 1.0 - 1.0 / (1.0 + coef * s),
            StackingFn::AdditiveCap => (coef * s).min(1.0),
            StackingFn::Unique => coef,
        }
    }

    pub fn max_stack(self) -> u32 {
        match self {
            StackingFn::Unique => 1,
            _ => u32::MAX,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkillNode {
    pub id: u32,
    pub branch: u8,
    pub tier: u8,
    pub modifiers: Vec<StatModifier>,
    pub effect_id: Option<u32>,
    pub implemented: bool,
}

#[derive(Debug, Clone)]
pub struct ItemDef {
    pub id: u32,
    pub modifiers: Vec<StatModifier>,
    pub stacking: StackingFn,
    pub coef: f32,
}

/// Static content tables owned by the world, passed in at construction
/// rather than loaded through a singleton registry.
#[derive(Resource, Debug, Clone, Default)]
pub struct ContentTables {
    pub skill_tree: Vec<SkillNode>,
    pub items: Vec<ItemDef>,
}

impl ContentTables {
    pub fn skill_node(&self, id: u32) -> Option<&SkillNode> {
        self.skill_tree.iter().find(|n| n.id == id)
    }

    pub fn item(&self, id: u32) -> Option<&ItemDef> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Whether `node_id` can be taken: a pending point is available, it
    /// isn't already taken, it's implemented, and every lower-tier node in
    /// the same branch has been taken.
    pub fn can_take(&self, progression: &PlayerProgression, skills: &SkillState, node_id: u32) -> SimResult<bool> {
        let node = self.skill_node(node_id).ok_or(SimError::UnknownNodeId(node_id))?;
        if !node.implemented {
            return Ok(false);
        }
        if progression.pending_points == 0 {
            return Ok(false);
        }
        if skills.nodes_taken.contains(&node_id) {
            return Ok(false);
        }
        let lower_tiers_satisfied = self
            .skill_tree
            .iter()
            .filter(|n| n.branch == node.branch && n.tier < node.tier)
            .all(|n| skills.nodes_taken.contains(&n.id));
        Ok(lower_tiers_satisfied)
    }

    pub fn take_node(
        &self,
        progression: &mut PlayerProgression,
        skills: &mut SkillState,
        node_id: u32,
    ) -> SimResult<()> {
        if !self.can_take(progression, skills, node_id)? {
            return Err(SimError::ContentNotImplemented { node_id });
        }
        progression.pending_points -= 1;
        skills.nodes_taken.insert(node_id);
        Ok(())
    }
}

/// Base stats before any modifiers, supplied by the character's base
/// loadout (weapon table, base max HP, base move speed).
#[derive(Debug, Clone, Copy)]
pub struct BaseStats {
    pub max_health: f32,
    pub bullet_damage: f32,
    pub fire_rate: f32,
    pub reload_time: f32,
    pub move_speed: f32,
    pub last_round_multiplier: f32,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accum {
    add: f32,
    mul: f32,
}

/// Fold every taken skill node's modifiers and every stacked item's
/// modifiers into a final stat table: `result = (base + sum(add)) *
/// product(mul)`, additive strictly before multiplicative.
pub fn recompute(
    base: &BaseStats,
    content: &ContentTables,
    skills: &SkillState,
    inventory: &Inventory,
) -> BaseStats {
    let mut accum: HashMap<StatKind, Accum> = HashMap::new();

    let mut apply = |modifiers: &[StatModifier]| {
        for m in modifiers {
            let e = accum.entry(m.stat).or_insert(Accum { add: 0.0, mul: 1.0 });
            match m.op {
                ModOp::Add => e.add += m.value,
                ModOp::Mul => e.mul *= m.value,
            }
        }
    };

    for node_id in &skills.nodes_taken {
        if let Some(node) = content.skill_node(*node_id) {
            apply(&node.modifiers);
        }
    }

    for (&item_id, &stacks) in &inventory.stacks {
        if let Some(item) = content.item(item_id) {
            let stacks = stacks.min(item.stacking.max_stack());
            let contribution = item.stacking.contribution(item.coef, stacks);
            for m in &item.modifiers {
                let e = accum.entry(m.stat).or_insert(Accum { add: 0.0, mul: 1.0 });
                match m.op {
                    ModOp::Add => e.add += m.value * contribution,
                    ModOp::Mul => e.mul *= 1.0 + contribution,
                }
            }
        }
    }

    let fold = |stat: StatKind, base_value: f32| -> f32 {
        match accum.get(&stat) {
            Some(a) => (base_value + a.add) * a.mul,
            None => base_value,
        }
    };

    BaseStats {
        max_health: fold(StatKind::MaxHealth, base.max_health),
        bullet_damage: fold(StatKind::BulletDamage, base.bullet_damage),
        fire_rate: fold(StatKind::FireRate, base.fire_rate),
        reload_time: fold(StatKind::ReloadTime, base.reload_time),
        move_speed: fold(StatKind::MoveSpeed, base.move_speed),
        last_round_multiplier: fold(StatKind::LastRoundMultiplier, base.last_round_multiplier),
    }
}

/// Write recomputed stats back into the ECS components the combat
/// systems read. HP is healed by the delta when max increases, and
/// clamped back down when max decreases; never compounded across calls.
pub fn write_stats_to_ecs(
    stats: &BaseStats,
    health: &mut Health,
    weapon: &mut Weapon,
    cylinder: &mut Cylinder,
    speed: &mut MoveSpeed,
) {
    let delta = stats.max_health - health.max;
    health.max = stats.max_health;
    if delta > 0.0 {
        health.current = (health.current + delta).min(health.max);
    } else {
        health.current = health.current.min(health.max);
    }

    weapon.bullet_damage = stats.bullet_damage;
    weapon.fire_rate = stats.fire_rate;
    weapon.last_round_multiplier = stats.last_round_multiplier;

    cylinder.reload_time = stats.reload_time;

    speed.0 = stats.move_speed;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_with(node: SkillNode, item: Option<ItemDef>) -> ContentTables {
        ContentTables { skill_tree: vec![node], items: item.into_iter().collect() }
    }

    #[test]
    fn xp_threshold_grants_level_and_pending_point() {
        let mut p = PlayerProgression::default();
        p.add_xp(100);
        assert_eq!(p.level, 1);
        assert_eq!(p.pending_points, 1);
        p.add_xp(50);
        assert_eq!(p.level, 1);
        assert_eq!(p.pending_points, 1);
    }

    #[test]
    fn tin_star_and_quick_reload_stack_additively_then_multiplicatively() {
        // Mirrors the spec's S6 scenario: tin_star (maxHP +2), quick_reload
        // (reloadTime x0.6), speed_loader item (x0.7) stacking with it.
        let tin_star = SkillNode {
            id: 1,
            branch: 0,
            tier: 0,
            modifiers: vec![StatModifier { stat: StatKind::MaxHealth, op: ModOp::Add, value: 2.0 }],
            effect_id: None,
            implemented: true,
        };
        let quick_reload = SkillNode {
            id: 2,
            branch: 1,
            tier: 0,
            modifiers: vec![StatModifier { stat: StatKind::ReloadTime, op: ModOp::Mul, value: 0.6 }],
            effect_id: None,
            implemented: true,
        };
        let speed_loader = ItemDef {
            id: 10,
            modifiers: vec![StatModifier { stat: StatKind::ReloadTime, op: ModOp::Mul, value: 1.0 }],
            stacking: StackingFn::Unique,
            coef: -0.3,
        };

        let content = ContentTables { skill_tree: vec![tin_star, quick_reload], items: vec![speed_loader] };
        let mut skills = SkillState::default();
        skills.nodes_taken.insert(1);
        skills.nodes_taken.insert(2);
        let mut inventory = Inventory::default();
        inventory.stacks.insert(10, 1);

        let base = BaseStats {
            max_health: 10.0,
            bullet_damage: 10.0,
            fire_rate: 3.0,
            reload_time: 1.0,
            move_speed: 200.0,
            last_round_multiplier: 1.5,
        };

        let result = recompute(&base, &content, &skills, &inventory);
        assert_eq!(result.max_health, 12.0);
        // reload_time: (1.0) * 0.6 (quick_reload) * (1.0 + (-0.3)) (item, unique stack=1)
        let expected = 1.0 * 0.6 * 0.7;
        assert!((result.reload_time - expected).abs() < 1e-5);
    }

    #[test]
    fn recompute_is_idempotent() {
        let node = SkillNode {
            id: 5,
            branch: 0,
            tier: 0,
            modifiers: vec![StatModifier { stat: StatKind::BulletDamage, op: ModOp::Add, value: 5.0 }],
            effect_id: None,
            implemented: true,
        };
        let content = content_with(node, None);
        let mut skills = SkillState::default();
        skills.nodes_taken.insert(5);
        let inventory = Inventory::default();
        let base = BaseStats {
            max_health: 10.0,
            bullet_damage: 10.0,
            fire_rate: 3.0,
            reload_time: 1.0,
            move_speed: 200.0,
            last_round_multiplier: 1.5,
        };

        let once = recompute(&base, &content, &skills, &inventory);
        let twice = recompute(&base, &content, &skills, &inventory);
        assert_eq!(once.bullet_damage, twice.bullet_damage);
    }

    #[test]
    fn skill_prerequisite_blocks_higher_tier() {
        let base_node = SkillNode { id: 1, branch: 0, tier: 0, modifiers: vec![], effect_id: None, implemented: true };
        let upper_node = SkillNode { id: 2, branch: 0, tier: 1, modifiers: vec![], effect_id: None, implemented: true };
        let content = ContentTables { skill_tree: vec![base_node, upper_node], items: vec![] };

        let mut progression = PlayerProgression { xp: 100, level: 1, pending_points: 2 };
        let mut skills = SkillState::default();

        assert!(!content.can_take(&progression, &skills, 2).unwrap());
        content.take_node(&mut progression, &mut skills, 1).unwrap();
        assert!(content.can_take(&progression, &skills, 2).unwrap());
        content.take_node(&mut progression, &mut skills, 2).unwrap();
        assert!(skills.nodes_taken.contains(&2));
    }

    #[test]
    fn unimplemented_node_is_never_takeable() {
        let node = SkillNode { id: 9, branch: 0, tier: 0, modifiers: vec![], effect_id: None, implemented: false };
        let content = content_with(node, None);
        let progression = PlayerProgression { xp: 100, level: 1, pending_points: 5 };
        let skills = SkillState::default();
        assert!(!content.can_take(&progression, &skills, 9).unwrap());
    }
}
