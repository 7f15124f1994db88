//! Per-type enemy behavior tables. Polymorphism across enemy types is a
//! tagged-variant discriminator (`EnemyKind`), not inheritance, so every
//! type-specific parameter lives here indexed by the enum rather than on
//! a virtual method.

use crate::components::EnemyKind;

#[derive(Debug, Clone, Copy)]
pub struct EnemyTypeStats {
    pub max_health: f32,
    pub move_speed: f32,
    pub collider_radius: f32,
    pub aggro_range: f32,
    pub attack_range: f32,
    pub telegraph_duration: f32,
    pub recovery_duration: f32,
    pub cooldown_duration: f32,
    pub melee_damage: f32,
    pub preferred_range: f32,
    pub is_ranged: bool,
    pub budget_cost: u8,
    pub los_required: bool,
}

pub fn stats_for(kind: EnemyKind) -> EnemyTypeStats {
    match kind {
        EnemyKind::Swarmer => EnemyTypeStats {
            max_health: 18.0,
            move_speed: 140.0,
            collider_radius: 10.0,
            aggro_range: 320.0,
            attack_range: 28.0,
            telegraph_duration: 0.15,
            recovery_duration: 0.2,
            cooldown_duration: 0.3,
            melee_damage: 6.0,
            preferred_range: 0.0,
            is_ranged: false,
            budget_cost: 1,
            los_required: false,
        },
        EnemyKind::Ranged => EnemyTypeStats {
            max_health: 14.0,
            move_speed: 90.0,
            collider_radius: 10.0,
            aggro_range: 420.0,
            attack_range: 260.0,
            telegraph_duration: 0.35,
            recovery_duration: 0.3,
            cooldown_duration: 0.9,
            melee_damage: 8.0,
            preferred_range: 220.0,
            is_ranged: true,
            budget_cost: 2,
            los_required: true,
        },
        EnemyKind::Charger => EnemyTypeStats {
            max_health: 32.0,
            move_speed: 260.0,
            collider_radius: 13.0,
            aggro_range: 360.0,
            attack_range: 40.0,
            telegraph_duration: 0.5,
            recovery_duration: 0.6,
            cooldown_duration: 0.5,
            melee_damage: 16.0,
            preferred_range: 0.0,
            is_ranged: false,
            budget_cost: 3,
            los_required: false,
        },
        EnemyKind::Dynamite => EnemyTypeStats {
            max_health: 20.0,
            move_speed: 110.0,
            collider_radius: 11.0,
            aggro_range: 340.0,
            attack_range: 180.0,
            telegraph_duration: 0.8,
            recovery_duration: 0.4,
            cooldown_duration: 1.2,
            melee_damage: 24.0,
            preferred_range: 160.0,
            is_ranged: true,
            budget_cost: 3,
            los_required: true,
        },
        EnemyKind::Boss => EnemyTypeStats {
            max_health: 900.0,
            move_speed: 120.0,
            collider_radius: 28.0,
            aggro_range: 700.0,
            attack_range: 90.0,
            telegraph_duration: 0.6,
            recovery_duration: 0.5,
            cooldown_duration: 0.4,
            melee_damage: 28.0,
            preferred_range: 0.0,
            is_ranged: false,
            budget_cost: 0,
            los_required: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranged_types_require_line_of_sight() {
        assert!(stats_for(EnemyKind::Ranged).los_required);
        assert!(!stats_for(EnemyKind::Swarmer).los_required);
    }

    #[test]
    fn boss_has_no_budget_cost_since_it_is_a_threat() {
        assert_eq!(stats_for(EnemyKind::Boss).budget_cost, 0);
    }
}
