//! Tunables that are not simulation invariants: fixed timestep, spatial
//! hash cell size, i-frame durations, wave pacing, economy prices. Kept as
//! a `Resource` the same way the teacher's performance tuning knobs were
//! a resource, so content can be swapped per-deployment without touching
//! system code.

use bevy_ecs::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct SimConfig {
    pub fixed_timestep: f32,
    pub spatial_cell_size: f32,
    pub roll_duration: f32,
    pub roll_speed: f32,
    pub iframe_duration: f32,
    pub telegraph_duration_default: f32,
    pub recovery_duration_default: f32,
    pub cooldown_duration_default: f32,
    pub leash_multiplier: f32,
    pub lava_dps: f32,
    pub salesman_interact_radius: f32,
    pub stash_interact_radius: f32,
    pub interact_hold_ticks: u32,
    pub shovel_base_price: u32,
    pub shovel_price_step_per_stage: u32,
    pub max_shovels: u32,
    pub threat_clear_ratio: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            spatial_cell_size: 32.0,
            roll_duration: 0.35,
            roll_speed: 520.0,
            iframe_duration: 0.5,
            telegraph_duration_default: 0.4,
            recovery_duration_default: 0.3,
            cooldown_duration_default: 0.6,
            leash_multiplier: 2.0,
            lava_dps: 10.0,
            salesman_interact_radius: 48.0,
            stash_interact_radius: 32.0,
            interact_hold_ticks: 30,
            shovel_base_price: 25,
            shovel_price_step_per_stage: 10,
            max_shovels: 9,
            threat_clear_ratio: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sixty_hz_timestep() {
        let cfg = SimConfig::default();
        assert!((cfg.fixed_timestep - 1.0 / 60.0).abs() < 1e-6);
    }
}
