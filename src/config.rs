//! Tunable timings and rules for a battle.

use crate::errors::{PersistenceError, PersistenceResult};
use schema::{Archetype, Side};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Speed multipliers the speed toggle cycles through.
pub const SPEED_STEPS: [u32; 3] = [1, 2, 4];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Wall-clock seconds per scheduler tick at speed x1.
    pub tick_interval_secs: f64,
    pub speed_multiplier: u32,
    pub enemy_tick_modulus: u32,
    pub ally_tick_modulus: u32,
    /// The scheduler tick counter resets once it exceeds this value.
    pub tick_wrap: u32,
    /// Lifetime of floating damage/heal/score indicators, in animation ticks.
    pub indicator_ticks: u32,
    pub walk_in_distance: u32,
    pub ally_stride: u32,
    pub enemy_stride: u32,
    pub on_hit_debuff_percent: u8,
    pub idle_blink_one_in: usize,
    pub heal_consideration_ratio: f64,
    pub score_per_kill: u32,
    pub difficulty_growth: f64,
    pub ally_lineup: Vec<Archetype>,
    pub enemy_count: usize,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 0.01,
            speed_multiplier: 1,
            enemy_tick_modulus: 7,
            ally_tick_modulus: 10,
            tick_wrap: 70,
            indicator_ticks: 15,
            walk_in_distance: 400,
            ally_stride: 10,
            enemy_stride: 7,
            on_hit_debuff_percent: 80,
            idle_blink_one_in: 3,
            heal_consideration_ratio: 0.6,
            score_per_kill: 20,
            difficulty_growth: 1.2,
            ally_lineup: vec![Archetype::Magic, Archetype::Ice, Archetype::Fire],
            enemy_count: 3,
        }
    }
}

impl BattleConfig {
    /// Load a config from a RON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> PersistenceResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    pub fn from_ron_str(content: &str) -> PersistenceResult<Self> {
        let config: BattleConfig =
            ron::from_str(content).map_err(|e| PersistenceError::Format(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> PersistenceResult<()> {
        if self.enemy_tick_modulus == 0 || self.ally_tick_modulus == 0 {
            return Err(PersistenceError::Format(
                "tick moduli must be positive".to_string(),
            ));
        }
        // Both sides must get an animation tick before the counter wraps.
        let slowest = self.enemy_tick_modulus.max(self.ally_tick_modulus);
        if self.tick_wrap < slowest {
            return Err(PersistenceError::Format(format!(
                "tick_wrap {} is below tick modulus {}",
                self.tick_wrap, slowest
            )));
        }
        if self.ally_stride == 0 || self.enemy_stride == 0 {
            return Err(PersistenceError::Format(
                "walk strides must be positive".to_string(),
            ));
        }
        if self.indicator_ticks == 0 {
            return Err(PersistenceError::Format(
                "indicator_ticks must be positive".to_string(),
            ));
        }
        if !SPEED_STEPS.contains(&self.speed_multiplier) {
            return Err(PersistenceError::Format(format!(
                "speed multiplier must be one of {:?}",
                SPEED_STEPS
            )));
        }
        if self.idle_blink_one_in == 0 {
            return Err(PersistenceError::Format(
                "idle_blink_one_in must be positive".to_string(),
            ));
        }
        if let Some(misplaced) = self.ally_lineup.iter().find(|a| a.side() != Side::Ally) {
            return Err(PersistenceError::Format(format!(
                "{} cannot join the ally lineup",
                misplaced
            )));
        }
        Ok(())
    }

    /// Cycle the speed multiplier x1 -> x2 -> x4 -> x1.
    pub fn toggle_speed(&mut self) -> u32 {
        self.speed_multiplier *= 2;
        if self.speed_multiplier > SPEED_STEPS[SPEED_STEPS.len() - 1] {
            self.speed_multiplier = SPEED_STEPS[0];
        }
        self.speed_multiplier
    }

    /// Wall-clock threshold a tick must exceed at the current speed.
    pub fn tick_threshold_secs(&self) -> f64 {
        self.tick_interval_secs / self.speed_multiplier as f64
    }
}
