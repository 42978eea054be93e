use crate::config::BattleConfig;
use std::time::Duration;

/// Which rosters animate on a given scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickPlan {
    pub advance_enemies: bool,
    pub advance_allies: bool,
}

/// Fixed-step scheduler. Wall-clock time accumulates until it exceeds the
/// speed-scaled threshold, then exactly one tick fires.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    since_last_tick: Duration,
    tick: u32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_count(&self) -> u32 {
        self.tick
    }

    /// Add elapsed time. Returns true when a tick is due; the remainder is
    /// discarded, so a long frame still yields a single tick.
    pub fn accumulate(&mut self, delta: Duration, config: &BattleConfig) -> bool {
        self.since_last_tick += delta;
        if self.since_last_tick.as_secs_f64() > config.tick_threshold_secs() {
            self.since_last_tick = Duration::ZERO;
            true
        } else {
            false
        }
    }

    /// Count one tick and report which sides animate on it.
    pub fn next_tick(&mut self, config: &BattleConfig) -> TickPlan {
        self.tick += 1;
        let plan = TickPlan {
            advance_enemies: self.tick % config.enemy_tick_modulus == 0,
            advance_allies: self.tick % config.ally_tick_modulus == 0,
        };
        if self.tick > config.tick_wrap {
            self.tick = 0;
        }
        plan
    }
}
