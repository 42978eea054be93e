//! A module for defining decision behaviors for the entity at the head of
//! the turn queue.

use crate::battle::resolver::lowest_health_ratio;
use crate::battle::state::{BattleSession, TurnRng};
use crate::config::BattleConfig;
use crate::entity::EntityId;
use serde::{Deserialize, Serialize};

/// An action an entity may start on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleAction {
    Attack,
    Heal,
    Special,
}

/// A trait for any system that can decide on a battle action.
pub trait Behavior {
    /// Inspects the session and decides the next action for `actor`.
    fn decide_action(
        &self,
        actor: EntityId,
        session: &BattleSession,
        rng: &mut TurnRng,
        config: &BattleConfig,
    ) -> BattleAction;
}

/// The opposing side's policy: attack, unless a teammate is badly hurt, in
/// which case heal with a chance growing with the wound and the actor's
/// defence.
#[derive(Debug, Default, Clone, Copy)]
pub struct HealOrAttackAI;

impl HealOrAttackAI {
    pub fn new() -> Self {
        Self
    }

    /// Chance in [0, ∞) that the actor heals instead of attacking.
    pub fn heal_chance(min_ratio: f64, defence: u32) -> f64 {
        (1.0 - min_ratio) + defence as f64 / 10.0
    }
}

impl Behavior for HealOrAttackAI {
    fn decide_action(
        &self,
        actor: EntityId,
        session: &BattleSession,
        rng: &mut TurnRng,
        config: &BattleConfig,
    ) -> BattleAction {
        let Some(entity) = session.entity(actor) else {
            return BattleAction::Attack;
        };
        let min_ratio = lowest_health_ratio(session, entity.side, actor)
            .and_then(|id| session.entity(id))
            .map_or(1.0, |weakest| weakest.health_ratio());

        if min_ratio < config.heal_consideration_ratio {
            let chance = Self::heal_chance(min_ratio, entity.defence);
            if chance > rng.fraction("heal or attack") {
                return BattleAction::Heal;
            }
        }
        BattleAction::Attack
    }
}

/// Plays the ally side in headless runs: heal the party when someone is low,
/// otherwise mostly attack with the occasional special.
#[derive(Debug, Clone, Copy)]
pub struct AutoPilot {
    pub heal_below_ratio: f64,
    pub special_percent: u8,
}

impl Default for AutoPilot {
    fn default() -> Self {
        Self { heal_below_ratio: 0.4, special_percent: 25 }
    }
}

impl Behavior for AutoPilot {
    fn decide_action(
        &self,
        actor: EntityId,
        session: &BattleSession,
        rng: &mut TurnRng,
        _config: &BattleConfig,
    ) -> BattleAction {
        let Some(entity) = session.entity(actor) else {
            return BattleAction::Attack;
        };
        let wounded = lowest_health_ratio(session, entity.side, actor)
            .and_then(|id| session.entity(id))
            .is_some_and(|weakest| weakest.health_ratio() < self.heal_below_ratio);
        if wounded {
            BattleAction::Heal
        } else if entity.archetype.has_special() && rng.chance(self.special_percent, "autopilot special") {
            BattleAction::Special
        } else {
            BattleAction::Attack
        }
    }
}
