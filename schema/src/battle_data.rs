use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of temporary buffs and debuffs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Copy)]
pub enum EffectKind {
    AttackBuff,
    AttackBreak,
    DefenceBuff,
    DefenceBreak,
    HealBreak,
    Stun,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EffectKind::AttackBuff => "attack buff",
            EffectKind::AttackBreak => "attack break",
            EffectKind::DefenceBuff => "defence buff",
            EffectKind::DefenceBreak => "defence break",
            EffectKind::HealBreak => "heal break",
            EffectKind::Stun => "stun",
        };
        write!(f, "{}", name)
    }
}

/// Phase of an entity's animation/behaviour state machine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Copy)]
pub enum ActionState {
    Idle,
    IdleBlink,
    Walking,
    Attacking,
    Hurt,
    Dying,
    Healing,
    Healed,
    Special,
}

impl ActionState {
    /// `Idle` and `IdleBlink` both count as idle for the admission gate.
    pub fn is_idle_family(self) -> bool {
        matches!(self, ActionState::Idle | ActionState::IdleBlink)
    }
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionState::IdleBlink => write!(f, "Idle Blink"),
            other => write!(f, "{:?}", other),
        }
    }
}
