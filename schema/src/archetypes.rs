use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::EffectKind;

/// Which roster an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Side {
    /// The player's party.
    Ally,
    /// The opposing group.
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Ally => Side::Enemy,
            Side::Enemy => Side::Ally,
        }
    }
}

/// The fixed combat class of an entity.
///
/// The string form is the exact key used by the stat table, so `fire` and
/// `Golem` are spelled the way the data files spell them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum Archetype {
    #[serde(rename = "fire")]
    #[strum(serialize = "fire")]
    Fire,
    #[serde(rename = "ice")]
    #[strum(serialize = "ice")]
    Ice,
    #[serde(rename = "magic")]
    #[strum(serialize = "magic")]
    Magic,
    Golem,
    Wraith,
    Satyr,
}

impl Archetype {
    /// The exact stat-table key for this archetype.
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn side(self) -> Side {
        match self {
            Archetype::Fire | Archetype::Ice | Archetype::Magic => Side::Ally,
            Archetype::Golem | Archetype::Wraith | Archetype::Satyr => Side::Enemy,
        }
    }

    /// All archetypes that can appear on the given side, in declaration order.
    pub fn for_side(side: Side) -> Vec<Archetype> {
        Archetype::iter().filter(|a| a.side() == side).collect()
    }

    /// Debuff a normal attack may leave on its target.
    pub fn on_hit_debuff(self) -> Option<EffectKind> {
        match self {
            Archetype::Fire => Some(EffectKind::HealBreak),
            Archetype::Ice => Some(EffectKind::Stun),
            _ => None,
        }
    }

    /// Opposing-side archetypes have no special ability.
    pub fn has_special(self) -> bool {
        self.side() == Side::Ally
    }
}
