//! Buff/debuff bookkeeping for a single entity.

use crate::entity::EntityId;
use schema::EffectKind;
use serde::{Deserialize, Serialize};

/// One buff or debuff attached to an entity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Effect {
    pub kind: EffectKind,
    pub owner: EntityId,
    /// Plain data. No rule in the engine sets it and consumption ignores it.
    pub permanent: bool,
}

/// Ordered list of active effects. Insertion order is display and
/// consumption order; the same kind may be stacked.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EffectSet {
    effects: Vec<Effect>,
}

impl EffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn has(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|effect| effect.kind == kind)
    }

    pub fn count(&self, kind: EffectKind) -> usize {
        self.effects.iter().filter(|effect| effect.kind == kind).count()
    }

    /// Consume the first effect of `kind`. Returns whether one was present,
    /// i.e. whether its modifier applies to the current event.
    pub fn consume_first(&mut self, kind: EffectKind) -> bool {
        let Some(index) = self.effects.iter().position(|effect| effect.kind == kind) else {
            return false;
        };
        self.effects.remove(index);
        true
    }

    /// Remove every effect.
    pub fn clear_all(&mut self) {
        self.effects.clear();
    }

    pub fn kinds(&self) -> Vec<EffectKind> {
        self.effects.iter().map(|effect| effect.kind).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
