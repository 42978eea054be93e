use crate::battle::state::TurnRng;
use crate::entity::EntityId;
use std::collections::VecDeque;

/// Number of upcoming actors kept in the queue.
pub const QUEUE_LENGTH: usize = 3;

/// FIFO of upcoming actors. Holds ids only; rosters own the entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnQueue {
    slots: VecDeque<EntityId>,
}

impl TurnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(&self) -> Option<EntityId> {
        self.slots.front().copied()
    }

    pub fn pop(&mut self) -> Option<EntityId> {
        self.slots.pop_front()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.slots.contains(&id)
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.slots.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Pick the next actor: a 50/50 side choice, then a uniform pick within
    /// that side. Falls back to the other side when one is empty.
    pub fn pick(allies: &[EntityId], enemies: &[EntityId], rng: &mut TurnRng) -> Option<EntityId> {
        let side = match (allies.is_empty(), enemies.is_empty()) {
            (true, true) => return None,
            (true, false) => enemies,
            (false, true) => allies,
            (false, false) => {
                if rng.pick_index(2, "turn queue side") == 0 {
                    enemies
                } else {
                    allies
                }
            }
        };
        Some(side[rng.pick_index(side.len(), "turn queue entity")])
    }

    /// Top the queue up to `QUEUE_LENGTH` from the given living ids.
    pub fn refill(&mut self, allies: &[EntityId], enemies: &[EntityId], rng: &mut TurnRng) {
        while self.slots.len() < QUEUE_LENGTH {
            match Self::pick(allies, enemies, rng) {
                Some(id) => self.slots.push_back(id),
                None => break,
            }
        }
    }

    /// Rewrite every slot naming `removed` with a fresh pick. Duplicates of
    /// entities already queued are allowed.
    pub fn replace(
        &mut self,
        removed: EntityId,
        allies: &[EntityId],
        enemies: &[EntityId],
        rng: &mut TurnRng,
    ) {
        let mut index = 0;
        while index < self.slots.len() {
            if self.slots[index] != removed {
                index += 1;
                continue;
            }
            match Self::pick(allies, enemies, rng) {
                Some(replacement) => {
                    self.slots[index] = replacement;
                    index += 1;
                }
                None => {
                    self.slots.remove(index);
                }
            }
        }
    }
}
