use crate::ActionState;
use serde::{Deserialize, Serialize};

/// Number of animation frames for every action state of one archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationFrames {
    pub idle: u32,
    pub idle_blink: u32,
    pub walking: u32,
    pub attacking: u32,
    pub hurt: u32,
    pub dying: u32,
    pub healing: u32,
    pub healed: u32,
    pub special: u32,
}

impl AnimationFrames {
    pub fn count(&self, state: ActionState) -> u32 {
        match state {
            ActionState::Idle => self.idle,
            ActionState::IdleBlink => self.idle_blink,
            ActionState::Walking => self.walking,
            ActionState::Attacking => self.attacking,
            ActionState::Hurt => self.hurt,
            ActionState::Dying => self.dying,
            ActionState::Healing => self.healing,
            ActionState::Healed => self.healed,
            ActionState::Special => self.special,
        }
    }

    /// Returns the first state whose frame count is zero, if any.
    pub fn first_empty_state(&self) -> Option<ActionState> {
        [
            ActionState::Idle,
            ActionState::IdleBlink,
            ActionState::Walking,
            ActionState::Attacking,
            ActionState::Hurt,
            ActionState::Dying,
            ActionState::Healing,
            ActionState::Healed,
            ActionState::Special,
        ]
        .into_iter()
        .find(|state| self.count(*state) == 0)
    }
}

/// One row of the stat table, keyed by the exact archetype name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatEntry {
    pub archetype_name: String,
    pub base_attack: u32,
    pub base_defence: u32,
    pub base_max_health: u32,
    pub frames: AnimationFrames,
}
