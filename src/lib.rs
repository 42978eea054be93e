//! Wizard Skirmish Battle Engine
//!
//! A turn-based battle simulator: a party of wizards against waves of
//! monsters, driven by a turn queue, temporary effects and per-entity
//! animation state machines. The engine knows nothing about drawing; it
//! exposes entity snapshots and battle events for a renderer to consume.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod config;
pub mod effects;
pub mod entity;
pub mod errors;
pub mod persistence;
pub mod stat_table;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{ActionState, AnimationFrames, Archetype, EffectKind, Side, StatEntry};

// --- From this crate's modules (`src/`) ---

// Battle orchestration and state.
pub use battle::ai::{AutoPilot, BattleAction, Behavior, HealOrAttackAI};
pub use battle::controller::BattleController;
pub use battle::state::{
    BattleEvent, BattleObserver, BattleOutcome, BattleSession, EntityView, EventBus, TurnRng,
};

// Core runtime types for a battle.
pub use config::BattleConfig;
pub use effects::{Effect, EffectSet};
pub use entity::{CombatEntity, EntityId};
pub use persistence::{Leaderboard, LeaderboardEntry, SavedBattle, SavedEntity};
pub use stat_table::{default_stat_table, StatTable};

// Crate-specific error and result types.
pub use errors::{
    BattleEngineError, BattleResult, BattleStateError, PersistenceError, PersistenceResult,
    StatTableError, StatTableResult,
};
