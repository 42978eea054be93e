use schema::Side;
use thiserror::Error;

/// Main error type for the wizard skirmish battle engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleEngineError {
    /// Error related to stat table lookup or loading
    #[error("Stat table error: {0}")]
    StatTable(#[from] StatTableError),
    /// Error related to invalid battle state
    #[error("Battle state error: {0}")]
    BattleState(#[from] BattleStateError),
    /// Error reading or writing saved battles and leaderboards
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Errors related to the stat table. These are configuration errors and are
/// fatal at entity-creation time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatTableError {
    /// No record matches the archetype name exactly
    #[error("Unknown archetype: {0}")]
    UnknownArchetype(String),
    /// Two records share the same archetype name
    #[error("Duplicate archetype in stat table: {0}")]
    DuplicateArchetype(String),
    /// A record carries values the engine cannot use
    #[error("Invalid stats for {archetype}: {reason}")]
    InvalidStats { archetype: String, reason: String },
    /// Table source could not be read or parsed
    #[error("Malformed stat table: {0}")]
    Malformed(String),
}

/// Errors related to battle state validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleStateError {
    /// Some entity has not finished walking in yet
    #[error("Entities are still walking in")]
    EntitiesStillWalking,
    /// A battle needs at least one entity per side
    #[error("No entities on the {0} side")]
    EmptyRoster(Side),
    /// The requested operation needs a won battle
    #[error("Battle is not won")]
    BattleNotWon,
}

/// Errors related to saved battles and the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("I/O failure: {0}")]
    Io(String),
    #[error("Bad format: {0}")]
    Format(String),
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::Io(err.to_string())
    }
}

/// Type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;

/// Type alias for Results using StatTableError
pub type StatTableResult<T> = Result<T, StatTableError>;

/// Type alias for Results using PersistenceError
pub type PersistenceResult<T> = Result<T, PersistenceError>;
