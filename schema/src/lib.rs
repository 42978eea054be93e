// Wizard Skirmish Schema - Shared type definitions
// This crate contains the plain data enums and records shared between the
// battle engine and its data files, so the RON tables and the engine agree
// on names and shapes.

// Re-export the main types
pub use archetypes::*;
pub use battle_data::*;
pub use stat_data::*;

pub mod archetypes;
pub mod battle_data;
pub mod stat_data;
