//! Saved battles and the leaderboard.
//!
//! A saved battle is one RON document. The leaderboard is append-only JSON
//! lines, one entry per finished run.

use crate::errors::{PersistenceError, PersistenceResult};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Placeholder name used to pad short leaderboards.
pub const EMPTY_SLOT_NAME: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEntity {
    /// Exact archetype name, as in the stat table.
    pub archetype: String,
    pub health_percent: f64,
}

/// Everything needed to rebuild a battle. The turn queue is not stored; it is
/// reseeded when the battle is restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedBattle {
    pub score: u32,
    pub difficulty_scale: f64,
    pub allies: Vec<SavedEntity>,
    pub enemies: Vec<SavedEntity>,
}

impl SavedBattle {
    pub fn to_ron_string(&self) -> PersistenceResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| PersistenceError::Format(e.to_string()))
    }

    pub fn from_ron_str(content: &str) -> PersistenceResult<Self> {
        let saved: SavedBattle =
            ron::from_str(content).map_err(|e| PersistenceError::Format(e.to_string()))?;
        if saved.difficulty_scale.is_nan() || saved.difficulty_scale <= 0.0 {
            return Err(PersistenceError::Format(format!(
                "difficulty scale must be positive, got {}",
                saved.difficulty_scale
            )));
        }
        Ok(saved)
    }

    pub fn save(&self, path: &Path) -> PersistenceResult<()> {
        fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> PersistenceResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_name: String,
    pub score: u32,
}

impl LeaderboardEntry {
    pub fn new(user_name: impl Into<String>, score: u32) -> Self {
        Self { user_name: user_name.into(), score }
    }
}

/// All recorded runs, in the order they were appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a leaderboard file. A missing file is an empty leaderboard.
    pub fn load(path: &Path) -> PersistenceResult<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        Self::from_json_lines(&content)
    }

    pub fn from_json_lines(content: &str) -> PersistenceResult<Self> {
        let entries = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| PersistenceError::Format(e.to_string()))
            })
            .collect::<PersistenceResult<Vec<LeaderboardEntry>>>()?;
        Ok(Self { entries })
    }

    /// Append one entry to the file at `path`, creating it if needed.
    pub fn append(path: &Path, entry: &LeaderboardEntry) -> PersistenceResult<()> {
        let line = serde_json::to_string(entry).map_err(|e| PersistenceError::Format(e.to_string()))?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    pub fn record(&mut self, entry: LeaderboardEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Entries by score, highest first. Equal scores keep insertion order.
    pub fn ranked(&self) -> Vec<LeaderboardEntry> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    /// The best `n` entries, padded with empty slots.
    pub fn top(&self, n: usize) -> Vec<LeaderboardEntry> {
        let mut top: Vec<LeaderboardEntry> = self.ranked().into_iter().take(n).collect();
        while top.len() < n {
            top.push(LeaderboardEntry::new(EMPTY_SLOT_NAME, 0));
        }
        top
    }
}
