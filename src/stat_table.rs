use crate::errors::{StatTableError, StatTableResult};
use schema::{Archetype, Side, StatEntry};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

// Built-in table, parsed once on first use
static DEFAULT_TABLE: LazyLock<StatTableResult<StatTable>> =
    LazyLock::new(|| StatTable::from_ron_str(include_str!("../data/archetypes.ron")));

/// Get the built-in stat table.
pub fn default_stat_table() -> StatTableResult<&'static StatTable> {
    DEFAULT_TABLE.as_ref().map_err(|e| e.clone())
}

/// Stats of one entity after difficulty scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledStats {
    pub attack_power: u32,
    pub defence: u32,
    pub max_health: u32,
}

/// Immutable lookup of base stats per archetype name.
#[derive(Debug, Clone)]
pub struct StatTable {
    entries: HashMap<String, StatEntry>,
}

impl StatTable {
    /// Build a table from records. Names must be unique and every stat and
    /// frame count must be positive.
    pub fn from_entries(records: Vec<StatEntry>) -> StatTableResult<Self> {
        let mut entries = HashMap::with_capacity(records.len());
        for record in records {
            validate_entry(&record)?;
            if entries.contains_key(&record.archetype_name) {
                return Err(StatTableError::DuplicateArchetype(record.archetype_name));
            }
            entries.insert(record.archetype_name.clone(), record);
        }
        Ok(Self { entries })
    }

    pub fn from_ron_str(content: &str) -> StatTableResult<Self> {
        let records: Vec<StatEntry> =
            ron::from_str(content).map_err(|e| StatTableError::Malformed(e.to_string()))?;
        Self::from_entries(records)
    }

    /// Load a stat table from a RON file on disk.
    pub fn load(path: &Path) -> StatTableResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StatTableError::Malformed(format!("{}: {}", path.display(), e))
        })?;
        Self::from_ron_str(&content)
    }

    pub fn lookup(&self, archetype: Archetype) -> StatTableResult<&StatEntry> {
        self.lookup_name(archetype.name())
    }

    /// Exact-key lookup. Names differing only in case do not match.
    pub fn lookup_name(&self, name: &str) -> StatTableResult<&StatEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| StatTableError::UnknownArchetype(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_entry(entry: &StatEntry) -> StatTableResult<()> {
    let invalid = |reason: &str| StatTableError::InvalidStats {
        archetype: entry.archetype_name.clone(),
        reason: reason.to_string(),
    };
    if entry.base_defence == 0 {
        return Err(invalid("defence must be positive"));
    }
    if entry.base_max_health == 0 {
        return Err(invalid("max health must be positive"));
    }
    if let Some(state) = entry.frames.first_empty_state() {
        return Err(invalid(&format!("no frames for {}", state)));
    }
    Ok(())
}

/// Apply the difficulty factor: the ally side gets weaker and the opposing
/// side stronger as difficulty grows. Each stat stays at least 1.
pub fn scaled_stats(entry: &StatEntry, side: Side, difficulty_scale: f64) -> ScaledStats {
    let scale = |base: u32| -> u32 {
        let value = match side {
            Side::Ally => base as f64 / difficulty_scale,
            Side::Enemy => base as f64 * difficulty_scale,
        };
        (value as u32).max(1)
    };
    ScaledStats {
        attack_power: scale(entry.base_attack),
        defence: scale(entry.base_defence),
        max_health: scale(entry.base_max_health),
    }
}

/// Starting health for a max health and a percentage, truncated. The small
/// bias keeps a saved percentage from losing a point of health on reload.
pub fn health_from_percent(max_health: u32, percent: f64) -> u32 {
    let health = (max_health as f64 * (percent / 100.0) + 1e-9) as u32;
    health.min(max_health)
}
