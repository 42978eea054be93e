use crate::battle::controller::BattleController;
use crate::battle::state::{BattleSession, EventBus, TurnRng};
use crate::config::BattleConfig;
use crate::entity::EntityId;
use crate::errors::BattleResult;
use crate::stat_table::{default_stat_table, StatTable};
use schema::{Archetype, EffectKind};

/// A builder for placing test entities with common defaults.
///
/// # Example
/// ```ignore
/// let session = create_test_session(
///     vec![TestEntityBuilder::new(Archetype::Fire).with_attack(20)],
///     vec![TestEntityBuilder::new(Archetype::Golem).with_defence(5)],
/// );
/// ```
pub struct TestEntityBuilder {
    archetype: Archetype,
    health_percent: f64,
    current_health: Option<u32>,
    max_health: Option<u32>,
    attack_power: Option<u32>,
    defence: Option<u32>,
    effects: Vec<EffectKind>,
    walking: bool,
}

impl TestEntityBuilder {
    /// Creates a new builder for a placed, full-health entity at difficulty 1.
    pub fn new(archetype: Archetype) -> Self {
        Self {
            archetype,
            health_percent: 100.0,
            current_health: None,
            max_health: None,
            attack_power: None,
            defence: None,
            effects: Vec::new(),
            walking: false,
        }
    }

    pub fn with_health_percent(mut self, percent: f64) -> Self {
        self.health_percent = percent;
        self
    }

    /// Sets current health directly, after any max health override.
    pub fn with_health(mut self, health: u32) -> Self {
        self.current_health = Some(health);
        self
    }

    /// Sets max health; current health is refilled to it unless set too.
    pub fn with_max_health(mut self, max_health: u32) -> Self {
        self.max_health = Some(max_health);
        self
    }

    pub fn with_attack(mut self, attack_power: u32) -> Self {
        self.attack_power = Some(attack_power);
        self
    }

    pub fn with_defence(mut self, defence: u32) -> Self {
        self.defence = Some(defence);
        self
    }

    pub fn with_effect(mut self, kind: EffectKind) -> Self {
        self.effects.push(kind);
        self
    }

    /// Leaves the entity in its walk-in state.
    pub fn walking(mut self) -> Self {
        self.walking = true;
        self
    }

    /// Spawns the entity into `session` and applies the overrides.
    pub fn spawn_into(self, session: &mut BattleSession, config: &BattleConfig) -> EntityId {
        let table = test_table();
        let id = match session.spawn(self.archetype, self.health_percent, table, config) {
            Ok(id) => id,
            Err(err) => panic!("Failed to spawn {}: {}", self.archetype, err),
        };
        let Some(entity) = session.entity_mut(id) else {
            panic!("Spawned entity {} is missing", id);
        };
        if let Some(max_health) = self.max_health {
            entity.max_health = max_health;
            entity.set_health(max_health);
        }
        if let Some(health) = self.current_health {
            entity.set_health(health);
        }
        if let Some(attack_power) = self.attack_power {
            entity.attack_power = attack_power;
        }
        if let Some(defence) = self.defence {
            entity.defence = defence;
        }
        let mut events = EventBus::new();
        for kind in self.effects {
            entity.add_effect(kind, &mut events);
        }
        if !self.walking {
            entity.skip_walk_in();
        }
        id
    }
}

pub fn test_table() -> &'static StatTable {
    match default_stat_table() {
        Ok(table) => table,
        Err(err) => panic!("Failed to load the built-in stat table: {}", err),
    }
}

/// Creates a difficulty-1 session with the given rosters, in order. Ids are
/// assigned allies first, starting at 1.
pub fn create_test_session(
    allies: Vec<TestEntityBuilder>,
    enemies: Vec<TestEntityBuilder>,
) -> BattleSession {
    let config = BattleConfig::default();
    let mut session = BattleSession::new(1.0, 0);
    for builder in allies.into_iter().chain(enemies) {
        builder.spawn_into(&mut session, &config);
    }
    session
}

/// Wraps a test session in a controller. The queue is seeded from `rng`.
pub fn create_test_controller(session: BattleSession, rng: TurnRng) -> BattleController {
    BattleController::from_session(session, BattleConfig::default(), test_table().clone(), rng)
}

/// Creates a `TurnRng` that cycles a mid-range roll forever.
/// Useful for tests where the specific RNG outcome is not important, preventing panics from exhaustion.
pub fn predictable_rng() -> TurnRng {
    TurnRng::repeating(vec![50])
}

/// Helper function to assert that a Result is Ok and return the value.
/// Provides clear error messages in tests when functions unexpectedly fail.
pub fn assert_ok<T>(result: BattleResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected Ok but got error: {}", err),
    }
}
