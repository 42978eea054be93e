use crate::battle::turn_queue::TurnQueue;
use crate::config::BattleConfig;
use crate::entity::{CombatEntity, EntityId, FloatingIndicator};
use crate::errors::StatTableResult;
use crate::stat_table::StatTable;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schema::{ActionState, Archetype, EffectKind, Side};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    /// The opposing roster is empty.
    Victory,
    /// The ally roster is empty while opponents remain.
    Defeat,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Stunned,
    NoTarget,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Health changes
    Damage {
        target: EntityId,
        amount: u32,
        remaining_health: u32,
    },
    Heal {
        target: EntityId,
        amount: u32,
        new_health: u32,
        blocked: bool,
    },

    // Animation
    StateChanged {
        entity: EntityId,
        state: ActionState,
    },

    // Effects
    EffectApplied {
        target: EntityId,
        effect: EffectKind,
    },
    EffectConsumed {
        target: EntityId,
        effect: EffectKind,
    },

    // Action flow
    ActionSkipped {
        entity: EntityId,
        reason: SkipReason,
    },
    TurnOwnerChanged {
        owner: Side,
    },

    // Lifecycle
    EntityDied {
        entity: EntityId,
    },
    EntityRemoved {
        entity: EntityId,
        side: Side,
    },
    ScoreChanged {
        awarded: u32,
        total: u32,
    },
    BattleEnded {
        outcome: BattleOutcome,
        score: u32,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable string using battle context.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self, session: &BattleSession) -> Option<String> {
        match self {
            BattleEvent::Damage { target, amount, remaining_health } => Some(format!(
                "{} took {} damage ({} left)",
                Self::entity_name(session, *target),
                amount,
                remaining_health
            )),
            BattleEvent::Heal { target, blocked: true, .. } => Some(format!(
                "{}'s healing was blocked!",
                Self::entity_name(session, *target)
            )),
            BattleEvent::Heal { target, amount, new_health, .. } => Some(format!(
                "{} recovered {} health ({} now)",
                Self::entity_name(session, *target),
                amount,
                new_health
            )),
            BattleEvent::StateChanged { .. } => None, // Silent - animation detail
            BattleEvent::EffectApplied { target, effect } => Some(format!(
                "{} gained {}",
                Self::entity_name(session, *target),
                effect
            )),
            BattleEvent::EffectConsumed { .. } => None,
            BattleEvent::ActionSkipped { entity, reason } => {
                let name = Self::entity_name(session, *entity);
                match reason {
                    SkipReason::Stunned => Some(format!("{} is stunned and loses its turn!", name)),
                    SkipReason::NoTarget => Some(format!("{} has nothing to target.", name)),
                }
            }
            BattleEvent::TurnOwnerChanged { owner } => match owner {
                Side::Ally => Some("Your turn.".to_string()),
                Side::Enemy => None,
            },
            BattleEvent::EntityDied { entity } => {
                Some(format!("{} was defeated!", Self::entity_name(session, *entity)))
            }
            BattleEvent::EntityRemoved { .. } => None,
            BattleEvent::ScoreChanged { awarded, total } => {
                Some(format!("+{} score (total {})", awarded, total))
            }
            BattleEvent::BattleEnded { outcome, score } => match outcome {
                BattleOutcome::Victory => Some(format!("Victory! Score: {}", score)),
                BattleOutcome::Defeat => Some(format!("You lost! Final score: {}", score)),
            },
        }
    }

    fn entity_name(session: &BattleSession, id: EntityId) -> String {
        match session.entity(id) {
            Some(entity) => format!("{} {}", entity.archetype, id),
            None => format!("entity {}", id),
        }
    }
}

/// Receives battle notifications. Every method defaults to doing nothing, so a
/// renderer only overrides what it draws.
pub trait BattleObserver {
    fn on_damage(&mut self, _entity: EntityId, _amount: u32) {}
    fn on_heal(&mut self, _entity: EntityId, _amount: u32) {}
    fn on_state_changed(&mut self, _entity: EntityId, _state: ActionState) {}
    fn on_entity_died(&mut self, _entity: EntityId) {}
    fn on_score_changed(&mut self, _total: u32) {}
}

/// Event bus for collecting battle events between two drains.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Take every collected event, leaving the bus empty.
    pub fn drain(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Forward every collected event to the matching observer callback.
    pub fn dispatch(&self, observer: &mut dyn BattleObserver) {
        for event in &self.events {
            match event {
                BattleEvent::Damage { target, amount, .. } => observer.on_damage(*target, *amount),
                BattleEvent::Heal { target, amount, .. } => observer.on_heal(*target, *amount),
                BattleEvent::StateChanged { entity, state } => {
                    observer.on_state_changed(*entity, *state)
                }
                BattleEvent::EntityDied { entity } => observer.on_entity_died(*entity),
                BattleEvent::ScoreChanged { total, .. } => observer.on_score_changed(*total),
                _ => {}
            }
        }
    }

    /// Log all events using their formatted text (when available).
    pub fn log_formatted(&self, session: &BattleSession) {
        for event in &self.events {
            match event.format(session) {
                Some(formatted) => tracing::info!("{}", formatted),
                None => tracing::trace!("{:?}", event),
            }
        }
    }

    /// Print all events with a custom header message for debugging.
    pub fn print_debug_with_message(&self, message: &str) {
        println!("{}", message);
        for event in &self.events {
            println!("  {:?}", event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl std::fmt::Display for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum RngSource {
    Live(StdRng),
    Scripted {
        outcomes: Vec<u8>,
        index: usize,
        repeat: bool,
    },
}

/// Source of every random decision in a battle. Scripted sources replay
/// rolls in 1..=100 so tests can force outcomes.
#[derive(Debug, Clone)]
pub struct TurnRng {
    source: RngSource,
}

impl TurnRng {
    pub fn new_random() -> Self {
        Self { source: RngSource::Live(StdRng::from_os_rng()) }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { source: RngSource::Live(StdRng::seed_from_u64(seed)) }
    }

    /// Replays `outcomes` once and panics when they run out.
    pub fn new_for_test(outcomes: Vec<u8>) -> Self {
        Self {
            source: RngSource::Scripted { outcomes, index: 0, repeat: false },
        }
    }

    /// Cycles through `outcomes` forever.
    pub fn repeating(outcomes: Vec<u8>) -> Self {
        assert!(!outcomes.is_empty(), "repeating TurnRng needs at least one outcome");
        Self {
            source: RngSource::Scripted { outcomes, index: 0, repeat: true },
        }
    }

    /// A roll in 1..=100.
    pub fn next_outcome(&mut self, reason: &str) -> u8 {
        match &mut self.source {
            RngSource::Live(rng) => rng.random_range(1..=100),
            RngSource::Scripted { outcomes, index, repeat } => {
                if *index >= outcomes.len() {
                    if !*repeat {
                        panic!(
                            "TurnRng exhausted! Tried to get a value for: '{}'. Need more random values.",
                            reason
                        );
                    }
                    *index = 0;
                }
                let outcome = outcomes[*index];
                tracing::trace!("[RNG] Consumed {} for: {}", outcome, reason);
                *index += 1;
                outcome
            }
        }
    }

    /// True with `percent` percent probability.
    pub fn chance(&mut self, percent: u8, reason: &str) -> bool {
        self.next_outcome(reason) <= percent
    }

    /// A value in [0, 1).
    pub fn fraction(&mut self, reason: &str) -> f64 {
        if let RngSource::Live(rng) = &mut self.source {
            return rng.random::<f64>();
        }
        (self.next_outcome(reason) - 1) as f64 / 100.0
    }

    /// A uniform index below `len`. A single candidate is returned without
    /// consuming a roll.
    pub fn pick_index(&mut self, len: usize, reason: &str) -> usize {
        if len <= 1 {
            return 0;
        }
        if let RngSource::Live(rng) = &mut self.source {
            return rng.random_range(0..len);
        }
        (self.next_outcome(reason) as usize - 1) % len
    }
}

/// Read-only snapshot of one entity for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityView {
    pub id: EntityId,
    pub side: Side,
    pub archetype: Archetype,
    pub action_state: ActionState,
    pub current_frame_index: u32,
    pub current_health: u32,
    pub max_health: u32,
    pub effect_kinds: Vec<EffectKind>,
    pub damage_indicator: Option<FloatingIndicator>,
    pub heal_indicator: Option<FloatingIndicator>,
    pub placed: bool,
}

/// Everything one battle owns. Rosters own the entities; the turn queue and
/// pending targets refer to them by id only.
#[derive(Debug, Clone)]
pub struct BattleSession {
    pub allies: Vec<CombatEntity>,
    pub enemies: Vec<CombatEntity>,
    pub turn_queue: TurnQueue,
    pub turn_owner: Side,
    pub score: u32,
    pub difficulty_scale: f64,
    next_id: u32,
}

impl BattleSession {
    pub fn new(difficulty_scale: f64, score: u32) -> Self {
        Self {
            allies: Vec::new(),
            enemies: Vec::new(),
            turn_queue: TurnQueue::new(),
            turn_owner: Side::Ally,
            score,
            difficulty_scale,
            next_id: 1,
        }
    }

    /// Create an entity of `archetype` on its side's roster.
    pub fn spawn(
        &mut self,
        archetype: Archetype,
        health_percent: f64,
        table: &StatTable,
        config: &BattleConfig,
    ) -> StatTableResult<EntityId> {
        let id = EntityId(self.next_id);
        let entity =
            CombatEntity::new(id, archetype, table, self.difficulty_scale, health_percent, config)?;
        self.next_id += 1;
        self.roster_mut(archetype.side()).push(entity);
        Ok(id)
    }

    pub fn roster(&self, side: Side) -> &[CombatEntity] {
        match side {
            Side::Ally => &self.allies,
            Side::Enemy => &self.enemies,
        }
    }

    pub fn roster_mut(&mut self, side: Side) -> &mut Vec<CombatEntity> {
        match side {
            Side::Ally => &mut self.allies,
            Side::Enemy => &mut self.enemies,
        }
    }

    pub fn entities(&self) -> impl Iterator<Item = &CombatEntity> {
        self.allies.iter().chain(self.enemies.iter())
    }

    pub fn entity(&self, id: EntityId) -> Option<&CombatEntity> {
        self.entities().find(|entity| entity.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut CombatEntity> {
        self.allies
            .iter_mut()
            .chain(self.enemies.iter_mut())
            .find(|entity| entity.id == id)
    }

    /// Ids of the entities on `side` that can still act or be targeted.
    pub fn living_ids(&self, side: Side) -> Vec<EntityId> {
        self.roster(side)
            .iter()
            .filter(|entity| !entity.is_dead())
            .map(|entity| entity.id)
            .collect()
    }

    /// The admission gate: true only when every entity is idle.
    pub fn everyone_idle(&self) -> bool {
        self.entities().all(|entity| entity.is_idle())
    }

    pub fn anyone_walking(&self) -> bool {
        self.entities()
            .any(|entity| entity.action_state() == ActionState::Walking)
    }

    /// Top up the turn queue from the living entities of both rosters.
    pub fn refill_turn_queue(&mut self, rng: &mut TurnRng) {
        let allies = self.living_ids(Side::Ally);
        let enemies = self.living_ids(Side::Enemy);
        self.turn_queue.refill(&allies, &enemies, rng);
    }

    /// Rewrite every queue slot that still names `removed`.
    pub fn replace_in_turn_queue(&mut self, removed: EntityId, rng: &mut TurnRng) {
        let allies = self.living_ids(Side::Ally);
        let enemies = self.living_ids(Side::Enemy);
        self.turn_queue.replace(removed, &allies, &enemies, rng);
    }

    /// Side owning the head of the turn queue, if any.
    pub fn head_side(&self) -> Option<Side> {
        let head = self.turn_queue.head()?;
        self.entity(head).map(|entity| entity.side)
    }

    pub fn views(&self, side: Side) -> Vec<EntityView> {
        self.roster(side).iter().map(CombatEntity::view).collect()
    }
}
