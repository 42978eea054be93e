use crate::battle::ai::{BattleAction, Behavior, HealOrAttackAI};
use crate::battle::clock::FrameClock;
use crate::battle::resolver;
use crate::battle::state::{
    BattleEvent, BattleObserver, BattleOutcome, BattleSession, EntityView, EventBus, TurnRng,
};
use crate::config::BattleConfig;
use crate::entity::{AnimationCompletion, EntityId, FloatingIndicator, IndicatorTone};
use crate::errors::{BattleResult, BattleStateError, StatTableError};
use crate::persistence::{SavedBattle, SavedEntity};
use crate::stat_table::StatTable;
use schema::{Archetype, Side};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Drives one battle: opposing turns, the player's commands, win checks,
/// death cleanup and the animation scheduler.
pub struct BattleController {
    session: BattleSession,
    config: BattleConfig,
    table: StatTable,
    rng: TurnRng,
    clock: FrameClock,
    enemy_ai: Box<dyn Behavior>,
    events: EventBus,
    score_indicator: Option<FloatingIndicator>,
    outcome: Option<BattleOutcome>,
    paused: bool,
}

impl BattleController {
    /// A fresh battle at difficulty 1 with no score.
    pub fn new_battle(config: BattleConfig, table: StatTable, rng: TurnRng) -> BattleResult<Self> {
        Self::new_wave(config, table, rng, 1.0, 0)
    }

    /// A battle with the configured ally lineup and a random opposing group.
    pub fn new_wave(
        config: BattleConfig,
        table: StatTable,
        mut rng: TurnRng,
        difficulty_scale: f64,
        score: u32,
    ) -> BattleResult<Self> {
        let session = build_wave(&config, &table, &mut rng, difficulty_scale, score)?;
        Ok(Self::from_session(session, config, table, rng))
    }

    /// Rebuild a saved battle. Health percentages and difficulty are
    /// restored exactly; the turn queue is reseeded.
    pub fn from_saved(
        saved: &SavedBattle,
        config: BattleConfig,
        table: StatTable,
        rng: TurnRng,
    ) -> BattleResult<Self> {
        let mut session = BattleSession::new(saved.difficulty_scale, saved.score);
        for record in saved.allies.iter().chain(saved.enemies.iter()) {
            let archetype = Archetype::from_str(&record.archetype)
                .map_err(|_| StatTableError::UnknownArchetype(record.archetype.clone()))?;
            session.spawn(archetype, record.health_percent, &table, &config)?;
        }
        for side in [Side::Ally, Side::Enemy] {
            if session.roster(side).is_empty() {
                return Err(BattleStateError::EmptyRoster(side).into());
            }
        }
        info!(
            "Restored battle: {} allies, {} enemies, difficulty {:.2}, score {}",
            session.allies.len(),
            session.enemies.len(),
            session.difficulty_scale,
            session.score
        );
        Ok(Self::from_session(session, config, table, rng))
    }

    /// Wrap an already populated session.
    pub fn from_session(
        mut session: BattleSession,
        config: BattleConfig,
        table: StatTable,
        mut rng: TurnRng,
    ) -> Self {
        session.refill_turn_queue(&mut rng);
        session.turn_owner = session.head_side().unwrap_or(Side::Ally);
        Self {
            session,
            config,
            table,
            rng,
            clock: FrameClock::new(),
            enemy_ai: Box::new(HealOrAttackAI::new()),
            events: EventBus::new(),
            score_indicator: None,
            outcome: None,
            paused: false,
        }
    }

    /// Replace the opposing side's decision policy.
    pub fn with_enemy_ai(mut self, behavior: Box<dyn Behavior>) -> Self {
        self.enemy_ai = behavior;
        self
    }

    pub fn session(&self) -> &BattleSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut BattleSession {
        &mut self.session
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn rng_mut(&mut self) -> &mut TurnRng {
        &mut self.rng
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Take the events collected since the last drain.
    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        self.events.drain()
    }

    /// Notify `observer` of the collected events, then clear them.
    pub fn notify(&mut self, observer: &mut dyn BattleObserver) {
        self.events.dispatch(observer);
        self.events.drain();
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// The score to record once the battle has ended.
    pub fn final_score(&self) -> Option<u32> {
        self.outcome.map(|_| self.session.score)
    }

    pub fn score_indicator(&self) -> Option<FloatingIndicator> {
        self.score_indicator
    }

    pub fn views(&self, side: Side) -> Vec<EntityView> {
        self.session.views(side)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Cycle the speed multiplier x1 -> x2 -> x4 -> x1.
    pub fn toggle_speed(&mut self) -> u32 {
        let speed = self.config.toggle_speed();
        debug!("Speed set to x{}", speed);
        speed
    }

    /// Feed wall-clock time. Runs a controller pass every call and a
    /// scheduler tick whenever one is due.
    pub fn update(&mut self, delta: Duration) {
        if self.paused || self.is_over() {
            return;
        }
        self.controller_pass();
        if !self.is_over() && self.clock.accumulate(delta, &self.config) {
            self.scheduler_tick();
        }
    }

    /// One controller pass followed by one scheduler tick, whatever the
    /// elapsed time.
    pub fn step(&mut self) {
        if self.paused || self.is_over() {
            return;
        }
        self.controller_pass();
        if !self.is_over() {
            self.scheduler_tick();
        }
    }

    fn controller_pass(&mut self) {
        if self.session.turn_owner == Side::Enemy && self.session.everyone_idle() {
            self.run_enemy_turn();
        }

        if self.check_win_condition() {
            return;
        }
        self.session.refill_turn_queue(&mut self.rng);
        self.cleanup_destroyed();
        self.update_turn_owner();
    }

    fn run_enemy_turn(&mut self) {
        let Some(actor) = self.session.turn_queue.head() else {
            return;
        };
        let action = self
            .enemy_ai
            .decide_action(actor, &self.session, &mut self.rng, &self.config);
        self.perform(actor, action);
        self.session.turn_queue.pop();
    }

    fn perform(&mut self, actor: EntityId, action: BattleAction) -> bool {
        let session = &mut self.session;
        let events = &mut self.events;
        match action {
            BattleAction::Attack => {
                resolver::begin_attack(session, actor, &mut self.rng, &self.config, events)
            }
            BattleAction::Heal => resolver::begin_heal(session, actor, events),
            BattleAction::Special => {
                resolver::begin_special(session, actor, &mut self.rng, &self.config, events)
            }
        }
    }

    /// Ends the battle when a roster is empty. Returns true if it ended.
    fn check_win_condition(&mut self) -> bool {
        let outcome = if self.session.enemies.is_empty() {
            BattleOutcome::Victory
        } else if self.session.allies.is_empty() {
            BattleOutcome::Defeat
        } else {
            return false;
        };
        self.outcome = Some(outcome);
        info!("Battle ended in {:?} with score {}", outcome, self.session.score);
        self.events.push(BattleEvent::BattleEnded { outcome, score: self.session.score });
        true
    }

    /// Remove every entity whose dying animation has finished, rewrite the
    /// queue slots naming it and pay out for opposing kills.
    fn cleanup_destroyed(&mut self) {
        for side in [Side::Ally, Side::Enemy] {
            let destroyed: Vec<EntityId> = self
                .session
                .roster(side)
                .iter()
                .filter(|entity| entity.is_destroyed())
                .map(|entity| entity.id)
                .collect();

            for id in destroyed {
                self.session.roster_mut(side).retain(|entity| entity.id != id);
                self.session.replace_in_turn_queue(id, &mut self.rng);
                self.events.push(BattleEvent::EntityRemoved { entity: id, side });
                debug!("Removed {} from the {} roster", id, side);
                if side == Side::Enemy {
                    self.award_kill();
                }
            }
        }
    }

    fn award_kill(&mut self) {
        let awarded = (self.config.score_per_kill as f64 * self.session.difficulty_scale) as u32;
        self.session.score += awarded;
        // A new award replaces the visible one.
        self.score_indicator = Some(FloatingIndicator {
            amount: awarded,
            tone: IndicatorTone::Normal,
            ticks_remaining: self.config.indicator_ticks,
        });
        self.events.push(BattleEvent::ScoreChanged { awarded, total: self.session.score });
    }

    fn update_turn_owner(&mut self) {
        let Some(owner) = self.session.head_side() else {
            return;
        };
        if owner != self.session.turn_owner {
            self.session.turn_owner = owner;
            self.events.push(BattleEvent::TurnOwnerChanged { owner });
        }
    }

    fn scheduler_tick(&mut self) {
        let plan = self.clock.next_tick(&self.config);
        if plan.advance_enemies {
            self.advance_roster(Side::Enemy);
            self.score_indicator = self.score_indicator.and_then(|indicator| {
                let ticks_remaining = indicator.ticks_remaining.saturating_sub(1);
                (ticks_remaining > 0).then_some(FloatingIndicator { ticks_remaining, ..indicator })
            });
        }
        if plan.advance_allies {
            self.advance_roster(Side::Ally);
        }
    }

    fn advance_roster(&mut self, side: Side) {
        let ids: Vec<EntityId> = self.session.roster(side).iter().map(|entity| entity.id).collect();
        for id in ids {
            let Some(entity) = self.session.entity_mut(id) else {
                continue;
            };
            let completion = entity.advance_frame(&mut self.rng, &self.config, &mut self.events);
            match completion {
                Some(AnimationCompletion::AttackFinished) => {
                    resolver::finish_attack(&mut self.session, id, &self.config, &mut self.events)
                }
                Some(AnimationCompletion::HealFinished) => {
                    resolver::finish_heal(&mut self.session, id, &self.config, &mut self.events)
                }
                Some(AnimationCompletion::WalkFinished) => debug!("{} is in position", id),
                Some(AnimationCompletion::DyingFinished) => debug!("{} finished dying", id),
                None => {}
            }
        }
    }

    /// The head of the queue, if the player may command it right now.
    fn player_actor(&self) -> Option<EntityId> {
        if self.paused || self.is_over() || !self.session.everyone_idle() {
            return None;
        }
        if self.session.head_side() != Some(Side::Ally) {
            return None;
        }
        self.session.turn_queue.head()
    }

    fn player_command(&mut self, action: BattleAction) -> bool {
        let Some(actor) = self.player_actor() else {
            debug!("Ignoring {:?}: not the player's turn or someone is busy", action);
            return false;
        };
        self.perform(actor, action);
        self.session.turn_queue.pop();
        true
    }

    /// The ally at the head of the queue attacks. No-op unless it is the
    /// player's turn and everyone is idle.
    pub fn player_attack(&mut self) -> bool {
        self.player_command(BattleAction::Attack)
    }

    /// The ally at the head of the queue heals. Same gate as `player_attack`.
    pub fn player_heal(&mut self) -> bool {
        self.player_command(BattleAction::Heal)
    }

    /// The ally at the head of the queue uses its special. Same gate as
    /// `player_attack`.
    pub fn player_special(&mut self) -> bool {
        self.player_command(BattleAction::Special)
    }

    /// Start the next wave after a victory: stronger opponents, weaker fresh
    /// allies, score carried over.
    pub fn next_wave(&mut self) -> BattleResult<()> {
        if self.outcome != Some(BattleOutcome::Victory) {
            return Err(BattleStateError::BattleNotWon.into());
        }
        let difficulty = self.session.difficulty_scale * self.config.difficulty_growth;
        let session =
            build_wave(&self.config, &self.table, &mut self.rng, difficulty, self.session.score)?;
        info!("Starting a new wave at difficulty {:.2}", difficulty);

        self.session = session;
        self.session.refill_turn_queue(&mut self.rng);
        self.session.turn_owner = self.session.head_side().unwrap_or(Side::Ally);
        self.clock = FrameClock::new();
        self.score_indicator = None;
        self.outcome = None;
        Ok(())
    }

    /// Snapshot the living entities for saving. Refused while anyone is still
    /// walking in.
    pub fn save_record(&self) -> BattleResult<SavedBattle> {
        if self.session.anyone_walking() {
            return Err(BattleStateError::EntitiesStillWalking.into());
        }
        let record = |side: Side| -> Vec<SavedEntity> {
            self.session
                .roster(side)
                .iter()
                .filter(|entity| !entity.is_dead())
                .map(|entity| SavedEntity {
                    archetype: entity.archetype.name().to_string(),
                    health_percent: entity.health_percent(),
                })
                .collect()
        };
        Ok(SavedBattle {
            score: self.session.score,
            difficulty_scale: self.session.difficulty_scale,
            allies: record(Side::Ally),
            enemies: record(Side::Enemy),
        })
    }
}

/// Populate a session with the configured allies and `enemy_count` random
/// opponents.
fn build_wave(
    config: &BattleConfig,
    table: &StatTable,
    rng: &mut TurnRng,
    difficulty_scale: f64,
    score: u32,
) -> BattleResult<BattleSession> {
    if config.ally_lineup.is_empty() {
        return Err(BattleStateError::EmptyRoster(Side::Ally).into());
    }
    if config.enemy_count == 0 {
        return Err(BattleStateError::EmptyRoster(Side::Enemy).into());
    }

    let mut session = BattleSession::new(difficulty_scale, score);
    for archetype in &config.ally_lineup {
        session.spawn(*archetype, 100.0, table, config)?;
    }
    let candidates = Archetype::for_side(Side::Enemy);
    for _ in 0..config.enemy_count {
        let archetype = candidates[rng.pick_index(candidates.len(), "enemy archetype")];
        session.spawn(archetype, 100.0, table, config)?;
    }
    info!(
        "Wave ready: {} allies against {} enemies at difficulty {:.2}",
        session.allies.len(),
        session.enemies.len(),
        difficulty_scale
    );
    Ok(session)
}
