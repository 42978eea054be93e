use crate::battle::state::{BattleEvent, EntityView, EventBus, TurnRng};
use crate::config::BattleConfig;
use crate::effects::{Effect, EffectSet};
use crate::errors::StatTableResult;
use crate::stat_table::{health_from_percent, scaled_stats, StatTable};
use schema::{ActionState, AnimationFrames, Archetype, EffectKind, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle of an entity within one battle. Rosters own entities; every
/// other structure refers to them through this id.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorTone {
    Normal,
    /// A heal cancelled by heal break, drawn in red.
    Blocked,
}

/// Floating "-N" / "+N" text shown next to an entity's health bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatingIndicator {
    pub amount: u32,
    pub tone: IndicatorTone,
    /// Remaining lifetime in the owning entity's animation ticks.
    pub ticks_remaining: u32,
}

impl FloatingIndicator {
    /// Merge a new amount into a still-visible indicator of the same tone, or
    /// start a new one. The lifetime always restarts.
    fn merged(existing: Option<FloatingIndicator>, amount: u32, tone: IndicatorTone, ticks: u32) -> Self {
        let amount = match existing {
            Some(previous) if previous.tone == tone => previous.amount + amount,
            _ => amount,
        };
        FloatingIndicator { amount, tone, ticks_remaining: ticks }
    }

    /// Returns None once the indicator has expired.
    fn ticked(self) -> Option<Self> {
        let ticks_remaining = self.ticks_remaining.saturating_sub(1);
        if ticks_remaining == 0 {
            None
        } else {
            Some(FloatingIndicator { ticks_remaining, ..self })
        }
    }
}

/// What an animation cycle finished, for the controller to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationCompletion {
    AttackFinished,
    HealFinished,
    WalkFinished,
    /// The entity is destroyed and can be removed from its roster.
    DyingFinished,
}

#[derive(Debug, Clone)]
pub struct CombatEntity {
    pub id: EntityId,
    pub side: Side,
    pub archetype: Archetype,
    pub attack_power: u32,
    pub defence: u32,
    pub max_health: u32,
    current_health: u32,
    pub effects: EffectSet,
    pub frames: AnimationFrames,
    action_state: ActionState,
    current_frame_index: u32,
    is_dead: bool,
    is_destroyed: bool,
    pub pending_target: Option<EntityId>,
    pub pending_amount: Option<u32>,
    pub damage_indicator: Option<FloatingIndicator>,
    pub heal_indicator: Option<FloatingIndicator>,
    walk_remaining: u32,
    placed: bool,
}

impl CombatEntity {
    /// Create an entity walking in from off-screen. Fails if the archetype
    /// has no row in `table`.
    pub fn new(
        id: EntityId,
        archetype: Archetype,
        table: &StatTable,
        difficulty_scale: f64,
        health_percent: f64,
        config: &BattleConfig,
    ) -> StatTableResult<Self> {
        let entry = table.lookup(archetype)?;
        let side = archetype.side();
        let stats = scaled_stats(entry, side, difficulty_scale);
        // A living entity never starts at zero health.
        let current_health = health_from_percent(stats.max_health, health_percent).max(1);

        Ok(Self {
            id,
            side,
            archetype,
            attack_power: stats.attack_power,
            defence: stats.defence,
            max_health: stats.max_health,
            current_health,
            effects: EffectSet::new(),
            frames: entry.frames,
            action_state: ActionState::Walking,
            current_frame_index: 0,
            is_dead: false,
            is_destroyed: false,
            pending_target: None,
            pending_amount: None,
            damage_indicator: None,
            heal_indicator: None,
            walk_remaining: config.walk_in_distance,
            placed: false,
        })
    }

    pub fn current_health(&self) -> u32 {
        self.current_health
    }

    /// Set health directly, clamped to `[0, max_health]`. Does not trigger death.
    pub fn set_health(&mut self, health: u32) {
        self.current_health = health.min(self.max_health);
    }

    pub fn action_state(&self) -> ActionState {
        self.action_state
    }

    pub fn current_frame_index(&self) -> u32 {
        self.current_frame_index
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn is_destroyed(&self) -> bool {
        self.is_destroyed
    }

    pub fn is_placed(&self) -> bool {
        self.placed
    }

    pub fn is_idle(&self) -> bool {
        self.action_state.is_idle_family()
    }

    pub fn health_ratio(&self) -> f64 {
        self.current_health as f64 / self.max_health as f64
    }

    pub fn health_percent(&self) -> f64 {
        self.health_ratio() * 100.0
    }

    pub fn add_effect(&mut self, kind: EffectKind, events: &mut EventBus) {
        self.effects.add(Effect { kind, owner: self.id, permanent: false });
        events.push(BattleEvent::EffectApplied { target: self.id, effect: kind });
    }

    /// Consume the first `kind` effect, reporting it when one was present.
    pub fn consume_effect(&mut self, kind: EffectKind, events: &mut EventBus) -> bool {
        let consumed = self.effects.consume_first(kind);
        if consumed {
            tracing::debug!("{} {} consumed {}", self.archetype, self.id, kind);
            events.push(BattleEvent::EffectConsumed { target: self.id, effect: kind });
        }
        consumed
    }

    /// Enter `state` from its first frame.
    pub fn set_state(&mut self, state: ActionState, events: &mut EventBus) {
        self.action_state = state;
        self.current_frame_index = 0;
        events.push(BattleEvent::StateChanged { entity: self.id, state });
    }

    /// Subtract `amount` health and play the hurt animation. Returns true if
    /// this hit killed the entity. Hits on a dead entity are ignored.
    pub fn take_damage(&mut self, amount: u32, indicator_ticks: u32, events: &mut EventBus) -> bool {
        if self.is_dead {
            return false;
        }
        self.current_health = self.current_health.saturating_sub(amount);
        self.damage_indicator = Some(FloatingIndicator::merged(
            self.damage_indicator,
            amount,
            IndicatorTone::Normal,
            indicator_ticks,
        ));
        events.push(BattleEvent::Damage {
            target: self.id,
            amount,
            remaining_health: self.current_health,
        });
        self.set_state(ActionState::Hurt, events);

        if self.current_health == 0 {
            self.die(events);
            return true;
        }
        false
    }

    /// Death at zero health: effects and indicators are cleared and the
    /// dying animation starts. Happens at most once.
    pub fn die(&mut self, events: &mut EventBus) {
        if self.is_dead {
            return;
        }
        self.is_dead = true;
        self.current_health = 0;
        self.effects.clear_all();
        self.damage_indicator = None;
        self.heal_indicator = None;
        self.pending_target = None;
        self.pending_amount = None;
        tracing::info!("{} {} died", self.archetype, self.id);
        self.set_state(ActionState::Dying, events);
        events.push(BattleEvent::EntityDied { entity: self.id });
    }

    /// Apply a heal of `amount`. Heal break turns it into a blocked "+0" and
    /// skips the healed animation. Returns the health actually gained.
    pub fn receive_heal(&mut self, amount: u32, indicator_ticks: u32, events: &mut EventBus) -> u32 {
        if self.is_dead {
            return 0;
        }
        if self.consume_effect(EffectKind::HealBreak, events) {
            // A blocked heal always reads "+0", replacing whatever was showing.
            self.heal_indicator = Some(FloatingIndicator {
                amount: 0,
                tone: IndicatorTone::Blocked,
                ticks_remaining: indicator_ticks,
            });
            events.push(BattleEvent::Heal {
                target: self.id,
                amount: 0,
                new_health: self.current_health,
                blocked: true,
            });
            self.set_state(ActionState::Idle, events);
            return 0;
        }

        let before = self.current_health;
        self.current_health = (self.current_health + amount).min(self.max_health);
        self.heal_indicator = Some(FloatingIndicator::merged(
            self.heal_indicator,
            amount,
            IndicatorTone::Normal,
            indicator_ticks,
        ));
        events.push(BattleEvent::Heal {
            target: self.id,
            amount,
            new_health: self.current_health,
            blocked: false,
        });
        self.set_state(ActionState::Healed, events);
        self.current_health - before
    }

    /// Advance one animation tick of this entity's side. Returns the
    /// animation that just completed, if any.
    pub fn advance_frame(
        &mut self,
        rng: &mut TurnRng,
        config: &BattleConfig,
        events: &mut EventBus,
    ) -> Option<AnimationCompletion> {
        if self.is_destroyed {
            return None;
        }

        self.damage_indicator = self.damage_indicator.and_then(FloatingIndicator::ticked);
        self.heal_indicator = self.heal_indicator.and_then(FloatingIndicator::ticked);

        if self.action_state == ActionState::Walking {
            return self.advance_walk(config, events);
        }

        self.current_frame_index += 1;
        if self.current_frame_index < self.frames.count(self.action_state) {
            return None;
        }

        match self.action_state {
            ActionState::Idle => {
                let blinks = self.side == Side::Enemy
                    && rng.pick_index(config.idle_blink_one_in, "idle blink") == 0;
                if blinks {
                    self.set_state(ActionState::IdleBlink, events);
                } else {
                    // Idle loops without a state change.
                    self.current_frame_index = 0;
                }
                None
            }
            ActionState::Attacking => {
                self.set_state(ActionState::Idle, events);
                Some(AnimationCompletion::AttackFinished)
            }
            ActionState::Healing => {
                self.set_state(ActionState::Idle, events);
                Some(AnimationCompletion::HealFinished)
            }
            ActionState::Dying => {
                self.current_frame_index = self.frames.dying - 1;
                self.is_destroyed = true;
                Some(AnimationCompletion::DyingFinished)
            }
            ActionState::IdleBlink
            | ActionState::Hurt
            | ActionState::Healed
            | ActionState::Special => {
                self.set_state(ActionState::Idle, events);
                None
            }
            ActionState::Walking => None,
        }
    }

    fn advance_walk(&mut self, config: &BattleConfig, events: &mut EventBus) -> Option<AnimationCompletion> {
        let stride = match self.side {
            Side::Ally => config.ally_stride,
            Side::Enemy => config.enemy_stride,
        };
        // The walking animation loops until the distance is covered.
        self.current_frame_index = (self.current_frame_index + 1) % self.frames.walking;
        self.walk_remaining = self.walk_remaining.saturating_sub(stride);
        if self.walk_remaining > 0 {
            return None;
        }
        self.placed = true;
        self.set_state(ActionState::Idle, events);
        Some(AnimationCompletion::WalkFinished)
    }

    /// Place the entity immediately, as if its walk-in had finished.
    pub fn skip_walk_in(&mut self) {
        if self.action_state == ActionState::Walking {
            self.action_state = ActionState::Idle;
            self.current_frame_index = 0;
        }
        self.walk_remaining = 0;
        self.placed = true;
    }

    pub fn view(&self) -> EntityView {
        EntityView {
            id: self.id,
            side: self.side,
            archetype: self.archetype,
            action_state: self.action_state,
            current_frame_index: self.current_frame_index,
            current_health: self.current_health,
            max_health: self.max_health,
            effect_kinds: self.effects.kinds(),
            damage_indicator: self.damage_indicator,
            heal_indicator: self.heal_indicator,
            placed: self.placed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stat_table::default_stat_table;
    use pretty_assertions::assert_eq;

    fn placed(archetype: Archetype) -> CombatEntity {
        let table = default_stat_table().unwrap();
        let mut entity =
            CombatEntity::new(EntityId(1), archetype, table, 1.0, 100.0, &BattleConfig::default())
                .unwrap();
        entity.skip_walk_in();
        entity
    }

    #[test]
    fn test_unknown_archetype_fails_construction() {
        let table = StatTable::from_entries(vec![]).unwrap();
        let result =
            CombatEntity::new(EntityId(1), Archetype::Fire, &table, 1.0, 100.0, &BattleConfig::default());
        assert!(matches!(
            result,
            Err(crate::errors::StatTableError::UnknownArchetype(name)) if name == "fire"
        ));
    }

    #[test]
    fn test_walk_in_completes_by_distance() {
        let table = default_stat_table().unwrap();
        let config = BattleConfig::default();
        let mut rng = TurnRng::new_for_test(vec![]);
        let mut events = EventBus::new();
        let mut entity =
            CombatEntity::new(EntityId(1), Archetype::Ice, table, 1.0, 100.0, &config).unwrap();

        // 400 px at 10 px per ally tick.
        for _ in 0..39 {
            assert_eq!(entity.advance_frame(&mut rng, &config, &mut events), None);
            assert_eq!(entity.action_state(), ActionState::Walking);
            assert!(entity.current_frame_index() < entity.frames.walking);
        }
        assert_eq!(
            entity.advance_frame(&mut rng, &config, &mut events),
            Some(AnimationCompletion::WalkFinished)
        );
        assert_eq!(entity.action_state(), ActionState::Idle);
        assert_eq!(entity.current_frame_index(), 0);
        assert!(entity.is_placed());
    }

    #[test]
    fn test_damage_to_zero_kills_once() {
        let mut entity = placed(Archetype::Golem);
        let mut events = EventBus::new();
        let health = entity.current_health();

        assert!(entity.take_damage(health + 50, 15, &mut events));
        assert_eq!(entity.current_health(), 0);
        assert_eq!(entity.action_state(), ActionState::Dying);
        assert!(entity.is_dead());
        assert_eq!(entity.damage_indicator, None);

        let before = events.len();
        assert!(!entity.take_damage(5, 15, &mut events));
        assert_eq!(events.len(), before);
    }

    #[test]
    fn test_damage_indicator_merges_and_restarts_timer() {
        let config = BattleConfig::default();
        let mut rng = TurnRng::new_for_test(vec![]);
        let mut events = EventBus::new();
        let mut entity = placed(Archetype::Magic);

        entity.take_damage(4, 15, &mut events);
        for _ in 0..5 {
            entity.advance_frame(&mut rng, &config, &mut events);
        }
        assert_eq!(entity.damage_indicator.map(|i| i.ticks_remaining), Some(10));

        entity.take_damage(3, 15, &mut events);
        assert_eq!(
            entity.damage_indicator,
            Some(FloatingIndicator { amount: 7, tone: IndicatorTone::Normal, ticks_remaining: 15 })
        );

        for _ in 0..15 {
            entity.advance_frame(&mut rng, &config, &mut events);
        }
        assert_eq!(entity.damage_indicator, None);
    }

    #[test]
    fn test_heal_is_capped_at_max_health() {
        let mut entity = placed(Archetype::Magic);
        let mut events = EventBus::new();
        let max = entity.max_health;
        entity.set_health(max - 3);

        assert_eq!(entity.receive_heal(20, 15, &mut events), 3);
        assert_eq!(entity.current_health(), max);
        assert_eq!(entity.action_state(), ActionState::Healed);
        assert_eq!(entity.heal_indicator.map(|i| i.amount), Some(20));
    }

    #[test]
    fn test_heal_break_blocks_heal_and_forces_idle() {
        let mut entity = placed(Archetype::Satyr);
        let mut events = EventBus::new();
        entity.set_health(10);
        entity.add_effect(EffectKind::HealBreak, &mut events);
        entity.add_effect(EffectKind::HealBreak, &mut events);

        assert_eq!(entity.receive_heal(16, 15, &mut events), 0);
        assert_eq!(entity.current_health(), 10);
        assert_eq!(entity.action_state(), ActionState::Idle);
        assert_eq!(entity.effects.count(EffectKind::HealBreak), 1);
        assert_eq!(
            entity.heal_indicator,
            Some(FloatingIndicator { amount: 0, tone: IndicatorTone::Blocked, ticks_remaining: 15 })
        );
    }

    #[test]
    fn test_blocked_heal_replaces_visible_heal_indicator() {
        let mut entity = placed(Archetype::Satyr);
        let mut events = EventBus::new();
        entity.set_health(10);

        entity.receive_heal(16, 15, &mut events);
        assert_eq!(
            entity.heal_indicator,
            Some(FloatingIndicator { amount: 16, tone: IndicatorTone::Normal, ticks_remaining: 15 })
        );

        entity.add_effect(EffectKind::HealBreak, &mut events);
        assert_eq!(entity.receive_heal(16, 15, &mut events), 0);
        assert_eq!(
            entity.heal_indicator,
            Some(FloatingIndicator { amount: 0, tone: IndicatorTone::Blocked, ticks_remaining: 15 })
        );

        // A normal heal afterwards starts over instead of adding to the "+0".
        entity.receive_heal(5, 15, &mut events);
        assert_eq!(
            entity.heal_indicator,
            Some(FloatingIndicator { amount: 5, tone: IndicatorTone::Normal, ticks_remaining: 15 })
        );
    }

    #[test]
    fn test_attack_animation_reports_completion() {
        let config = BattleConfig::default();
        let mut rng = TurnRng::new_for_test(vec![]);
        let mut events = EventBus::new();
        let mut entity = placed(Archetype::Fire);
        entity.set_state(ActionState::Attacking, &mut events);

        let frames = entity.frames.attacking;
        for _ in 1..frames {
            assert_eq!(entity.advance_frame(&mut rng, &config, &mut events), None);
        }
        assert_eq!(
            entity.advance_frame(&mut rng, &config, &mut events),
            Some(AnimationCompletion::AttackFinished)
        );
        assert_eq!(entity.action_state(), ActionState::Idle);
    }

    #[test]
    fn test_enemy_idle_cycle_may_blink() {
        let config = BattleConfig::default();
        // First cycle: roll 2 -> index 1, no blink. Second: roll 1 -> blink.
        let mut rng = TurnRng::new_for_test(vec![2, 1]);
        let mut events = EventBus::new();
        let mut entity = placed(Archetype::Wraith);

        for _ in 0..entity.frames.idle {
            entity.advance_frame(&mut rng, &config, &mut events);
        }
        assert_eq!(entity.action_state(), ActionState::Idle);
        assert_eq!(entity.current_frame_index(), 0);

        for _ in 0..entity.frames.idle {
            entity.advance_frame(&mut rng, &config, &mut events);
        }
        assert_eq!(entity.action_state(), ActionState::IdleBlink);
        assert!(entity.is_idle());
    }

    #[test]
    fn test_dying_animation_destroys_entity() {
        let config = BattleConfig::default();
        let mut rng = TurnRng::new_for_test(vec![]);
        let mut events = EventBus::new();
        let mut entity = placed(Archetype::Ice);
        entity.die(&mut events);

        let mut completion = None;
        for _ in 0..entity.frames.dying {
            completion = entity.advance_frame(&mut rng, &config, &mut events);
        }
        assert_eq!(completion, Some(AnimationCompletion::DyingFinished));
        assert!(entity.is_destroyed());
        assert_eq!(entity.advance_frame(&mut rng, &config, &mut events), None);
    }
}
