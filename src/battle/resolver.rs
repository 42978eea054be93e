//! Combat math and the side effects of starting and finishing actions.
//!
//! Every function takes the session and entity ids rather than entity
//! references, so the attacker and its target can be borrowed one at a time.

use crate::battle::state::{BattleEvent, BattleSession, EventBus, SkipReason, TurnRng};
use crate::config::BattleConfig;
use crate::entity::{CombatEntity, EntityId};
use ordered_float::OrderedFloat;
use schema::{ActionState, Archetype, EffectKind, Side};
use tracing::{debug, warn};

/// Attack value used by the ice special's token hit.
const ICE_SPECIAL_ATTACK: u32 = 1;

/// `floor(multiplier * (attack + 10) / defence)`.
pub fn damage_formula(attack: u32, defence: u32, multiplier: f64) -> u32 {
    (multiplier * (attack as f64 + 10.0) / defence.max(1) as f64) as u32
}

/// `floor(multiplier * attack_power)`.
pub fn attack_power_formula(attack_power: u32, multiplier: f64) -> u32 {
    (multiplier * attack_power as f64) as u32
}

/// Heal strength fixed when the heal starts.
pub fn heal_formula(defence: u32) -> u32 {
    10 + defence
}

/// Defence modifiers of the defender, consumed by this hit.
fn defence_multiplier(defender: &mut CombatEntity, events: &mut EventBus) -> f64 {
    let mut multiplier = 1.0;
    if defender.consume_effect(EffectKind::DefenceBuff, events) {
        multiplier -= 0.5;
    }
    if defender.consume_effect(EffectKind::DefenceBreak, events) {
        multiplier += 0.5;
    }
    multiplier
}

/// Attack modifiers of the attacker, consumed by this finishing attack.
fn attack_multiplier(attacker: &mut CombatEntity, events: &mut EventBus) -> f64 {
    let mut multiplier = 1.0;
    if attacker.consume_effect(EffectKind::AttackBuff, events) {
        multiplier += 0.5;
    }
    if attacker.consume_effect(EffectKind::AttackBreak, events) {
        multiplier -= 0.5;
    }
    multiplier
}

/// Deal a hit of `attack` to `target` through the damage formula. Returns the
/// damage dealt, or None if the target is gone or already dead.
pub fn hit(
    session: &mut BattleSession,
    target: EntityId,
    attack: u32,
    config: &BattleConfig,
    events: &mut EventBus,
) -> Option<u32> {
    let defender = session.entity_mut(target).filter(|entity| !entity.is_dead())?;
    let multiplier = defence_multiplier(defender, events);
    let damage = damage_formula(attack, defender.defence, multiplier);
    defender.take_damage(damage, config.indicator_ticks, events);
    Some(damage)
}

/// Resolve one finishing attack of `attacker` against `target`.
fn strike(
    session: &mut BattleSession,
    attacker_id: EntityId,
    target: EntityId,
    config: &BattleConfig,
    events: &mut EventBus,
) -> Option<u32> {
    session.entity(target).filter(|entity| !entity.is_dead())?;
    let attacker = session.entity_mut(attacker_id)?;
    let multiplier = attack_multiplier(attacker, events);
    let power = attack_power_formula(attacker.attack_power, multiplier);
    let archetype = attacker.archetype;
    let self_heal = attacker.max_health / 4;

    let damage = hit(session, target, power, config, events)?;

    // Magic attacks also restore a quarter of the attacker's health.
    if archetype == Archetype::Magic {
        if let Some(attacker) = session.entity_mut(attacker_id) {
            attacker.receive_heal(self_heal, config.indicator_ticks, events);
        }
    }
    Some(damage)
}

/// Stunned opposing entities lose the action and the stun. Returns true if
/// the action must be skipped.
fn stunned(session: &mut BattleSession, actor_id: EntityId, events: &mut EventBus) -> bool {
    let Some(actor) = session.entity_mut(actor_id) else {
        return false;
    };
    if actor.side != Side::Enemy || !actor.consume_effect(EffectKind::Stun, events) {
        return false;
    }
    debug!("{} {} is stunned, skipping its action", actor.archetype, actor_id);
    events.push(BattleEvent::ActionSkipped { entity: actor_id, reason: SkipReason::Stunned });
    true
}

fn skip_without_target(actor_id: EntityId, events: &mut EventBus) -> bool {
    debug!("{} has no target, skipping its action", actor_id);
    events.push(BattleEvent::ActionSkipped { entity: actor_id, reason: SkipReason::NoTarget });
    false
}

/// Start a normal attack on the first living opponent. The archetype's
/// on-hit debuff may land on the target right away. Returns whether the
/// attack started.
pub fn begin_attack(
    session: &mut BattleSession,
    attacker_id: EntityId,
    rng: &mut TurnRng,
    config: &BattleConfig,
    events: &mut EventBus,
) -> bool {
    if stunned(session, attacker_id, events) {
        return false;
    }
    let Some(attacker) = session.entity(attacker_id) else {
        return false;
    };
    let (side, archetype) = (attacker.side, attacker.archetype);
    let Some(target) = session.living_ids(side.opponent()).first().copied() else {
        return skip_without_target(attacker_id, events);
    };

    if let Some(attacker) = session.entity_mut(attacker_id) {
        debug!("{} {} attacks {}", archetype, attacker_id, target);
        attacker.pending_target = Some(target);
        attacker.pending_amount = None;
        attacker.set_state(ActionState::Attacking, events);
    }

    if let Some(debuff) = archetype.on_hit_debuff() {
        if rng.chance(config.on_hit_debuff_percent, "on-hit debuff") {
            if let Some(target) = session.entity_mut(target) {
                target.add_effect(debuff, events);
            }
        }
    }
    true
}

/// The living member of `side` with the lowest health ratio. `first` is
/// checked before the roster so it wins ties.
pub fn lowest_health_ratio(session: &BattleSession, side: Side, first: EntityId) -> Option<EntityId> {
    std::iter::once(first)
        .chain(session.living_ids(side))
        .filter_map(|id| session.entity(id))
        .filter(|entity| !entity.is_dead())
        .min_by_key(|entity| OrderedFloat(entity.health_ratio()))
        .map(|entity| entity.id)
}

/// Start a heal on the most wounded member of the healer's side. The amount
/// is fixed now and applied when the animation finishes.
pub fn begin_heal(session: &mut BattleSession, healer_id: EntityId, events: &mut EventBus) -> bool {
    if stunned(session, healer_id, events) {
        return false;
    }
    let Some(healer) = session.entity(healer_id) else {
        return false;
    };
    let side = healer.side;
    let amount = heal_formula(healer.defence);
    let Some(target) = lowest_health_ratio(session, side, healer_id) else {
        return skip_without_target(healer_id, events);
    };

    match session.entity_mut(healer_id) {
        Some(healer) => {
            debug!("{} {} heals {} for {}", healer.archetype, healer_id, target, amount);
            healer.pending_target = Some(target);
            healer.pending_amount = Some(amount);
            healer.set_state(ActionState::Healing, events);
            true
        }
        None => false,
    }
}

/// Deal the stored attack once the attacking animation ends.
pub fn finish_attack(
    session: &mut BattleSession,
    attacker_id: EntityId,
    config: &BattleConfig,
    events: &mut EventBus,
) {
    let Some(target) = session
        .entity_mut(attacker_id)
        .and_then(|attacker| attacker.pending_target.take())
    else {
        return;
    };
    if strike(session, attacker_id, target, config, events).is_none() {
        warn!("{} finished an attack but target {} is gone", attacker_id, target);
    }
}

/// Apply the stored heal once the healing animation ends.
pub fn finish_heal(
    session: &mut BattleSession,
    healer_id: EntityId,
    config: &BattleConfig,
    events: &mut EventBus,
) {
    let Some((target, amount)) = session.entity_mut(healer_id).and_then(|healer| {
        let target = healer.pending_target.take()?;
        let amount = healer.pending_amount.take()?;
        Some((target, amount))
    }) else {
        return;
    };
    match session.entity_mut(target).filter(|entity| !entity.is_dead()) {
        Some(entity) => {
            entity.receive_heal(amount, config.indicator_ticks, events);
        }
        None => warn!("{} finished a heal but target {} is gone", healer_id, target),
    }
}

/// Fire the caster's special ability. Its effects apply immediately; the
/// caster then plays its special animation. Opposing archetypes have none.
pub fn begin_special(
    session: &mut BattleSession,
    caster_id: EntityId,
    rng: &mut TurnRng,
    config: &BattleConfig,
    events: &mut EventBus,
) -> bool {
    let Some(caster) = session.entity(caster_id) else {
        return false;
    };
    let (archetype, side) = (caster.archetype, caster.side);
    debug!("{} {} uses its special", archetype, caster_id);

    match archetype {
        Archetype::Ice => ice_special(session, caster_id, side, config, events),
        Archetype::Fire => fire_special(session, caster_id, side, rng, config, events),
        Archetype::Magic => magic_special(session, caster_id, side, config, events),
        Archetype::Golem | Archetype::Wraith | Archetype::Satyr => return false,
    }

    if let Some(caster) = session.entity_mut(caster_id).filter(|entity| !entity.is_dead()) {
        caster.set_state(ActionState::Special, events);
    }
    true
}

/// Token hit on every opponent, then attack and defence breaks on each; the
/// strongest ally gets two attack buffs.
fn ice_special(
    session: &mut BattleSession,
    caster_id: EntityId,
    side: Side,
    config: &BattleConfig,
    events: &mut EventBus,
) {
    for target in session.living_ids(side.opponent()) {
        hit(session, target, ICE_SPECIAL_ATTACK, config, events);
        if let Some(enemy) = session.entity_mut(target).filter(|entity| !entity.is_dead()) {
            enemy.add_effect(EffectKind::DefenceBreak, events);
            enemy.add_effect(EffectKind::AttackBreak, events);
        }
    }

    let mut strongest = caster_id;
    let mut max_attack = session.entity(caster_id).map_or(0, |caster| caster.attack_power);
    for id in session.living_ids(side) {
        if let Some(ally) = session.entity(id) {
            if ally.attack_power > max_attack {
                max_attack = ally.attack_power;
                strongest = id;
            }
        }
    }
    if let Some(ally) = session.entity_mut(strongest) {
        ally.add_effect(EffectKind::AttackBuff, events);
        ally.add_effect(EffectKind::AttackBuff, events);
    }
}

/// A finishing attack on every opponent, then a buffed one on a random
/// survivor.
fn fire_special(
    session: &mut BattleSession,
    caster_id: EntityId,
    side: Side,
    rng: &mut TurnRng,
    config: &BattleConfig,
    events: &mut EventBus,
) {
    for target in session.living_ids(side.opponent()) {
        strike(session, caster_id, target, config, events);
    }
    if let Some(caster) = session.entity_mut(caster_id) {
        caster.add_effect(EffectKind::AttackBuff, events);
    }
    let survivors = session.living_ids(side.opponent());
    if survivors.is_empty() {
        return;
    }
    let target = survivors[rng.pick_index(survivors.len(), "fire special target")];
    strike(session, caster_id, target, config, events);
}

/// Defence buff and a small heal for every ally.
fn magic_special(
    session: &mut BattleSession,
    caster_id: EntityId,
    side: Side,
    config: &BattleConfig,
    events: &mut EventBus,
) {
    let amount = session
        .entity(caster_id)
        .map_or(0, |caster| (0.1 * caster.max_health as f64) as u32);
    for id in session.living_ids(side) {
        if let Some(ally) = session.entity_mut(id) {
            ally.add_effect(EffectKind::DefenceBuff, events);
            ally.receive_heal(amount, config.indicator_ticks, events);
        }
    }
}
