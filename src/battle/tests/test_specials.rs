#[cfg(test)]
mod tests {
    use crate::battle::resolver::begin_special;
    use crate::battle::state::{EventBus, TurnRng};
    use crate::battle::tests::common::{create_test_session, TestEntityBuilder};
    use crate::config::BattleConfig;
    use crate::entity::EntityId;
    use pretty_assertions::assert_eq;
    use schema::{ActionState, Archetype, EffectKind};

    #[test]
    fn test_ice_special_breaks_enemies_and_buffs_strongest_ally() {
        // Arrange: fire out-hits ice, so it receives the buffs.
        let mut session = create_test_session(
            vec![
                TestEntityBuilder::new(Archetype::Ice).with_attack(20),
                TestEntityBuilder::new(Archetype::Fire).with_attack(30),
            ],
            vec![
                TestEntityBuilder::new(Archetype::Golem).with_defence(6),
                TestEntityBuilder::new(Archetype::Satyr).with_defence(5),
            ],
        );
        let (ice, fire, golem, satyr) = (EntityId(1), EntityId(2), EntityId(3), EntityId(4));
        let mut rng = TurnRng::new_for_test(vec![]);
        let mut events = EventBus::new();

        // Act
        assert!(begin_special(&mut session, ice, &mut rng, &BattleConfig::default(), &mut events));

        // Assert: token hits of floor(11 / defence).
        events.print_debug_with_message("Events for test_ice_special_breaks_enemies_and_buffs_strongest_ally:");
        assert_eq!(session.entity(golem).unwrap().current_health(), 59);
        assert_eq!(session.entity(satyr).unwrap().current_health(), 48);
        for enemy in [golem, satyr] {
            let enemy = session.entity(enemy).unwrap();
            assert_eq!(
                enemy.effects.kinds(),
                vec![EffectKind::DefenceBreak, EffectKind::AttackBreak]
            );
            assert_eq!(enemy.action_state(), ActionState::Hurt);
        }
        assert_eq!(session.entity(fire).unwrap().effects.count(EffectKind::AttackBuff), 2);
        assert!(session.entity(ice).unwrap().effects.is_empty());
        assert_eq!(session.entity(ice).unwrap().action_state(), ActionState::Special);
    }

    #[test]
    fn test_ice_special_buff_tie_goes_to_caster() {
        let mut session = create_test_session(
            vec![
                TestEntityBuilder::new(Archetype::Fire).with_attack(20),
                TestEntityBuilder::new(Archetype::Ice).with_attack(20),
            ],
            vec![TestEntityBuilder::new(Archetype::Golem)],
        );
        let ice = EntityId(2);
        let mut rng = TurnRng::new_for_test(vec![]);
        let mut events = EventBus::new();

        begin_special(&mut session, ice, &mut rng, &BattleConfig::default(), &mut events);
        assert_eq!(session.entity(ice).unwrap().effects.count(EffectKind::AttackBuff), 2);
        assert!(session.entity(EntityId(1)).unwrap().effects.is_empty());
    }

    #[test]
    fn test_fire_special_hits_all_then_a_buffed_random_enemy() {
        let mut session = create_test_session(
            vec![TestEntityBuilder::new(Archetype::Fire).with_attack(30)],
            vec![
                TestEntityBuilder::new(Archetype::Golem).with_defence(6),
                TestEntityBuilder::new(Archetype::Satyr).with_defence(5),
            ],
        );
        let (fire, golem, satyr) = (EntityId(1), EntityId(2), EntityId(3));
        // Roll 2 picks the second survivor.
        let mut rng = TurnRng::new_for_test(vec![2]);
        let mut events = EventBus::new();

        begin_special(&mut session, fire, &mut rng, &BattleConfig::default(), &mut events);

        // 40 / 6 = 6 on the golem; 40 / 5 = 8 then floor(1.5 * 30) = 45 -> 55 / 5 = 11 on the satyr.
        assert_eq!(session.entity(golem).unwrap().current_health(), 54);
        assert_eq!(session.entity(satyr).unwrap().current_health(), 31);
        let fire = session.entity(fire).unwrap();
        assert!(!fire.effects.has(EffectKind::AttackBuff));
        assert_eq!(fire.action_state(), ActionState::Special);
    }

    #[test]
    fn test_fire_special_without_survivors_skips_random_hit() {
        let mut session = create_test_session(
            vec![TestEntityBuilder::new(Archetype::Fire).with_attack(30)],
            vec![TestEntityBuilder::new(Archetype::Wraith).with_health(1)],
        );
        let fire = EntityId(1);
        let mut rng = TurnRng::new_for_test(vec![]);
        let mut events = EventBus::new();

        begin_special(&mut session, fire, &mut rng, &BattleConfig::default(), &mut events);

        assert!(session.entity(EntityId(2)).unwrap().is_dead());
        // The unused attack buff stays for the next attack.
        assert!(session.entity(fire).unwrap().effects.has(EffectKind::AttackBuff));
    }

    #[test]
    fn test_magic_special_shields_and_heals_every_ally() {
        let mut session = create_test_session(
            vec![
                TestEntityBuilder::new(Archetype::Magic).with_health_percent(50.0),
                TestEntityBuilder::new(Archetype::Fire).with_health_percent(50.0),
            ],
            vec![TestEntityBuilder::new(Archetype::Golem)],
        );
        let (magic, fire) = (EntityId(1), EntityId(2));
        let mut rng = TurnRng::new_for_test(vec![]);
        let mut events = EventBus::new();

        begin_special(&mut session, magic, &mut rng, &BattleConfig::default(), &mut events);

        // floor(0.1 * 80) = 8 for everyone.
        let magic = session.entity(magic).unwrap();
        assert_eq!(magic.current_health(), 48);
        assert_eq!(magic.effects.kinds(), vec![EffectKind::DefenceBuff]);
        assert_eq!(magic.action_state(), ActionState::Special);

        let fire = session.entity(fire).unwrap();
        assert_eq!(fire.current_health(), 38);
        assert_eq!(fire.effects.kinds(), vec![EffectKind::DefenceBuff]);
        assert_eq!(fire.action_state(), ActionState::Healed);
    }

    #[test]
    fn test_opposing_archetypes_have_no_special() {
        let mut session = create_test_session(
            vec![TestEntityBuilder::new(Archetype::Fire)],
            vec![TestEntityBuilder::new(Archetype::Satyr)],
        );
        let mut rng = TurnRng::new_for_test(vec![]);
        let mut events = EventBus::new();

        assert!(!begin_special(&mut session, EntityId(2), &mut rng, &BattleConfig::default(), &mut events));
        assert!(events.is_empty());
        assert_eq!(session.entity(EntityId(2)).unwrap().action_state(), ActionState::Idle);
    }
}
