#[cfg(test)]
mod tests {
    use crate::battle::resolver::{begin_attack, begin_heal};
    use crate::battle::state::{BattleEvent, EventBus, SkipReason, TurnRng};
    use crate::battle::tests::common::{create_test_controller, create_test_session, TestEntityBuilder};
    use crate::config::BattleConfig;
    use crate::entity::EntityId;
    use pretty_assertions::assert_eq;
    use schema::{ActionState, Archetype, EffectKind, Side};

    #[test]
    fn test_stunned_enemy_skips_attack_and_loses_stun() {
        let mut session = create_test_session(
            vec![TestEntityBuilder::new(Archetype::Fire)],
            vec![TestEntityBuilder::new(Archetype::Golem)
                .with_effect(EffectKind::Stun)
                .with_effect(EffectKind::Stun)],
        );
        let golem = EntityId(2);
        let config = BattleConfig::default();
        let mut rng = TurnRng::new_for_test(vec![]);
        let mut events = EventBus::new();

        assert!(!begin_attack(&mut session, golem, &mut rng, &config, &mut events));
        assert_eq!(session.entity(golem).unwrap().action_state(), ActionState::Idle);
        assert_eq!(session.entity(golem).unwrap().effects.count(EffectKind::Stun), 1);
        assert!(events.events().contains(&BattleEvent::ActionSkipped {
            entity: golem,
            reason: SkipReason::Stunned,
        }));

        // One stack per attempt: the second one is spent on the heal attempt.
        assert!(!begin_heal(&mut session, golem, &mut events));
        assert!(!session.entity(golem).unwrap().effects.has(EffectKind::Stun));

        assert!(begin_attack(&mut session, golem, &mut rng, &config, &mut events));
        assert_eq!(session.entity(golem).unwrap().action_state(), ActionState::Attacking);
    }

    #[test]
    fn test_stun_does_not_hold_back_allies() {
        let mut session = create_test_session(
            vec![TestEntityBuilder::new(Archetype::Magic).with_effect(EffectKind::Stun)],
            vec![TestEntityBuilder::new(Archetype::Golem)],
        );
        let magic = EntityId(1);
        let mut rng = TurnRng::new_for_test(vec![]);
        let mut events = EventBus::new();

        assert!(begin_attack(&mut session, magic, &mut rng, &BattleConfig::default(), &mut events));
        assert!(session.entity(magic).unwrap().effects.has(EffectKind::Stun));
    }

    #[test]
    fn test_stunned_enemy_turn_is_consumed_by_controller() {
        // Arrange: odd rolls put the enemy side at the head of the queue.
        let session = create_test_session(
            vec![TestEntityBuilder::new(Archetype::Fire)],
            vec![TestEntityBuilder::new(Archetype::Golem).with_effect(EffectKind::Stun)],
        );
        let golem = EntityId(2);
        let mut controller = create_test_controller(session, TurnRng::repeating(vec![51]));
        assert_eq!(controller.session().turn_owner, Side::Enemy);

        // Act
        controller.step();

        // Assert: the turn was spent, the golem never left idle.
        let golem_entity = controller.session().entity(golem).unwrap();
        assert!(golem_entity.is_idle());
        assert!(!golem_entity.effects.has(EffectKind::Stun));
        assert_eq!(controller.session().turn_queue.len(), 3);

        // Next pass it acts normally.
        controller.step();
        assert_eq!(
            controller.session().entity(golem).unwrap().action_state(),
            ActionState::Attacking
        );
    }
}
