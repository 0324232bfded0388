#[cfg(test)]
mod tests {
    use crate::battle::controller::TurnFault;
    use crate::battle::state::{BattleEvent, BattlePhase};
    use crate::battle::tests::common::{
        play_turn, single, single_with, use_move, PatchedDex, TestBattle,
    };
    use crate::creature::CreatureSpec;
    use crate::errors::RuleFault;
    use crate::side::{PartySpec, SideId};
    use pretty_assertions::assert_eq;
    use schema::{
        AbilityData, AbilityId, HookBinding, HookEffect, HookRole, HookStage, ItemData, ItemId,
        Stat,
    };

    fn leftovers_bound_to(stage: HookStage, role: HookRole) -> ItemData {
        ItemData {
            id: ItemId::from("leftovers"),
            name: "Leftovers".to_string(),
            hooks: vec![HookBinding {
                stage,
                priority: 0,
                role,
                effect: HookEffect::HealFraction {
                    numerator: 1,
                    denominator: 16,
                },
            }],
            bag_use: None,
        }
    }

    fn ability(id: &str, binding: HookBinding) -> AbilityData {
        AbilityData {
            id: AbilityId::from(id),
            name: id.to_string(),
            hooks: vec![binding],
        }
    }

    #[test]
    fn test_faulting_action_is_dropped_and_earlier_actions_stay() {
        // Arrange: the slower side's held item is bound to the wrong stage
        let tables = PatchedDex::default()
            .with_item(leftovers_bound_to(HookStage::DamageCalc, HookRole::Actor));
        let mut battle = TestBattle::new(
            single_with("stonehorn", &["tackle"], "leftovers"),
            single("emberfox", &["tackle"]),
        )
        .with_seed(4)
        .with_tables(tables)
        .build();

        // Act
        let report = play_turn(&mut battle, use_move(0, SideId::B), use_move(0, SideId::A));

        // Assert: one fault, charged to side A
        assert!(report.is_errored());
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].side, Some(SideId::A));
        assert!(matches!(
            report.faults[0].fault,
            RuleFault::StageMismatch {
                stage: HookStage::DamageCalc,
                ..
            }
        ));
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, BattleEvent::ActionAborted { side: Some(SideId::A), .. })));

        // Side B moved first and its hit stays committed
        let state = battle.state();
        assert!(state.active(SideId::A).hp() < 150);
        // Side A's whole action was discarded, PP included
        assert_eq!(state.active(SideId::B).hp(), 120);
        let slot = &state.active(SideId::A).moves[0];
        assert_eq!(slot.pp, slot.max_pp);

        // The battle carries on
        assert_eq!(battle.phase(), BattlePhase::AwaitingActions);
        assert_eq!(battle.turn(), 2);
    }

    #[test]
    fn test_end_of_turn_fault_is_reported_after_moves_commit() {
        // Arrange
        let tables = PatchedDex::default().with_ability(ability(
            "static",
            HookBinding {
                stage: HookStage::EndOfTurn,
                priority: 0,
                role: HookRole::Actor,
                effect: HookEffect::TickDuration,
            },
        ));
        let mut battle = TestBattle::new(
            single("voltmouse", &["tackle"]),
            single("stonehorn", &["growl"]),
        )
        .with_seed(2)
        .with_tables(tables)
        .build();

        // Act
        let report = play_turn(&mut battle, use_move(0, SideId::B), use_move(0, SideId::A));

        // Assert
        assert_eq!(report.faults.len(), 1);
        assert!(matches!(
            &report.faults[0],
            TurnFault {
                side: Some(SideId::A),
                fault: RuleFault::Inconsistent(_)
            }
        ));
        assert!(battle.state().active(SideId::B).hp() < 150);
        assert_eq!(
            battle.state().active(SideId::A).stat_stages.get(Stat::Attack),
            -2,
            "intimidate and growl both landed"
        );
    }

    #[test]
    fn test_ambient_hook_without_a_participant_faults() {
        let tables = PatchedDex::default()
            .with_item(leftovers_bound_to(HookStage::EndOfTurn, HookRole::Owner));
        let mut battle = TestBattle::new(
            single_with("emberfox", &["swords_dance"], "leftovers"),
            single("leafling", &["growl"]),
        )
        .with_tables(tables)
        .build();

        let report = play_turn(&mut battle, use_move(0, SideId::A), use_move(0, SideId::A));

        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].side, None);
        assert!(matches!(
            report.faults[0].fault,
            RuleFault::MissingParticipant {
                stage: HookStage::EndOfTurn,
                ..
            }
        ));
    }

    #[test]
    fn test_switch_in_fault_is_kept_with_the_opening() {
        // Arrange
        let tables = PatchedDex::default().with_ability(ability(
            "drought",
            HookBinding {
                stage: HookStage::SwitchIn,
                priority: 0,
                role: HookRole::Actor,
                effect: HookEffect::HealFraction {
                    numerator: 1,
                    denominator: 16,
                },
            },
        ));
        let party_a = PartySpec::new(
            "Faulty",
            vec![CreatureSpec::new("emberfox", 50, &["tackle"]).with_ability("drought")],
        );

        // Act
        let mut battle = TestBattle::new(party_a, single("tidalotter", &["tackle"]))
            .with_tables(tables)
            .build();

        // Assert
        assert_eq!(battle.opening_faults().len(), 1);
        assert_eq!(battle.opening_faults()[0].side, Some(SideId::A));
        assert_eq!(battle.state().weather(), None);
        let report = play_turn(&mut battle, use_move(0, SideId::B), use_move(0, SideId::A));
        assert_eq!(report.turn, 1);
    }
}
