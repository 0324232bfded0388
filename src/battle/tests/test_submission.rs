#[cfg(test)]
mod tests {
    use crate::battle::controller::BattleController;
    use crate::battle::state::{Action, BattlePhase};
    use crate::battle::tests::common::{single, use_move, TestBattle};
    use crate::errors::{BattleError, ValidationError};
    use crate::side::SideId;
    use pretty_assertions::assert_eq;

    fn battle() -> BattleController {
        TestBattle::new(
            single("emberfox", &["tackle", "growl"]),
            single("tidalotter", &["tackle"]),
        )
        .with_seed(17)
        .build()
    }

    #[test]
    fn test_stale_turn_is_rejected() {
        let mut battle = battle();
        assert_eq!(
            battle.submit(SideId::A, 2, use_move(0, SideId::B)),
            Err(BattleError::StaleTurn {
                submitted: 2,
                current: 1
            })
        );
        assert_eq!(battle.pending_action(SideId::A), None);
    }

    #[test]
    fn test_submission_can_be_replaced_until_locked() {
        // Arrange
        let mut battle = battle();

        // Act
        battle.submit(SideId::A, 1, use_move(0, SideId::B)).unwrap();
        battle.submit(SideId::A, 1, use_move(1, SideId::B)).unwrap();

        // Assert
        assert_eq!(battle.pending_action(SideId::A), Some(&use_move(1, SideId::B)));
    }

    #[test]
    fn test_both_submissions_lock_the_turn() {
        let mut battle = battle();
        battle.submit(SideId::A, 1, use_move(0, SideId::B)).unwrap();
        battle.submit(SideId::B, 1, use_move(0, SideId::A)).unwrap();

        assert_eq!(
            battle.submit(SideId::A, 1, use_move(1, SideId::B)),
            Err(BattleError::TurnLocked(1))
        );
        assert_eq!(battle.retract(SideId::B), Err(BattleError::TurnLocked(1)));
        assert_eq!(battle.pending_action(SideId::A), Some(&use_move(0, SideId::B)));
    }

    #[test]
    fn test_retract_clears_a_pending_action() {
        let mut battle = battle();
        battle.submit(SideId::A, 1, use_move(0, SideId::B)).unwrap();

        assert_eq!(battle.retract(SideId::A), Ok(Some(use_move(0, SideId::B))));
        assert_eq!(battle.pending_action(SideId::A), None);
        assert_eq!(battle.retract(SideId::A), Ok(None));
    }

    #[test]
    fn test_illegal_action_leaves_state_untouched() {
        // Arrange
        let mut battle = battle();
        let before = battle.state().clone();

        // Act
        let result = battle.submit(SideId::A, 1, use_move(5, SideId::B));

        // Assert
        assert_eq!(
            result,
            Err(BattleError::Validation(ValidationError::NoSuchMoveSlot(5)))
        );
        assert_eq!(battle.state(), &before);
        assert_eq!(battle.pending_action(SideId::A), None);
    }

    #[test]
    fn test_resolving_needs_both_sides() {
        let mut battle = battle();
        battle.submit(SideId::A, 1, use_move(0, SideId::B)).unwrap();

        assert_eq!(
            battle.resolve_turn(),
            Err(BattleError::NotReady {
                turn: 1,
                side: SideId::B
            })
        );
        assert_eq!(battle.phase(), BattlePhase::AwaitingActions);
    }

    #[test]
    fn test_resolution_advances_the_turn_and_clears_submissions() {
        // Arrange
        let mut battle = battle();
        battle.submit(SideId::A, 1, use_move(0, SideId::B)).unwrap();
        battle.submit(SideId::B, 1, use_move(0, SideId::A)).unwrap();

        // Act
        let report = battle.resolve_turn().unwrap();

        // Assert
        assert_eq!(report.turn, 1);
        assert_eq!(battle.turn(), 2);
        assert_eq!(battle.phase(), BattlePhase::AwaitingActions);
        assert_eq!(battle.pending_action(SideId::A), None);
        assert_eq!(battle.pending_action(SideId::B), None);
        assert_eq!(
            battle.record().turns.len(),
            1,
            "resolved turns are recorded for replay"
        );
        assert!(battle
            .submit(SideId::A, 2, Action::UseMove {
                move_slot: 1,
                target: SideId::B
            })
            .is_ok());
    }
}
