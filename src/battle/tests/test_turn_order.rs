#[cfg(test)]
mod tests {
    use crate::battle::hooks::HookRegistry;
    use crate::battle::rng::BattleRng;
    use crate::battle::state::{Action, ActiveWeather, BattleState};
    use crate::battle::tests::common::{battle_state, single, single_with, switch_to, use_move};
    use crate::battle::turn_order::{effective_speed, resolve_order};
    use crate::config::BattleRules;
    use crate::creature::CreatureSpec;
    use crate::dex::StaticDex;
    use crate::side::{PartySpec, SideId};
    use ordered_float::OrderedFloat;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use schema::{MajorStatus, Weather};

    fn order_of(state: &BattleState, actions: &[(SideId, Action)], seed: u64) -> Vec<SideId> {
        let registry = HookRegistry::build(state, &StaticDex).unwrap();
        let rules = BattleRules::default();
        let mut rng = BattleRng::from_seed(seed);
        let order = resolve_order(actions, state, &registry, &StaticDex, &rules, &mut rng);
        assert!(order.faults.is_empty(), "unexpected faults: {:?}", order.faults);
        order.actions.iter().map(|a| a.side).collect()
    }

    fn both_attack() -> Vec<(SideId, Action)> {
        vec![
            (SideId::A, use_move(0, SideId::B)),
            (SideId::B, use_move(0, SideId::A)),
        ]
    }

    #[rstest]
    #[case("voltmouse", "emberfox", vec![SideId::A, SideId::B])]
    #[case("stonehorn", "emberfox", vec![SideId::B, SideId::A])]
    #[case("leafling", "tidalotter", vec![SideId::B, SideId::A])]
    fn test_faster_creature_moves_first(
        #[case] species_a: &str,
        #[case] species_b: &str,
        #[case] expected: Vec<SideId>,
    ) {
        let state = battle_state(single(species_a, &["tackle"]), single(species_b, &["tackle"]));
        assert_eq!(order_of(&state, &both_attack(), 1), expected);
    }

    #[test]
    fn test_switch_precedes_any_move() {
        // Arrange: the slower side switches, the faster side uses a priority move
        let party_a = PartySpec::new(
            "Slow",
            vec![
                CreatureSpec::new("stonehorn", 50, &["tackle"]),
                CreatureSpec::new("leafling", 50, &["growl"]),
            ],
        );
        let state = battle_state(party_a, single("voltmouse", &["quick_attack"]));
        let actions = vec![
            (SideId::A, switch_to(1)),
            (SideId::B, use_move(0, SideId::A)),
        ];

        // Act / Assert
        assert_eq!(order_of(&state, &actions, 1), vec![SideId::A, SideId::B]);
    }

    #[test]
    fn test_bag_item_precedes_moves() {
        let party_a = single("stonehorn", &["tackle"]).with_bag_item("potion", 1);
        let mut state = battle_state(party_a, single("voltmouse", &["quick_attack"]));
        state.active_mut(SideId::A).set_hp(10);
        let actions = vec![
            (
                SideId::A,
                Action::UseItem {
                    item: schema::ItemId::from("potion"),
                },
            ),
            (SideId::B, use_move(0, SideId::A)),
        ];

        assert_eq!(order_of(&state, &actions, 1), vec![SideId::A, SideId::B]);
    }

    #[test]
    fn test_move_priority_beats_speed() {
        let state = battle_state(
            single("stonehorn", &["quick_attack"]),
            single("voltmouse", &["tackle"]),
        );
        assert_eq!(order_of(&state, &both_attack(), 1), vec![SideId::A, SideId::B]);
    }

    #[test]
    fn test_paralysis_halves_effective_speed() {
        // Arrange
        let mut state = battle_state(single("voltmouse", &["tackle"]), single("emberfox", &["tackle"]));
        state.active_mut(SideId::A).status = Some(MajorStatus::Paralyzed);
        let registry = HookRegistry::build(&state, &StaticDex).unwrap();
        let rules = BattleRules::default();
        let mut rng = BattleRng::from_seed(1);

        // Act
        let speed = effective_speed(&state, &registry, &rules, &mut rng, SideId::A).unwrap();

        // Assert
        assert_eq!(speed, OrderedFloat(57.5));
        assert_eq!(order_of(&state, &both_attack(), 1), vec![SideId::B, SideId::A]);
        assert_eq!(state.active(SideId::A).stats.speed, 115, "the stat itself is untouched");
    }

    #[test]
    fn test_swift_swim_only_in_rain() {
        let mut state = battle_state(single("tidalotter", &["tackle"]), single("emberfox", &["tackle"]));
        assert_eq!(order_of(&state, &both_attack(), 1), vec![SideId::B, SideId::A]);

        state.field.weather = Some(ActiveWeather {
            weather: Weather::Rain,
            turns_remaining: 5,
        });
        assert_eq!(order_of(&state, &both_attack(), 1), vec![SideId::A, SideId::B]);
    }

    #[test]
    fn test_choice_scarf_scales_speed() {
        let state = battle_state(
            single_with("stonehorn", &["tackle"], "choice_scarf"),
            single("leafling", &["tackle"]),
        );
        assert_eq!(order_of(&state, &both_attack(), 1), vec![SideId::A, SideId::B]);
    }

    fn mirror_match() -> BattleState {
        battle_state(single("emberfox", &["tackle"]), single("emberfox", &["tackle"]))
    }

    #[test]
    fn test_speed_ties_are_deterministic_per_seed() {
        let state = mirror_match();
        for seed in 0..50 {
            assert_eq!(
                order_of(&state, &both_attack(), seed),
                order_of(&state, &both_attack(), seed),
                "seed {} resolved differently",
                seed
            );
        }
    }

    #[test]
    fn test_speed_ties_ignore_submission_order() {
        let state = mirror_match();
        let reversed: Vec<(SideId, Action)> = both_attack().into_iter().rev().collect();
        for seed in 0..50 {
            assert_eq!(
                order_of(&state, &both_attack(), seed),
                order_of(&state, &reversed, seed)
            );
        }
    }

    #[test]
    fn test_speed_ties_split_evenly_across_seeds() {
        let state = mirror_match();
        let a_first = (0..400)
            .filter(|seed| order_of(&state, &both_attack(), *seed)[0] == SideId::A)
            .count();
        assert!(
            (140..=260).contains(&a_first),
            "side A went first in {} of 400 ties",
            a_first
        );
    }
}
