#[cfg(test)]
mod tests {
    use crate::battle::hooks::{HookContext, HookRegistry, HookSource, SourceKind, StageData};
    use crate::battle::rng::BattleRng;
    use crate::battle::effects::PendingEffect;
    use crate::battle::state::{ActiveWeather, BattleEvent, DamageSource, MoveFailureReason};
    use crate::battle::tests::common::{
        battle_state, play_turn, single, single_with, use_move, TestBattle,
    };
    use crate::config::BattleRules;
    use crate::creature::VolatileState;
    use crate::dex::StaticDex;
    use crate::side::{CreatureRef, SideId};
    use pretty_assertions::assert_eq;
    use schema::{
        ConditionRef, ItemId, MajorStatus, MoveCategory, MoveId, Stat, Type, Volatile, Weather,
    };

    fn volatile(kind: Volatile) -> VolatileState {
        VolatileState {
            kind,
            turns_remaining: 3,
            move_id: None,
        }
    }

    #[test]
    fn test_equal_priority_hooks_run_status_ability_item_field() {
        // Arrange: a burned, item-holding attacker in harsh sunlight
        let mut state = battle_state(
            single_with("emberfox", &["ember"], "life_orb"),
            single("leafling", &["growl"]),
        );
        state.active_mut(SideId::A).status = Some(MajorStatus::Burned);
        state.field.weather = Some(ActiveWeather {
            weather: Weather::Sun,
            turns_remaining: 5,
        });
        let registry = HookRegistry::build(&state, &StaticDex).unwrap();
        let rules = BattleRules::default();
        let mut rng = BattleRng::from_seed(1);
        let mut ctx = HookContext::new(
            &state,
            StageData::DamageCalc {
                move_type: Type::Fire,
                category: MoveCategory::Special,
                effectiveness: 2.0,
                critical: false,
                multiplier: 1.0,
            },
            &mut rng,
            &rules,
        )
        .with_actor(SideId::A)
        .with_target(SideId::B)
        .with_move(MoveId::from("ember"));

        // Act
        let sources: Vec<HookSource> = registry
            .applicable(&ctx)
            .into_iter()
            .map(|reg| reg.source.clone())
            .collect();
        registry.invoke(&mut ctx).unwrap();

        // Assert
        assert_eq!(
            sources.iter().map(HookSource::kind).collect::<Vec<_>>(),
            vec![
                SourceKind::Status,
                SourceKind::Ability,
                SourceKind::Item,
                SourceKind::Field,
                SourceKind::Field,
            ]
        );
        assert_eq!(sources[0], HookSource::Status(ConditionRef::Major(MajorStatus::Burned)));
        assert_eq!(sources[2], HookSource::Item(ItemId::from("life_orb")));
        let StageData::DamageCalc { multiplier, .. } = ctx.data else {
            panic!("stage data changed shape");
        };
        // Burn leaves special moves alone; life orb and sun both apply.
        assert!((multiplier - 1.95).abs() < 1e-9, "multiplier was {}", multiplier);
    }

    #[test]
    fn test_higher_priority_runs_first_and_cancellation_stops_the_chain() {
        // Arrange: asleep, flinched and confused all at once
        let mut state = battle_state(
            single("emberfox", &["tackle"]),
            single("stonehorn", &["tackle"]),
        );
        {
            let creature = state.active_mut(SideId::A);
            creature.status = Some(MajorStatus::Asleep);
            creature.sleep_turns = 2;
            creature.volatiles.push(volatile(Volatile::Confused));
            creature.volatiles.push(volatile(Volatile::Flinched));
        }
        let registry = HookRegistry::build(&state, &StaticDex).unwrap();
        let rules = BattleRules::default();
        let mut rng = BattleRng::scripted(1, vec![1]);
        let mut ctx = HookContext::new(&state, StageData::BeforeMove { cancelled: None }, &mut rng, &rules)
            .with_actor(SideId::A)
            .with_target(SideId::B)
            .with_move(MoveId::from("tackle"));

        // Act
        let order: Vec<HookSource> = registry
            .applicable(&ctx)
            .into_iter()
            .map(|reg| reg.source.clone())
            .collect();
        let fired = registry.invoke(&mut ctx).unwrap();

        // Assert
        assert_eq!(
            order,
            vec![
                HookSource::Status(ConditionRef::Major(MajorStatus::Asleep)),
                HookSource::Status(ConditionRef::Volatile(Volatile::Flinched)),
                HookSource::Status(ConditionRef::Volatile(Volatile::Confused)),
            ]
        );
        assert_eq!(fired.len(), 1, "only the sleep hook should have fired");
        assert_eq!(
            ctx.data,
            StageData::BeforeMove {
                cancelled: Some(MoveFailureReason::Asleep)
            }
        );
        assert_eq!(
            ctx.effects,
            vec![PendingEffect::TickSleep {
                target: CreatureRef::new(SideId::A, 0)
            }],
            "the sleep counter still ticks"
        );
        assert_eq!(ctx.rng.remaining_script(), 1, "confusion never rolled");
    }

    #[test]
    fn test_end_of_turn_hooks_are_ordered_across_both_sides() {
        // Arrange: the faster side holds leftovers, the slower one is burned
        let mut battle = TestBattle::new(
            single_with("emberfox", &["growl"], "leftovers"),
            single("stonehorn", &["growl"]),
        )
        .build();
        battle.state_mut().active_mut(SideId::A).set_hp(60);
        battle.state_mut().active_mut(SideId::B).status = Some(MajorStatus::Burned);

        // Act
        let report = play_turn(&mut battle, use_move(0, SideId::B), use_move(0, SideId::A));

        // Assert: status hooks outrank item hooks whatever the owner's speed
        let burn = report.events.iter().position(|event| {
            *event
                == BattleEvent::DamageDealt {
                    target: CreatureRef::new(SideId::B, 0),
                    amount: 9,
                    remaining_hp: 141,
                    source: DamageSource::Residual,
                }
        });
        let heal = report.events.iter().position(|event| {
            *event
                == BattleEvent::Healed {
                    target: CreatureRef::new(SideId::A, 0),
                    amount: 7,
                    new_hp: 67,
                }
        });
        let (Some(burn), Some(heal)) = (burn, heal) else {
            panic!("missing residual events: {:?}", report.events);
        };
        assert!(burn < heal, "burn at {}, leftovers at {}", burn, heal);
        assert!(!report.is_errored());
    }

    #[test]
    fn test_same_kind_hooks_follow_owner_speed() {
        // Arrange: attacker and defender both hold an after-damage item
        let mut state = battle_state(
            single_with("emberfox", &["tackle"], "life_orb"),
            single_with("stonehorn", &["tackle"], "rocky_helmet"),
        );
        let registry = HookRegistry::build(&state, &StaticDex).unwrap();
        let rules = BattleRules::default();
        let after_damage = StageData::AfterDamage {
            move_type: Type::Normal,
            damage: 10,
            contact: true,
            critical: false,
            copied: false,
        };
        let item_order = |state: &crate::battle::state::BattleState| -> Vec<HookSource> {
            let mut rng = BattleRng::from_seed(3);
            let ctx = HookContext::new(state, after_damage.clone(), &mut rng, &rules)
                .with_actor(SideId::A)
                .with_target(SideId::B)
                .with_move(MoveId::from("tackle"));
            registry
                .applicable(&ctx)
                .into_iter()
                .map(|reg| reg.source.clone())
                .collect()
        };

        // Act
        let faster_attacker = item_order(&state);
        state.active_mut(SideId::B).stat_stages.adjust(Stat::Speed, 6);
        let faster_defender = item_order(&state);

        // Assert
        let life_orb = HookSource::Item(ItemId::from("life_orb"));
        let helmet = HookSource::Item(ItemId::from("rocky_helmet"));
        assert_eq!(faster_attacker, vec![life_orb.clone(), helmet.clone()]);
        assert_eq!(faster_defender, vec![helmet, life_orb]);
    }

    #[test]
    fn test_fully_tied_hooks_keep_registration_order() {
        let mut state = battle_state(
            single("tidalotter", &["water_gun"]),
            single("emberfox", &["ember"]),
        );
        state.field.weather = Some(ActiveWeather {
            weather: Weather::Rain,
            turns_remaining: 5,
        });
        let registry = HookRegistry::build(&state, &StaticDex).unwrap();
        let rules = BattleRules::default();
        let mut rng = BattleRng::from_seed(5);
        let ctx = HookContext::new(
            &state,
            StageData::DamageCalc {
                move_type: Type::Water,
                category: MoveCategory::Special,
                effectiveness: 2.0,
                critical: false,
                multiplier: 1.0,
            },
            &mut rng,
            &rules,
        )
        .with_actor(SideId::A)
        .with_target(SideId::B)
        .with_move(MoveId::from("water_gun"));

        let orders: Vec<usize> = registry
            .applicable(&ctx)
            .into_iter()
            .filter(|reg| reg.source == HookSource::Field(ConditionRef::Weather(Weather::Rain)))
            .map(|reg| reg.order)
            .collect();

        assert_eq!(orders.len(), 2);
        assert!(orders[0] < orders[1]);
    }
}
