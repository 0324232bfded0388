use crate::battle::rng::BattleRng;
use crate::battle::state::{
    ActiveTerrain, ActiveWeather, BattleEvent, BattleState, DamageSource, EventBus,
    MoveFailureReason,
};
use crate::config::BattleRules;
use crate::errors::RuleFault;
use crate::side::{ActiveSideCondition, CreatureRef, SideId};
use crate::creature::VolatileState;
use schema::{ItemId, MajorStatus, MoveId, SideCondition, Stat, StatusKind, Terrain, Volatile, Weather};
use serde::{Deserialize, Serialize};

/// A staged state change. Hooks and the damage pipeline only ever propose
/// these; the controller applies them in one batch per action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingEffect {
    Damage {
        target: CreatureRef,
        amount: u16,
        source: DamageSource,
    },
    Heal {
        target: CreatureRef,
        amount: u16,
    },
    StatStage {
        target: CreatureRef,
        stat: Stat,
        delta: i8,
    },
    /// Passes through `StatusApply` hooks before it is applied.
    ApplyStatus {
        target: CreatureRef,
        status: StatusKind,
        source: Option<CreatureRef>,
    },
    CureStatus {
        target: CreatureRef,
    },
    TickSleep {
        target: CreatureRef,
    },
    RemoveVolatile {
        target: CreatureRef,
        volatile: Volatile,
    },
    TickVolatile {
        target: CreatureRef,
        volatile: Volatile,
    },
    DisableMove {
        target: CreatureRef,
        move_id: MoveId,
        turns: u8,
    },
    ConsumeItem {
        holder: CreatureRef,
    },
    SpendPp {
        user: CreatureRef,
        slot: usize,
    },
    RecordMove {
        user: CreatureRef,
        move_id: MoveId,
    },
    RememberIncomingMove {
        target: CreatureRef,
        move_id: MoveId,
    },
    MoveFailed {
        user: CreatureRef,
        reason: MoveFailureReason,
    },
    SetWeather {
        weather: Weather,
        turns: u8,
    },
    TickWeather,
    SetTerrain {
        terrain: Terrain,
        turns: u8,
    },
    TickTerrain,
    SetSideCondition {
        side: SideId,
        condition: SideCondition,
        turns: Option<u8>,
    },
    TickSideCondition {
        side: SideId,
        condition: SideCondition,
    },
    Switch {
        side: SideId,
        party_index: usize,
    },
    SpendBagItem {
        side: SideId,
        item: ItemId,
    },
    /// The holder immediately uses the move that just hit it.
    QueueCopiedMove {
        user: CreatureRef,
        move_id: MoveId,
        target: SideId,
    },
    /// Informational only; recorded in the event log as-is.
    Announce(BattleEvent),
}

/// Applies a batch of effects to `state` in order.
///
/// `observed` is the state the effects were computed against. Damage larger
/// than the HP its target had there is an inconsistent proposal. On error the
/// caller is expected to throw `state` away, so a batch is all-or-nothing.
pub fn apply_effect_batch(
    effects: &[PendingEffect],
    state: &mut BattleState,
    observed: &BattleState,
    rules: &BattleRules,
    rng: &mut BattleRng,
    bus: &mut EventBus,
) -> Result<(), RuleFault> {
    for effect in effects {
        apply_effect(effect, state, observed, rules, rng, bus)?;
    }
    Ok(())
}

fn creature_mut<'a>(
    state: &'a mut BattleState,
    target: CreatureRef,
) -> Result<&'a mut crate::creature::Creature, RuleFault> {
    state
        .creature_mut(target)
        .ok_or_else(|| RuleFault::Inconsistent(format!("no creature at {}", target)))
}

pub fn apply_effect(
    effect: &PendingEffect,
    state: &mut BattleState,
    observed: &BattleState,
    rules: &BattleRules,
    rng: &mut BattleRng,
    bus: &mut EventBus,
) -> Result<(), RuleFault> {
    match effect {
        PendingEffect::Damage {
            target,
            amount,
            source,
        } => {
            let remaining = observed
                .creature(*target)
                .map(|c| c.hp())
                .ok_or_else(|| RuleFault::Inconsistent(format!("no creature at {}", target)))?;
            if *amount > remaining {
                return Err(RuleFault::DamageExceedsHp {
                    amount: *amount,
                    remaining,
                });
            }
            let creature = creature_mut(state, *target)?;
            if creature.is_fainted() || *amount == 0 {
                return Ok(());
            }
            let dealt = (*amount).min(creature.hp());
            let fainted = creature.take_damage(dealt);
            bus.push(BattleEvent::DamageDealt {
                target: *target,
                amount: dealt,
                remaining_hp: creature.hp(),
                source: source.clone(),
            });
            if fainted {
                bus.push(BattleEvent::CreatureFainted { creature: *target });
            }
        }
        PendingEffect::Heal { target, amount } => {
            let creature = creature_mut(state, *target)?;
            let healed = creature.heal(*amount);
            if healed > 0 {
                bus.push(BattleEvent::Healed {
                    target: *target,
                    amount: healed,
                    new_hp: creature.hp(),
                });
            }
        }
        PendingEffect::StatStage {
            target,
            stat,
            delta,
        } => {
            let creature = creature_mut(state, *target)?;
            if creature.is_fainted() {
                return Ok(());
            }
            let old_stage = creature.stat_stages.get(*stat);
            let new_stage = creature.stat_stages.adjust(*stat, *delta);
            if old_stage != new_stage {
                bus.push(BattleEvent::StatStageChanged {
                    target: *target,
                    stat: *stat,
                    old_stage,
                    new_stage,
                });
            }
        }
        PendingEffect::ApplyStatus { target, status, .. } => {
            apply_status(*target, *status, state, rules, rng, bus)?;
        }
        PendingEffect::CureStatus { target } => {
            let creature = creature_mut(state, *target)?;
            if let Some(status) = creature.status.take() {
                creature.sleep_turns = 0;
                bus.push(BattleEvent::StatusCured {
                    target: *target,
                    status,
                });
            }
        }
        PendingEffect::TickSleep { target } => {
            let creature = creature_mut(state, *target)?;
            if creature.status == Some(MajorStatus::Asleep) {
                creature.sleep_turns = creature.sleep_turns.saturating_sub(1);
            }
        }
        PendingEffect::RemoveVolatile { target, volatile } => {
            let creature = creature_mut(state, *target)?;
            let before = creature.volatiles.len();
            creature.volatiles.retain(|v| v.kind != *volatile);
            if creature.volatiles.len() != before {
                bus.push(BattleEvent::VolatileEnded {
                    target: *target,
                    volatile: *volatile,
                });
            }
        }
        PendingEffect::TickVolatile { target, volatile } => {
            let creature = creature_mut(state, *target)?;
            let mut expired = false;
            if let Some(entry) = creature.volatiles.iter_mut().find(|v| v.kind == *volatile) {
                entry.turns_remaining = entry.turns_remaining.saturating_sub(1);
                expired = entry.turns_remaining == 0;
            }
            if expired {
                creature.volatiles.retain(|v| v.kind != *volatile);
                bus.push(BattleEvent::VolatileEnded {
                    target: *target,
                    volatile: *volatile,
                });
            }
        }
        PendingEffect::DisableMove {
            target,
            move_id,
            turns,
        } => {
            let creature = creature_mut(state, *target)?;
            if creature.is_fainted() || creature.has_volatile(Volatile::Disabled) {
                return Ok(());
            }
            creature.volatiles.push(VolatileState {
                kind: Volatile::Disabled,
                turns_remaining: *turns,
                move_id: Some(move_id.clone()),
            });
            bus.push(BattleEvent::StatusApplied {
                target: *target,
                status: StatusKind::Volatile(Volatile::Disabled),
            });
        }
        PendingEffect::ConsumeItem { holder } => {
            let creature = creature_mut(state, *holder)?;
            match creature.item.take() {
                Some(item) => bus.push(BattleEvent::ItemConsumed {
                    holder: *holder,
                    item,
                }),
                None => {
                    return Err(RuleFault::Inconsistent(format!(
                        "{} has no item to consume",
                        holder
                    )))
                }
            }
        }
        PendingEffect::SpendPp { user, slot } => {
            let creature = creature_mut(state, *user)?;
            let move_slot = creature.moves.get_mut(*slot).ok_or_else(|| {
                RuleFault::Inconsistent(format!("{} has no move slot {}", user, slot))
            })?;
            move_slot.pp = move_slot.pp.saturating_sub(1);
        }
        PendingEffect::RecordMove { user, move_id } => {
            creature_mut(state, *user)?.last_move = Some(move_id.clone());
        }
        PendingEffect::RememberIncomingMove { target, move_id } => {
            creature_mut(state, *target)?.last_move_against = Some(move_id.clone());
        }
        PendingEffect::MoveFailed { user, reason } => {
            bus.push(BattleEvent::MoveFailed {
                user: *user,
                reason: *reason,
            });
        }
        PendingEffect::SetWeather { weather, turns } => {
            if state.weather() != Some(*weather) {
                state.field.weather = Some(ActiveWeather {
                    weather: *weather,
                    turns_remaining: *turns,
                });
                bus.push(BattleEvent::WeatherStarted { weather: *weather });
            }
        }
        PendingEffect::TickWeather => {
            if let Some(active) = state.field.weather.as_mut() {
                active.turns_remaining = active.turns_remaining.saturating_sub(1);
                if active.turns_remaining == 0 {
                    let weather = active.weather;
                    state.field.weather = None;
                    bus.push(BattleEvent::WeatherEnded { weather });
                }
            }
        }
        PendingEffect::SetTerrain { terrain, turns } => {
            if state.terrain() != Some(*terrain) {
                state.field.terrain = Some(ActiveTerrain {
                    terrain: *terrain,
                    turns_remaining: *turns,
                });
                bus.push(BattleEvent::TerrainStarted { terrain: *terrain });
            }
        }
        PendingEffect::TickTerrain => {
            if let Some(active) = state.field.terrain.as_mut() {
                active.turns_remaining = active.turns_remaining.saturating_sub(1);
                if active.turns_remaining == 0 {
                    let terrain = active.terrain;
                    state.field.terrain = None;
                    bus.push(BattleEvent::TerrainEnded { terrain });
                }
            }
        }
        PendingEffect::SetSideCondition {
            side,
            condition,
            turns,
        } => {
            let side_state = state.side_mut(*side);
            if !side_state.has_condition(*condition) {
                side_state.conditions.push(ActiveSideCondition {
                    condition: *condition,
                    turns_remaining: *turns,
                });
                bus.push(BattleEvent::SideConditionStarted {
                    side: *side,
                    condition: *condition,
                });
            }
        }
        PendingEffect::TickSideCondition { side, condition } => {
            let side_state = state.side_mut(*side);
            let mut expired = false;
            if let Some(entry) = side_state
                .conditions
                .iter_mut()
                .find(|c| c.condition == *condition)
            {
                if let Some(turns) = entry.turns_remaining.as_mut() {
                    *turns = turns.saturating_sub(1);
                    expired = *turns == 0;
                }
            }
            if expired {
                side_state.conditions.retain(|c| c.condition != *condition);
                bus.push(BattleEvent::SideConditionEnded {
                    side: *side,
                    condition: *condition,
                });
            }
        }
        PendingEffect::Switch { side, party_index } => {
            let side_state = state.side_mut(*side);
            let incoming_fainted = side_state
                .party
                .get(*party_index)
                .map(|c| c.is_fainted())
                .ok_or_else(|| {
                    RuleFault::Inconsistent(format!(
                        "side {} has no party member {}",
                        side, party_index
                    ))
                })?;
            if incoming_fainted {
                return Err(RuleFault::Inconsistent(format!(
                    "cannot switch in fainted party member {}",
                    party_index
                )));
            }
            let from = side_state.active;
            side_state.active_creature_mut().reset_on_switch_out();
            side_state.active = *party_index;
            bus.push(BattleEvent::CreatureSwitched {
                side: *side,
                from,
                to: *party_index,
            });
        }
        PendingEffect::SpendBagItem { side, item } => {
            if !state.side_mut(*side).spend_bag_item(item) {
                return Err(RuleFault::Inconsistent(format!(
                    "side {} has no {} left",
                    side, item
                )));
            }
            bus.push(BattleEvent::BagItemUsed {
                side: *side,
                item: item.clone(),
            });
        }
        PendingEffect::QueueCopiedMove { .. } => {}
        PendingEffect::Announce(event) => bus.push(event.clone()),
    }
    Ok(())
}

fn apply_status(
    target: CreatureRef,
    status: StatusKind,
    state: &mut BattleState,
    rules: &BattleRules,
    rng: &mut BattleRng,
    bus: &mut EventBus,
) -> Result<(), RuleFault> {
    let creature = creature_mut(state, target)?;
    if creature.is_fainted() {
        return Ok(());
    }
    match status {
        StatusKind::Major(major) => {
            if creature.status.is_some() {
                return Ok(());
            }
            creature.status = Some(major);
            if major == MajorStatus::Asleep {
                creature.sleep_turns =
                    rng.range(rules.sleep_turns_min, rules.sleep_turns_max, "sleep duration");
            }
        }
        StatusKind::Volatile(volatile) => {
            if creature.has_volatile(volatile) {
                return Ok(());
            }
            let turns = match volatile {
                Volatile::Flinched => 1,
                Volatile::Confused => rng.range(
                    rules.confusion_turns_min,
                    rules.confusion_turns_max,
                    "confusion duration",
                ),
                Volatile::Disabled => {
                    return Err(RuleFault::Inconsistent(
                        "disable must name the move it locks out".to_string(),
                    ))
                }
            };
            creature.volatiles.push(VolatileState {
                kind: volatile,
                turns_remaining: turns,
                move_id: None,
            });
        }
    }
    bus.push(BattleEvent::StatusApplied { target, status });
    Ok(())
}

/// Whether `status` would take hold on the creature as the state stands.
pub fn status_can_apply(state: &BattleState, target: CreatureRef, status: StatusKind) -> bool {
    let Some(creature) = state.creature(target) else {
        return false;
    };
    if creature.is_fainted() {
        return false;
    }
    match status {
        StatusKind::Major(_) => creature.status.is_none(),
        StatusKind::Volatile(Volatile::Disabled) => false,
        StatusKind::Volatile(volatile) => !creature.has_volatile(volatile),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{battle_state, single};
    use pretty_assertions::assert_eq;

    fn commit(
        effects: &[PendingEffect],
        state: &mut BattleState,
    ) -> Result<Vec<BattleEvent>, RuleFault> {
        let observed = state.clone();
        let mut next = state.clone();
        let mut bus = EventBus::new();
        let mut rng = BattleRng::scripted(0, vec![2]);
        apply_effect_batch(effects, &mut next, &observed, &BattleRules::default(), &mut rng, &mut bus)?;
        *state = next;
        Ok(bus.into_events())
    }

    #[test]
    fn test_damage_above_observed_hp_is_a_fault() {
        let mut state = battle_state(
            single("emberfox", &["tackle"]),
            single("stonehorn", &["tackle"]),
        );
        let target = CreatureRef::new(SideId::B, 0);
        let hp = state.creature(target).unwrap().hp();

        let err = commit(
            &[PendingEffect::Damage {
                target,
                amount: hp + 1,
                source: DamageSource::Residual,
            }],
            &mut state,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RuleFault::DamageExceedsHp {
                amount: hp + 1,
                remaining: hp
            }
        );
        assert_eq!(state.creature(target).unwrap().hp(), hp);
    }

    #[test]
    fn test_stacked_damage_clamps_at_zero_and_faints_once() {
        let mut state = battle_state(
            single("emberfox", &["tackle"]),
            single("stonehorn", &["tackle"]),
        );
        let target = CreatureRef::new(SideId::A, 0);
        let hp = state.creature(target).unwrap().hp();
        let events = commit(
            &[
                PendingEffect::Damage {
                    target,
                    amount: hp,
                    source: DamageSource::Recoil,
                },
                PendingEffect::Damage {
                    target,
                    amount: 10,
                    source: DamageSource::Contact,
                },
            ],
            &mut state,
        )
        .unwrap();
        assert!(state.creature(target).unwrap().is_fainted());
        let faints = events
            .iter()
            .filter(|e| matches!(e, BattleEvent::CreatureFainted { .. }))
            .count();
        assert_eq!(faints, 1);
    }

    #[test]
    fn test_sleep_duration_drawn_on_apply() {
        let mut state = battle_state(
            single("emberfox", &["tackle"]),
            single("stonehorn", &["tackle"]),
        );
        let target = CreatureRef::new(SideId::B, 0);
        commit(
            &[PendingEffect::ApplyStatus {
                target,
                status: StatusKind::Major(MajorStatus::Asleep),
                source: None,
            }],
            &mut state,
        )
        .unwrap();
        let creature = state.creature(target).unwrap();
        assert_eq!(creature.status, Some(MajorStatus::Asleep));
        assert_eq!(creature.sleep_turns, 2);
    }

    #[test]
    fn test_second_major_status_does_not_stack() {
        let mut state = battle_state(
            single("emberfox", &["tackle"]),
            single("stonehorn", &["tackle"]),
        );
        let target = CreatureRef::new(SideId::B, 0);
        state.creature_mut(target).unwrap().status = Some(MajorStatus::Burned);
        let events = commit(
            &[PendingEffect::ApplyStatus {
                target,
                status: StatusKind::Major(MajorStatus::Paralyzed),
                source: None,
            }],
            &mut state,
        )
        .unwrap();
        assert!(events.is_empty());
        assert_eq!(state.creature(target).unwrap().status, Some(MajorStatus::Burned));
    }

    #[test]
    fn test_field_conditions_tick_out() {
        let mut state = battle_state(
            single("emberfox", &["tackle"]),
            single("stonehorn", &["tackle"]),
        );
        commit(
            &[
                PendingEffect::SetWeather {
                    weather: Weather::Rain,
                    turns: 2,
                },
                PendingEffect::SetSideCondition {
                    side: SideId::A,
                    condition: SideCondition::Reflect,
                    turns: Some(1),
                },
            ],
            &mut state,
        )
        .unwrap();
        assert_eq!(state.weather(), Some(Weather::Rain));

        let events = commit(
            &[
                PendingEffect::TickWeather,
                PendingEffect::TickSideCondition {
                    side: SideId::A,
                    condition: SideCondition::Reflect,
                },
            ],
            &mut state,
        )
        .unwrap();
        assert_eq!(state.weather(), Some(Weather::Rain));
        assert!(!state.side(SideId::A).has_condition(SideCondition::Reflect));
        assert_eq!(
            events,
            vec![BattleEvent::SideConditionEnded {
                side: SideId::A,
                condition: SideCondition::Reflect
            }]
        );

        commit(&[PendingEffect::TickWeather], &mut state).unwrap();
        assert_eq!(state.weather(), None);
    }
}
