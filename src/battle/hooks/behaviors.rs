//! Callbacks behind each declarative hook effect.
//!
//! A callback reads the views in its context, adjusts the stage data and
//! proposes pending effects. It never sees the battle state. A callback whose
//! effect does not understand the context's stage faults instead of guessing.

use super::context::{HookContext, StageData};
use super::{HookOwner, HookRegistration, HookSource};
use crate::battle::damage::base_damage;
use crate::battle::effects::PendingEffect;
use crate::battle::state::{BattleEvent, DamageSource, MoveFailureReason};
use crate::battle::stats::apply_stage;
use crate::errors::RuleFault;
use crate::side::{CreatureRef, SideId};
use schema::{ConditionRef, HookEffect, MajorStatus, RecoilBasis, Stat, StatusKind, Volatile};

pub fn run(reg: &HookRegistration, ctx: &mut HookContext) -> Result<(), RuleFault> {
    match &reg.effect {
        HookEffect::ScaleSpeed { percent, weather } => {
            let weather_ok = weather.map_or(true, |w| ctx.field.weather == Some(w));
            let StageData::ModifySpeed { multiplier } = &mut ctx.data else {
                return Err(mismatch(reg, ctx));
            };
            if weather_ok {
                *multiplier *= *percent as f64 / 100.0;
            }
        }

        HookEffect::PriorityWhenSlower { boost, consume } => {
            let holder = owner_creature(reg, ctx)?;
            let StageData::TurnOrder {
                moves_after_target,
                priority_boost,
            } = &mut ctx.data
            else {
                return Err(mismatch(reg, ctx));
            };
            if !*moves_after_target {
                return Ok(());
            }
            *priority_boost += *boost;
            if *consume {
                consume_held_item(reg, holder, ctx)?;
            }
            ctx.effects.push(PendingEffect::Announce(BattleEvent::PriorityBoosted {
                creature: holder,
                boost: *boost,
            }));
        }

        HookEffect::SkipWhileAsleep => {
            let actor = actor_side(reg, ctx)?;
            let view = ctx.view(actor);
            let (creature, sleep_turns) = (view.creature, view.sleep_turns);
            let StageData::BeforeMove { cancelled } = &mut ctx.data else {
                return Err(mismatch(reg, ctx));
            };
            if sleep_turns == 0 {
                ctx.effects.push(PendingEffect::CureStatus { target: creature });
            } else {
                *cancelled = Some(MoveFailureReason::Asleep);
                ctx.effects.push(PendingEffect::TickSleep { target: creature });
            }
        }

        HookEffect::ThawChance { percent } => {
            let actor = actor_side(reg, ctx)?;
            let creature = ctx.view(actor).creature;
            if !matches!(ctx.data, StageData::BeforeMove { .. }) {
                return Err(mismatch(reg, ctx));
            }
            if ctx.rng.chance(*percent, "thaw") {
                ctx.effects.push(PendingEffect::CureStatus { target: creature });
            } else {
                cancel(ctx, MoveFailureReason::Frozen);
            }
        }

        HookEffect::FullParalysis { percent } => {
            if !matches!(ctx.data, StageData::BeforeMove { .. }) {
                return Err(mismatch(reg, ctx));
            }
            if ctx.rng.chance(*percent, "full paralysis") {
                cancel(ctx, MoveFailureReason::FullyParalyzed);
            }
        }

        HookEffect::Flinch => {
            if !matches!(ctx.data, StageData::BeforeMove { .. }) {
                return Err(mismatch(reg, ctx));
            }
            cancel(ctx, MoveFailureReason::Flinched);
        }

        HookEffect::ConfusionSelfHit { percent, power } => {
            let actor = actor_side(reg, ctx)?;
            if !matches!(ctx.data, StageData::BeforeMove { .. }) {
                return Err(mismatch(reg, ctx));
            }
            let view = ctx.view(actor).clone();
            let turns = view
                .volatile(Volatile::Confused)
                .map_or(0, |v| v.turns_remaining);
            if turns <= 1 {
                ctx.effects.push(PendingEffect::RemoveVolatile {
                    target: view.creature,
                    volatile: Volatile::Confused,
                });
                return Ok(());
            }
            ctx.effects.push(PendingEffect::TickVolatile {
                target: view.creature,
                volatile: Volatile::Confused,
            });
            if ctx.rng.chance(*percent, "confusion self-hit") {
                let attack = apply_stage(view.stats.attack, view.stat_stages.get(Stat::Attack));
                let defense = apply_stage(view.stats.defense, view.stat_stages.get(Stat::Defense));
                let amount = base_damage(view.level, *power, attack, defense).min(view.hp);
                ctx.effects.push(PendingEffect::Damage {
                    target: view.creature,
                    amount,
                    source: DamageSource::Confusion,
                });
                cancel(ctx, MoveFailureReason::HurtItselfInConfusion);
            }
        }

        HookEffect::BlockDisabledMove => {
            let actor = actor_side(reg, ctx)?;
            if !matches!(ctx.data, StageData::BeforeMove { .. }) {
                return Err(mismatch(reg, ctx));
            }
            let disabled = ctx
                .view(actor)
                .volatile(Volatile::Disabled)
                .and_then(|v| v.move_id.clone());
            if disabled.is_some() && disabled == ctx.move_id {
                cancel(ctx, MoveFailureReason::Disabled);
            }
        }

        HookEffect::RaiseCritStage { stages } => {
            let StageData::CritChance { stage } = &mut ctx.data else {
                return Err(mismatch(reg, ctx));
            };
            *stage = stage.saturating_add(*stages);
        }

        HookEffect::BoostMoveType {
            move_type,
            percent,
            below_hp_percent,
        } => {
            let holder = owner_creature(reg, ctx)?;
            let view = ctx.view(holder.side);
            let hp_ok = below_hp_percent.map_or(true, |threshold| {
                view.hp as u32 * 100 <= view.max_hp as u32 * threshold as u32
            });
            let StageData::DamageCalc {
                move_type: used_type,
                multiplier,
                ..
            } = &mut ctx.data
            else {
                return Err(mismatch(reg, ctx));
            };
            if hp_ok && used_type == move_type {
                *multiplier *= *percent as f64 / 100.0;
            }
        }

        HookEffect::ScaleTypeDamage { move_type, percent } => {
            let StageData::DamageCalc {
                move_type: used_type,
                multiplier,
                ..
            } = &mut ctx.data
            else {
                return Err(mismatch(reg, ctx));
            };
            if used_type == move_type {
                *multiplier *= *percent as f64 / 100.0;
            }
        }

        HookEffect::ScaleCategoryDamage {
            category,
            percent,
            bypassed_by_crit,
        } => {
            let StageData::DamageCalc {
                category: used_category,
                critical,
                multiplier,
                ..
            } = &mut ctx.data
            else {
                return Err(mismatch(reg, ctx));
            };
            if used_category == category && !(*bypassed_by_crit && *critical) {
                *multiplier *= *percent as f64 / 100.0;
            }
        }

        HookEffect::ResistSuperEffective { move_type, percent } => {
            let holder = owner_creature(reg, ctx)?;
            let StageData::DamageCalc {
                move_type: used_type,
                effectiveness,
                multiplier,
                ..
            } = &mut ctx.data
            else {
                return Err(mismatch(reg, ctx));
            };
            if used_type == move_type && *effectiveness > 1.0 {
                *multiplier *= *percent as f64 / 100.0;
                consume_held_item(reg, holder, ctx)?;
            }
        }

        HookEffect::ScaleAllDamage { percent } => {
            let StageData::DamageCalc { multiplier, .. } = &mut ctx.data else {
                return Err(mismatch(reg, ctx));
            };
            *multiplier *= *percent as f64 / 100.0;
        }

        HookEffect::RecoilFraction {
            numerator,
            denominator,
            basis,
        } => {
            let actor = actor_side(reg, ctx)?;
            let StageData::AfterDamage { damage, .. } = ctx.data else {
                return Err(mismatch(reg, ctx));
            };
            let view = ctx.view(actor);
            if damage == 0 || view.fainted {
                return Ok(());
            }
            let basis_amount = match basis {
                RecoilBasis::DamageDealt => damage,
                RecoilBasis::MaxHp => view.max_hp,
            };
            let amount = fraction(basis_amount, *numerator, *denominator).min(view.hp);
            let target = view.creature;
            ctx.effects.push(PendingEffect::Damage {
                target,
                amount,
                source: DamageSource::Recoil,
            });
        }

        HookEffect::ContactStatus { status, percent } => {
            let holder = owner_creature(reg, ctx)?;
            let attacker = actor_side(reg, ctx)?;
            let StageData::AfterDamage {
                contact, damage, ..
            } = ctx.data
            else {
                return Err(mismatch(reg, ctx));
            };
            let view = ctx.view(attacker);
            if !contact || damage == 0 || view.fainted || view.status.is_some() {
                return Ok(());
            }
            let target = view.creature;
            if ctx.rng.chance(*percent, "contact status") {
                ctx.effects.push(PendingEffect::ApplyStatus {
                    target,
                    status: StatusKind::Major(*status),
                    source: Some(holder),
                });
            }
        }

        HookEffect::ContactDamage {
            numerator,
            denominator,
        } => {
            let attacker = actor_side(reg, ctx)?;
            let StageData::AfterDamage {
                contact, damage, ..
            } = ctx.data
            else {
                return Err(mismatch(reg, ctx));
            };
            let view = ctx.view(attacker);
            if !contact || damage == 0 || view.fainted {
                return Ok(());
            }
            let amount = fraction(view.max_hp, *numerator, *denominator).min(view.hp);
            let target = view.creature;
            ctx.effects.push(PendingEffect::Damage {
                target,
                amount,
                source: DamageSource::Contact,
            });
        }

        HookEffect::CopyIncomingMove => {
            let holder = owner_creature(reg, ctx)?;
            let attacker = actor_side(reg, ctx)?;
            let StageData::AfterDamage { damage, copied, .. } = ctx.data else {
                return Err(mismatch(reg, ctx));
            };
            if copied || damage == 0 {
                return Ok(());
            }
            let move_id = ctx.move_id.clone().ok_or_else(|| RuleFault::MissingParticipant {
                stage: ctx.stage,
                effect: format!("{:?}", reg.effect),
                participant: "move".to_string(),
            })?;
            ctx.effects.push(PendingEffect::QueueCopiedMove {
                user: holder,
                move_id,
                target: attacker,
            });
        }

        HookEffect::BlockStatus { statuses } => {
            let target = target_side(reg, ctx)?;
            let recipient = ctx.view(target).creature;
            let StageData::StatusApply {
                status, blocked, ..
            } = &mut ctx.data
            else {
                return Err(mismatch(reg, ctx));
            };
            if statuses.contains(status) {
                *blocked = true;
                let status = *status;
                ctx.effects.push(PendingEffect::Announce(BattleEvent::StatusBlocked {
                    target: recipient,
                    status,
                }));
            }
        }

        HookEffect::ReflectStatus => {
            let holder = owner_creature(reg, ctx)?;
            let StageData::StatusApply { status, source, .. } = ctx.data else {
                return Err(mismatch(reg, ctx));
            };
            let reflectable = matches!(
                status,
                StatusKind::Major(
                    MajorStatus::Burned | MajorStatus::Paralyzed | MajorStatus::Poisoned
                )
            );
            if let Some(source) = source {
                if reflectable && source != holder {
                    ctx.effects.push(PendingEffect::ApplyStatus {
                        target: source,
                        status,
                        source: None,
                    });
                }
            }
        }

        HookEffect::ResidualDamage {
            numerator,
            denominator,
            immune_types,
        } => {
            let actor = actor_side(reg, ctx)?;
            if !matches!(ctx.data, StageData::EndOfTurn) {
                return Err(mismatch(reg, ctx));
            }
            let view = ctx.view(actor);
            if view.fainted || immune_types.iter().any(|t| view.has_type(*t)) {
                return Ok(());
            }
            let amount = fraction(view.max_hp, *numerator, *denominator).min(view.hp);
            let target = view.creature;
            ctx.effects.push(PendingEffect::Damage {
                target,
                amount,
                source: DamageSource::Residual,
            });
        }

        HookEffect::HealFraction {
            numerator,
            denominator,
        } => {
            let actor = actor_side(reg, ctx)?;
            if !matches!(ctx.data, StageData::EndOfTurn) {
                return Err(mismatch(reg, ctx));
            }
            let view = ctx.view(actor);
            if view.fainted || view.hp >= view.max_hp {
                return Ok(());
            }
            let amount = fraction(view.max_hp, *numerator, *denominator);
            let target = view.creature;
            ctx.effects.push(PendingEffect::Heal { target, amount });
        }

        HookEffect::TickDuration => {
            if !matches!(ctx.data, StageData::EndOfTurn) {
                return Err(mismatch(reg, ctx));
            }
            let effect = match (&reg.source, reg.owner) {
                (HookSource::Status(ConditionRef::Volatile(volatile)), HookOwner::Creature(owner)) => {
                    PendingEffect::TickVolatile {
                        target: owner,
                        volatile: *volatile,
                    }
                }
                (HookSource::Field(ConditionRef::Weather(_)), _) => PendingEffect::TickWeather,
                (HookSource::Field(ConditionRef::Terrain(_)), _) => PendingEffect::TickTerrain,
                (HookSource::Field(ConditionRef::Side(condition)), HookOwner::Side(side)) => {
                    PendingEffect::TickSideCondition {
                        side,
                        condition: *condition,
                    }
                }
                (source, _) => {
                    return Err(RuleFault::Inconsistent(format!(
                        "{:?} has no duration to tick",
                        source
                    )))
                }
            };
            ctx.effects.push(effect);
        }

        HookEffect::SetWeather { weather } => {
            if !matches!(ctx.data, StageData::SwitchIn) {
                return Err(mismatch(reg, ctx));
            }
            if ctx.field.weather != Some(*weather) {
                ctx.effects.push(PendingEffect::SetWeather {
                    weather: *weather,
                    turns: ctx.rules.weather_turns,
                });
            }
        }

        HookEffect::LowerOpponentStat { stat, stages } => {
            let actor = actor_side(reg, ctx)?;
            if !matches!(ctx.data, StageData::SwitchIn) {
                return Err(mismatch(reg, ctx));
            }
            let opponent = ctx.view(actor.opponent());
            if !opponent.fainted {
                let target = opponent.creature;
                ctx.effects.push(PendingEffect::StatStage {
                    target,
                    stat: *stat,
                    delta: *stages,
                });
            }
        }

        HookEffect::EntryHazard {
            numerator,
            denominator,
        } => {
            let actor = actor_side(reg, ctx)?;
            if !matches!(ctx.data, StageData::SwitchIn) {
                return Err(mismatch(reg, ctx));
            }
            let view = ctx.view(actor);
            if view.fainted {
                return Ok(());
            }
            let amount = fraction(view.max_hp, *numerator, *denominator).min(view.hp);
            let target = view.creature;
            ctx.effects.push(PendingEffect::Damage {
                target,
                amount,
                source: DamageSource::EntryHazard,
            });
        }
    }
    Ok(())
}

fn mismatch(reg: &HookRegistration, ctx: &HookContext) -> RuleFault {
    RuleFault::StageMismatch {
        stage: ctx.stage,
        effect: format!("{:?}", reg.effect),
    }
}

fn missing(reg: &HookRegistration, ctx: &HookContext, participant: &str) -> RuleFault {
    RuleFault::MissingParticipant {
        stage: ctx.stage,
        effect: format!("{:?}", reg.effect),
        participant: participant.to_string(),
    }
}

fn actor_side(reg: &HookRegistration, ctx: &HookContext) -> Result<SideId, RuleFault> {
    ctx.actor.ok_or_else(|| missing(reg, ctx, "actor"))
}

fn target_side(reg: &HookRegistration, ctx: &HookContext) -> Result<SideId, RuleFault> {
    ctx.target.ok_or_else(|| missing(reg, ctx, "target"))
}

fn owner_creature(reg: &HookRegistration, ctx: &HookContext) -> Result<CreatureRef, RuleFault> {
    match reg.owner {
        HookOwner::Creature(owner) => Ok(owner),
        _ => Err(missing(reg, ctx, "owning creature")),
    }
}

fn cancel(ctx: &mut HookContext, reason: MoveFailureReason) {
    if let StageData::BeforeMove { cancelled } = &mut ctx.data {
        *cancelled = Some(reason);
    }
}

fn consume_held_item(
    reg: &HookRegistration,
    holder: CreatureRef,
    ctx: &mut HookContext,
) -> Result<(), RuleFault> {
    if !matches!(reg.source, HookSource::Item(_)) {
        return Err(RuleFault::Inconsistent(format!(
            "{:?} tried to consume an item it is not",
            reg.source
        )));
    }
    ctx.effects.push(PendingEffect::ConsumeItem { holder });
    Ok(())
}

/// `value * numerator / denominator`, at least 1 and saturating at `u16::MAX`.
fn fraction(value: u16, numerator: u16, denominator: u16) -> u16 {
    let denominator = denominator.max(1) as u32;
    ((value as u32 * numerator as u32) / denominator).clamp(1, u16::MAX as u32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fraction_saturates_above_one() {
        assert_eq!(fraction(60_000, 3, 2), u16::MAX);
        assert_eq!(fraction(120, 3, 2), 180);
    }

    #[test]
    fn test_fraction_floors_at_one() {
        assert_eq!(fraction(160, 1, 16), 10);
        assert_eq!(fraction(10, 1, 16), 1);
        assert_eq!(fraction(100, 1, 3), 33);
    }
}
