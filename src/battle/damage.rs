//! The damage pipeline.
//!
//! Resolves one use of a move against the state as it stood when the action
//! began. Nothing here mutates the battle: every outcome is a
//! [`PendingEffect`] for the controller to commit.

use crate::battle::effects::PendingEffect;
use crate::battle::hooks::{HookContext, HookRegistry, StageData};
use crate::battle::move_effects::{secondary_effects, Participant};
use crate::battle::rng::BattleRng;
use crate::battle::state::{BattleEvent, BattleState, DamageSource, MoveFailureReason};
use crate::battle::stats::{
    effective_attack, effective_defense, hit_chance, offense_defense, staged_speed,
};
use crate::config::BattleRules;
use crate::creature::Creature;
use crate::dex::DataTables;
use crate::errors::RuleFault;
use crate::side::SideId;
use schema::{MoveData, MoveEffect, MoveId, MoveTarget, PowerScaling, Stat, Type};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct DamageResult {
    pub amount: u16,
    pub was_critical: bool,
    /// Product of the type matchups against every defender type.
    pub effectiveness: f64,
    pub effects: Vec<PendingEffect>,
}

impl DamageResult {
    pub fn is_immune(&self) -> bool {
        self.effectiveness == 0.0
    }
}

/// The level/power/attack/defense core of every damage roll, before any
/// multiplier.
pub fn base_damage(level: u8, power: u16, attack: u16, defense: u16) -> u16 {
    let level_factor = 2 * level as u32 / 5 + 2;
    let raw = level_factor * power as u32 * attack as u32 / defense.max(1) as u32 / 50 + 2;
    raw.min(u16::MAX as u32) as u16
}

/// Base power of `move_data` for this attacker and defender.
pub fn move_power(move_data: &MoveData, attacker: &Creature, defender: &Creature) -> u16 {
    let base = move_data.power.unwrap_or(0);
    match move_data.power_scaling {
        PowerScaling::Fixed => base,
        PowerScaling::SpeedRatio => {
            let ratio = staged_speed(attacker) as f64 / staged_speed(defender).max(1) as f64;
            let scaled = if ratio >= 4.0 {
                150
            } else if ratio >= 3.0 {
                120
            } else if ratio >= 2.0 {
                80
            } else if ratio >= 1.0 {
                60
            } else {
                40
            };
            scaled.max(base)
        }
        PowerScaling::LowHp => {
            let remaining = 48 * attacker.hp() as u32 / attacker.max_hp().max(1) as u32;
            match remaining {
                0..=1 => 200,
                2..=4 => 150,
                5..=9 => 100,
                10..=16 => 80,
                17..=32 => 40,
                _ => base,
            }
        }
    }
}

pub struct DamagePipeline<'a> {
    state: &'a BattleState,
    registry: &'a HookRegistry,
    tables: &'a dyn DataTables,
    rules: &'a BattleRules,
    rng: &'a mut BattleRng,
}

impl<'a> DamagePipeline<'a> {
    pub fn new(
        state: &'a BattleState,
        registry: &'a HookRegistry,
        tables: &'a dyn DataTables,
        rules: &'a BattleRules,
        rng: &'a mut BattleRng,
    ) -> Self {
        Self {
            state,
            registry,
            tables,
            rules,
            rng,
        }
    }

    /// A chosen move: spends PP, runs the legality checks, then executes.
    pub fn use_move(
        &mut self,
        user: SideId,
        slot: usize,
        target: SideId,
    ) -> Result<Vec<PendingEffect>, RuleFault> {
        let state = self.state;
        let user_ref = state.side(user).active_ref();
        let move_id = state
            .active(user)
            .move_slot(slot)
            .map(|s| s.move_id.clone())
            .ok_or_else(|| {
                RuleFault::Inconsistent(format!("{} has no move slot {}", user_ref, slot))
            })?;
        let move_data = self.lookup_move(&move_id)?;

        let mut effects = vec![PendingEffect::SpendPp {
            user: user_ref,
            slot,
        }];
        let (cancelled, hook_effects) = self.before_move(user, target, &move_id, &effects)?;
        effects.extend(hook_effects);
        if let Some(reason) = cancelled {
            debug!(user = %user_ref, move_id = %move_id, ?reason, "move cancelled");
            effects.push(PendingEffect::MoveFailed {
                user: user_ref,
                reason,
            });
            return Ok(effects);
        }

        self.execute_move(user, target, move_data, false, &mut effects)?;
        Ok(effects)
    }

    /// A move used on the spot because of another creature's move. Skips the
    /// legality checks and PP.
    pub fn use_copied_move(
        &mut self,
        user: SideId,
        move_id: &MoveId,
        target: SideId,
    ) -> Result<Vec<PendingEffect>, RuleFault> {
        let move_data = self.lookup_move(move_id)?;
        let mut effects = Vec::new();
        self.execute_move(user, target, move_data, true, &mut effects)?;
        Ok(effects)
    }

    /// Runs `BeforeMove` hooks. A returned reason means the move does not
    /// happen this turn.
    pub fn before_move(
        &mut self,
        user: SideId,
        target: SideId,
        move_id: &MoveId,
        spent: &[PendingEffect],
    ) -> Result<(Option<MoveFailureReason>, Vec<PendingEffect>), RuleFault> {
        let (data, effects) = self.run_hooks(
            StageData::BeforeMove { cancelled: None },
            user,
            target,
            move_id,
            spent,
            |_| {},
        )?;
        let cancelled = match data {
            StageData::BeforeMove { cancelled } => cancelled,
            _ => None,
        };
        Ok((cancelled, effects))
    }

    pub fn accuracy_check(&mut self, attacker: SideId, defender: SideId, move_data: &MoveData) -> bool {
        let Some(accuracy) = move_data.accuracy else {
            return true;
        };
        let chance = hit_chance(
            accuracy,
            self.state.active(attacker).stat_stages.get(Stat::Accuracy),
            self.state.active(defender).stat_stages.get(Stat::Evasion),
        );
        self.rng.chance(chance, "accuracy")
    }

    /// Damage of one hit of a connecting move.
    pub fn compute_damage(
        &mut self,
        attacker: SideId,
        defender: SideId,
        move_data: &MoveData,
        spent: &[PendingEffect],
    ) -> Result<DamageResult, RuleFault> {
        let state = self.state;
        let rules = self.rules;
        let attacker_creature = state.active(attacker);
        let defender_creature = state.active(defender);
        let defender_ref = state.side(defender).active_ref();
        let (offense, guard) = offense_defense(move_data.category).ok_or_else(|| {
            RuleFault::Inconsistent(format!("{} deals no damage", move_data.id))
        })?;

        let mut effects = Vec::new();
        let effectiveness = Type::matchup(move_data.move_type, &defender_creature.types);
        if effectiveness == 0.0 {
            effects.push(PendingEffect::Announce(BattleEvent::TypeEffectiveness {
                target: defender_ref,
                multiplier: 0.0,
            }));
            return Ok(DamageResult {
                amount: 0,
                was_critical: false,
                effectiveness,
                effects,
            });
        }

        let power = move_power(move_data, attacker_creature, defender_creature);

        let (crit_data, crit_effects) = self.run_hooks(
            StageData::CritChance {
                stage: move_data.crit_stage,
            },
            attacker,
            defender,
            &move_data.id,
            spent,
            |_| {},
        )?;
        effects.extend(crit_effects);
        let crit_stage = match crit_data {
            StageData::CritChance { stage } => stage,
            _ => move_data.crit_stage,
        };
        let critical = self.rng.chance(rules.crit_chance(crit_stage), "critical hit");

        let attack = effective_attack(attacker_creature, offense, critical);
        let defense = effective_defense(defender_creature, guard, critical);
        let mut damage = base_damage(attacker_creature.level, power, attack, defense) as f64;
        if attacker_creature.types.contains(&move_data.move_type) {
            damage *= rules.stab_percent as f64 / 100.0;
        }
        damage *= effectiveness;
        if critical {
            damage *= rules.crit_percent as f64 / 100.0;
        }
        let variance = self
            .rng
            .range(rules.variance_min, rules.variance_max, "damage variance");
        damage *= variance as f64 / 100.0;

        let (calc_data, calc_effects) = self.run_hooks(
            StageData::DamageCalc {
                move_type: move_data.move_type,
                category: move_data.category,
                effectiveness,
                critical,
                multiplier: 1.0,
            },
            attacker,
            defender,
            &move_data.id,
            spent,
            |_| {},
        )?;
        let multiplier = match calc_data {
            StageData::DamageCalc { multiplier, .. } => multiplier,
            _ => 1.0,
        };

        let amount = ((damage * multiplier).floor() as u32)
            .max(1)
            .min(defender_creature.hp() as u32) as u16;
        debug!(
            move_id = %move_data.id,
            power,
            critical,
            effectiveness,
            multiplier,
            amount,
            "damage computed"
        );

        if critical {
            effects.push(PendingEffect::Announce(BattleEvent::CriticalHit {
                target: defender_ref,
            }));
        }
        if effectiveness != 1.0 {
            effects.push(PendingEffect::Announce(BattleEvent::TypeEffectiveness {
                target: defender_ref,
                multiplier: effectiveness,
            }));
        }
        effects.extend(calc_effects);
        effects.push(PendingEffect::Damage {
            target: defender_ref,
            amount,
            source: DamageSource::Move(move_data.id.clone()),
        });

        Ok(DamageResult {
            amount,
            was_critical: critical,
            effectiveness,
            effects,
        })
    }

    /// Runs `AfterDamage` hooks with the defender's view already showing the
    /// hit.
    pub fn after_damage(
        &mut self,
        attacker: SideId,
        defender: SideId,
        move_data: &MoveData,
        result: &DamageResult,
        copied: bool,
        spent: &[PendingEffect],
    ) -> Result<Vec<PendingEffect>, RuleFault> {
        let amount = result.amount;
        let (_, effects) = self.run_hooks(
            StageData::AfterDamage {
                move_type: move_data.move_type,
                damage: amount,
                contact: move_data.contact,
                critical: result.was_critical,
                copied,
            },
            attacker,
            defender,
            &move_data.id,
            spent,
            |ctx| {
                let view = ctx.view_mut(defender);
                view.hp = view.hp.saturating_sub(amount);
                view.fainted = view.hp == 0;
            },
        )?;
        Ok(effects)
    }

    fn execute_move(
        &mut self,
        user: SideId,
        target: SideId,
        move_data: &MoveData,
        copied: bool,
        effects: &mut Vec<PendingEffect>,
    ) -> Result<(), RuleFault> {
        let state = self.state;
        let user_ref = state.side(user).active_ref();
        let move_id = move_data.id.clone();
        effects.push(PendingEffect::Announce(if copied {
            BattleEvent::MoveCopied {
                user: user_ref,
                move_id: move_id.clone(),
            }
        } else {
            BattleEvent::MoveUsed {
                user: user_ref,
                move_id: move_id.clone(),
            }
        }));
        if !copied {
            effects.push(PendingEffect::RecordMove {
                user: user_ref,
                move_id: move_id.clone(),
            });
        }

        if move_data.effects.contains(&MoveEffect::CopyRememberedMove) {
            return self.copy_remembered_move(user, effects);
        }

        let target_side = match move_data.target {
            MoveTarget::User => user,
            MoveTarget::Opponent => target,
        };
        let target_ref = state.side(target_side).active_ref();
        if move_data.target == MoveTarget::Opponent {
            effects.push(PendingEffect::RememberIncomingMove {
                target: target_ref,
                move_id: move_id.clone(),
            });
            if !self.accuracy_check(user, target_side, move_data) {
                effects.push(PendingEffect::Announce(BattleEvent::MoveMissed {
                    user: user_ref,
                    move_id,
                }));
                return Ok(());
            }
        }

        let mut target_fainted = false;
        if move_data.is_damaging() {
            let result = self.compute_damage(user, target_side, move_data, effects)?;
            effects.extend(result.effects.iter().cloned());
            if result.is_immune() {
                return Ok(());
            }
            target_fainted = result.amount >= state.active(target_side).hp();
            let after = self.after_damage(user, target_side, move_data, &result, copied, effects)?;
            effects.extend(after);
        }

        let secondaries = secondary_effects(
            move_data,
            Participant {
                creature: state.active(user),
                at: user_ref,
            },
            Participant {
                creature: state.active(target_side),
                at: target_ref,
            },
            target_fainted,
            self.rules,
            self.rng,
        );
        effects.extend(secondaries);
        Ok(())
    }

    fn copy_remembered_move(
        &mut self,
        user: SideId,
        effects: &mut Vec<PendingEffect>,
    ) -> Result<(), RuleFault> {
        let tables = self.tables;
        let user_ref = self.state.side(user).active_ref();
        let remembered = self
            .state
            .active(user)
            .last_move_against
            .as_ref()
            .and_then(|id| tables.move_data(id))
            .filter(|m| !m.effects.contains(&MoveEffect::CopyRememberedMove));
        match remembered {
            Some(move_data) => self.execute_move(user, user.opponent(), move_data, true, effects),
            None => {
                effects.push(PendingEffect::MoveFailed {
                    user: user_ref,
                    reason: MoveFailureReason::NoRememberedMove,
                });
                Ok(())
            }
        }
    }

    fn lookup_move(&self, move_id: &MoveId) -> Result<&'a MoveData, RuleFault> {
        let tables = self.tables;
        tables
            .move_data(move_id)
            .ok_or_else(|| RuleFault::missing_record("moves", move_id))
    }

    fn run_hooks(
        &mut self,
        data: StageData,
        actor: SideId,
        target: SideId,
        move_id: &MoveId,
        spent: &[PendingEffect],
        prepare: impl FnOnce(&mut HookContext),
    ) -> Result<(StageData, Vec<PendingEffect>), RuleFault> {
        let registry = self.registry;
        let mut ctx = HookContext::new(self.state, data, &mut *self.rng, self.rules)
            .with_actor(actor)
            .with_target(target)
            .with_move(move_id.clone());
        ctx.forget_consumed_items(spent);
        prepare(&mut ctx);
        registry.invoke(&mut ctx)?;
        Ok((ctx.data, ctx.effects))
    }
}
