//! The battle controller: the turn state machine and the only writer of
//! [`BattleState`].
//!
//! Each turn collects one action per side, orders them, executes them one at
//! a time and commits each action's effects before the next one starts. A
//! commit is all-or-nothing: effects are applied to a copy of the state that
//! replaces the real one only if every effect applied cleanly.

use crate::battle::damage::DamagePipeline;
use crate::battle::effects::{apply_effect_batch, status_can_apply, PendingEffect};
use crate::battle::hooks::{
    firing_order, FiringOrder, HookContext, HookRegistration, HookRegistry, StageData,
};
use crate::battle::rng::BattleRng;
use crate::battle::state::{
    Action, BattleEvent, BattleOutcome, BattlePhase, BattleState, EventBus, SkipReason,
};
use crate::battle::stats::staged_speed;
use crate::battle::turn_order::{resolve_order, OrderedAction};
use crate::battle::validation::validate_action;
use crate::config::BattleRules;
use crate::dex::{DataTables, StaticDex};
use crate::errors::{BattleError, BattleResult, RuleFault};
use crate::replay::BattleRecord;
use crate::side::{CreatureRef, PartySpec, SideId};
use schema::{BagUse, ItemId, MoveTarget};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A rule fault raised while resolving a turn, and the side whose action it
/// aborted. `None` for faults outside any one side's action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnFault {
    pub side: Option<SideId>,
    pub fault: RuleFault,
}

/// Everything one call to [`BattleController::resolve_turn`] produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: u32,
    pub events: Vec<BattleEvent>,
    pub faults: Vec<TurnFault>,
    pub outcome: BattleOutcome,
}

impl TurnReport {
    pub fn is_errored(&self) -> bool {
        !self.faults.is_empty()
    }
}

/// Events and faults gathered while one turn (or the opening) runs.
#[derive(Debug, Default)]
struct TurnLog {
    bus: EventBus,
    faults: Vec<TurnFault>,
}

pub struct BattleController {
    state: BattleState,
    registry: HookRegistry,
    rng: BattleRng,
    rules: BattleRules,
    tables: Arc<dyn DataTables>,
    pending: [Option<Action>; 2],
    record: BattleRecord,
    opening: Vec<BattleEvent>,
    opening_faults: Vec<TurnFault>,
}

impl BattleController {
    /// A battle using the compiled data tables.
    pub fn new(
        seed: u64,
        rules: BattleRules,
        party_a: PartySpec,
        party_b: PartySpec,
    ) -> BattleResult<Self> {
        Self::with_tables(seed, rules, party_a, party_b, Arc::new(StaticDex))
    }

    pub fn with_tables(
        seed: u64,
        rules: BattleRules,
        party_a: PartySpec,
        party_b: PartySpec,
        tables: Arc<dyn DataTables>,
    ) -> BattleResult<Self> {
        Self::with_rng(seed, BattleRng::from_seed(seed), rules, party_a, party_b, tables)
    }

    /// A battle driven by a prepared generator, e.g. one with scripted rolls.
    /// `seed` is only recorded.
    pub fn with_rng(
        seed: u64,
        rng: BattleRng,
        rules: BattleRules,
        party_a: PartySpec,
        party_b: PartySpec,
        tables: Arc<dyn DataTables>,
    ) -> BattleResult<Self> {
        rules.validate()?;
        let state = BattleState::new(&party_a, &party_b, tables.as_ref(), &rules)?;
        let registry = HookRegistry::build(&state, tables.as_ref())?;
        let record = BattleRecord::new(seed, rules.clone(), party_a, party_b);

        let mut controller = Self {
            state,
            registry,
            rng,
            rules,
            tables,
            pending: [None, None],
            record,
            opening: Vec::new(),
            opening_faults: Vec::new(),
        };
        controller.send_out_leads();
        info!(
            side_a = %controller.state.side(SideId::A).name,
            side_b = %controller.state.side(SideId::B).name,
            seed,
            "battle started"
        );
        Ok(controller)
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn rules(&self) -> &BattleRules {
        &self.rules
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    pub fn tables(&self) -> &dyn DataTables {
        self.tables.as_ref()
    }

    pub fn record(&self) -> &BattleRecord {
        &self.record
    }

    pub fn turn(&self) -> u32 {
        self.state.turn
    }

    pub fn phase(&self) -> BattlePhase {
        self.state.phase
    }

    pub fn outcome(&self) -> BattleOutcome {
        self.state.outcome
    }

    /// What happened as the leads were sent out, before turn 1.
    pub fn opening_events(&self) -> &[BattleEvent] {
        &self.opening
    }

    pub fn opening_faults(&self) -> &[TurnFault] {
        &self.opening_faults
    }

    /// Direct access for setting up scenarios in tests.
    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut BattleState {
        &mut self.state
    }

    pub fn pending_action(&self, side: SideId) -> Option<&Action> {
        self.pending[side.index()].as_ref()
    }

    fn is_locked(&self) -> bool {
        self.pending.iter().all(Option::is_some)
    }

    /// Submits `side`'s action for `turn`. Replaces an earlier submission
    /// until both sides have submitted; then the turn is locked.
    pub fn submit(&mut self, side: SideId, turn: u32, action: Action) -> BattleResult<()> {
        let current = self.state.turn;
        if self.state.is_over() {
            warn!(side = %side, "submission after the battle ended");
            return Err(BattleError::BattleOver);
        }
        if self.state.phase != BattlePhase::AwaitingActions {
            return Err(BattleError::TurnInProgress(current));
        }
        if turn != current {
            warn!(side = %side, submitted = turn, current, "stale submission");
            return Err(BattleError::StaleTurn {
                submitted: turn,
                current,
            });
        }
        if self.is_locked() {
            return Err(BattleError::TurnLocked(current));
        }
        if let Err(error) = validate_action(&self.state, side, &action, self.tables.as_ref()) {
            warn!(side = %side, %error, ?action, "action rejected");
            return Err(error.into());
        }
        debug!(side = %side, turn, ?action, "action submitted");
        self.pending[side.index()] = Some(action);
        Ok(())
    }

    /// Withdraws `side`'s pending action before the turn locks.
    pub fn retract(&mut self, side: SideId) -> BattleResult<Option<Action>> {
        if self.state.is_over() {
            return Err(BattleError::BattleOver);
        }
        if self.state.phase != BattlePhase::AwaitingActions {
            return Err(BattleError::TurnInProgress(self.state.turn));
        }
        if self.is_locked() {
            return Err(BattleError::TurnLocked(self.state.turn));
        }
        Ok(self.pending[side.index()].take())
    }

    /// Resolves the current turn once both sides have submitted.
    pub fn resolve_turn(&mut self) -> BattleResult<TurnReport> {
        if self.state.is_over() {
            return Err(BattleError::BattleOver);
        }
        let turn = self.state.turn;
        let mut actions = Vec::with_capacity(2);
        for side in SideId::both() {
            let action = self.pending[side.index()]
                .clone()
                .ok_or(BattleError::NotReady { turn, side })?;
            actions.push((side, action));
        }
        self.pending = [None, None];
        self.record.push_turn(actions[0].1.clone(), actions[1].1.clone());

        let mut log = TurnLog::default();
        log.bus.push(BattleEvent::TurnStarted { turn });
        debug!(turn, "resolving turn");

        self.state.phase = BattlePhase::Resolving;
        let submitted_by = SideId::both().map(|side| self.state.side(side).active_ref());
        let order = resolve_order(
            &actions,
            &self.state,
            &self.registry,
            self.tables.as_ref(),
            &self.rules,
            &mut self.rng,
        );
        for (side, fault) in order.faults {
            self.record_fault(Some(side), fault, &mut log);
        }

        self.state.phase = BattlePhase::Applying;
        self.commit(None, order.effects, &mut log);
        for entry in &order.actions {
            if self.state.check_outcome() != BattleOutcome::Undecided {
                break;
            }
            self.execute(entry, submitted_by[entry.side.index()], &mut log);
        }
        if self.state.check_outcome() == BattleOutcome::Undecided {
            self.end_of_turn(&mut log);
        }
        log.bus.push(BattleEvent::TurnEnded { turn });

        self.state.phase = BattlePhase::CheckingTerminal;
        let outcome = self.state.check_outcome();
        if outcome == BattleOutcome::Undecided {
            self.state.turn += 1;
            self.state.phase = BattlePhase::AwaitingActions;
        } else {
            self.state.outcome = outcome;
            self.state.phase = BattlePhase::Terminal;
            log.bus.push(BattleEvent::BattleEnded { outcome });
            info!(turn, ?outcome, "battle ended");
        }

        Ok(TurnReport {
            turn,
            events: log.bus.into_events(),
            faults: log.faults,
            outcome,
        })
    }

    fn send_out_leads(&mut self) {
        let mut log = TurnLog::default();
        for side in SideId::both() {
            log.bus.push(BattleEvent::CreatureSentOut {
                creature: self.state.side(side).active_ref(),
            });
        }
        for side in self.speed_order() {
            self.run_switch_in(side, &mut log);
        }
        self.opening = log.bus.into_events();
        self.opening_faults = log.faults;
    }

    /// Both sides, fastest active creature first. Exact ties are rolled.
    fn speed_order(&mut self) -> [SideId; 2] {
        let speed_a = staged_speed(self.state.active(SideId::A));
        let speed_b = staged_speed(self.state.active(SideId::B));
        let a_first = match speed_a.cmp(&speed_b) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => self.rng.chance(50, "speed tie"),
        };
        if a_first {
            [SideId::A, SideId::B]
        } else {
            [SideId::B, SideId::A]
        }
    }

    fn execute(&mut self, entry: &OrderedAction, submitted_by: CreatureRef, log: &mut TurnLog) {
        let side = entry.side;
        let active = self.state.side(side).active_ref();
        let is_switch = matches!(entry.action, Action::SwitchCreature { .. });

        if active != submitted_by {
            self.skip(side, SkipReason::ActorSwitchedOut, log);
            return;
        }
        if !is_switch && self.state.active(side).is_fainted() {
            self.skip(side, SkipReason::ActorFainted, log);
            return;
        }

        match &entry.action {
            Action::SwitchCreature { party_index } => {
                debug!(side = %side, party_index, "switching");
                let effects = vec![PendingEffect::Switch {
                    side,
                    party_index: *party_index,
                }];
                if self.commit(Some(side), effects, log).is_some() {
                    self.run_switch_in(side, log);
                }
            }
            Action::UseItem { item } => match self.bag_item_effects(side, item) {
                Ok(effects) => {
                    self.commit(Some(side), effects, log);
                }
                Err(fault) => self.record_fault(Some(side), fault, log),
            },
            Action::UseMove { move_slot, target } => {
                let targets_opponent = self
                    .state
                    .active(side)
                    .move_slot(*move_slot)
                    .and_then(|slot| self.tables.move_data(&slot.move_id))
                    .is_some_and(|m| m.target == MoveTarget::Opponent);
                if targets_opponent && self.state.active(*target).is_fainted() {
                    self.skip(side, SkipReason::TargetFainted, log);
                    return;
                }
                let result = DamagePipeline::new(
                    &self.state,
                    &self.registry,
                    self.tables.as_ref(),
                    &self.rules,
                    &mut self.rng,
                )
                .use_move(side, *move_slot, *target);
                match result {
                    Ok(effects) => {
                        if let Some(committed) = self.commit(Some(side), effects, log) {
                            self.run_copied_moves(&committed, log);
                        }
                    }
                    Err(fault) => self.record_fault(Some(side), fault, log),
                }
            }
        }
    }

    fn skip(&mut self, side: SideId, reason: SkipReason, log: &mut TurnLog) {
        debug!(side = %side, ?reason, "action skipped");
        log.bus.push(BattleEvent::ActionSkipped { side, reason });
    }

    fn bag_item_effects(&self, side: SideId, item: &ItemId) -> Result<Vec<PendingEffect>, RuleFault> {
        let target = self.state.side(side).active_ref();
        let bag_use = self
            .tables
            .item(item)
            .and_then(|data| data.bag_use.clone())
            .ok_or_else(|| RuleFault::missing_record("bag items", item))?;
        let mut effects = vec![PendingEffect::SpendBagItem {
            side,
            item: item.clone(),
        }];
        effects.push(match bag_use {
            BagUse::Heal { amount } => PendingEffect::Heal { target, amount },
            BagUse::CureStatus => PendingEffect::CureStatus { target },
        });
        Ok(effects)
    }

    /// Moves queued by `AfterDamage` hooks in a batch that was just
    /// committed. Each runs immediately, against the updated state.
    fn run_copied_moves(&mut self, committed: &[PendingEffect], log: &mut TurnLog) {
        for effect in committed {
            let PendingEffect::QueueCopiedMove {
                user,
                move_id,
                target,
            } = effect
            else {
                continue;
            };
            if !self.state.is_in_play(*user) || self.state.active(*target).is_fainted() {
                continue;
            }
            debug!(user = %user, move_id = %move_id, "copying move");
            let result = DamagePipeline::new(
                &self.state,
                &self.registry,
                self.tables.as_ref(),
                &self.rules,
                &mut self.rng,
            )
            .use_copied_move(user.side, move_id, *target);
            match result {
                Ok(effects) => {
                    self.commit(Some(user.side), effects, log);
                }
                Err(fault) => self.record_fault(Some(user.side), fault, log),
            }
        }
    }

    fn run_switch_in(&mut self, side: SideId, log: &mut TurnLog) {
        let result = {
            let mut ctx = HookContext::new(&self.state, StageData::SwitchIn, &mut self.rng, &self.rules)
                .with_actor(side)
                .with_target(side.opponent());
            self.registry.invoke(&mut ctx).map(|_| ctx.effects)
        };
        match result {
            Ok(effects) => {
                self.commit(Some(side), effects, log);
            }
            Err(fault) => self.record_fault(Some(side), fault, log),
        }
    }

    /// Every live `EndOfTurn` hook of both active creatures and the field,
    /// run as one list in firing order. Each hook sees its own side as the
    /// actor (none for field-wide hooks) and is committed on its own, so a
    /// fault only drops that hook's effects.
    fn end_of_turn(&mut self, log: &mut TurnLog) {
        let mut actors: Vec<Option<SideId>> = Vec::with_capacity(3);
        for side in self.speed_order() {
            if !self.state.active(side).is_fainted() {
                actors.push(Some(side));
            }
        }
        actors.push(None);

        let mut queue: Vec<(FiringOrder, Option<SideId>, HookRegistration)> = Vec::new();
        for actor in actors {
            let mut ctx =
                HookContext::new(&self.state, StageData::EndOfTurn, &mut self.rng, &self.rules);
            if let Some(side) = actor {
                ctx = ctx.with_actor(side);
            }
            for reg in self.registry.applicable(&ctx) {
                queue.push((firing_order(reg, &ctx), actor, reg.clone()));
            }
        }
        // Stable: a field hook run once per side keeps the speed order.
        queue.sort_by(|a, b| a.0.cmp(&b.0));

        for (_, actor, reg) in queue {
            let result = {
                let mut ctx =
                    HookContext::new(&self.state, StageData::EndOfTurn, &mut self.rng, &self.rules);
                if let Some(side) = actor {
                    ctx = ctx.with_actor(side);
                }
                self.registry.invoke_one(&reg, &mut ctx).map(|_| ctx.effects)
            };
            match result {
                Ok(effects) => {
                    self.commit(actor, effects, log);
                }
                Err(fault) => self.record_fault(actor, fault, log),
            }
        }
    }

    /// Applies `effects` as one unit. Returns the effects actually applied,
    /// or `None` if the batch faulted and the state was left as it was.
    fn commit(
        &mut self,
        side: Option<SideId>,
        effects: Vec<PendingEffect>,
        log: &mut TurnLog,
    ) -> Option<Vec<PendingEffect>> {
        if effects.is_empty() {
            return Some(effects);
        }
        let expanded = match self.expand_statuses(effects) {
            Ok(expanded) => expanded,
            Err(fault) => {
                self.record_fault(side, fault, log);
                return None;
            }
        };

        let mut next = self.state.clone();
        let mut staged = EventBus::new();
        match apply_effect_batch(
            &expanded,
            &mut next,
            &self.state,
            &self.rules,
            &mut self.rng,
            &mut staged,
        ) {
            Ok(()) => {
                self.state = next;
                log.bus.extend(staged.into_events());
                Some(expanded)
            }
            Err(fault) => {
                self.record_fault(side, fault, log);
                None
            }
        }
    }

    /// Runs every proposed status application through `StatusApply` hooks.
    /// Blocked statuses and statuses that could not take hold are dropped;
    /// statuses the hooks propose in turn are expanded the same way.
    fn expand_statuses(&mut self, effects: Vec<PendingEffect>) -> Result<Vec<PendingEffect>, RuleFault> {
        let mut queue: VecDeque<PendingEffect> = effects.into();
        let mut expanded = Vec::with_capacity(queue.len());

        while let Some(effect) = queue.pop_front() {
            let PendingEffect::ApplyStatus {
                target,
                status,
                source,
            } = effect
            else {
                expanded.push(effect);
                continue;
            };
            if !self.state.is_in_play(target) || !status_can_apply(&self.state, target, status) {
                debug!(target = %target, ?status, "status cannot take hold");
                continue;
            }

            let mut ctx = HookContext::new(
                &self.state,
                StageData::StatusApply {
                    status,
                    source,
                    blocked: false,
                },
                &mut self.rng,
                &self.rules,
            )
            .with_target(target.side);
            if let Some(source) = source {
                if source.side != target.side {
                    ctx = ctx.with_actor(source.side);
                }
            }
            ctx.forget_consumed_items(&expanded);
            self.registry.invoke(&mut ctx)?;

            let blocked = matches!(ctx.data, StageData::StatusApply { blocked: true, .. });
            if !blocked {
                expanded.push(PendingEffect::ApplyStatus {
                    target,
                    status,
                    source,
                });
            }
            for follow_up in ctx.effects.into_iter().rev() {
                queue.push_front(follow_up);
            }
        }

        Ok(expanded)
    }

    fn record_fault(&self, side: Option<SideId>, fault: RuleFault, log: &mut TurnLog) {
        error!(turn = self.state.turn, side = ?side, %fault, "rule fault; action aborted");
        log.bus.push(BattleEvent::ActionAborted {
            side,
            fault: fault.clone(),
        });
        log.faults.push(TurnFault { side, fault });
    }
}
