use crate::battle::effects::PendingEffect;
use crate::battle::hooks::{HookContext, HookRegistry, StageData};
use crate::battle::rng::BattleRng;
use crate::battle::state::{Action, BattleState};
use crate::battle::stats::staged_speed;
use crate::config::BattleRules;
use crate::dex::DataTables;
use crate::errors::RuleFault;
use crate::side::SideId;
use ordered_float::OrderedFloat;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cmp::Ordering;
use tracing::{debug, error};

pub const SWITCH_PRIORITY: i8 = 6;
pub const ITEM_PRIORITY: i8 = 5;
pub const MOVE_PRIORITY: i8 = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct ActionPriority {
    pub action_priority: i8,
    /// Move priority plus any boost granted by `TurnOrder` hooks.
    pub move_priority: i8,
    pub speed: OrderedFloat<f64>,
    /// Drawn from the per-turn tie seed; only decides exact ties.
    pub tie_break: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderedAction {
    pub side: SideId,
    pub action: Action,
    pub priority: ActionPriority,
}

#[derive(Debug, Clone, Default)]
pub struct TurnOrder {
    pub actions: Vec<OrderedAction>,
    /// Proposed by `TurnOrder` hooks; committed before any action runs.
    pub effects: Vec<PendingEffect>,
    pub faults: Vec<(SideId, RuleFault)>,
}

pub fn action_priority(action: &Action) -> i8 {
    match action {
        Action::SwitchCreature { .. } => SWITCH_PRIORITY,
        Action::UseItem { .. } => ITEM_PRIORITY,
        Action::UseMove { .. } => MOVE_PRIORITY,
    }
}

/// Speed used for ordering: stat-stage speed scaled by every live
/// `ModifySpeed` hook. Comparison only; the stat itself is untouched.
pub fn effective_speed(
    state: &BattleState,
    registry: &HookRegistry,
    rules: &BattleRules,
    rng: &mut BattleRng,
    side: SideId,
) -> Result<OrderedFloat<f64>, RuleFault> {
    let mut ctx = HookContext::new(state, StageData::ModifySpeed { multiplier: 1.0 }, rng, rules)
        .with_actor(side);
    registry.invoke(&mut ctx)?;
    let multiplier = match ctx.data {
        StageData::ModifySpeed { multiplier } => multiplier,
        _ => 1.0,
    };
    Ok(OrderedFloat(staged_speed(state.active(side)) as f64 * multiplier))
}

fn compare(a: &ActionPriority, b: &ActionPriority) -> Ordering {
    b.action_priority
        .cmp(&a.action_priority)
        .then_with(|| b.move_priority.cmp(&a.move_priority))
        .then_with(|| b.speed.cmp(&a.speed))
        .then_with(|| b.tie_break.cmp(&a.tie_break))
}

/// Orders the submitted actions for this turn.
///
/// Switches go first, then bag items, then moves by priority and effective
/// speed. Exact ties fall to a draw from a seed taken once per turn, so the
/// result never depends on which side is listed first. A fault while ordering
/// one side's action drops that side's hook results, not the action.
pub fn resolve_order(
    actions: &[(SideId, Action)],
    state: &BattleState,
    registry: &HookRegistry,
    tables: &dyn DataTables,
    rules: &BattleRules,
    rng: &mut BattleRng,
) -> TurnOrder {
    let mut tie_rng = ChaCha8Rng::seed_from_u64(rng.next_seed());
    let mut order = TurnOrder::default();

    let mut submitted: Vec<&(SideId, Action)> = actions.iter().collect();
    submitted.sort_by_key(|(side, _)| side.index());

    for (side, action) in submitted {
        let speed = match effective_speed(state, registry, rules, &mut *rng, *side) {
            Ok(speed) => speed,
            Err(fault) => {
                error!(side = %side, %fault, "speed hooks faulted");
                order.faults.push((*side, fault));
                OrderedFloat(staged_speed(state.active(*side)) as f64)
            }
        };
        let move_priority = match action {
            Action::UseMove { move_slot, .. } => {
                let move_id = state.active(*side).move_slot(*move_slot).map(|s| &s.move_id);
                match move_id.and_then(|id| tables.move_data(id)) {
                    Some(move_data) => move_data.priority,
                    None => {
                        order.faults.push((
                            *side,
                            RuleFault::missing_record("moves", format!("slot {}", move_slot)),
                        ));
                        0
                    }
                }
            }
            _ => 0,
        };
        order.actions.push(OrderedAction {
            side: *side,
            action: action.clone(),
            priority: ActionPriority {
                action_priority: action_priority(action),
                move_priority,
                speed,
                tie_break: tie_rng.next_u64(),
            },
        });
    }

    order.actions.sort_by(|a, b| compare(&a.priority, &b.priority));
    let unboosted: Vec<_> = order
        .actions
        .iter()
        .map(|a| (a.side, a.priority.action_priority))
        .collect();

    for entry in order.actions.iter_mut() {
        let Action::UseMove { move_slot, .. } = entry.action else {
            continue;
        };
        // Only a target that also attacks in the move class counts; a
        // switch or bag item always goes first whatever the boost.
        let class = entry.priority.action_priority;
        let own_position = unboosted.iter().position(|(s, _)| *s == entry.side);
        let target_position = unboosted
            .iter()
            .position(|(s, c)| *s == entry.side.opponent() && *c == class);
        let moves_after_target = matches!(
            (own_position, target_position),
            (Some(own), Some(target)) if own > target
        );

        let mut ctx = HookContext::new(
            state,
            StageData::TurnOrder {
                moves_after_target,
                priority_boost: 0,
            },
            &mut *rng,
            rules,
        )
        .with_actor(entry.side)
        .with_target(entry.side.opponent());
        if let Some(slot) = state.active(entry.side).move_slot(move_slot) {
            ctx = ctx.with_move(slot.move_id.clone());
        }

        match registry.invoke(&mut ctx) {
            Ok(_) => {
                if let StageData::TurnOrder { priority_boost, .. } = ctx.data {
                    entry.priority.move_priority += priority_boost;
                }
                order.effects.extend(ctx.effects);
            }
            Err(fault) => {
                error!(side = %entry.side, %fault, "turn order hooks faulted");
                order.faults.push((entry.side, fault));
            }
        }
    }

    order.actions.sort_by(|a, b| compare(&a.priority, &b.priority));
    debug!(
        order = ?order.actions.iter().map(|a| a.side).collect::<Vec<_>>(),
        "turn order resolved"
    );
    order
}
