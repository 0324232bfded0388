use crate::battle::state::{Action, BattleState};
use crate::dex::DataTables;
use crate::errors::ValidationError;
use crate::side::SideId;
use schema::{BagUse, MoveTarget};

/// Checks that `action` is legal for `side` right now. Nothing here touches
/// the state; a rejected action never reaches resolution.
pub fn validate_action(
    state: &BattleState,
    side: SideId,
    action: &Action,
    tables: &dyn DataTables,
) -> Result<(), ValidationError> {
    let own = state.side(side);
    let active = own.active_creature();

    if active.is_fainted() && !matches!(action, Action::SwitchCreature { .. }) {
        return Err(ValidationError::SwitchRequired);
    }

    match action {
        Action::UseMove { move_slot, target } => {
            let slot = active
                .move_slot(*move_slot)
                .ok_or(ValidationError::NoSuchMoveSlot(*move_slot))?;
            if slot.pp == 0 {
                return Err(ValidationError::NoPpLeft(slot.move_id.clone()));
            }
            if active.disabled_move() == Some(&slot.move_id) {
                return Err(ValidationError::MoveDisabled(slot.move_id.clone()));
            }
            let move_data = tables
                .move_data(&slot.move_id)
                .ok_or(ValidationError::NoSuchMoveSlot(*move_slot))?;
            let expected = match move_data.target {
                MoveTarget::Opponent => side.opponent(),
                MoveTarget::User => side,
            };
            if *target != expected {
                return Err(ValidationError::InvalidTarget(*target));
            }
            // A fainted target is only legal while its side can still send
            // in a replacement ahead of the move.
            let targeted = state.side(*target);
            if targeted.active_creature().is_fainted() && targeted.available_switches().is_empty() {
                return Err(ValidationError::TargetFainted);
            }
        }
        Action::SwitchCreature { party_index } => {
            let incoming = own
                .party
                .get(*party_index)
                .ok_or(ValidationError::PartyIndexOutOfRange(*party_index))?;
            if incoming.is_fainted() {
                return Err(ValidationError::SwitchTargetFainted(*party_index));
            }
            if *party_index == own.active {
                return Err(ValidationError::AlreadyActive(*party_index));
            }
        }
        Action::UseItem { item } => {
            if own.bag_count(item) == 0 {
                return Err(ValidationError::ItemNotInBag(item.clone()));
            }
            let bag_use = tables
                .item(item)
                .and_then(|data| data.bag_use.as_ref())
                .ok_or_else(|| ValidationError::ItemNotUsable(item.clone()))?;
            let has_effect = match bag_use {
                BagUse::Heal { .. } => active.hp() < active.max_hp(),
                BagUse::CureStatus => active.status.is_some(),
            };
            if !has_effect {
                return Err(ValidationError::ItemHasNoEffect(item.clone()));
            }
        }
    }

    Ok(())
}

/// Every action `side` could legally submit right now.
pub fn valid_actions(state: &BattleState, side: SideId, tables: &dyn DataTables) -> Vec<Action> {
    let own = state.side(side);
    let mut candidates = Vec::new();

    for move_slot in 0..own.active_creature().moves.len() {
        for target in [side.opponent(), side] {
            candidates.push(Action::UseMove { move_slot, target });
        }
    }
    for party_index in 0..own.party.len() {
        candidates.push(Action::SwitchCreature { party_index });
    }
    for entry in &own.bag {
        candidates.push(Action::UseItem {
            item: entry.item.clone(),
        });
    }

    candidates
        .into_iter()
        .filter(|action| validate_action(state, side, action, tables).is_ok())
        .collect()
}
