//! The effect hook registry.
//!
//! Every ability, item, move and condition declares its behavior as hook
//! bindings against fixed pipeline stages. At battle setup the registry turns
//! those bindings into registrations for every party member and every field
//! condition. Registrations never change afterwards; whether one fires is
//! decided at invocation time by checking that its source is still in play.

pub mod behaviors;
pub mod context;

pub use context::{CreatureView, FieldView, HookContext, StageData};

use crate::battle::state::BattleState;
use crate::creature::Creature;
use crate::dex::DataTables;
use crate::errors::{RuleFault, SetupError};
use crate::side::{CreatureRef, SideId};
use schema::{AbilityId, ConditionRef, HookBinding, HookEffect, HookRole, HookStage, ItemId, MoveId};
use std::cmp::Reverse;
use tracing::debug;

/// Tie-break rank between hooks of equal priority. Lower runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    Status,
    Ability,
    Item,
    Move,
    Field,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HookSource {
    Status(ConditionRef),
    Ability(AbilityId),
    Item(ItemId),
    Move(MoveId),
    Field(ConditionRef),
}

impl HookSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            HookSource::Status(_) => SourceKind::Status,
            HookSource::Ability(_) => SourceKind::Ability,
            HookSource::Item(_) => SourceKind::Item,
            HookSource::Move(_) => SourceKind::Move,
            HookSource::Field(_) => SourceKind::Field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookOwner {
    Creature(CreatureRef),
    Side(SideId),
    Field,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HookRegistration {
    /// Position in the registry; the final ordering tie-break.
    pub order: usize,
    pub source: HookSource,
    pub owner: HookOwner,
    pub stage: HookStage,
    pub priority: i8,
    pub role: HookRole,
    pub effect: HookEffect,
}

/// Bindings declared by everything a creature brings into battle: its
/// ability, held item, moves, and every status it could come to carry.
pub fn register_hooks(
    creature: &Creature,
    tables: &dyn DataTables,
) -> Result<Vec<(HookSource, HookBinding)>, SetupError> {
    let mut bindings = Vec::new();

    let ability = tables
        .ability(&creature.ability)
        .ok_or_else(|| SetupError::UnknownAbility(creature.ability.clone()))?;
    for binding in &ability.hooks {
        bindings.push((HookSource::Ability(ability.id.clone()), binding.clone()));
    }

    if let Some(item_id) = &creature.item {
        let item = tables
            .item(item_id)
            .ok_or_else(|| SetupError::UnknownItem(item_id.clone()))?;
        for binding in &item.hooks {
            bindings.push((HookSource::Item(item.id.clone()), binding.clone()));
        }
    }

    for slot in &creature.moves {
        let move_data = tables
            .move_data(&slot.move_id)
            .ok_or_else(|| SetupError::UnknownMove(slot.move_id.clone()))?;
        for binding in &move_data.hooks {
            bindings.push((HookSource::Move(move_data.id.clone()), binding.clone()));
        }
    }

    for condition in ConditionRef::all().into_iter().filter(|c| c.is_status()) {
        if let Some(entry) = tables.condition(condition) {
            for binding in &entry.hooks {
                bindings.push((HookSource::Status(condition), binding.clone()));
            }
        }
    }

    Ok(bindings)
}

#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    registrations: Vec<HookRegistration>,
}

impl HookRegistry {
    /// Registers both parties, then every field and side condition.
    pub fn build(state: &BattleState, tables: &dyn DataTables) -> Result<Self, SetupError> {
        let mut registry = HookRegistry::default();

        for side in SideId::both() {
            for (slot, creature) in state.side(side).party.iter().enumerate() {
                let owner = HookOwner::Creature(CreatureRef::new(side, slot));
                for (source, binding) in register_hooks(creature, tables)? {
                    registry.push(source, owner, binding);
                }
            }
        }

        for condition in ConditionRef::all().into_iter().filter(|c| !c.is_status()) {
            let Some(entry) = tables.condition(condition) else {
                continue;
            };
            let owners: Vec<HookOwner> = match condition {
                ConditionRef::Side(_) => SideId::both().map(HookOwner::Side).to_vec(),
                _ => vec![HookOwner::Field],
            };
            for owner in owners {
                for binding in &entry.hooks {
                    registry.push(HookSource::Field(condition), owner, binding.clone());
                }
            }
        }

        debug!(
            registrations = registry.registrations.len(),
            "hook registry built"
        );
        Ok(registry)
    }

    fn push(&mut self, source: HookSource, owner: HookOwner, binding: HookBinding) {
        let order = self.registrations.len();
        self.registrations.push(HookRegistration {
            order,
            source,
            owner,
            stage: binding.stage,
            priority: binding.priority,
            role: binding.role,
            effect: binding.effect,
        });
    }

    pub fn registrations(&self) -> &[HookRegistration] {
        &self.registrations
    }

    /// Registrations that would fire for `ctx` right now, sorted by
    /// [`firing_order`].
    pub fn applicable<'r>(&'r self, ctx: &HookContext) -> Vec<&'r HookRegistration> {
        let mut matching: Vec<&HookRegistration> = self
            .registrations
            .iter()
            .filter(|reg| reg.stage == ctx.stage && role_matches(reg, ctx) && is_live(reg, ctx))
            .collect();
        matching.sort_by_key(|reg| firing_order(reg, ctx));
        matching
    }

    /// Runs every applicable hook for the context's stage in order, threading
    /// the context through. Returns the registrations that fired.
    pub fn invoke(&self, ctx: &mut HookContext) -> Result<Vec<usize>, RuleFault> {
        let mut fired = Vec::new();
        for reg in self.applicable(ctx) {
            if ctx.is_settled() {
                break;
            }
            behaviors::run(reg, ctx)?;
            debug!(stage = %ctx.stage, source = ?reg.source, owner = ?reg.owner, "hook fired");
            fired.push(reg.order);
        }
        Ok(fired)
    }

    /// Runs `reg` on its own if it still applies to `ctx`. Returns whether
    /// it fired. For stages whose hooks are ordered across several contexts.
    pub fn invoke_one(
        &self,
        reg: &HookRegistration,
        ctx: &mut HookContext,
    ) -> Result<bool, RuleFault> {
        if reg.stage != ctx.stage || !role_matches(reg, ctx) || !is_live(reg, ctx) {
            return Ok(false);
        }
        behaviors::run(reg, ctx)?;
        debug!(stage = %ctx.stage, source = ?reg.source, owner = ?reg.owner, "hook fired");
        Ok(true)
    }
}

/// Sort key for firing order; lower fires first.
pub type FiringOrder = (Reverse<i8>, SourceKind, Reverse<u16>, usize);

/// Priority descending, then source kind, then the owner's current speed
/// (highest first), then registration order.
pub fn firing_order(reg: &HookRegistration, ctx: &HookContext) -> FiringOrder {
    (
        Reverse(reg.priority),
        reg.source.kind(),
        Reverse(owner_speed(reg, ctx)),
        reg.order,
    )
}

fn role_matches(reg: &HookRegistration, ctx: &HookContext) -> bool {
    let participant = match reg.role {
        HookRole::Actor => ctx.actor,
        HookRole::Target => ctx.target,
        HookRole::Owner => return ctx.actor.is_none() && ctx.target.is_none(),
    };
    let Some(side) = participant else {
        return false;
    };
    match reg.owner {
        HookOwner::Creature(owner) => owner.side == side,
        HookOwner::Side(owner) => owner == side,
        HookOwner::Field => true,
    }
}

fn is_live(reg: &HookRegistration, ctx: &HookContext) -> bool {
    match reg.owner {
        HookOwner::Creature(owner) => {
            let view = ctx.view(owner.side);
            if view.creature != owner || view.fainted {
                return false;
            }
            match &reg.source {
                HookSource::Ability(id) => &view.ability == id,
                HookSource::Item(id) => view.item.as_ref() == Some(id),
                HookSource::Move(id) => {
                    ctx.actor == Some(owner.side) && ctx.move_id.as_ref() == Some(id)
                }
                HookSource::Status(ConditionRef::Major(status)) => view.status == Some(*status),
                HookSource::Status(ConditionRef::Volatile(volatile)) => {
                    view.volatile(*volatile).is_some()
                }
                HookSource::Status(_) | HookSource::Field(_) => false,
            }
        }
        HookOwner::Side(side) => match &reg.source {
            HookSource::Field(ConditionRef::Side(condition)) => {
                ctx.field.side_conditions[side.index()].contains(condition)
            }
            _ => false,
        },
        HookOwner::Field => match &reg.source {
            HookSource::Field(ConditionRef::Weather(weather)) => ctx.field.weather == Some(*weather),
            HookSource::Field(ConditionRef::Terrain(terrain)) => ctx.field.terrain == Some(*terrain),
            _ => false,
        },
    }
}

fn owner_speed(reg: &HookRegistration, ctx: &HookContext) -> u16 {
    match reg.owner {
        HookOwner::Creature(owner) => ctx.view(owner.side).speed,
        HookOwner::Side(side) => ctx.view(side).speed,
        HookOwner::Field => 0,
    }
}
