use crate::battle::effects::PendingEffect;
use crate::battle::rng::BattleRng;
use crate::battle::state::{BattleState, MoveFailureReason};
use crate::battle::stats::staged_speed;
use crate::config::BattleRules;
use crate::creature::{Creature, StatStages, Stats, VolatileState};
use crate::side::{CreatureRef, SideId};
use schema::{
    AbilityId, HookStage, ItemId, MajorStatus, MoveCategory, MoveId, SideCondition, StatusKind,
    Terrain, Type, Volatile, Weather,
};

/// What a hook may read about an active creature.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatureView {
    pub creature: CreatureRef,
    pub level: u8,
    pub types: Vec<Type>,
    pub hp: u16,
    pub max_hp: u16,
    pub stats: Stats,
    pub stat_stages: StatStages,
    /// Speed after stat stages.
    pub speed: u16,
    pub status: Option<MajorStatus>,
    pub sleep_turns: u8,
    pub volatiles: Vec<VolatileState>,
    pub item: Option<ItemId>,
    pub ability: AbilityId,
    pub last_move: Option<MoveId>,
    pub fainted: bool,
}

impl CreatureView {
    pub fn of(creature: &Creature, creature_ref: CreatureRef) -> Self {
        Self {
            creature: creature_ref,
            level: creature.level,
            types: creature.types.clone(),
            hp: creature.hp(),
            max_hp: creature.max_hp(),
            stats: creature.stats,
            stat_stages: creature.stat_stages,
            speed: staged_speed(creature),
            status: creature.status,
            sleep_turns: creature.sleep_turns,
            volatiles: creature.volatiles.clone(),
            item: creature.item.clone(),
            ability: creature.ability.clone(),
            last_move: creature.last_move.clone(),
            fainted: creature.is_fainted(),
        }
    }

    pub fn volatile(&self, kind: Volatile) -> Option<&VolatileState> {
        self.volatiles.iter().find(|v| v.kind == kind)
    }

    pub fn has_type(&self, kind: Type) -> bool {
        self.types.contains(&kind)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldView {
    pub weather: Option<Weather>,
    pub terrain: Option<Terrain>,
    pub side_conditions: [Vec<SideCondition>; 2],
}

impl FieldView {
    pub fn of(state: &BattleState) -> Self {
        Self {
            weather: state.weather(),
            terrain: state.terrain(),
            side_conditions: SideId::both().map(|side| {
                state
                    .side(side)
                    .conditions
                    .iter()
                    .map(|c| c.condition)
                    .collect()
            }),
        }
    }
}

/// Per-stage data the hooks of that stage read and write.
#[derive(Debug, Clone, PartialEq)]
pub enum StageData {
    SwitchIn,
    ModifySpeed {
        multiplier: f64,
    },
    TurnOrder {
        moves_after_target: bool,
        priority_boost: i8,
    },
    BeforeMove {
        cancelled: Option<MoveFailureReason>,
    },
    CritChance {
        stage: u8,
    },
    DamageCalc {
        move_type: Type,
        category: MoveCategory,
        effectiveness: f64,
        critical: bool,
        multiplier: f64,
    },
    AfterDamage {
        move_type: Type,
        damage: u16,
        contact: bool,
        critical: bool,
        /// The hit came from a move being copied, not chosen.
        copied: bool,
    },
    StatusApply {
        status: StatusKind,
        source: Option<CreatureRef>,
        blocked: bool,
    },
    EndOfTurn,
}

impl StageData {
    pub fn stage(&self) -> HookStage {
        match self {
            StageData::SwitchIn => HookStage::SwitchIn,
            StageData::ModifySpeed { .. } => HookStage::ModifySpeed,
            StageData::TurnOrder { .. } => HookStage::TurnOrder,
            StageData::BeforeMove { .. } => HookStage::BeforeMove,
            StageData::CritChance { .. } => HookStage::CritChance,
            StageData::DamageCalc { .. } => HookStage::DamageCalc,
            StageData::AfterDamage { .. } => HookStage::AfterDamage,
            StageData::StatusApply { .. } => HookStage::StatusApply,
            StageData::EndOfTurn => HookStage::EndOfTurn,
        }
    }
}

/// The scoped computation a stage's hooks thread through. Hooks see views of
/// the two active creatures and the field, never the battle state itself.
#[derive(Debug)]
pub struct HookContext<'a> {
    pub stage: HookStage,
    pub actives: [CreatureView; 2],
    pub field: FieldView,
    pub actor: Option<SideId>,
    pub target: Option<SideId>,
    pub move_id: Option<MoveId>,
    pub data: StageData,
    pub effects: Vec<PendingEffect>,
    pub rng: &'a mut BattleRng,
    pub rules: &'a BattleRules,
}

impl<'a> HookContext<'a> {
    pub fn new(
        state: &BattleState,
        data: StageData,
        rng: &'a mut BattleRng,
        rules: &'a BattleRules,
    ) -> Self {
        let actives = SideId::both().map(|side| {
            let side_state = state.side(side);
            CreatureView::of(side_state.active_creature(), side_state.active_ref())
        });
        Self {
            stage: data.stage(),
            actives,
            field: FieldView::of(state),
            actor: None,
            target: None,
            move_id: None,
            data,
            effects: Vec::new(),
            rng,
            rules,
        }
    }

    pub fn with_actor(mut self, side: SideId) -> Self {
        self.actor = Some(side);
        self
    }

    pub fn with_target(mut self, side: SideId) -> Self {
        self.target = Some(side);
        self
    }

    pub fn with_move(mut self, move_id: MoveId) -> Self {
        self.move_id = Some(move_id);
        self
    }

    pub fn view(&self, side: SideId) -> &CreatureView {
        &self.actives[side.index()]
    }

    pub fn view_mut(&mut self, side: SideId) -> &mut CreatureView {
        &mut self.actives[side.index()]
    }

    /// Stage outcome is decided and later hooks have nothing left to do.
    pub fn is_settled(&self) -> bool {
        matches!(
            self.data,
            StageData::BeforeMove {
                cancelled: Some(_)
            } | StageData::StatusApply { blocked: true, .. }
        )
    }

    /// Hide items that an earlier stage of the same action already spent, so
    /// their hooks stop firing before the batch is committed.
    pub fn forget_consumed_items(&mut self, effects: &[PendingEffect]) {
        for effect in effects {
            if let PendingEffect::ConsumeItem { holder } = effect {
                let view = self.view_mut(holder.side);
                if view.creature == *holder {
                    view.item = None;
                }
            }
        }
    }
}
