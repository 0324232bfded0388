use crate::conditions::{MajorStatus, StatusKind, Weather};
use crate::records::{MoveCategory, Stat};
use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumIter;

/// The fixed pipeline points a hook can be bound to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum HookStage {
    SwitchIn,
    ModifySpeed,
    TurnOrder,
    BeforeMove,
    CritChance,
    DamageCalc,
    AfterDamage,
    StatusApply,
    EndOfTurn,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Which participant of the current computation a hook listens as.
///
/// `Actor` fires when the owner is the creature the invocation is about (the
/// attacker, the creature switching in, the creature whose speed or residual
/// is being computed). `Target` fires when the owner is on the receiving end.
/// `Owner` fires only in ambient passes that concern no particular creature,
/// such as the duration pass at the end of a turn.
///
/// Side-wide sources match on the creature's side; field-wide sources match
/// any creature.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookRole {
    Actor,
    Target,
    Owner,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoilBasis {
    DamageDealt,
    MaxHp,
}

/// Declarative behavior attached to a hook binding. The engine maps each
/// variant to a callback; a variant bound to a stage whose data it cannot
/// read is a rule fault at runtime.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum HookEffect {
    // ModifySpeed
    ScaleSpeed {
        percent: u16,
        #[serde(default)]
        weather: Option<Weather>,
    },

    // TurnOrder
    PriorityWhenSlower {
        boost: i8,
        consume: bool,
    },

    // BeforeMove
    SkipWhileAsleep,
    ThawChance {
        percent: u8,
    },
    FullParalysis {
        percent: u8,
    },
    Flinch,
    ConfusionSelfHit {
        percent: u8,
        power: u16,
    },
    BlockDisabledMove,

    // CritChance
    RaiseCritStage {
        stages: u8,
    },

    // DamageCalc
    BoostMoveType {
        move_type: Type,
        percent: u16,
        #[serde(default)]
        below_hp_percent: Option<u8>,
    },
    ScaleTypeDamage {
        move_type: Type,
        percent: u16,
    },
    ScaleCategoryDamage {
        category: MoveCategory,
        percent: u16,
        bypassed_by_crit: bool,
    },
    ResistSuperEffective {
        move_type: Type,
        percent: u16,
    },
    ScaleAllDamage {
        percent: u16,
    },

    // AfterDamage
    RecoilFraction {
        numerator: u16,
        denominator: u16,
        basis: RecoilBasis,
    },
    ContactStatus {
        status: MajorStatus,
        percent: u8,
    },
    ContactDamage {
        numerator: u16,
        denominator: u16,
    },
    CopyIncomingMove,

    // StatusApply
    BlockStatus {
        statuses: Vec<StatusKind>,
    },
    ReflectStatus,

    // EndOfTurn
    ResidualDamage {
        numerator: u16,
        denominator: u16,
        #[serde(default)]
        immune_types: Vec<Type>,
    },
    HealFraction {
        numerator: u16,
        denominator: u16,
    },
    TickDuration,

    // SwitchIn
    SetWeather {
        weather: Weather,
    },
    LowerOpponentStat {
        stat: Stat,
        stages: i8,
    },
    EntryHazard {
        numerator: u16,
        denominator: u16,
    },
}

impl HookEffect {
    /// The stages this effect knows how to interpret. Used by the build
    /// script to reject data that binds an effect somewhere it cannot run.
    pub fn supported_stages(&self) -> &'static [HookStage] {
        use HookStage::*;
        match self {
            HookEffect::ScaleSpeed { .. } => &[ModifySpeed],
            HookEffect::PriorityWhenSlower { .. } => &[TurnOrder],
            HookEffect::SkipWhileAsleep
            | HookEffect::ThawChance { .. }
            | HookEffect::FullParalysis { .. }
            | HookEffect::Flinch
            | HookEffect::ConfusionSelfHit { .. }
            | HookEffect::BlockDisabledMove => &[BeforeMove],
            HookEffect::RaiseCritStage { .. } => &[CritChance],
            HookEffect::BoostMoveType { .. }
            | HookEffect::ScaleTypeDamage { .. }
            | HookEffect::ScaleCategoryDamage { .. }
            | HookEffect::ResistSuperEffective { .. }
            | HookEffect::ScaleAllDamage { .. } => &[DamageCalc],
            HookEffect::RecoilFraction { .. }
            | HookEffect::ContactStatus { .. }
            | HookEffect::ContactDamage { .. }
            | HookEffect::CopyIncomingMove => &[AfterDamage],
            HookEffect::BlockStatus { .. } | HookEffect::ReflectStatus => &[StatusApply],
            HookEffect::ResidualDamage { .. }
            | HookEffect::HealFraction { .. }
            | HookEffect::TickDuration => &[EndOfTurn],
            HookEffect::SetWeather { .. }
            | HookEffect::LowerOpponentStat { .. }
            | HookEffect::EntryHazard { .. } => &[SwitchIn],
        }
    }
}

/// One declared hook on a static record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HookBinding {
    pub stage: HookStage,
    #[serde(default)]
    pub priority: i8,
    pub role: HookRole,
    pub effect: HookEffect,
}
