use crate::conditions::{ConditionRef, SideCondition, StatusKind, Terrain, Weather};
use crate::hooks::HookBinding;
use crate::ids::{AbilityId, ItemId, MoveId, SpeciesId};
use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumIter;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Stat {
    Attack,
    Defense,
    SpAttack,
    SpDefense,
    Speed,
    Accuracy,
    Evasion,
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            Stat::Attack => "Attack",
            Stat::Defense => "Defense",
            Stat::SpAttack => "Sp. Attack",
            Stat::SpDefense => "Sp. Defense",
            Stat::Speed => "Speed",
            Stat::Accuracy => "Accuracy",
            Stat::Evasion => "Evasion",
        };
        write!(f, "{}", display_name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseStats {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub sp_attack: u16,
    pub sp_defense: u16,
    pub speed: u16,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    Opponent,
    User,
}

/// How a move's base power is derived at use time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerScaling {
    #[default]
    Fixed,
    /// Power grows with the user's speed relative to the target's.
    SpeedRatio,
    /// Power grows as the user's remaining health falls.
    LowHp,
}

/// Secondary effect of a move, applied after the damage step (or instead of
/// it for status moves).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum MoveEffect {
    InflictStatus {
        status: StatusKind,
        percent: u8,
    },
    StatStage {
        stat: Stat,
        stages: i8,
        on_user: bool,
        percent: u8,
    },
    SetWeather {
        weather: Weather,
    },
    SetTerrain {
        terrain: Terrain,
    },
    SetSideCondition {
        condition: SideCondition,
        on_user: bool,
    },
    DisableLastMove,
    CopyRememberedMove,
    Heal {
        percent: u8,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpeciesData {
    pub id: SpeciesId,
    pub name: String,
    pub types: Vec<Type>,
    pub base_stats: BaseStats,
    pub abilities: Vec<AbilityId>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveData {
    pub id: MoveId,
    pub name: String,
    pub move_type: Type,
    pub category: MoveCategory,
    pub power: Option<u16>,
    #[serde(default)]
    pub power_scaling: PowerScaling,
    /// `None` never misses.
    pub accuracy: Option<u8>,
    pub pp: u8,
    #[serde(default)]
    pub priority: i8,
    #[serde(default)]
    pub contact: bool,
    #[serde(default)]
    pub crit_stage: u8,
    pub target: MoveTarget,
    #[serde(default)]
    pub effects: Vec<MoveEffect>,
    #[serde(default)]
    pub hooks: Vec<HookBinding>,
}

impl MoveData {
    pub fn is_damaging(&self) -> bool {
        self.category != MoveCategory::Status && self.power.is_some()
    }
}

/// What an item does when spent from the bag instead of held.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BagUse {
    Heal { amount: u16 },
    CureStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ItemData {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub hooks: Vec<HookBinding>,
    #[serde(default)]
    pub bag_use: Option<BagUse>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AbilityData {
    pub id: AbilityId,
    pub name: String,
    #[serde(default)]
    pub hooks: Vec<HookBinding>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConditionData {
    pub condition: ConditionRef,
    pub name: String,
    #[serde(default)]
    pub hooks: Vec<HookBinding>,
}
