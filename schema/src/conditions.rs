use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumIter, IntoEnumIterator};

/// Non-volatile status. At most one per creature; survives switching.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum MajorStatus {
    Burned,
    Paralyzed,
    Asleep,
    Frozen,
    Poisoned,
}

/// Volatile status. Any number per creature; cleared on switch-out.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Volatile {
    Flinched,
    Confused,
    Disabled,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Weather {
    Sun,
    Rain,
    Sandstorm,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Terrain {
    Electric,
    Misty,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum SideCondition {
    Reflect,
    LightScreen,
    Spikes,
}

/// A status as carried in an application request.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Major(MajorStatus),
    Volatile(Volatile),
}

/// Every entry of the condition table: statuses and field-wide or side-wide
/// conditions, each of which may declare hooks.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionRef {
    Major(MajorStatus),
    Volatile(Volatile),
    Weather(Weather),
    Terrain(Terrain),
    Side(SideCondition),
}

impl ConditionRef {
    /// Stable table key, e.g. `"major/burned"` or `"side/reflect"`.
    pub fn key(&self) -> String {
        let (family, name) = match self {
            ConditionRef::Major(status) => ("major", format!("{:?}", status)),
            ConditionRef::Volatile(volatile) => ("volatile", format!("{:?}", volatile)),
            ConditionRef::Weather(weather) => ("weather", format!("{:?}", weather)),
            ConditionRef::Terrain(terrain) => ("terrain", format!("{:?}", terrain)),
            ConditionRef::Side(condition) => ("side", format!("{:?}", condition)),
        };
        format!("{}/{}", family, name.to_lowercase())
    }

    /// Every condition the engine knows about, in a fixed order.
    pub fn all() -> Vec<ConditionRef> {
        MajorStatus::iter()
            .map(ConditionRef::Major)
            .chain(Volatile::iter().map(ConditionRef::Volatile))
            .chain(Weather::iter().map(ConditionRef::Weather))
            .chain(Terrain::iter().map(ConditionRef::Terrain))
            .chain(SideCondition::iter().map(ConditionRef::Side))
            .collect()
    }

    /// Statuses live on a creature; everything else lives on the field or a side.
    pub fn is_status(&self) -> bool {
        matches!(self, ConditionRef::Major(_) | ConditionRef::Volatile(_))
    }
}

impl From<StatusKind> for ConditionRef {
    fn from(status: StatusKind) -> Self {
        match status {
            StatusKind::Major(status) => ConditionRef::Major(status),
            StatusKind::Volatile(volatile) => ConditionRef::Volatile(volatile),
        }
    }
}

impl fmt::Display for ConditionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl fmt::Display for SideCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            SideCondition::Reflect => "Reflect",
            SideCondition::LightScreen => "Light Screen",
            SideCondition::Spikes => "Spikes",
        };
        write!(f, "{}", display_name)
    }
}
