use crate::config::BattleRules;
use crate::creature::{Creature, CreatureSpec};
use crate::dex::DataTables;
use crate::errors::SetupError;
use schema::{ItemId, SideCondition};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SideId {
    A,
    B,
}

impl SideId {
    pub fn index(self) -> usize {
        match self {
            SideId::A => 0,
            SideId::B => 1,
        }
    }

    pub fn opponent(self) -> SideId {
        match self {
            SideId::A => SideId::B,
            SideId::B => SideId::A,
        }
    }

    pub fn both() -> [SideId; 2] {
        [SideId::A, SideId::B]
    }
}

impl fmt::Display for SideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideId::A => write!(f, "A"),
            SideId::B => write!(f, "B"),
        }
    }
}

/// A specific party member: which side, which party slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreatureRef {
    pub side: SideId,
    pub slot: usize,
}

impl CreatureRef {
    pub fn new(side: SideId, slot: usize) -> Self {
        Self { side, slot }
    }
}

impl fmt::Display for CreatureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.side, self.slot)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagEntry {
    pub item: ItemId,
    pub count: u8,
}

/// How a side is described when a battle is set up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartySpec {
    pub name: String,
    pub creatures: Vec<CreatureSpec>,
    #[serde(default)]
    pub bag: Vec<BagEntry>,
}

impl PartySpec {
    pub fn new(name: &str, creatures: Vec<CreatureSpec>) -> Self {
        Self {
            name: name.to_string(),
            creatures,
            bag: Vec::new(),
        }
    }

    pub fn with_bag_item(mut self, item: &str, count: u8) -> Self {
        self.bag.push(BagEntry {
            item: ItemId::from(item),
            count,
        });
        self
    }
}

/// A side-wide condition in effect. `turns_remaining` of `None` lasts until
/// removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSideCondition {
    pub condition: SideCondition,
    pub turns_remaining: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Side {
    pub id: SideId,
    pub name: String,
    pub party: Vec<Creature>,
    pub active: usize,
    pub conditions: Vec<ActiveSideCondition>,
    pub bag: Vec<BagEntry>,
}

impl Side {
    pub fn from_spec(
        id: SideId,
        spec: &PartySpec,
        tables: &dyn DataTables,
        rules: &BattleRules,
    ) -> Result<Self, SetupError> {
        if spec.creatures.is_empty() {
            return Err(SetupError::EmptyParty(id));
        }
        if spec.creatures.len() > rules.max_party_size {
            return Err(SetupError::PartyTooLarge {
                side: id,
                size: spec.creatures.len(),
                max: rules.max_party_size,
            });
        }
        let party = spec
            .creatures
            .iter()
            .map(|creature| Creature::from_spec(creature, tables))
            .collect::<Result<Vec<_>, _>>()?;
        for entry in &spec.bag {
            if tables.item(&entry.item).is_none() {
                return Err(SetupError::UnknownItem(entry.item.clone()));
            }
        }

        Ok(Side {
            id,
            name: spec.name.clone(),
            party,
            active: 0,
            conditions: Vec::new(),
            bag: spec.bag.iter().filter(|entry| entry.count > 0).cloned().collect(),
        })
    }

    pub fn active_creature(&self) -> &Creature {
        &self.party[self.active]
    }

    pub fn active_creature_mut(&mut self) -> &mut Creature {
        &mut self.party[self.active]
    }

    pub fn active_ref(&self) -> CreatureRef {
        CreatureRef::new(self.id, self.active)
    }

    /// Every party member has fainted.
    pub fn is_wiped(&self) -> bool {
        self.party.iter().all(Creature::is_fainted)
    }

    /// Party members that could be switched in right now.
    pub fn available_switches(&self) -> Vec<usize> {
        self.party
            .iter()
            .enumerate()
            .filter(|(index, creature)| *index != self.active && !creature.is_fainted())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn has_condition(&self, condition: SideCondition) -> bool {
        self.conditions.iter().any(|c| c.condition == condition)
    }

    pub fn bag_count(&self, item: &ItemId) -> u8 {
        self.bag
            .iter()
            .find(|entry| &entry.item == item)
            .map_or(0, |entry| entry.count)
    }

    /// Remove one of `item` from the bag. Returns false if there was none.
    pub fn spend_bag_item(&mut self, item: &ItemId) -> bool {
        let Some(position) = self.bag.iter().position(|entry| &entry.item == item) else {
            return false;
        };
        self.bag[position].count -= 1;
        if self.bag[position].count == 0 {
            self.bag.remove(position);
        }
        true
    }
}
