use crate::dex::DataTables;
use crate::errors::SetupError;
use schema::{
    AbilityId, BaseStats, ItemId, MajorStatus, MoveId, SpeciesId, Stat, Type, Volatile,
};
use serde::{Deserialize, Serialize};

/// How a creature is described when a battle is set up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureSpec {
    pub species: SpeciesId,
    #[serde(default)]
    pub nickname: Option<String>,
    pub level: u8,
    pub moves: Vec<MoveId>,
    #[serde(default)]
    pub item: Option<ItemId>,
    /// Defaults to the species' first listed ability.
    #[serde(default)]
    pub ability: Option<AbilityId>,
}

impl CreatureSpec {
    pub fn new(species: &str, level: u8, moves: &[&str]) -> Self {
        Self {
            species: SpeciesId::from(species),
            nickname: None,
            level,
            moves: moves.iter().map(|m| MoveId::from(*m)).collect(),
            item: None,
            ability: None,
        }
    }

    pub fn with_item(mut self, item: &str) -> Self {
        self.item = Some(ItemId::from(item));
        self
    }

    pub fn with_ability(mut self, ability: &str) -> Self {
        self.ability = Some(AbilityId::from(ability));
        self
    }

    pub fn with_nickname(mut self, nickname: &str) -> Self {
        self.nickname = Some(nickname.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub sp_attack: u16,
    pub sp_defense: u16,
    pub speed: u16,
}

impl Stats {
    /// Stats at the given level, with no individual or training bonuses.
    pub fn at_level(base: &BaseStats, level: u8) -> Self {
        let level = level as u32;
        let other = |base: u16| ((2 * base as u32 * level) / 100 + 5) as u16;
        Self {
            hp: ((2 * base.hp as u32 * level) / 100 + level + 10) as u16,
            attack: other(base.attack),
            defense: other(base.defense),
            sp_attack: other(base.sp_attack),
            sp_defense: other(base.sp_defense),
            speed: other(base.speed),
        }
    }

    /// The raw value of a battle stat. Accuracy and evasion have none.
    pub fn get(&self, stat: Stat) -> u16 {
        match stat {
            Stat::Attack => self.attack,
            Stat::Defense => self.defense,
            Stat::SpAttack => self.sp_attack,
            Stat::SpDefense => self.sp_defense,
            Stat::Speed => self.speed,
            Stat::Accuracy | Stat::Evasion => 0,
        }
    }
}

/// Stat stages, each in `-6..=6`. Cleared on switch-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatStages([i8; 7]);

impl StatStages {
    fn index(stat: Stat) -> usize {
        match stat {
            Stat::Attack => 0,
            Stat::Defense => 1,
            Stat::SpAttack => 2,
            Stat::SpDefense => 3,
            Stat::Speed => 4,
            Stat::Accuracy => 5,
            Stat::Evasion => 6,
        }
    }

    pub fn get(&self, stat: Stat) -> i8 {
        self.0[Self::index(stat)]
    }

    /// Applies a delta and returns the new stage.
    pub fn adjust(&mut self, stat: Stat, delta: i8) -> i8 {
        let slot = &mut self.0[Self::index(stat)];
        *slot = slot.saturating_add(delta).clamp(-6, 6);
        *slot
    }

    pub fn clear(&mut self) {
        self.0 = [0; 7];
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSlot {
    pub move_id: MoveId,
    pub pp: u8,
    pub max_pp: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolatileState {
    pub kind: Volatile,
    pub turns_remaining: u8,
    /// The move a `Disabled` volatile locks out.
    pub move_id: Option<MoveId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    pub species: SpeciesId,
    pub nickname: String,
    pub level: u8,
    pub types: Vec<Type>,
    pub base_stats: BaseStats,
    pub stats: Stats,
    hp: u16,
    pub status: Option<MajorStatus>,
    /// Turns left asleep; only meaningful while `status` is `Asleep`.
    pub sleep_turns: u8,
    pub volatiles: Vec<VolatileState>,
    pub stat_stages: StatStages,
    pub item: Option<ItemId>,
    pub ability: AbilityId,
    pub moves: Vec<MoveSlot>,
    pub last_move: Option<MoveId>,
    pub last_move_against: Option<MoveId>,
}

impl Creature {
    pub fn from_spec(spec: &CreatureSpec, tables: &dyn DataTables) -> Result<Self, SetupError> {
        if spec.level == 0 || spec.level > 100 {
            return Err(SetupError::InvalidLevel(spec.level));
        }
        let species = tables
            .species(&spec.species)
            .ok_or_else(|| SetupError::UnknownSpecies(spec.species.clone()))?;

        if spec.moves.is_empty() || spec.moves.len() > 4 {
            return Err(SetupError::InvalidMoveCount {
                species: spec.species.clone(),
                count: spec.moves.len(),
            });
        }
        let moves = spec
            .moves
            .iter()
            .map(|move_id| {
                let data = tables
                    .move_data(move_id)
                    .ok_or_else(|| SetupError::UnknownMove(move_id.clone()))?;
                Ok(MoveSlot {
                    move_id: move_id.clone(),
                    pp: data.pp,
                    max_pp: data.pp,
                })
            })
            .collect::<Result<Vec<_>, SetupError>>()?;

        let ability = match &spec.ability {
            Some(ability) => {
                if tables.ability(ability).is_none() {
                    return Err(SetupError::UnknownAbility(ability.clone()));
                }
                if !species.abilities.contains(ability) {
                    return Err(SetupError::AbilityNotAllowed {
                        species: spec.species.clone(),
                        ability: ability.clone(),
                    });
                }
                ability.clone()
            }
            None => species
                .abilities
                .first()
                .cloned()
                .ok_or_else(|| SetupError::UnknownAbility(AbilityId::from("")))?,
        };

        if let Some(item) = &spec.item {
            if tables.item(item).is_none() {
                return Err(SetupError::UnknownItem(item.clone()));
            }
        }

        let stats = Stats::at_level(&species.base_stats, spec.level);
        Ok(Creature {
            species: spec.species.clone(),
            nickname: spec.nickname.clone().unwrap_or_else(|| species.name.clone()),
            level: spec.level,
            types: species.types.clone(),
            base_stats: species.base_stats,
            stats,
            hp: stats.hp,
            status: None,
            sleep_turns: 0,
            volatiles: Vec::new(),
            stat_stages: StatStages::default(),
            item: spec.item.clone(),
            ability,
            moves,
            last_move: None,
            last_move_against: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.nickname
    }

    pub fn hp(&self) -> u16 {
        self.hp
    }

    pub fn max_hp(&self) -> u16 {
        self.stats.hp
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    /// Set HP directly, clamped to `0..=max_hp`.
    pub fn set_hp(&mut self, hp: u16) {
        self.hp = hp.min(self.max_hp());
    }

    /// Deal damage and return whether the creature fainted from it.
    pub fn take_damage(&mut self, amount: u16) -> bool {
        let was_fainted = self.is_fainted();
        self.hp = self.hp.saturating_sub(amount);
        if self.is_fainted() && !was_fainted {
            self.status = None;
            self.volatiles.clear();
            return true;
        }
        false
    }

    /// Restore HP and return the amount actually restored. Fainted creatures
    /// cannot be healed.
    pub fn heal(&mut self, amount: u16) -> u16 {
        if self.is_fainted() {
            return 0;
        }
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(self.max_hp());
        self.hp - before
    }

    pub fn volatile(&self, kind: Volatile) -> Option<&VolatileState> {
        self.volatiles.iter().find(|v| v.kind == kind)
    }

    pub fn has_volatile(&self, kind: Volatile) -> bool {
        self.volatile(kind).is_some()
    }

    pub fn move_slot(&self, slot: usize) -> Option<&MoveSlot> {
        self.moves.get(slot)
    }

    pub fn slot_of(&self, move_id: &MoveId) -> Option<usize> {
        self.moves.iter().position(|slot| &slot.move_id == move_id)
    }

    /// The move currently locked out by `Disabled`, if any.
    pub fn disabled_move(&self) -> Option<&MoveId> {
        self.volatile(Volatile::Disabled)
            .and_then(|v| v.move_id.as_ref())
    }

    /// State that does not survive leaving the field.
    pub fn reset_on_switch_out(&mut self) {
        self.volatiles.clear();
        self.stat_stages.clear();
    }
}
