//! Read-only access to the compiled static tables.
//!
//! The build script validates `data/*.ron`, encodes each table with postcard
//! and emits a perfect-hash index per table. Tables are decoded on first use
//! and never change afterwards, so any number of battles may read them
//! concurrently.

use schema::{
    AbilityData, AbilityId, ConditionData, ConditionRef, ItemData, ItemId, MoveData, MoveId,
    SpeciesData, SpeciesId,
};
use std::sync::LazyLock;

include!(concat!(env!("OUT_DIR"), "/tables.rs"));

/// Lookups the engine performs against the static catalogs.
pub trait DataTables: Send + Sync {
    fn species(&self, id: &SpeciesId) -> Option<&SpeciesData>;
    fn move_data(&self, id: &MoveId) -> Option<&MoveData>;
    fn item(&self, id: &ItemId) -> Option<&ItemData>;
    fn ability(&self, id: &AbilityId) -> Option<&AbilityData>;
    fn condition(&self, condition: ConditionRef) -> Option<&ConditionData>;
}

struct CompiledTables {
    species: Vec<SpeciesData>,
    moves: Vec<MoveData>,
    items: Vec<ItemData>,
    abilities: Vec<AbilityData>,
    conditions: Vec<ConditionData>,
}

fn decode<T: serde::de::DeserializeOwned>(name: &str, blob: &[u8]) -> Vec<T> {
    // The blobs were produced from the same schema types by the build script,
    // so a decode failure means the binary itself is corrupt.
    match schema::decode_table(blob) {
        Ok(records) => records,
        Err(e) => panic!("compiled {} table is corrupt: {}", name, e),
    }
}

static TABLES: LazyLock<CompiledTables> = LazyLock::new(|| CompiledTables {
    species: decode("species", SPECIES_BLOB),
    moves: decode("moves", MOVES_BLOB),
    items: decode("items", ITEMS_BLOB),
    abilities: decode("abilities", ABILITIES_BLOB),
    conditions: decode("conditions", CONDITIONS_BLOB),
});

/// The catalogs compiled into this binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDex;

impl DataTables for StaticDex {
    fn species(&self, id: &SpeciesId) -> Option<&SpeciesData> {
        SPECIES_INDEX
            .get(id.as_str())
            .and_then(|&index| TABLES.species.get(index))
    }

    fn move_data(&self, id: &MoveId) -> Option<&MoveData> {
        MOVE_INDEX
            .get(id.as_str())
            .and_then(|&index| TABLES.moves.get(index))
    }

    fn item(&self, id: &ItemId) -> Option<&ItemData> {
        ITEM_INDEX
            .get(id.as_str())
            .and_then(|&index| TABLES.items.get(index))
    }

    fn ability(&self, id: &AbilityId) -> Option<&AbilityData> {
        ABILITY_INDEX
            .get(id.as_str())
            .and_then(|&index| TABLES.abilities.get(index))
    }

    fn condition(&self, condition: ConditionRef) -> Option<&ConditionData> {
        CONDITION_INDEX
            .get(condition.key().as_str())
            .and_then(|&index| TABLES.conditions.get(index))
    }
}

pub fn get_species(id: &SpeciesId) -> Option<&'static SpeciesData> {
    SPECIES_INDEX
        .get(id.as_str())
        .and_then(|&index| TABLES.species.get(index))
}

pub fn get_move(id: &MoveId) -> Option<&'static MoveData> {
    MOVE_INDEX
        .get(id.as_str())
        .and_then(|&index| TABLES.moves.get(index))
}

pub fn get_item(id: &ItemId) -> Option<&'static ItemData> {
    ITEM_INDEX
        .get(id.as_str())
        .and_then(|&index| TABLES.items.get(index))
}

pub fn get_ability(id: &AbilityId) -> Option<&'static AbilityData> {
    ABILITY_INDEX
        .get(id.as_str())
        .and_then(|&index| TABLES.abilities.get(index))
}

/// All species ids, in table order.
pub fn species_ids() -> impl Iterator<Item = &'static SpeciesId> {
    TABLES.species.iter().map(|species| &species.id)
}
