//! Build script for creature-battle.
//!
//! Parses the RON catalogs under `data/`, rejects malformed or inconsistent
//! records, encodes every table with postcard and emits a perfect-hash
//! id-to-index map per table into `OUT_DIR/tables.rs`.

use schema::{AbilityData, ConditionData, ConditionRef, HookBinding, ItemData, MoveData, SpeciesData};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR not set"));
    let data_dir = Path::new(&manifest_dir).join("data");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=data");

    let species: Vec<SpeciesData> = load_table(&data_dir, "species.ron");
    let moves: Vec<MoveData> = load_table(&data_dir, "moves.ron");
    let items: Vec<ItemData> = load_table(&data_dir, "items.ron");
    let abilities: Vec<AbilityData> = load_table(&data_dir, "abilities.ron");
    let conditions: Vec<ConditionData> = load_table(&data_dir, "conditions.ron");

    unique_ids("species", species.iter().map(|s| s.id.to_string()));
    unique_ids("moves", moves.iter().map(|m| m.id.to_string()));
    unique_ids("items", items.iter().map(|i| i.id.to_string()));
    let ability_ids = unique_ids("abilities", abilities.iter().map(|a| a.id.to_string()));
    let condition_keys = unique_ids("conditions", conditions.iter().map(|c| c.condition.key()));

    for species_data in &species {
        if species_data.types.is_empty() || species_data.types.len() > 2 {
            panic!("species '{}' must have one or two types", species_data.id);
        }
        if species_data.abilities.is_empty() {
            panic!("species '{}' lists no abilities", species_data.id);
        }
        for ability in &species_data.abilities {
            if !ability_ids.contains(ability.as_str()) {
                panic!(
                    "species '{}' lists unknown ability '{}'",
                    species_data.id, ability
                );
            }
        }
    }

    for move_data in &moves {
        if let Some(accuracy) = move_data.accuracy {
            if accuracy == 0 || accuracy > 100 {
                panic!("move '{}' has accuracy {} outside 1..=100", move_data.id, accuracy);
            }
        }
        if move_data.category != schema::MoveCategory::Status && move_data.power.is_none() {
            panic!("damaging move '{}' declares no power", move_data.id);
        }
        check_hooks(&format!("move '{}'", move_data.id), &move_data.hooks);
    }
    for item in &items {
        check_hooks(&format!("item '{}'", item.id), &item.hooks);
    }
    for ability in &abilities {
        check_hooks(&format!("ability '{}'", ability.id), &ability.hooks);
    }
    for condition in &conditions {
        check_hooks(&format!("condition '{}'", condition.condition), &condition.hooks);
    }

    for condition in ConditionRef::all() {
        if !condition_keys.contains(condition.key().as_str()) {
            panic!("condition table is missing an entry for '{}'", condition);
        }
    }

    write_blob(&out_dir, "species.bin", &species);
    write_blob(&out_dir, "moves.bin", &moves);
    write_blob(&out_dir, "items.bin", &items);
    write_blob(&out_dir, "abilities.bin", &abilities);
    write_blob(&out_dir, "conditions.bin", &conditions);

    let tables_path = out_dir.join("tables.rs");
    let mut file = BufWriter::new(fs::File::create(&tables_path).expect("create tables.rs"));

    let species_keys: Vec<String> = species.iter().map(|s| s.id.to_string()).collect();
    let move_keys: Vec<String> = moves.iter().map(|m| m.id.to_string()).collect();
    let item_keys: Vec<String> = items.iter().map(|i| i.id.to_string()).collect();
    let ability_keys: Vec<String> = abilities.iter().map(|a| a.id.to_string()).collect();
    let condition_keys: Vec<String> = conditions.iter().map(|c| c.condition.key()).collect();

    write_index(&mut file, "SPECIES_INDEX", &species_keys);
    write_index(&mut file, "MOVE_INDEX", &move_keys);
    write_index(&mut file, "ITEM_INDEX", &item_keys);
    write_index(&mut file, "ABILITY_INDEX", &ability_keys);
    write_index(&mut file, "CONDITION_INDEX", &condition_keys);

    for (name, blob) in [
        ("SPECIES_BLOB", "species.bin"),
        ("MOVES_BLOB", "moves.bin"),
        ("ITEMS_BLOB", "items.bin"),
        ("ABILITIES_BLOB", "abilities.bin"),
        ("CONDITIONS_BLOB", "conditions.bin"),
    ] {
        writeln!(
            file,
            "static {}: &[u8] = include_bytes!(concat!(env!(\"OUT_DIR\"), \"/{}\"));",
            name, blob
        )
        .expect("write tables.rs");
    }
}

fn load_table<T: DeserializeOwned>(data_dir: &Path, file_name: &str) -> Vec<T> {
    let path = data_dir.join(file_name);
    println!("cargo:rerun-if-changed={}", path.display());
    let text = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
    ron::from_str(&text).unwrap_or_else(|e| panic!("failed to parse {}: {}", path.display(), e))
}

fn unique_ids(table: &str, ids: impl Iterator<Item = String>) -> HashSet<String> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.clone()) {
            panic!("duplicate id '{}' in {} table", id, table);
        }
    }
    seen
}

fn check_hooks(owner: &str, hooks: &[HookBinding]) {
    for binding in hooks {
        if !binding.effect.supported_stages().contains(&binding.stage) {
            panic!(
                "{} binds {:?} to stage {}, which it cannot run in",
                owner, binding.effect, binding.stage
            );
        }
    }
}

fn write_blob<T: Serialize>(out_dir: &Path, file_name: &str, records: &[T]) {
    let bytes = postcard::to_allocvec(records)
        .unwrap_or_else(|e| panic!("failed to encode {}: {}", file_name, e));
    fs::write(out_dir.join(file_name), bytes)
        .unwrap_or_else(|e| panic!("failed to write {}: {}", file_name, e));
}

fn write_index(file: &mut impl Write, name: &str, keys: &[String]) {
    let mut map = phf_codegen::Map::<&str>::new();
    for (index, key) in keys.iter().enumerate() {
        map.entry(key.as_str(), &index.to_string());
    }
    writeln!(
        file,
        "static {}: phf::Map<&'static str, usize> = {};",
        name,
        map.build()
    )
    .expect("write tables.rs");
}
