//! Creature Battle Engine
//!
//! A deterministic two-sided, turn-based creature battle simulator. Abilities,
//! held items, statuses and field conditions are declared as hook bindings in
//! the static data tables and composed by the engine at fixed pipeline stages.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod config;
pub mod creature;
pub mod dex;
pub mod errors;
pub mod replay;
pub mod side;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    AbilityId, ConditionRef, HookEffect, HookRole, HookStage, ItemId, MajorStatus, MoveCategory,
    MoveData, MoveId, SpeciesId, Stat, StatusKind, Type, Volatile, Weather,
};

// --- From this crate's modules (`src/`) ---
pub use battle::controller::{BattleController, TurnFault, TurnReport};
pub use battle::state::{Action, BattleEvent, BattleOutcome, BattlePhase, BattleState};
pub use config::BattleRules;
pub use creature::{Creature, CreatureSpec};
pub use dex::{get_ability, get_item, get_move, get_species, DataTables, StaticDex};
pub use errors::{BattleError, BattleResult, RuleFault, SetupError, ValidationError};
pub use replay::BattleRecord;
pub use side::{CreatureRef, PartySpec, SideId};
