use crate::battle::controller::{BattleController, TurnReport};
use crate::battle::rng::BattleRng;
use crate::battle::state::{Action, BattleEvent, BattleState};
use crate::config::BattleRules;
use crate::creature::CreatureSpec;
use crate::dex::{DataTables, StaticDex};
use crate::errors::BattleResult;
use crate::side::{PartySpec, SideId};
use schema::{
    AbilityData, AbilityId, ConditionData, ConditionRef, ItemData, ItemId, MoveData, MoveId,
    SpeciesData, SpeciesId,
};
use std::collections::HashMap;
use std::sync::Arc;

/// A one-creature party at level 50.
pub fn single(species: &str, moves: &[&str]) -> PartySpec {
    PartySpec::new(species, vec![CreatureSpec::new(species, 50, moves)])
}

/// A one-creature party at level 50 holding `item`.
pub fn single_with(species: &str, moves: &[&str], item: &str) -> PartySpec {
    PartySpec::new(
        species,
        vec![CreatureSpec::new(species, 50, moves).with_item(item)],
    )
}

/// A fresh state against the compiled tables. No switch-in hooks have run.
pub fn battle_state(party_a: PartySpec, party_b: PartySpec) -> BattleState {
    match BattleState::new(&party_a, &party_b, &StaticDex, &BattleRules::default()) {
        Ok(state) => state,
        Err(err) => panic!("Failed to build test battle state: {}", err),
    }
}

pub fn use_move(move_slot: usize, target: SideId) -> Action {
    Action::UseMove { move_slot, target }
}

pub fn switch_to(party_index: usize) -> Action {
    Action::SwitchCreature { party_index }
}

/// Builds a controller for a test scenario.
///
/// # Example
/// ```
/// let battle = TestBattle::new(single("emberfox", &["ember"]), single("leafling", &["growl"]))
///     .with_rolls(vec![100, 100])
///     .build();
/// ```
pub struct TestBattle {
    party_a: PartySpec,
    party_b: PartySpec,
    seed: u64,
    rolls: Vec<u8>,
    rules: BattleRules,
    tables: Arc<dyn DataTables>,
}

impl TestBattle {
    pub fn new(party_a: PartySpec, party_b: PartySpec) -> Self {
        Self {
            party_a,
            party_b,
            seed: 0,
            rolls: Vec::new(),
            rules: BattleRules::default(),
            tables: Arc::new(StaticDex),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Outcomes every roll consumes first, in order.
    pub fn with_rolls(mut self, rolls: Vec<u8>) -> Self {
        self.rolls = rolls;
        self
    }

    pub fn with_rules(mut self, rules: BattleRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_tables(mut self, tables: impl DataTables + 'static) -> Self {
        self.tables = Arc::new(tables);
        self
    }

    pub fn build(self) -> BattleController {
        let rng = BattleRng::scripted(self.seed, self.rolls);
        match BattleController::with_rng(
            self.seed,
            rng,
            self.rules,
            self.party_a,
            self.party_b,
            self.tables,
        ) {
            Ok(controller) => controller,
            Err(err) => panic!("Failed to build test battle: {}", err),
        }
    }
}

/// Submits both actions for the current turn and resolves it.
pub fn play_turn(battle: &mut BattleController, a: Action, b: Action) -> TurnReport {
    let turn = battle.turn();
    assert_ok(battle.submit(SideId::A, turn, a), "side A submission");
    assert_ok(battle.submit(SideId::B, turn, b), "side B submission");
    assert_ok(battle.resolve_turn(), "turn resolution")
}

/// Unwraps a battle result, naming what failed.
pub fn assert_ok<T>(result: BattleResult<T>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{} failed: {}", what, err),
    }
}

/// Events matching `predicate`, in order.
pub fn events_matching<'e>(
    events: &'e [BattleEvent],
    predicate: impl Fn(&BattleEvent) -> bool,
) -> Vec<&'e BattleEvent> {
    events.iter().filter(|event| predicate(event)).collect()
}

/// Sides in the order their creatures announced a chosen move.
pub fn move_order(events: &[BattleEvent]) -> Vec<SideId> {
    events
        .iter()
        .filter_map(|event| match event {
            BattleEvent::MoveUsed { user, .. } => Some(user.side),
            _ => None,
        })
        .collect()
}

/// The compiled tables with some records replaced or added. Lets a test bind
/// behavior the build script would never accept.
#[derive(Debug, Default)]
pub struct PatchedDex {
    base: StaticDex,
    items: HashMap<ItemId, ItemData>,
    abilities: HashMap<AbilityId, AbilityData>,
}

impl PatchedDex {
    pub fn with_item(mut self, item: ItemData) -> Self {
        self.items.insert(item.id.clone(), item);
        self
    }

    pub fn with_ability(mut self, ability: AbilityData) -> Self {
        self.abilities.insert(ability.id.clone(), ability);
        self
    }
}

impl DataTables for PatchedDex {
    fn species(&self, id: &SpeciesId) -> Option<&SpeciesData> {
        self.base.species(id)
    }

    fn move_data(&self, id: &MoveId) -> Option<&MoveData> {
        self.base.move_data(id)
    }

    fn item(&self, id: &ItemId) -> Option<&ItemData> {
        self.items.get(id).or_else(|| self.base.item(id))
    }

    fn ability(&self, id: &AbilityId) -> Option<&AbilityData> {
        self.abilities.get(id).or_else(|| self.base.ability(id))
    }

    fn condition(&self, condition: ConditionRef) -> Option<&ConditionData> {
        self.base.condition(condition)
    }
}
