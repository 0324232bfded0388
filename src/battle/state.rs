use crate::config::BattleRules;
use crate::dex::DataTables;
use crate::errors::{RuleFault, SetupError};
use crate::side::{CreatureRef, PartySpec, Side, SideId};
use crate::creature::Creature;
use schema::{
    ItemId, MajorStatus, MoveId, SideCondition, Stat, StatusKind, Terrain, Volatile, Weather,
};
use serde::{Deserialize, Serialize};

/// A side's choice for one turn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Action {
    UseMove { move_slot: usize, target: SideId },
    SwitchCreature { party_index: usize },
    UseItem { item: ItemId },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    AwaitingActions,
    Resolving,
    Applying,
    CheckingTerminal,
    Terminal,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    Undecided,
    SideAWins,
    SideBWins,
    Draw,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveFailureReason {
    Asleep,
    Frozen,
    FullyParalyzed,
    Flinched,
    HurtItselfInConfusion,
    Disabled,
    NoRememberedMove,
    NothingHappened,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ActorFainted,
    ActorSwitchedOut,
    TargetFainted,
}

/// Why a creature lost HP.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum DamageSource {
    Move(MoveId),
    Recoil,
    Confusion,
    Residual,
    Contact,
    EntryHazard,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    TurnStarted {
        turn: u32,
    },
    TurnEnded {
        turn: u32,
    },
    CreatureSentOut {
        creature: CreatureRef,
    },
    CreatureSwitched {
        side: SideId,
        from: usize,
        to: usize,
    },
    ActionSkipped {
        side: SideId,
        reason: SkipReason,
    },
    PriorityBoosted {
        creature: CreatureRef,
        boost: i8,
    },
    MoveUsed {
        user: CreatureRef,
        move_id: MoveId,
    },
    MoveCopied {
        user: CreatureRef,
        move_id: MoveId,
    },
    MoveFailed {
        user: CreatureRef,
        reason: MoveFailureReason,
    },
    MoveMissed {
        user: CreatureRef,
        move_id: MoveId,
    },
    CriticalHit {
        target: CreatureRef,
    },
    TypeEffectiveness {
        target: CreatureRef,
        multiplier: f64,
    },
    DamageDealt {
        target: CreatureRef,
        amount: u16,
        remaining_hp: u16,
        source: DamageSource,
    },
    Healed {
        target: CreatureRef,
        amount: u16,
        new_hp: u16,
    },
    CreatureFainted {
        creature: CreatureRef,
    },
    StatusApplied {
        target: CreatureRef,
        status: StatusKind,
    },
    StatusBlocked {
        target: CreatureRef,
        status: StatusKind,
    },
    StatusCured {
        target: CreatureRef,
        status: MajorStatus,
    },
    VolatileEnded {
        target: CreatureRef,
        volatile: Volatile,
    },
    StatStageChanged {
        target: CreatureRef,
        stat: Stat,
        old_stage: i8,
        new_stage: i8,
    },
    ItemConsumed {
        holder: CreatureRef,
        item: ItemId,
    },
    BagItemUsed {
        side: SideId,
        item: ItemId,
    },
    WeatherStarted {
        weather: Weather,
    },
    WeatherEnded {
        weather: Weather,
    },
    TerrainStarted {
        terrain: Terrain,
    },
    TerrainEnded {
        terrain: Terrain,
    },
    SideConditionStarted {
        side: SideId,
        condition: SideCondition,
    },
    SideConditionEnded {
        side: SideId,
        condition: SideCondition,
    },
    ActionAborted {
        side: Option<SideId>,
        fault: RuleFault,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
}

/// Ordered log of everything that happened, for relay to transport and
/// presentation layers.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = BattleEvent>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<BattleEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWeather {
    pub weather: Weather,
    pub turns_remaining: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTerrain {
    pub terrain: Terrain,
    pub turns_remaining: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldState {
    pub weather: Option<ActiveWeather>,
    pub terrain: Option<ActiveTerrain>,
}

/// The mutable snapshot of a battle. Only the controller writes to it, and
/// only by committing pending effects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleState {
    pub sides: [Side; 2],
    pub turn: u32,
    pub field: FieldState,
    pub phase: BattlePhase,
    pub outcome: BattleOutcome,
}

impl BattleState {
    pub fn new(
        party_a: &PartySpec,
        party_b: &PartySpec,
        tables: &dyn DataTables,
        rules: &BattleRules,
    ) -> Result<Self, SetupError> {
        Ok(Self {
            sides: [
                Side::from_spec(SideId::A, party_a, tables, rules)?,
                Side::from_spec(SideId::B, party_b, tables, rules)?,
            ],
            turn: 1,
            field: FieldState::default(),
            phase: BattlePhase::AwaitingActions,
            outcome: BattleOutcome::Undecided,
        })
    }

    pub fn side(&self, side: SideId) -> &Side {
        &self.sides[side.index()]
    }

    pub fn side_mut(&mut self, side: SideId) -> &mut Side {
        &mut self.sides[side.index()]
    }

    pub fn active(&self, side: SideId) -> &Creature {
        self.side(side).active_creature()
    }

    pub fn active_mut(&mut self, side: SideId) -> &mut Creature {
        self.side_mut(side).active_creature_mut()
    }

    pub fn creature(&self, creature: CreatureRef) -> Option<&Creature> {
        self.side(creature.side).party.get(creature.slot)
    }

    pub fn creature_mut(&mut self, creature: CreatureRef) -> Option<&mut Creature> {
        self.side_mut(creature.side).party.get_mut(creature.slot)
    }

    /// The creature is on the field and can still act or be targeted.
    pub fn is_in_play(&self, creature: CreatureRef) -> bool {
        self.side(creature.side).active == creature.slot
            && self.creature(creature).is_some_and(|c| !c.is_fainted())
    }

    pub fn weather(&self) -> Option<Weather> {
        self.field.weather.map(|w| w.weather)
    }

    pub fn terrain(&self) -> Option<Terrain> {
        self.field.terrain.map(|t| t.terrain)
    }

    pub fn is_over(&self) -> bool {
        self.outcome != BattleOutcome::Undecided
    }

    /// Outcome implied by the current parties: a side loses once every party
    /// member has fainted, and both losing at once is a draw.
    pub fn check_outcome(&self) -> BattleOutcome {
        match (self.sides[0].is_wiped(), self.sides[1].is_wiped()) {
            (true, true) => BattleOutcome::Draw,
            (true, false) => BattleOutcome::SideBWins,
            (false, true) => BattleOutcome::SideAWins,
            (false, false) => BattleOutcome::Undecided,
        }
    }
}
