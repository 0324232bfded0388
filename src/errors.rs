use crate::side::SideId;
use schema::{AbilityId, HookStage, ItemId, MoveId, SpeciesId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An illegal action. Raised before resolution; the battle is left untouched
/// and the side must resubmit.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("move slot {0} does not exist")]
    NoSuchMoveSlot(usize),

    #[error("{0} has no PP left")]
    NoPpLeft(MoveId),

    #[error("{0} is disabled")]
    MoveDisabled(MoveId),

    #[error("side {0} cannot be targeted by this move")]
    InvalidTarget(SideId),

    #[error("the targeted creature has fainted")]
    TargetFainted,

    #[error("party index {0} is out of range")]
    PartyIndexOutOfRange(usize),

    #[error("party member {0} has fainted")]
    SwitchTargetFainted(usize),

    #[error("party member {0} is already active")]
    AlreadyActive(usize),

    #[error("the active creature has fainted and must be switched out")]
    SwitchRequired,

    #[error("{0} is not in the bag")]
    ItemNotInBag(ItemId),

    #[error("{0} cannot be used from the bag")]
    ItemNotUsable(ItemId),

    #[error("{0} would have no effect")]
    ItemHasNoEffect(ItemId),
}

/// A hook or effect that cannot be carried out consistently. Aborts the action
/// being resolved; everything committed before it stays committed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RuleFault {
    #[error("{effect} cannot run during {stage}")]
    StageMismatch { stage: HookStage, effect: String },

    #[error("{stage} hook {effect} needs an {participant} but the context has none")]
    MissingParticipant {
        stage: HookStage,
        effect: String,
        participant: String,
    },

    #[error("effect would deal {amount} damage to a creature with {remaining} HP")]
    DamageExceedsHp { amount: u16, remaining: u16 },

    #[error("no {table} record for '{id}'")]
    MissingRecord { table: String, id: String },

    #[error("inconsistent effect: {0}")]
    Inconsistent(String),
}

impl RuleFault {
    pub fn missing_record(table: &str, id: impl ToString) -> Self {
        RuleFault::MissingRecord {
            table: table.to_string(),
            id: id.to_string(),
        }
    }
}

/// Problems building a battle from party specifications or configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("unknown species '{0}'")]
    UnknownSpecies(SpeciesId),

    #[error("unknown move '{0}'")]
    UnknownMove(MoveId),

    #[error("unknown item '{0}'")]
    UnknownItem(ItemId),

    #[error("unknown ability '{0}'")]
    UnknownAbility(AbilityId),

    #[error("{species} cannot have the ability '{ability}'")]
    AbilityNotAllowed {
        species: SpeciesId,
        ability: AbilityId,
    },

    #[error("{species} must know between 1 and 4 moves, got {count}")]
    InvalidMoveCount { species: SpeciesId, count: usize },

    #[error("level {0} is outside 1..=100")]
    InvalidLevel(u8),

    #[error("side {0} has an empty party")]
    EmptyParty(SideId),

    #[error("side {side} has {size} creatures, the limit is {max}")]
    PartyTooLarge { side: SideId, size: usize, max: usize },

    #[error("invalid battle rules: {0}")]
    Rules(String),

    #[error("invalid battle record: {0}")]
    Record(String),
}

/// Top-level error returned by the battle controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    #[error("invalid action: {0}")]
    Validation(#[from] ValidationError),

    #[error("the battle is over")]
    BattleOver,

    #[error("turn {0} is already being resolved")]
    TurnInProgress(u32),

    #[error("both actions for turn {0} are locked in")]
    TurnLocked(u32),

    #[error("action is for turn {submitted} but the battle is on turn {current}")]
    StaleTurn { submitted: u32, current: u32 },

    #[error("turn {turn} is still waiting on side {side}")]
    NotReady { turn: u32, side: SideId },

    #[error("battle setup failed: {0}")]
    Setup(#[from] SetupError),
}

pub type BattleResult<T> = Result<T, BattleError>;
