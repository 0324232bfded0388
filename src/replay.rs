//! Battle records: everything needed to rebuild a battle from scratch.
//!
//! The engine is deterministic given its seed and the actions submitted, so a
//! record holds only those plus the rules and the two parties.

use crate::battle::controller::{BattleController, TurnReport};
use crate::battle::state::Action;
use crate::config::BattleRules;
use crate::dex::{DataTables, StaticDex};
use crate::errors::{BattleResult, SetupError};
use crate::side::{PartySpec, SideId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TurnActions {
    pub a: Action,
    pub b: Action,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleRecord {
    pub seed: u64,
    pub rules: BattleRules,
    pub parties: [PartySpec; 2],
    pub turns: Vec<TurnActions>,
}

impl BattleRecord {
    pub fn new(seed: u64, rules: BattleRules, party_a: PartySpec, party_b: PartySpec) -> Self {
        Self {
            seed,
            rules,
            parties: [party_a, party_b],
            turns: Vec::new(),
        }
    }

    pub fn push_turn(&mut self, a: Action, b: Action) {
        self.turns.push(TurnActions { a, b });
    }

    pub fn to_json(&self) -> Result<String, SetupError> {
        serde_json::to_string_pretty(self).map_err(|e| SetupError::Record(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, SetupError> {
        serde_json::from_str(text).map_err(|e| SetupError::Record(e.to_string()))
    }

    /// Rebuilds the battle against the compiled tables and plays every
    /// recorded turn.
    pub fn replay(&self) -> BattleResult<(BattleController, Vec<TurnReport>)> {
        self.replay_with_tables(Arc::new(StaticDex))
    }

    pub fn replay_with_tables(
        &self,
        tables: Arc<dyn DataTables>,
    ) -> BattleResult<(BattleController, Vec<TurnReport>)> {
        let [party_a, party_b] = self.parties.clone();
        let mut controller =
            BattleController::with_tables(self.seed, self.rules.clone(), party_a, party_b, tables)?;
        let mut reports = Vec::with_capacity(self.turns.len());
        for actions in &self.turns {
            let turn = controller.turn();
            controller.submit(SideId::A, turn, actions.a.clone())?;
            controller.submit(SideId::B, turn, actions.b.clone())?;
            reports.push(controller.resolve_turn()?);
        }
        Ok((controller, reports))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::single;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_json_round_trip() {
        let mut record = BattleRecord::new(
            9,
            BattleRules::default(),
            single("emberfox", &["ember"]),
            single("tidalotter", &["water_gun"]),
        );
        record.push_turn(
            Action::UseMove {
                move_slot: 0,
                target: SideId::B,
            },
            Action::UseMove {
                move_slot: 0,
                target: SideId::A,
            },
        );
        let text = record.to_json().unwrap();
        assert_eq!(BattleRecord::from_json(&text).unwrap(), record);
    }

    #[test]
    fn test_malformed_record_is_a_setup_error() {
        assert!(matches!(
            BattleRecord::from_json("{ \"seed\": 1 }"),
            Err(SetupError::Record(_))
        ));
    }
}
