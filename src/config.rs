use crate::errors::SetupError;
use serde::{Deserialize, Serialize};

/// Tunable numbers of the battle rules. Every field has a default, so a RON
/// override only needs to name what it changes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BattleRules {
    pub max_party_size: usize,
    /// Same-type attack bonus, in percent.
    pub stab_percent: u16,
    /// Critical hit multiplier, in percent.
    pub crit_percent: u16,
    /// Chance to land a critical hit at crit stage 0, 1, 2, ... in percent.
    /// Stages past the end use the last entry.
    pub crit_stage_chances: Vec<u8>,
    pub variance_min: u8,
    pub variance_max: u8,
    pub weather_turns: u8,
    pub terrain_turns: u8,
    pub screen_turns: u8,
    pub sleep_turns_min: u8,
    pub sleep_turns_max: u8,
    pub confusion_turns_min: u8,
    pub confusion_turns_max: u8,
    pub disable_turns: u8,
}

impl Default for BattleRules {
    fn default() -> Self {
        Self {
            max_party_size: 6,
            stab_percent: 150,
            crit_percent: 150,
            crit_stage_chances: vec![4, 13, 50, 100],
            variance_min: 85,
            variance_max: 100,
            weather_turns: 5,
            terrain_turns: 5,
            screen_turns: 5,
            sleep_turns_min: 1,
            sleep_turns_max: 3,
            confusion_turns_min: 2,
            confusion_turns_max: 5,
            disable_turns: 4,
        }
    }
}

impl BattleRules {
    pub fn from_ron_str(text: &str) -> Result<Self, SetupError> {
        let rules: BattleRules =
            ron::from_str(text).map_err(|e| SetupError::Rules(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if self.max_party_size == 0 {
            return Err(SetupError::Rules("max_party_size must be at least 1".into()));
        }
        if self.crit_stage_chances.is_empty() {
            return Err(SetupError::Rules("crit_stage_chances cannot be empty".into()));
        }
        if self.variance_min == 0 || self.variance_min > self.variance_max || self.variance_max > 100 {
            return Err(SetupError::Rules(format!(
                "variance range {}..={} must lie within 1..=100",
                self.variance_min, self.variance_max
            )));
        }
        if self.sleep_turns_min > self.sleep_turns_max
            || self.confusion_turns_min > self.confusion_turns_max
        {
            return Err(SetupError::Rules("duration ranges must be ordered".into()));
        }
        Ok(())
    }

    /// Chance of a critical hit at the given crit stage, in percent.
    pub fn crit_chance(&self, stage: u8) -> u8 {
        let index = (stage as usize).min(self.crit_stage_chances.len().saturating_sub(1));
        self.crit_stage_chances.get(index).copied().unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let rules = BattleRules::from_ron_str("(stab_percent: 200, weather_turns: 8)").unwrap();
        assert_eq!(rules.stab_percent, 200);
        assert_eq!(rules.weather_turns, 8);
        assert_eq!(rules.crit_percent, 150);
        assert_eq!(rules.max_party_size, 6);
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        let err = BattleRules::from_ron_str("(variance_min: 90, variance_max: 80)").unwrap_err();
        assert!(matches!(err, SetupError::Rules(_)));

        let err = BattleRules::from_ron_str("(stab_percent: \"lots\")").unwrap_err();
        assert!(matches!(err, SetupError::Rules(_)));
    }

    #[test]
    fn test_crit_chance_saturates_at_last_stage() {
        let rules = BattleRules::default();
        assert_eq!(rules.crit_chance(0), 4);
        assert_eq!(rules.crit_chance(1), 13);
        assert_eq!(rules.crit_chance(3), 100);
        assert_eq!(rules.crit_chance(9), 100);
    }
}
