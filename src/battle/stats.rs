use crate::creature::Creature;
use schema::{MoveCategory, Stat};

/// Apply stat stage multipliers
/// Stages range from -6 to +6
/// Negative stages: (2 / (2 + |stage|))
/// Positive stages: ((2 + stage) / 2)
pub fn stage_multiplier(stage: i8) -> f64 {
    let stage = stage.clamp(-6, 6);
    if stage < 0 {
        2.0 / (2.0 + (-stage) as f64)
    } else {
        (2.0 + stage as f64) / 2.0
    }
}

/// Accuracy and evasion use thirds instead of halves.
pub fn accuracy_stage_multiplier(stage: i8) -> f64 {
    let stage = stage.clamp(-6, 6);
    if stage < 0 {
        3.0 / (3.0 + (-stage) as f64)
    } else {
        (3.0 + stage as f64) / 3.0
    }
}

pub fn apply_stage(value: u16, stage: i8) -> u16 {
    if stage == 0 {
        return value;
    }
    ((value as f64) * stage_multiplier(stage)).round() as u16
}

/// Speed after stat stages, before any hook modifiers.
pub fn staged_speed(creature: &Creature) -> u16 {
    apply_stage(creature.stats.speed, creature.stat_stages.get(Stat::Speed))
}

/// The attacking and defending stats a move of `category` reads.
pub fn offense_defense(category: MoveCategory) -> Option<(Stat, Stat)> {
    match category {
        MoveCategory::Physical => Some((Stat::Attack, Stat::Defense)),
        MoveCategory::Special => Some((Stat::SpAttack, Stat::SpDefense)),
        MoveCategory::Status => None,
    }
}

/// Attack stat used in a damage roll. Critical hits ignore the attacker's
/// own drops.
pub fn effective_attack(attacker: &Creature, stat: Stat, critical: bool) -> u16 {
    let stage = attacker.stat_stages.get(stat);
    let stage = if critical { stage.max(0) } else { stage };
    apply_stage(attacker.stats.get(stat), stage).max(1)
}

/// Defense stat used in a damage roll. Critical hits ignore the defender's
/// boosts.
pub fn effective_defense(defender: &Creature, stat: Stat, critical: bool) -> u16 {
    let stage = defender.stat_stages.get(stat);
    let stage = if critical { stage.min(0) } else { stage };
    apply_stage(defender.stats.get(stat), stage).max(1)
}

/// Chance, in percent, that a move with `base_accuracy` lands.
pub fn hit_chance(base_accuracy: u8, accuracy_stage: i8, evasion_stage: i8) -> u8 {
    let adjusted_stage = (accuracy_stage - evasion_stage).clamp(-6, 6);
    let modified = (base_accuracy as f64 * accuracy_stage_multiplier(adjusted_stage)).round();
    modified.clamp(1.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::CreatureSpec;
    use crate::dex::StaticDex;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, 100)]
    #[case(1, 150)]
    #[case(2, 200)]
    #[case(-1, 67)]
    #[case(-2, 50)]
    #[case(6, 400)]
    #[case(-6, 25)]
    fn test_stat_stage_multipliers(#[case] stage: i8, #[case] expected: u16) {
        assert_eq!(apply_stage(100, stage), expected);
    }

    #[test]
    fn test_accuracy_stage_multipliers() {
        assert!((accuracy_stage_multiplier(0) - 1.0).abs() < 0.001);
        assert!((accuracy_stage_multiplier(1) - 4.0 / 3.0).abs() < 0.001);
        assert!((accuracy_stage_multiplier(-1) - 3.0 / 4.0).abs() < 0.001);
        assert!((accuracy_stage_multiplier(6) - 3.0).abs() < 0.001);
        assert!((accuracy_stage_multiplier(-6) - 1.0 / 3.0).abs() < 0.001);
    }

    #[test]
    fn test_hit_chance_clamps() {
        assert_eq!(hit_chance(100, 0, 0), 100);
        assert_eq!(hit_chance(90, 1, 0), 100);
        assert_eq!(hit_chance(100, 0, 1), 75);
        assert_eq!(hit_chance(75, -6, 6), 25);
    }

    #[test]
    fn test_critical_hits_ignore_unfavourable_stages() {
        let mut creature = Creature::from_spec(
            &CreatureSpec::new("brawlbear", 50, &["tackle"]),
            &StaticDex,
        )
        .unwrap();
        creature.stat_stages.adjust(Stat::Attack, -2);
        creature.stat_stages.adjust(Stat::Defense, 2);
        let attack = creature.stats.attack;
        let defense = creature.stats.defense;

        assert_eq!(effective_attack(&creature, Stat::Attack, false), apply_stage(attack, -2));
        assert_eq!(effective_attack(&creature, Stat::Attack, true), attack);
        assert_eq!(effective_defense(&creature, Stat::Defense, false), apply_stage(defense, 2));
        assert_eq!(effective_defense(&creature, Stat::Defense, true), defense);
    }

    #[test]
    fn test_staged_speed() {
        let mut creature = Creature::from_spec(
            &CreatureSpec::new("emberfox", 50, &["tackle"]),
            &StaticDex,
        )
        .unwrap();
        assert_eq!(staged_speed(&creature), 100);
        creature.stat_stages.adjust(Stat::Speed, -1);
        assert_eq!(staged_speed(&creature), 67);
    }
}
