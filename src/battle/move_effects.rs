use crate::battle::effects::PendingEffect;
use crate::battle::rng::BattleRng;
use crate::battle::state::MoveFailureReason;
use crate::config::BattleRules;
use crate::creature::Creature;
use crate::side::CreatureRef;
use schema::{MoveData, MoveEffect, SideCondition};

/// One side of a move's resolution as the secondary effects see it.
pub struct Participant<'a> {
    pub creature: &'a Creature,
    pub at: CreatureRef,
}

/// Proposes the secondary effects of `move_data` once it has connected.
///
/// `target_fainted` is true when the hit that preceded these effects is about
/// to knock the target out; effects aimed at the target are then dropped.
pub fn secondary_effects(
    move_data: &MoveData,
    user: Participant,
    target: Participant,
    target_fainted: bool,
    rules: &BattleRules,
    rng: &mut BattleRng,
) -> Vec<PendingEffect> {
    let mut effects = Vec::new();

    for effect in &move_data.effects {
        match effect {
            MoveEffect::InflictStatus { status, percent } => {
                if target_fainted {
                    continue;
                }
                if rng.chance(*percent, "secondary status") {
                    effects.push(PendingEffect::ApplyStatus {
                        target: target.at,
                        status: *status,
                        source: Some(user.at),
                    });
                }
            }
            MoveEffect::StatStage {
                stat,
                stages,
                on_user,
                percent,
            } => {
                if !on_user && target_fainted {
                    continue;
                }
                if rng.chance(*percent, "secondary stat change") {
                    effects.push(PendingEffect::StatStage {
                        target: if *on_user { user.at } else { target.at },
                        stat: *stat,
                        delta: *stages,
                    });
                }
            }
            MoveEffect::SetWeather { weather } => effects.push(PendingEffect::SetWeather {
                weather: *weather,
                turns: rules.weather_turns,
            }),
            MoveEffect::SetTerrain { terrain } => effects.push(PendingEffect::SetTerrain {
                terrain: *terrain,
                turns: rules.terrain_turns,
            }),
            MoveEffect::SetSideCondition { condition, on_user } => {
                let side = if *on_user { user.at.side } else { target.at.side };
                // Hazards stay until something clears them.
                let turns = match condition {
                    SideCondition::Spikes => None,
                    _ => Some(rules.screen_turns),
                };
                effects.push(PendingEffect::SetSideCondition {
                    side,
                    condition: *condition,
                    turns,
                });
            }
            MoveEffect::DisableLastMove => match &target.creature.last_move {
                Some(move_id) if !target_fainted => effects.push(PendingEffect::DisableMove {
                    target: target.at,
                    move_id: move_id.clone(),
                    turns: rules.disable_turns,
                }),
                _ => effects.push(PendingEffect::MoveFailed {
                    user: user.at,
                    reason: MoveFailureReason::NothingHappened,
                }),
            },
            MoveEffect::Heal { percent } => {
                let creature = user.creature;
                if creature.hp() < creature.max_hp() {
                    let amount = (creature.max_hp() as u32 * *percent as u32 / 100).max(1) as u16;
                    effects.push(PendingEffect::Heal {
                        target: user.at,
                        amount,
                    });
                }
            }
            // Resolved by the pipeline before the move executes.
            MoveEffect::CopyRememberedMove => {}
        }
    }

    effects
}
