use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;
use tracing::trace;

/// The single source of randomness for one battle.
///
/// Seeded once at battle creation, so a battle is fully determined by its seed
/// and the actions submitted. Tests can prepend scripted outcomes; those are
/// consumed first by every roll (percent rolls, ranges and variance alike)
/// before the seeded generator takes over.
#[derive(Debug, Clone)]
pub struct BattleRng {
    rng: ChaCha8Rng,
    script: VecDeque<u8>,
}

impl BattleRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            script: VecDeque::new(),
        }
    }

    /// A generator that returns `outcomes` first, in order.
    pub fn scripted(seed: u64, outcomes: Vec<u8>) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            script: outcomes.into(),
        }
    }

    /// Scripted outcomes not consumed yet.
    pub fn remaining_script(&self) -> usize {
        self.script.len()
    }

    /// A roll in `1..=100`.
    pub fn roll_percent(&mut self, reason: &str) -> u8 {
        self.range(1, 100, reason)
    }

    /// True with `percent` chance. Certain and impossible outcomes do not roll.
    pub fn chance(&mut self, percent: u8, reason: &str) -> bool {
        if percent >= 100 {
            return true;
        }
        if percent == 0 {
            return false;
        }
        self.roll_percent(reason) <= percent
    }

    /// A roll in `low..=high`. Scripted values are clamped into the range.
    pub fn range(&mut self, low: u8, high: u8, reason: &str) -> u8 {
        let outcome = match self.script.pop_front() {
            Some(scripted) => scripted.clamp(low, high),
            None => self.rng.random_range(low..=high),
        };
        trace!(outcome, reason, "rng roll");
        outcome
    }

    /// Draws a fresh seed for a derived generator, e.g. the per-turn speed
    /// tie-break. Never scripted.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.next_u64()
    }
}
