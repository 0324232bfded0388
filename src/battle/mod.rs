pub mod controller;
pub mod damage;
pub mod effects;
pub mod hooks;
pub mod move_effects;
pub mod rng;
pub mod state;
pub mod stats;
pub mod turn_order;
pub mod validation;

#[cfg(test)]
pub(crate) mod tests;
