//! Content-side conditions that need host queries or randomness.

use std::sync::Arc;

use rand::Rng;
use synergy_core::Condition;

use crate::world::WorldEffects;

/// Passes with the given probability, clamped to `[0, 1]`.
pub fn chance(probability: f64) -> Condition {
    let probability = if probability.is_nan() {
        0.0
    } else {
        probability.clamp(0.0, 1.0)
    };
    Condition::snapshot(move |_| rand::thread_rng().gen_bool(probability))
}

/// Passes with `percent` percent probability.
pub fn percent(percent: u32) -> Condition {
    chance(f64::from(percent) / 100.0)
}

/// Passes if the event has a target that is not a player.
pub fn target_is_not_player(world: Arc<dyn WorldEffects>) -> Condition {
    Condition::snapshot(move |s| s.target().is_some_and(|t| !world.is_player(t)))
}
