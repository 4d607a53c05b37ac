//! Stock synergy content.
//!
//! This crate houses a small catalogue of synergy rules built only through the
//! public `synergy-core` builder:
//! - Energy Loop (generators, TICK)
//! - Combat Echo (critical strikes, CRITICAL_HIT)
//! - Survival Shield (shield + extinguisher, ENVIRONMENTAL_DAMAGE)
//!
//! World side effects go through the host-provided [`WorldEffects`]. Numbers
//! are taken from [`CatalogueTuning`], which the `loaders` feature can read
//! from TOML.

pub mod catalogue;
pub mod conditions;
pub mod tuning;
pub mod world;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use catalogue::{
    COMBAT_ECHO, ENERGY_LOOP, SURVIVAL_SHIELD, combat_echo, energy_loop, stock_rules,
    survival_shield,
};
pub use tuning::{CatalogueTuning, CombatEchoTuning, EnergyLoopTuning, SurvivalShieldTuning};
pub use world::WorldEffects;

#[cfg(feature = "loaders")]
pub use loaders::TuningLoader;
