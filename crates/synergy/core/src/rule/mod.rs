//! Synergy rules: definitions, conditions and effects.

mod condition;
mod definition;
mod effect;

pub use condition::{Condition, SnapshotPredicate, StatePredicate};
pub use definition::{BuildError, ModuleLink, RuleBuilder, RuleDefinition};
pub use effect::{Effect, EffectError, EffectFn};
