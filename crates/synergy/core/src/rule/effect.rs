//! Rule effects - ordered actions run when a rule matches.

use std::fmt;
use std::sync::Arc;

use crate::error::{EngineError, ErrorSeverity};
use crate::snapshot::EventSnapshot;
use crate::state::EntityRuntimeState;

/// Failure of a single effect. Aborts the remaining effects of the same rule.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EffectError {
    #[error("not enough {resource}: required {required}, available {available}")]
    InsufficientResource {
        resource: &'static str,
        required: f64,
        available: f64,
    },

    #[error("effect requires a target but the event has none")]
    MissingTarget,

    #[error("host collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("effect failed: {0}")]
    Failed(String),
}

impl EffectError {
    /// Catch-all failure with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl EngineError for EffectError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InsufficientResource { .. } | Self::Unavailable(_) => ErrorSeverity::Recoverable,
            Self::MissingTarget => ErrorSeverity::Validation,
            Self::Failed(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientResource { .. } => "EFFECT_INSUFFICIENT_RESOURCE",
            Self::MissingTarget => "EFFECT_MISSING_TARGET",
            Self::Unavailable(_) => "EFFECT_UNAVAILABLE",
            Self::Failed(_) => "EFFECT_FAILED",
        }
    }
}

pub type EffectFn =
    Arc<dyn Fn(&EventSnapshot, &mut EntityRuntimeState) -> Result<(), EffectError> + Send + Sync>;

/// An action over the snapshot and the acting actor's runtime state.
#[derive(Clone)]
pub struct Effect(EffectFn);

impl Effect {
    /// Effect that may fail; a failure stops the rest of its rule.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&EventSnapshot, &mut EntityRuntimeState) -> Result<(), EffectError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wraps an action that cannot fail.
    pub fn infallible<F>(f: F) -> Self
    where
        F: Fn(&EventSnapshot, &mut EntityRuntimeState) + Send + Sync + 'static,
    {
        Self::new(move |snapshot, state| {
            f(snapshot, state);
            Ok(())
        })
    }

    /// Runs the effect against the actor's state.
    pub fn apply(
        &self,
        snapshot: &EventSnapshot,
        state: &mut EntityRuntimeState,
    ) -> Result<(), EffectError> {
        (self.0)(snapshot, state)
    }

    // ========================================================================
    // Stock effects
    // ========================================================================

    /// Starts cooldown `key` at snapshot time.
    pub fn set_cooldown(key: impl Into<String>, duration_ms: u64) -> Self {
        let key = key.into();
        Self::infallible(move |s, state| state.set_cooldown(key.clone(), duration_ms, s.timestamp()))
    }

    /// Adds rejection; negative amounts remove it.
    pub fn add_rejection(amount: f32) -> Self {
        Self::infallible(move |_, state| state.add_rejection(amount))
    }

    /// Starts or refreshes timed state `id`.
    pub fn activate_state(id: impl Into<String>, duration_ticks: u32) -> Self {
        let id = id.into();
        Self::infallible(move |_, state| state.activate_state(id.clone(), duration_ticks))
    }

    /// Counts one combo hit at snapshot time.
    pub fn increment_combo() -> Self {
        Self::infallible(|s, state| {
            state.increment_combo(s.timestamp());
        })
    }

    /// Sets a named multiplier.
    pub fn set_modifier(key: impl Into<String>, value: f32) -> Self {
        let key = key.into();
        Self::infallible(move |_, state| state.set_modifier(key.clone(), value))
    }

    /// Bumps the causality-loop counter at snapshot time.
    pub fn increment_causality_loop() -> Self {
        Self::infallible(|s, state| state.increment_causality_loop(s.timestamp()))
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Effect(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimTime;
    use crate::config::EngineConstants;
    use crate::event::EventKind;
    use crate::provider::{ActorId, ModuleView};
    use crate::snapshot::tests::FixedProvider;

    #[test]
    fn stock_effects_mutate_state_at_snapshot_time() {
        let snapshot = EventSnapshot::builder(ActorId(1), EventKind::Kill)
            .at(SimTime(2_000))
            .build(&FixedProvider(Some(vec![ModuleView::active("core", 1)])))
            .unwrap();
        let mut state = EntityRuntimeState::new(ActorId(1), EngineConstants::default());

        for effect in [
            Effect::set_cooldown("burst", 500),
            Effect::add_rejection(15.0),
            Effect::activate_state("overdrive", 40),
            Effect::increment_combo(),
            Effect::set_modifier("speed", 1.5),
        ] {
            effect.apply(&snapshot, &mut state).unwrap();
        }

        assert!(state.is_on_cooldown("burst", SimTime(2_499)));
        assert!(!state.is_on_cooldown("burst", SimTime(2_500)));
        assert_eq!(state.rejection(), 15.0);
        assert_eq!(state.state_remaining_ticks("overdrive"), 40);
        assert_eq!(state.combo_count(), 1);
        assert_eq!(state.modifier("speed", 1.0), 1.5);
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(EffectError::MissingTarget.error_code(), "EFFECT_MISSING_TARGET");
        assert!(EffectError::Unavailable("energy".into()).severity().is_retryable());
        assert!(EffectError::failed("boom").severity().needs_investigation());
    }
}
