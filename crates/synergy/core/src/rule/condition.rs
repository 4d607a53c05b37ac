//! Rule conditions - side-effect-free predicates evaluated before effects run.

use std::fmt;
use std::sync::Arc;

use crate::snapshot::EventSnapshot;
use crate::state::{EntityRuntimeState, StateFlags};

pub type SnapshotPredicate = Arc<dyn Fn(&EventSnapshot) -> bool + Send + Sync>;
pub type StatePredicate = Arc<dyn Fn(&EventSnapshot, &EntityRuntimeState) -> bool + Send + Sync>;

/// A predicate a rule must satisfy, in one of two shapes.
///
/// Conditions must not mutate anything: they run in declared order and stop at
/// the first `false`, so whether a later condition runs at all is unspecified
/// from the caller's point of view.
#[derive(Clone)]
pub enum Condition {
    /// Reads only the event snapshot.
    Snapshot(SnapshotPredicate),
    /// Also reads the acting actor's runtime state.
    Stateful(StatePredicate),
}

impl Condition {
    /// Predicate over the snapshot alone.
    pub fn snapshot<F>(f: F) -> Self
    where
        F: Fn(&EventSnapshot) -> bool + Send + Sync + 'static,
    {
        Self::Snapshot(Arc::new(f))
    }

    /// Predicate that also reads runtime state.
    pub fn stateful<F>(f: F) -> Self
    where
        F: Fn(&EventSnapshot, &EntityRuntimeState) -> bool + Send + Sync + 'static,
    {
        Self::Stateful(Arc::new(f))
    }

    /// Runs the predicate.
    pub fn evaluate(&self, snapshot: &EventSnapshot, state: &EntityRuntimeState) -> bool {
        match self {
            Self::Snapshot(f) => f(snapshot),
            Self::Stateful(f) => f(snapshot, state),
        }
    }

    /// Whether the predicate reads runtime state.
    pub fn is_stateful(&self) -> bool {
        matches!(self, Self::Stateful(_))
    }

    // ========================================================================
    // Stock conditions
    // ========================================================================

    /// Magnitude strictly greater than `threshold`; false without a magnitude.
    pub fn magnitude_above(threshold: f32) -> Self {
        Self::snapshot(move |s| s.magnitude().is_some_and(|m| m > threshold))
    }

    /// Magnitude present and at least `threshold`.
    pub fn magnitude_at_least(threshold: f32) -> Self {
        Self::snapshot(move |s| s.magnitude().is_some_and(|m| m >= threshold))
    }

    /// The event names a target.
    pub fn has_target() -> Self {
        Self::snapshot(|s| s.target().is_some())
    }

    /// Module installed at `level` or higher.
    pub fn module_level_at_least(module_id: impl Into<String>, level: u32) -> Self {
        let module_id = module_id.into();
        Self::snapshot(move |s| s.module_level(&module_id) >= level)
    }

    /// At least `count` active modules.
    pub fn min_active_modules(count: usize) -> Self {
        Self::snapshot(move |s| s.active_module_count() >= count)
    }

    /// Cooldown `key` has elapsed at snapshot time.
    pub fn not_on_cooldown(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::stateful(move |s, state| !state.is_on_cooldown(&key, s.timestamp()))
    }

    /// Combo of at least `count` hits.
    pub fn combo_at_least(count: u32) -> Self {
        Self::stateful(move |_, state| state.combo_count() >= count)
    }

    /// Actor stood still for `ticks`.
    pub fn standing_still(ticks: u32) -> Self {
        Self::stateful(move |_, state| state.is_standing_still(ticks))
    }

    /// Timed state `id` is running.
    pub fn has_state(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::stateful(move |_, state| state.has_active_state(&id))
    }

    /// Timed state `id` is not running.
    pub fn lacks_state(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::stateful(move |_, state| !state.has_active_state(&id))
    }

    /// Rejection strictly below `limit`.
    pub fn rejection_below(limit: f32) -> Self {
        Self::stateful(move |_, state| state.rejection() < limit)
    }

    /// Every bit of `flags` is raised.
    pub fn flags_set(flags: StateFlags) -> Self {
        Self::stateful(move |_, state| state.has_flag(flags))
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot(_) => f.write_str("Condition::Snapshot(..)"),
            Self::Stateful(_) => f.write_str("Condition::Stateful(..)"),
        }
    }
}
