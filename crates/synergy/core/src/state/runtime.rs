//! Per-actor mutable state read and written by rule effects.

use std::collections::HashMap;
use std::fmt;

use super::flags::StateFlags;
use super::history::{PositionHistory, PositionSnapshot, TickSample, Vec3};
use crate::clock::SimTime;
use crate::config::EngineConstants;
use crate::provider::ActorId;

/// Callback run exactly once when a timed state runs out.
///
/// It receives the owning state so it can clear flags or start cooldowns
/// without re-entering the state store.
pub type ExpiryCallback = Box<dyn FnOnce(&mut EntityRuntimeState) + Send>;

/// A named timed state counting down in host ticks.
pub struct ActiveState {
    remaining_ticks: u32,
    on_expire: Option<ExpiryCallback>,
}

impl ActiveState {
    /// Ticks left before expiry.
    pub fn remaining_ticks(&self) -> u32 {
        self.remaining_ticks
    }
}

impl fmt::Debug for ActiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveState")
            .field("remaining_ticks", &self.remaining_ticks)
            .field("has_callback", &self.on_expire.is_some())
            .finish()
    }
}

/// Subset of the state that survives an actor reconnect.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PersistedState {
    pub rejection: f32,
    pub max_health_modifier: f32,
    pub causality_loop_count: u32,
}

/// State bag owned by a single actor.
///
/// Every field is independent: effects from different rules in the same
/// dispatch may touch the same field and later effects observe earlier
/// mutations. Callers must not update one actor's state from two threads at
/// once; [`super::StateStore`] enforces that with a per-actor lock.
#[derive(Debug)]
pub struct EntityRuntimeState {
    actor: ActorId,
    constants: EngineConstants,

    cooldowns: HashMap<String, SimTime>,
    rejection: f32,
    active_states: HashMap<String, ActiveState>,
    modifiers: HashMap<String, f32>,
    max_health_modifier: f32,

    history: PositionHistory,
    last_position: Option<Vec3>,
    standing_ticks: u32,

    combo_count: u32,
    last_hit: SimTime,

    causality_loop_count: u32,
    last_causality_loop: Option<SimTime>,

    flags: StateFlags,
}

impl EntityRuntimeState {
    /// Fresh state with empty history and no cooldowns.
    pub fn new(actor: ActorId, constants: EngineConstants) -> Self {
        let history = PositionHistory::with_capacity(constants.history_capacity);
        Self {
            actor,
            constants,
            cooldowns: HashMap::new(),
            rejection: 0.0,
            active_states: HashMap::new(),
            modifiers: HashMap::new(),
            max_health_modifier: 0.0,
            history,
            last_position: None,
            standing_ticks: 0,
            combo_count: 0,
            last_hit: SimTime::ZERO,
            causality_loop_count: 0,
            last_causality_loop: None,
            flags: StateFlags::empty(),
        }
    }

    /// Actor this state belongs to.
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances the state by one host tick.
    ///
    /// Returns the ids of timed states that expired during this tick, sorted.
    pub fn tick(&mut self, sample: &TickSample, now: SimTime) -> Vec<String> {
        let decay = self.constants.rejection_decay_per_tick();
        self.rejection = (self.rejection - decay).max(0.0);

        self.history.record(PositionSnapshot::from(sample));
        self.update_standing(sample.position);

        if self.combo_count > 0 && now.since(self.last_hit) > self.constants.combo_timeout_ms {
            self.combo_count = 0;
        }

        self.tick_active_states()
    }

    fn update_standing(&mut self, position: Vec3) {
        let still = self.last_position.is_some_and(|last| {
            last.distance_squared(&position) < EngineConstants::STANDING_EPSILON_SQ
        });
        self.standing_ticks = if still {
            self.standing_ticks.saturating_add(1)
        } else {
            0
        };
        self.last_position = Some(position);
    }

    fn tick_active_states(&mut self) -> Vec<String> {
        let mut expired: Vec<String> = Vec::new();
        for (id, state) in self.active_states.iter_mut() {
            state.remaining_ticks = state.remaining_ticks.saturating_sub(1);
            if state.remaining_ticks == 0 {
                expired.push(id.clone());
            }
        }
        expired.sort();

        let callbacks: Vec<ExpiryCallback> = expired
            .iter()
            .filter_map(|id| self.active_states.remove(id))
            .filter_map(|state| state.on_expire)
            .collect();
        for callback in callbacks {
            callback(self);
        }

        expired
    }

    // ========================================================================
    // Cooldowns (absolute expiry)
    // ========================================================================

    /// Whether `key` is still cooling down at `now`.
    pub fn is_on_cooldown(&self, key: &str, now: SimTime) -> bool {
        self.cooldowns.get(key).is_some_and(|end| now < *end)
    }

    /// Milliseconds until `key` is ready, 0 if ready.
    pub fn remaining_cooldown(&self, key: &str, now: SimTime) -> u64 {
        self.cooldowns
            .get(key)
            .map(|end| end.since(now))
            .unwrap_or(0)
    }

    /// Starts or restarts the cooldown for `key`.
    pub fn set_cooldown(&mut self, key: impl Into<String>, duration_ms: u64, now: SimTime) {
        self.cooldowns
            .insert(key.into(), now.saturating_add(duration_ms));
    }

    /// Shortens a running cooldown; unknown keys are ignored.
    pub fn reduce_cooldown(&mut self, key: &str, reduction_ms: u64) {
        if let Some(end) = self.cooldowns.get_mut(key) {
            *end = end.saturating_sub(reduction_ms);
        }
    }

    /// Ends a cooldown early.
    pub fn clear_cooldown(&mut self, key: &str) {
        self.cooldowns.remove(key);
    }

    // ========================================================================
    // Rejection meter [0, MAX_REJECTION]
    // ========================================================================

    /// Current rejection in `[0, MAX_REJECTION]`.
    pub fn rejection(&self) -> f32 {
        self.rejection
    }

    /// Adds (or with a negative amount, removes) rejection, clamped to range.
    pub fn add_rejection(&mut self, amount: f32) {
        self.set_rejection(self.rejection + amount);
    }

    /// Sets rejection, clamped to range; NaN resets to 0.
    pub fn set_rejection(&mut self, value: f32) {
        self.rejection = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, EngineConstants::MAX_REJECTION)
        };
    }

    /// Whether rejection has reached the critical threshold.
    pub fn is_rejection_critical(&self) -> bool {
        self.rejection >= EngineConstants::CRITICAL_REJECTION
    }

    /// Penalty factor in `[0, 1]`.
    pub fn rejection_penalty(&self) -> f32 {
        self.rejection / EngineConstants::MAX_REJECTION
    }

    // ========================================================================
    // Timed states
    // ========================================================================

    /// Starts (or restarts) a timed state lasting `duration_ticks` ticks.
    pub fn activate_state(&mut self, id: impl Into<String>, duration_ticks: u32) {
        self.insert_state(id.into(), duration_ticks, None);
    }

    /// Starts a timed state that runs `on_expire` once when it runs out.
    pub fn activate_state_with<F>(&mut self, id: impl Into<String>, duration_ticks: u32, on_expire: F)
    where
        F: FnOnce(&mut EntityRuntimeState) + Send + 'static,
    {
        self.insert_state(id.into(), duration_ticks, Some(Box::new(on_expire)));
    }

    fn insert_state(&mut self, id: String, duration_ticks: u32, on_expire: Option<ExpiryCallback>) {
        self.active_states.insert(
            id,
            ActiveState {
                remaining_ticks: duration_ticks,
                on_expire,
            },
        );
    }

    /// Whether a timed state is running.
    pub fn has_active_state(&self, id: &str) -> bool {
        self.active_states.contains_key(id)
    }

    /// Ticks left on a timed state, 0 if not running.
    pub fn state_remaining_ticks(&self, id: &str) -> u32 {
        self.active_states
            .get(id)
            .map(ActiveState::remaining_ticks)
            .unwrap_or(0)
    }

    /// Extends a running state, never beyond `max_ticks`.
    pub fn extend_state(&mut self, id: &str, additional_ticks: u32, max_ticks: u32) {
        if let Some(state) = self.active_states.get_mut(id) {
            state.remaining_ticks = state
                .remaining_ticks
                .saturating_add(additional_ticks)
                .min(max_ticks);
        }
    }

    /// Removes a state without running its expiry callback.
    pub fn deactivate_state(&mut self, id: &str) -> bool {
        self.active_states.remove(id).is_some()
    }

    /// Ids of running timed states, unordered.
    pub fn active_state_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.active_states.keys().map(String::as_str)
    }

    // ========================================================================
    // Transient modifiers
    // ========================================================================

    /// Sets a named multiplier read by effects.
    pub fn set_modifier(&mut self, key: impl Into<String>, value: f32) {
        self.modifiers.insert(key.into(), value);
    }

    /// Named multiplier or `default`.
    pub fn modifier(&self, key: &str, default: f32) -> f32 {
        self.modifiers.get(key).copied().unwrap_or(default)
    }

    /// Removes a multiplier and returns it.
    pub fn remove_modifier(&mut self, key: &str) -> Option<f32> {
        self.modifiers.remove(key)
    }

    /// Accumulated bonus to maximum health.
    pub fn max_health_modifier(&self) -> f32 {
        self.max_health_modifier
    }

    /// Adds to the maximum-health bonus.
    pub fn add_max_health_modifier(&mut self, delta: f32) {
        self.max_health_modifier += delta;
    }

    /// Drops the maximum-health bonus.
    pub fn reset_max_health_modifier(&mut self) {
        self.max_health_modifier = 0.0;
    }

    // ========================================================================
    // History & standing still
    // ========================================================================

    /// Recent per-tick samples, newest first.
    pub fn history(&self) -> &PositionHistory {
        &self.history
    }

    /// Sample from `ticks_ago` ticks back; 0 is the newest.
    pub fn position_at(&self, ticks_ago: usize) -> Option<&PositionSnapshot> {
        self.history.at(ticks_ago)
    }

    /// Consecutive ticks without moving.
    pub fn standing_ticks(&self) -> u32 {
        self.standing_ticks
    }

    /// Whether the actor has stood still for `required_ticks`.
    pub fn is_standing_still(&self, required_ticks: u32) -> bool {
        self.standing_ticks >= required_ticks
    }

    // ========================================================================
    // Combo
    // ========================================================================

    /// Hits in the current combo.
    pub fn combo_count(&self) -> u32 {
        self.combo_count
    }

    /// Counts one hit. A hit after the combo window starts a new combo at 1.
    pub fn increment_combo(&mut self, now: SimTime) -> u32 {
        if self.combo_count > 0 && now.since(self.last_hit) > self.constants.combo_timeout_ms {
            self.combo_count = 0;
        }
        self.combo_count = self.combo_count.saturating_add(1);
        self.last_hit = now;
        self.combo_count
    }

    /// Ends the current combo.
    pub fn reset_combo(&mut self) {
        self.combo_count = 0;
    }

    // ========================================================================
    // Causality loop
    // ========================================================================

    /// Causality-loop counter kept by rules, persisted across sessions.
    pub fn causality_loop_count(&self) -> u32 {
        self.causality_loop_count
    }

    /// Bumps the causality-loop counter, stamped at `now`.
    pub fn increment_causality_loop(&mut self, now: SimTime) {
        self.causality_loop_count = self.causality_loop_count.saturating_add(1);
        self.last_causality_loop = Some(now);
    }

    /// Required cooldown, growing linearly with the trigger count.
    pub fn causality_loop_cooldown(&self) -> u64 {
        u64::from(self.causality_loop_count) * EngineConstants::CAUSALITY_LOOP_STEP_MS
    }

    /// True once the escalating cooldown since the last trigger has elapsed.
    pub fn is_causality_loop_ready(&self, now: SimTime) -> bool {
        self.last_causality_loop
            .is_none_or(|last| now.since(last) >= self.causality_loop_cooldown())
    }

    /// Zeroes the causality-loop counter.
    pub fn reset_causality_loop(&mut self) {
        self.causality_loop_count = 0;
        self.last_causality_loop = None;
    }

    // ========================================================================
    // Flags
    // ========================================================================

    /// All raised flags.
    pub fn flags(&self) -> StateFlags {
        self.flags
    }

    /// Whether every bit of `flag` is raised.
    pub fn has_flag(&self, flag: StateFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Raises or lowers `flag`.
    pub fn set_flag(&mut self, flag: StateFlags, value: bool) {
        self.flags.set(flag, value);
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Fields kept across sessions.
    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            rejection: self.rejection,
            max_health_modifier: self.max_health_modifier,
            causality_loop_count: self.causality_loop_count,
        }
    }

    /// Loads persisted fields, clamping rejection.
    pub fn restore(&mut self, persisted: &PersistedState) {
        self.set_rejection(persisted.rejection);
        self.max_health_modifier = persisted.max_health_modifier;
        self.causality_loop_count = persisted.causality_loop_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn state() -> EntityRuntimeState {
        EntityRuntimeState::new(ActorId(1), EngineConstants::default())
    }

    fn sample_at(x: f64, world_time: u64) -> TickSample {
        TickSample::new(Vec3::new(x, 64.0, 0.0), 20.0, world_time)
    }

    #[test]
    fn rejection_stays_in_bounds_and_decays() {
        let mut s = state();
        s.add_rejection(250.0);
        assert_eq!(s.rejection(), 100.0);
        assert!(s.is_rejection_critical());

        let mut previous = s.rejection();
        for t in 0..50 {
            s.tick(&sample_at(0.0, t), SimTime(t * 50));
            assert!(s.rejection() < previous);
            assert!((0.0..=100.0).contains(&s.rejection()));
            previous = s.rejection();
        }

        s.add_rejection(-1_000.0);
        assert_eq!(s.rejection(), 0.0);
        s.tick(&sample_at(0.0, 99), SimTime(5_000));
        assert_eq!(s.rejection(), 0.0);
    }

    #[test]
    fn history_is_bounded_newest_first() {
        let mut s = EntityRuntimeState::new(
            ActorId(1),
            EngineConstants::default().with_history_capacity(10),
        );
        for t in 0..25 {
            s.tick(&sample_at(t as f64, t), SimTime(t * 50));
            assert!(s.history().len() <= 10);
            assert_eq!(s.position_at(0).map(|p| p.world_time), Some(t));
        }
    }

    #[test]
    fn standing_counter_resets_on_movement() {
        let mut s = state();
        for t in 0..5 {
            s.tick(&sample_at(1.0, t), SimTime(t * 50));
        }
        assert_eq!(s.standing_ticks(), 4);
        assert!(s.is_standing_still(4));

        s.tick(&sample_at(1.05, 5), SimTime(250));
        assert_eq!(s.standing_ticks(), 5);

        s.tick(&sample_at(3.0, 6), SimTime(300));
        assert_eq!(s.standing_ticks(), 0);
    }

    #[test]
    fn combo_resets_after_timeout() {
        let mut s = state();
        assert_eq!(s.increment_combo(SimTime(1_000)), 1);
        assert_eq!(s.increment_combo(SimTime(2_000)), 2);
        assert_eq!(s.increment_combo(SimTime(10_000)), 1);

        s.increment_combo(SimTime(11_000));
        s.tick(&sample_at(0.0, 0), SimTime(14_500));
        assert_eq!(s.combo_count(), 0);
    }

    #[test]
    fn timed_state_expires_once_with_callback() {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);

        let mut s = state();
        s.activate_state_with("overclock", 2, move |state| {
            counter.fetch_add(1, Ordering::SeqCst);
            state.set_flag(StateFlags::MELTDOWN, true);
        });

        assert!(s.tick(&sample_at(0.0, 0), SimTime(0)).is_empty());
        assert_eq!(s.state_remaining_ticks("overclock"), 1);

        let expired = s.tick(&sample_at(0.0, 1), SimTime(50));
        assert_eq!(expired, vec!["overclock".to_string()]);
        assert!(!s.has_active_state("overclock"));
        assert!(s.has_flag(StateFlags::MELTDOWN));

        s.tick(&sample_at(0.0, 2), SimTime(100));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn extend_state_is_capped() {
        let mut s = state();
        s.activate_state("phase", 10);
        s.extend_state("phase", 50, 30);
        assert_eq!(s.state_remaining_ticks("phase"), 30);
        s.extend_state("missing", 5, 30);
        assert!(!s.has_active_state("missing"));
    }

    #[test]
    fn cooldowns_use_absolute_expiry() {
        let mut s = state();
        s.set_cooldown("echo", 5_000, SimTime(1_000));
        assert!(s.is_on_cooldown("echo", SimTime(5_999)));
        assert_eq!(s.remaining_cooldown("echo", SimTime(2_000)), 4_000);

        s.reduce_cooldown("echo", 2_000);
        assert!(!s.is_on_cooldown("echo", SimTime(4_000)));
        assert_eq!(s.remaining_cooldown("unknown", SimTime(0)), 0);
    }

    #[test]
    fn causality_loop_cooldown_escalates() {
        let mut s = state();
        assert!(s.is_causality_loop_ready(SimTime(0)));

        s.increment_causality_loop(SimTime(0));
        s.increment_causality_loop(SimTime(1_000));
        assert_eq!(s.causality_loop_cooldown(), 60_000);
        assert!(!s.is_causality_loop_ready(SimTime(60_999)));
        assert!(s.is_causality_loop_ready(SimTime(61_000)));
    }

    #[test]
    fn persisted_subset_round_trips() {
        let mut s = state();
        s.add_rejection(42.0);
        s.add_max_health_modifier(-0.25);
        s.increment_causality_loop(SimTime(0));

        let mut restored = state();
        restored.restore(&s.persisted());
        assert_eq!(restored.persisted(), s.persisted());
    }
}
