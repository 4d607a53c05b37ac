/// Engine-wide constants and tunable defaults for per-actor state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConstants {
    /// Capacity of the position/health history ring buffer.
    pub history_capacity: usize,
    /// Milliseconds after the last hit before the combo counter resets.
    pub combo_timeout_ms: u64,
    /// Rejection points shed per second of host time.
    pub rejection_decay_per_second: f32,
}

impl EngineConstants {
    // ===== fixed by the host simulation =====
    /// Host simulation rate the per-tick decays are calibrated against.
    pub const TICKS_PER_SECOND: u32 = 20;

    // ===== rejection meter =====
    pub const MAX_REJECTION: f32 = 100.0;
    pub const CRITICAL_REJECTION: f32 = 80.0;

    // ===== movement =====
    /// Squared distance under which two consecutive positions count as "still".
    pub const STANDING_EPSILON_SQ: f64 = 0.01;

    // ===== causality loop =====
    /// Cooldown added per accumulated causality loop trigger.
    pub const CAUSALITY_LOOP_STEP_MS: u64 = 30_000;

    // ===== runtime-tunable defaults =====
    /// 5 seconds at 20 updates per second.
    pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
    pub const DEFAULT_COMBO_TIMEOUT_MS: u64 = 3_000;
    pub const DEFAULT_REJECTION_DECAY_PER_SECOND: f32 = 0.5;

    /// Stock tuning.
    pub fn new() -> Self {
        Self {
            history_capacity: Self::DEFAULT_HISTORY_CAPACITY,
            combo_timeout_ms: Self::DEFAULT_COMBO_TIMEOUT_MS,
            rejection_decay_per_second: Self::DEFAULT_REJECTION_DECAY_PER_SECOND,
        }
    }

    /// Snapshots kept per actor; at least 1.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    /// Time after the last hit at which a combo lapses.
    pub fn with_combo_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.combo_timeout_ms = timeout_ms;
        self
    }

    /// Rejection shed by a single host tick.
    pub fn rejection_decay_per_tick(&self) -> f32 {
        self.rejection_decay_per_second / Self::TICKS_PER_SECOND as f32
    }
}

impl Default for EngineConstants {
    fn default() -> Self {
        Self::new()
    }
}
