//! Runtime configuration for the synergy engine.

use std::env;
use std::path::PathBuf;

use synergy_core::EngineConstants;

/// Engine configuration shared by the manager, rule config and adapter.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Global kill switch; when false every dispatch is a no-op.
    pub enabled: bool,
    /// Logs every match and execution at info level.
    pub debug: bool,
    /// Rules fire only after the actor activated them.
    pub require_activation: bool,
    /// Host ticks between TICK dispatches.
    pub tick_interval: u64,
    /// Host ticks between energy maintenance runs.
    pub maintenance_interval: u64,
    /// Slot capacity for actors without a stored rule config.
    pub default_slots: usize,
    /// Directory for file-backed rule configs; in-memory when unset.
    pub data_dir: Option<PathBuf>,
    pub constants: EngineConstants,
}

impl EngineConfig {
    pub const DEFAULT_TICK_INTERVAL: u64 = 20;
    pub const DEFAULT_MAINTENANCE_INTERVAL: u64 = 100;
    pub const DEFAULT_SLOTS: usize = 3;

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SYNERGY_ENABLED` - Global kill switch (default: true)
    /// - `SYNERGY_DEBUG` - Verbose dispatch logging (default: false)
    /// - `SYNERGY_REQUIRE_ACTIVATION` - Enforce the activation gate (default: true)
    /// - `SYNERGY_TICK_INTERVAL` - Host ticks between TICK events (default: 20)
    /// - `SYNERGY_MAINTENANCE_INTERVAL` - Host ticks between upkeep runs (default: 100)
    /// - `SYNERGY_DEFAULT_SLOTS` - Enabled-rule capacity for new actors (default: 3)
    /// - `SYNERGY_DATA_DIR` - Directory for persisted rule configs (default: unset)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(enabled) = read_env_bool("SYNERGY_ENABLED") {
            config.enabled = enabled;
        }
        if let Some(debug) = read_env_bool("SYNERGY_DEBUG") {
            config.debug = debug;
        }
        if let Some(required) = read_env_bool("SYNERGY_REQUIRE_ACTIVATION") {
            config.require_activation = required;
        }
        if let Some(interval) = read_env::<u64>("SYNERGY_TICK_INTERVAL") {
            config.tick_interval = interval.max(1);
        }
        if let Some(interval) = read_env::<u64>("SYNERGY_MAINTENANCE_INTERVAL") {
            config.maintenance_interval = interval.max(1);
        }
        if let Some(slots) = read_env::<usize>("SYNERGY_DEFAULT_SLOTS") {
            config.default_slots = slots.max(1);
        }
        if let Some(dir) = read_env::<PathBuf>("SYNERGY_DATA_DIR") {
            config.data_dir = Some(dir);
        }

        config
    }

    /// Whether rules need a per-actor activation before they run.
    pub fn with_require_activation(mut self, required: bool) -> Self {
        self.require_activation = required;
        self
    }

    /// Enables verbose dispatch logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Replaces the per-actor state tuning.
    pub fn with_constants(mut self, constants: EngineConstants) -> Self {
        self.constants = constants;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debug: false,
            require_activation: true,
            tick_interval: Self::DEFAULT_TICK_INTERVAL,
            maintenance_interval: Self::DEFAULT_MAINTENANCE_INTERVAL,
            default_slots: Self::DEFAULT_SLOTS,
            data_dir: None,
            constants: EngineConstants::default(),
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
