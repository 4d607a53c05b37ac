//! Time source shared by the dispatch loop and per-actor state.
//!
//! All time-dependent state (cooldowns, combo window, causality loop) is
//! expressed in [`SimTime`] milliseconds supplied by a [`Clock`]. Hosts that
//! pause or speed up their simulation should supply a clock driven by
//! simulation time instead of [`SystemClock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds on the engine's time axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: Self = Self(0);

    /// Wraps a millisecond count.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Milliseconds since the clock's epoch.
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Later time, saturating at the maximum.
    pub const fn saturating_add(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    /// Earlier time, saturating at zero.
    pub const fn saturating_sub(self, ms: u64) -> Self {
        Self(self.0.saturating_sub(ms))
    }

    /// Milliseconds elapsed since `earlier`, zero if `earlier` is in the future.
    pub const fn since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Source of the current [`SimTime`].
pub trait Clock: Send + Sync {
    fn now(&self) -> SimTime;
}

/// Wall-clock time since the Unix epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SimTime {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        SimTime(ms)
    }
}

/// Clock advanced explicitly by the host (or by tests).
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Clock frozen at `start` until moved.
    pub fn new(start: SimTime) -> Self {
        Self {
            now: AtomicU64::new(start.0),
        }
    }

    /// Jumps to `time`, backwards included.
    pub fn set(&self, time: SimTime) {
        self.now.store(time.0, Ordering::Release);
    }

    /// Moves forward by `ms` and returns the new time.
    pub fn advance(&self, ms: u64) -> SimTime {
        SimTime(self.now.fetch_add(ms, Ordering::AcqRel).saturating_add(ms))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SimTime {
        SimTime(self.now.load(Ordering::Acquire))
    }
}
