//! Bounded position/health history, newest entry first.

use std::collections::VecDeque;

/// World-space position reported by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Point from its coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared distance to `other`.
    pub fn distance_squared(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

/// Per-tick input sampled from the host for one actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickSample {
    pub position: Vec3,
    pub health: f32,
    /// Host world tick counter at sampling time.
    pub world_time: u64,
}

impl TickSample {
    /// One tick's position and health.
    pub const fn new(position: Vec3, health: f32, world_time: u64) -> Self {
        Self {
            position,
            health,
            world_time,
        }
    }
}

/// One recorded history entry.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionSnapshot {
    pub position: Vec3,
    pub health: f32,
    pub world_time: u64,
}

impl From<&TickSample> for PositionSnapshot {
    fn from(sample: &TickSample) -> Self {
        Self {
            position: sample.position,
            health: sample.health,
            world_time: sample.world_time,
        }
    }
}

/// Fixed-capacity ring of snapshots. Index 0 is always the newest.
#[derive(Clone, Debug)]
pub struct PositionHistory {
    entries: VecDeque<PositionSnapshot>,
    capacity: usize,
}

impl PositionHistory {
    /// Ring holding at most `capacity` entries; at least 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Inserts at the front, evicting the oldest entries beyond capacity.
    pub fn record(&mut self, snapshot: PositionSnapshot) {
        self.entries.push_front(snapshot);
        self.entries.truncate(self.capacity);
    }

    /// Entry recorded `ticks_ago` ticks before the newest one.
    pub fn at(&self, ticks_ago: usize) -> Option<&PositionSnapshot> {
        self.entries.get(ticks_ago)
    }

    /// Most recent entry.
    pub fn newest(&self) -> Option<&PositionSnapshot> {
        self.entries.front()
    }

    /// Up to `max_ticks` most recent entries, newest first.
    pub fn recent(&self, max_ticks: usize) -> impl Iterator<Item = &PositionSnapshot> + '_ {
        self.entries.iter().take(max_ticks)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
