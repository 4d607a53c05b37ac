//! Per-actor runtime state: cooldowns, meters, timed states and history.

mod flags;
mod history;
mod runtime;
mod store;

pub use flags::StateFlags;
pub use history::{PositionHistory, PositionSnapshot, TickSample, Vec3};
pub use runtime::{ActiveState, EntityRuntimeState, ExpiryCallback, PersistedState};
pub use store::{SharedState, StateStore};
