//! Pure rule model and per-actor state for the synergy engine.
//!
//! `synergy-core` defines the event taxonomy, capability chains, rule
//! definitions and the immutable [`EventSnapshot`] rules are evaluated
//! against, plus the per-actor [`EntityRuntimeState`] their effects mutate.
//! It performs no I/O and does no logging; registration, dispatch and
//! persistence live in the runtime crate, which depends on the types
//! re-exported here.
pub mod chain;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod provider;
pub mod rule;
pub mod snapshot;
pub mod state;

pub use chain::{CapabilityChain, ChainBuilder, ChainError};
pub use clock::{Clock, ManualClock, SimTime, SystemClock};
pub use config::EngineConstants;
pub use error::{EngineError, ErrorSeverity};
pub use event::EventKind;
pub use provider::{ActorId, CapabilityProvider, HostObject, ModuleView};
pub use rule::{
    BuildError, Condition, Effect, EffectError, ModuleLink, RuleBuilder, RuleDefinition,
};
pub use snapshot::{EventPayload, EventSnapshot, ExtraValue, SnapshotBuilder, normalize_module_id};
pub use state::{
    ActiveState, EntityRuntimeState, PersistedState, PositionHistory, PositionSnapshot,
    SharedState, StateFlags, StateStore, TickSample, Vec3,
};
