//! Contracts for the host collaborators the engine reads from.
//!
//! The engine never mutates capability state. It only asks which carrier an
//! actor holds and which modules are installed on it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Stable identity of an actor in the host world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Opaque host object shared with rules (carrier items, raw host events).
///
/// Rules that know the host's concrete type can downcast it.
pub type HostObject = Arc<dyn Any + Send + Sync>;

/// Read-only view of one installed capability module.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleView {
    pub id: String,
    pub level: u32,
    pub active: bool,
}

impl ModuleView {
    /// View of a module as reported by the carrier.
    pub fn new(id: impl Into<String>, level: u32, active: bool) -> Self {
        Self {
            id: id.into(),
            level,
            active,
        }
    }

    /// Installed and switched on.
    pub fn active(id: impl Into<String>, level: u32) -> Self {
        Self::new(id, level, true)
    }

    /// Installed but switched off.
    pub fn inactive(id: impl Into<String>, level: u32) -> Self {
        Self::new(id, level, false)
    }
}

/// Supplies each actor's capability carrier and its installed modules.
///
/// Wired into the engine once at startup. Implementations must be cheap:
/// both methods are called on every dispatch.
pub trait CapabilityProvider: Send + Sync {
    /// The carrier item holding the actor's modules, `None` if the actor
    /// carries none (dispatch becomes a no-op).
    fn carrier(&self, actor: ActorId) -> Option<HostObject>;

    /// Installed modules in carrier order.
    fn installed_modules(&self, actor: ActorId) -> Vec<ModuleView>;
}
