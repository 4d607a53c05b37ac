//! Event snapshots - the immutable per-dispatch capture of "what happened".
//!
//! A snapshot is built fresh for every dispatch from the acting actor, the
//! event kind, an optional [`EventPayload`] and the capability provider's view
//! of the actor's modules. Rules evaluate their conditions and run their
//! effects against it; nothing in it changes after [`SnapshotBuilder::build`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::clock::SimTime;
use crate::event::EventKind;
use crate::provider::{ActorId, CapabilityProvider, HostObject, ModuleView};

/// Normalizes a module id to the case used by requirement sets.
pub fn normalize_module_id(id: &str) -> String {
    id.to_ascii_uppercase()
}

/// Ad hoc value attached to a snapshot via [`SnapshotBuilder::custom_data`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExtraValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ExtraValue {
    /// The flag, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// The text, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for ExtraValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for ExtraValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for ExtraValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for ExtraValue {
    fn from(v: f32) -> Self {
        Self::Float(v.into())
    }
}

impl From<f64> for ExtraValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ExtraValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for ExtraValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Optional parts of a dispatch: raw host event, target, magnitude, extras.
#[derive(Clone, Default)]
pub struct EventPayload {
    pub trigger: Option<HostObject>,
    pub target: Option<ActorId>,
    pub magnitude: Option<f32>,
    pub extras: BTreeMap<String, ExtraValue>,
}

impl EventPayload {
    /// Empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw host event that caused the dispatch.
    pub fn trigger(mut self, event: HostObject) -> Self {
        self.trigger = Some(event);
        self
    }

    /// The other actor involved, if any.
    pub fn target(mut self, target: ActorId) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets or clears the target.
    pub fn maybe_target(mut self, target: Option<ActorId>) -> Self {
        self.target = target;
        self
    }

    /// Event size, usually damage dealt or taken.
    pub fn magnitude(mut self, magnitude: f32) -> Self {
        self.magnitude = Some(magnitude);
        self
    }

    /// Adds one key/value pair; later values for the same key win.
    pub fn custom_data(mut self, key: impl Into<String>, value: impl Into<ExtraValue>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for EventPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPayload")
            .field("has_trigger", &self.trigger.is_some())
            .field("target", &self.target)
            .field("magnitude", &self.magnitude)
            .field("extras", &self.extras)
            .finish()
    }
}

/// Immutable capture of one dispatched event.
#[derive(Clone)]
pub struct EventSnapshot {
    actor: ActorId,
    carrier: HostObject,
    modules: Vec<ModuleView>,
    active_ids: HashSet<String>,
    installed_ids: HashSet<String>,
    kind: EventKind,
    trigger: Option<HostObject>,
    target: Option<ActorId>,
    magnitude: Option<f32>,
    extras: BTreeMap<String, ExtraValue>,
    timestamp: SimTime,
}

impl EventSnapshot {
    /// Starts a snapshot for `actor` reacting to `kind`.
    pub fn builder(actor: ActorId, kind: EventKind) -> SnapshotBuilder {
        SnapshotBuilder::new(actor, kind)
    }

    /// The acting actor.
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Kind being dispatched.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Host time at build.
    pub fn timestamp(&self) -> SimTime {
        self.timestamp
    }

    /// The other actor involved, if any.
    pub fn target(&self) -> Option<ActorId> {
        self.target
    }

    /// Event size, if the host supplied one.
    pub fn magnitude(&self) -> Option<f32> {
        self.magnitude
    }

    /// Event size or `default`.
    pub fn magnitude_or(&self, default: f32) -> f32 {
        self.magnitude.unwrap_or(default)
    }

    /// Installed modules in carrier order.
    pub fn modules(&self) -> &[ModuleView] {
        &self.modules
    }

    /// Normalized ids of modules whose `active` flag is set.
    pub fn active_module_ids(&self) -> &HashSet<String> {
        &self.active_ids
    }

    /// Normalized ids of every installed module, active or not.
    pub fn installed_module_ids(&self) -> &HashSet<String> {
        &self.installed_ids
    }

    pub fn active_module_count(&self) -> usize {
        self.active_ids.len()
    }

    /// Installed module by id, case-insensitive.
    pub fn module(&self, id: &str) -> Option<&ModuleView> {
        self.modules.iter().find(|m| m.id.eq_ignore_ascii_case(id))
    }

    /// Whether `id` is installed, active or not.
    pub fn has_module(&self, id: &str) -> bool {
        self.installed_ids.contains(&normalize_module_id(id))
    }

    /// Whether `id` is installed and active.
    pub fn is_module_active(&self, id: &str) -> bool {
        self.active_ids.contains(&normalize_module_id(id))
    }

    /// Level of the installed module, 0 if absent.
    pub fn module_level(&self, id: &str) -> u32 {
        self.module(id).map(|m| m.level).unwrap_or(0)
    }

    /// The actor's capability carrier, as handed over by the host.
    pub fn carrier(&self) -> &HostObject {
        &self.carrier
    }

    /// Carrier downcast to the host's concrete type.
    pub fn carrier_as<T: 'static>(&self) -> Option<&T> {
        self.carrier.downcast_ref::<T>()
    }

    /// Raw host event, if supplied.
    pub fn trigger(&self) -> Option<&HostObject> {
        self.trigger.as_ref()
    }

    /// Raw host event downcast to its concrete type.
    pub fn trigger_as<T: 'static>(&self) -> Option<&T> {
        self.trigger.as_ref().and_then(|t| t.downcast_ref::<T>())
    }

    /// All extras, sorted by key.
    pub fn extras(&self) -> &BTreeMap<String, ExtraValue> {
        &self.extras
    }

    /// One extra by exact key.
    pub fn extra(&self, key: &str) -> Option<&ExtraValue> {
        self.extras.get(key)
    }
}

impl fmt::Debug for EventSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSnapshot")
            .field("actor", &self.actor)
            .field("kind", &self.kind)
            .field("modules", &self.modules)
            .field("target", &self.target)
            .field("magnitude", &self.magnitude)
            .field("extras", &self.extras)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

/// Builder for [`EventSnapshot`].
#[derive(Debug)]
pub struct SnapshotBuilder {
    actor: ActorId,
    kind: EventKind,
    payload: EventPayload,
    timestamp: SimTime,
}

impl SnapshotBuilder {
    fn new(actor: ActorId, kind: EventKind) -> Self {
        Self {
            actor,
            kind,
            payload: EventPayload::default(),
            timestamp: SimTime::ZERO,
        }
    }

    /// Replaces every optional part at once.
    pub fn payload(mut self, payload: EventPayload) -> Self {
        self.payload = payload;
        self
    }

    /// Raw host event that caused the dispatch.
    pub fn trigger(mut self, event: HostObject) -> Self {
        self.payload.trigger = Some(event);
        self
    }

    /// The other actor involved.
    pub fn target(mut self, target: ActorId) -> Self {
        self.payload.target = Some(target);
        self
    }

    /// Event size, usually damage dealt or taken.
    pub fn magnitude(mut self, magnitude: f32) -> Self {
        self.payload.magnitude = Some(magnitude);
        self
    }

    /// Adds one key/value pair; later values for the same key win.
    pub fn custom_data(mut self, key: impl Into<String>, value: impl Into<ExtraValue>) -> Self {
        self.payload.extras.insert(key.into(), value.into());
        self
    }

    /// Overrides the snapshot time; the manager stamps its clock here.
    pub fn at(mut self, timestamp: SimTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Queries the provider and freezes the snapshot.
    ///
    /// Returns `None` when the actor carries no capability carrier or the
    /// carrier holds no modules; callers treat that as "nothing to dispatch",
    /// not as an error.
    pub fn build(self, provider: &dyn CapabilityProvider) -> Option<EventSnapshot> {
        let carrier = provider.carrier(self.actor)?;
        let modules = provider.installed_modules(self.actor);
        if modules.is_empty() {
            return None;
        }

        let installed_ids = modules
            .iter()
            .map(|m| normalize_module_id(&m.id))
            .collect();
        let active_ids = modules
            .iter()
            .filter(|m| m.active)
            .map(|m| normalize_module_id(&m.id))
            .collect();

        Some(EventSnapshot {
            actor: self.actor,
            carrier,
            modules,
            active_ids,
            installed_ids,
            kind: self.kind,
            trigger: self.payload.trigger,
            target: self.payload.target,
            magnitude: self.payload.magnitude,
            extras: self.payload.extras,
            timestamp: self.timestamp,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    /// Provider backed by a fixed module list; `None` modules means no carrier.
    pub(crate) struct FixedProvider(pub Option<Vec<ModuleView>>);

    impl CapabilityProvider for FixedProvider {
        fn carrier(&self, _actor: ActorId) -> Option<HostObject> {
            self.0.as_ref().map(|_| Arc::new("core") as HostObject)
        }

        fn installed_modules(&self, _actor: ActorId) -> Vec<ModuleView> {
            self.0.clone().unwrap_or_default()
        }
    }

    #[test]
    fn no_carrier_means_no_snapshot() {
        let provider = FixedProvider(None);
        let snapshot = EventSnapshot::builder(ActorId(1), EventKind::Tick).build(&provider);
        assert!(snapshot.is_none());
    }

    #[test]
    fn empty_carrier_means_no_snapshot() {
        let provider = FixedProvider(Some(vec![]));
        let snapshot = EventSnapshot::builder(ActorId(1), EventKind::Tick).build(&provider);
        assert!(snapshot.is_none());
    }

    #[test]
    fn active_ids_are_normalized_and_filtered() {
        let provider = FixedProvider(Some(vec![
            ModuleView::active("kinetic_generator", 2),
            ModuleView::inactive("Solar_Generator", 1),
        ]));
        let snapshot = EventSnapshot::builder(ActorId(1), EventKind::Tick)
            .build(&provider)
            .unwrap();

        assert!(snapshot.active_module_ids().contains("KINETIC_GENERATOR"));
        assert!(!snapshot.is_module_active("solar_generator"));
        assert!(snapshot.has_module("solar_generator"));
        assert_eq!(snapshot.module_level("KINETIC_GENERATOR"), 2);
        assert_eq!(snapshot.module_level("missing"), 0);
        assert_eq!(snapshot.active_module_count(), 1);
    }

    #[test]
    fn payload_parts_are_carried_through() {
        let provider = FixedProvider(Some(vec![ModuleView::active("core", 1)]));
        let snapshot = EventSnapshot::builder(ActorId(7), EventKind::Attack)
            .target(ActorId(9))
            .magnitude(12.5)
            .custom_data("source", "arrow")
            .custom_data("hits", 3)
            .trigger(Arc::new(42_u32))
            .at(SimTime(500))
            .build(&provider)
            .unwrap();

        assert_eq!(snapshot.target(), Some(ActorId(9)));
        assert_eq!(snapshot.magnitude_or(0.0), 12.5);
        assert_eq!(snapshot.extra("source").and_then(ExtraValue::as_str), Some("arrow"));
        assert_eq!(snapshot.extra("hits").and_then(ExtraValue::as_float), Some(3.0));
        assert_eq!(snapshot.trigger_as::<u32>(), Some(&42));
        assert_eq!(snapshot.carrier_as::<&str>(), Some(&"core"));
        assert_eq!(snapshot.timestamp(), SimTime(500));
    }
}
