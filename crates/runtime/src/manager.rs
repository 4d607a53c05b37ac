//! Rule manager - candidate lookup, activation gate and dispatch loop.
//!
//! The manager is the explicit engine context a host owns: it wires the
//! capability provider, the registry, the per-actor state store and the clock
//! together and exposes [`RuleManager::process_event`] as the single dispatch
//! entry point.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use synergy_core::{
    ActorId, CapabilityProvider, Clock, EngineError, EntityRuntimeState, EventKind, EventPayload,
    EventSnapshot, RuleDefinition, SimTime, StateStore, SystemClock,
};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::registry::{RegisteredRule, RuleRegistry};

/// Builder for [`RuleManager`].
#[derive(Default)]
pub struct RuleManagerBuilder {
    config: EngineConfig,
    registry: Option<Arc<RuleRegistry>>,
    states: Option<Arc<StateStore>>,
    clock: Option<Arc<dyn Clock>>,
    provider: Option<Arc<dyn CapabilityProvider>>,
}

impl RuleManagerBuilder {
    /// Engine switches and tuning constants.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Shares an existing registry. Rules registered through it, before or
    /// after build, are visible to dispatch.
    pub fn registry(mut self, registry: Arc<RuleRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Shares an existing per-actor state store.
    pub fn states(mut self, states: Arc<StateStore>) -> Self {
        self.states = Some(states);
        self
    }

    /// Time source for snapshots and cooldowns; the system clock by default.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Wires the provider up front instead of calling [`RuleManager::init`].
    pub fn provider(mut self, provider: Arc<dyn CapabilityProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Finishes wiring; missing parts fall back to fresh defaults.
    pub fn build(self) -> RuleManager {
        let registry = self.registry.unwrap_or_default();
        RuleManager {
            states: self
                .states
                .unwrap_or_else(|| Arc::new(StateStore::new(self.config.constants.clone()))),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            provider: RwLock::new(self.provider),
            activations: RwLock::new(HashMap::new()),
            enabled: AtomicBool::new(self.config.enabled),
            debug: AtomicBool::new(self.config.debug),
            require_activation: AtomicBool::new(self.config.require_activation),
            registry,
        }
    }
}

/// Engine context owning dispatch and the per-actor activation gate.
///
/// Dispatch is a no-op until [`RuleManager::init`] wires a capability
/// provider. Every public entry point is guarded: a failing or panicking rule
/// only stops that rule.
pub struct RuleManager {
    registry: Arc<RuleRegistry>,
    provider: RwLock<Option<Arc<dyn CapabilityProvider>>>,
    states: Arc<StateStore>,
    clock: Arc<dyn Clock>,
    activations: RwLock<HashMap<ActorId, BTreeSet<String>>>,
    enabled: AtomicBool,
    debug: AtomicBool,
    require_activation: AtomicBool,
}

impl RuleManager {
    /// Starts a builder with default configuration.
    pub fn builder() -> RuleManagerBuilder {
        RuleManagerBuilder::default()
    }

    /// Builds a manager with its own registry, state store and system clock.
    pub fn new(config: EngineConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Wires the capability provider. Re-initializing replaces it.
    pub fn init(&self, provider: Arc<dyn CapabilityProvider>) {
        let mut slot = self.provider.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            warn!(target: "synergy::manager", "Rule manager re-initialized, replacing provider");
        }
        *slot = Some(provider);
        info!(
            target: "synergy::manager",
            rules = self.registry.len(),
            "Rule manager initialized"
        );
    }

    /// Whether a capability provider has been wired.
    pub fn is_initialized(&self) -> bool {
        self.provider
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The shared rule table. Mutations made through it are indexed like
    /// those made through the manager.
    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    /// Per-actor runtime state.
    pub fn states(&self) -> &Arc<StateStore> {
        &self.states
    }

    /// Current time from the configured clock.
    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers and indexes a rule under each of its trigger kinds.
    pub fn register(&self, rule: RuleDefinition) -> Result<Arc<RuleDefinition>> {
        Ok(self.registry.register(rule)?.rule)
    }

    /// Registers rules in order, stopping at the first failure.
    pub fn register_all(&self, rules: impl IntoIterator<Item = RuleDefinition>) -> Result<usize> {
        let mut count = 0;
        for rule in rules {
            self.register(rule)?;
            count += 1;
        }
        Ok(count)
    }

    /// Removes a rule from the registry and the event index.
    pub fn unregister(&self, id: &str) -> Result<Option<Arc<RuleDefinition>>> {
        self.registry.unregister(id)
    }

    /// Drops every rule and every actor's activations.
    pub fn clear_all(&self) -> Result<usize> {
        let count = self.registry.clear()?;
        self.activations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        info!(target: "synergy::manager", rules = count, "Cleared all rules");
        Ok(count)
    }

    /// Candidates for `kind`: rules triggered by it or by the wildcard.
    pub fn get_by_event_type(&self, kind: EventKind) -> Vec<Arc<RuleDefinition>> {
        self.candidates(kind).into_iter().map(|e| e.rule).collect()
    }

    fn candidates(&self, kind: EventKind) -> Vec<RegisteredRule> {
        self.registry.candidates(kind)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Dispatches an event without payload.
    pub fn process(&self, actor: ActorId, kind: EventKind) -> usize {
        self.process_event(actor, kind, EventPayload::default())
    }

    /// Evaluates every candidate rule for `kind` and runs the matching ones.
    ///
    /// Returns the number of rules whose effects all completed. Returns 0
    /// when the engine is uninitialized or disabled, or when the actor carries
    /// no capability carrier.
    pub fn process_event(&self, actor: ActorId, kind: EventKind, payload: EventPayload) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        let Some(provider) = self.provider() else {
            return 0;
        };
        let Some(snapshot) = EventSnapshot::builder(actor, kind)
            .payload(payload)
            .at(self.clock.now())
            .build(provider.as_ref())
        else {
            return 0;
        };

        let mut candidates = self.candidates(kind);
        candidates.sort_by_key(|e| e.rule.priority());

        let gated = self.is_require_activation();

        let handle = self.states.handle(actor);
        let mut state = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut executed = 0;
        for entry in &candidates {
            let rule = entry.rule.as_ref();
            if !rule.is_enabled() {
                continue;
            }
            if gated && !self.is_activated(actor, rule.id()) {
                continue;
            }
            if self.run_rule(rule, &snapshot, &mut state) {
                executed += 1;
            }
        }

        if executed > 0 && self.is_debug_mode() {
            info!(
                target: "synergy::dispatch",
                actor = %actor,
                kind = %kind,
                executed,
                candidates = candidates.len(),
                "Dispatched event"
            );
        }
        executed
    }

    /// Matches and executes one rule inside a failure boundary.
    fn run_rule(
        &self,
        rule: &RuleDefinition,
        snapshot: &EventSnapshot,
        state: &mut EntityRuntimeState,
    ) -> bool {
        match panic::catch_unwind(AssertUnwindSafe(|| rule.matches(snapshot, &*state))) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(payload) => {
                warn!(
                    target: "synergy::dispatch",
                    rule = rule.id(),
                    actor = %snapshot.actor(),
                    panic = panic_message(payload.as_ref()),
                    "Condition panicked, treating rule as not matched"
                );
                return false;
            }
        }

        match panic::catch_unwind(AssertUnwindSafe(|| rule.execute(snapshot, &mut *state))) {
            Ok(Ok(())) => {
                if self.is_debug_mode() {
                    debug!(
                        target: "synergy::dispatch",
                        rule = rule.id(),
                        actor = %snapshot.actor(),
                        kind = %snapshot.kind(),
                        "Rule executed"
                    );
                }
                true
            }
            Ok(Err(e)) => {
                error!(
                    target: "synergy::dispatch",
                    rule = rule.id(),
                    actor = %snapshot.actor(),
                    severity = %e.severity(),
                    code = e.error_code(),
                    error = %e,
                    "Rule effect failed, continuing"
                );
                false
            }
            Err(payload) => {
                error!(
                    target: "synergy::dispatch",
                    rule = rule.id(),
                    actor = %snapshot.actor(),
                    panic = panic_message(payload.as_ref()),
                    "Rule effect panicked, continuing"
                );
                false
            }
        }
    }

    fn provider(&self) -> Option<Arc<dyn CapabilityProvider>> {
        self.provider
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ========================================================================
    // Activation gate
    // ========================================================================

    /// Switches a registered rule on for `actor`. False if the id is unknown
    /// or already active.
    pub fn activate(&self, actor: ActorId, id: &str) -> bool {
        if !self.registry.has(id) {
            return false;
        }
        self.activations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(actor)
            .or_default()
            .insert(id.to_owned())
    }

    /// Switches a rule off for `actor`. False if it was not active.
    pub fn deactivate(&self, actor: ActorId, id: &str) -> bool {
        let mut activations = self.activations.write().unwrap_or_else(PoisonError::into_inner);
        let Some(set) = activations.get_mut(&actor) else {
            return false;
        };
        let removed = set.remove(id);
        if set.is_empty() {
            activations.remove(&actor);
        }
        removed
    }

    /// Switches every rule off for `actor`. Returns how many were dropped.
    pub fn deactivate_all(&self, actor: ActorId) -> usize {
        self.activations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&actor)
            .map_or(0, |set| set.len())
    }

    /// Membership check under the read lock; nothing is cloned.
    pub fn is_activated(&self, actor: ActorId, id: &str) -> bool {
        self.activations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&actor)
            .is_some_and(|set| set.contains(id))
    }

    /// Activated ids, sorted.
    pub fn activated(&self, actor: ActorId) -> Vec<String> {
        self.activations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&actor)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of rules active for `actor`.
    pub fn activated_count(&self, actor: ActorId) -> usize {
        self.activations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&actor)
            .map_or(0, BTreeSet::len)
    }

    /// Activates every known id in `ids`, typically an actor's persisted
    /// enabled rules on login. Returns how many were newly activated.
    pub fn restore_activation<I, S>(&self, actor: ActorId, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .filter(|id| self.activate(actor, id.as_ref()))
            .count()
    }

    /// Forgets the actor: activations and runtime state.
    pub fn cleanup_actor(&self, actor: ActorId) {
        let dropped = self.deactivate_all(actor);
        let had_state = self.states.remove(actor);
        debug!(
            target: "synergy::manager",
            actor = %actor,
            activations = dropped,
            had_state,
            "Cleaned up actor"
        );
    }

    // ========================================================================
    // Switches
    // ========================================================================

    /// Global kill switch; a disabled engine dispatches nothing.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether the global kill switch is off.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Verbose per-rule dispatch logging.
    pub fn set_debug_mode(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }

    /// Whether verbose dispatch logging is on.
    pub fn is_debug_mode(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// When set, a rule only runs for actors that activated it.
    pub fn set_require_activation(&self, required: bool) {
        self.require_activation.store(required, Ordering::Relaxed);
    }

    /// Whether the activation gate is enforced.
    pub fn is_require_activation(&self) -> bool {
        self.require_activation.load(Ordering::Relaxed)
    }
}

impl Default for RuleManager {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
