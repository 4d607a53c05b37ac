//! Per-actor persisted rule selection ("loadout").
//!
//! [`EntityRuleConfig`] caches each actor's enabled rule ids and slot capacity
//! in memory and writes every mutation through to a [`ConfigRepository`]. It
//! is independent of the manager's activation gate; the adapter bridges the
//! two on login.

mod document;
mod error;
mod file;
mod memory;
mod repository;

pub use document::{RuleConfigDocument, RuleConfigSection};
pub use error::{RepositoryError, Result};
pub use file::FileConfigRepository;
pub use memory::InMemoryConfigRepository;
pub use repository::ConfigRepository;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use synergy_core::{ActorId, EngineError};
use tracing::{debug, error, warn};

use crate::config::EngineConfig;
use crate::registry::RuleRegistry;

/// Cached view of one actor's document.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ActorRuleConfig {
    enabled: Vec<String>,
    max_slots: usize,
}

impl ActorRuleConfig {
    fn from_document(document: RuleConfigDocument) -> Self {
        let max_slots = document.config.max_slots.max(1);
        let mut enabled: Vec<String> = Vec::with_capacity(document.config.enabled.len());
        for id in document.config.enabled {
            if !enabled.contains(&id) {
                enabled.push(id);
            }
        }
        enabled.truncate(max_slots);
        Self { enabled, max_slots }
    }

    fn to_document(&self) -> RuleConfigDocument {
        RuleConfigDocument::new(self.enabled.clone(), self.max_slots)
    }
}

/// Capacity-bounded, insertion-ordered set of enabled rule ids per actor.
///
/// Invariant: an actor never has more enabled ids than slots.
pub struct EntityRuleConfig {
    registry: Arc<RuleRegistry>,
    repository: Arc<dyn ConfigRepository>,
    default_slots: usize,
    cache: RwLock<HashMap<ActorId, ActorRuleConfig>>,
}

impl EntityRuleConfig {
    /// Uses the default capacity for actors with no stored document.
    pub fn new(registry: Arc<RuleRegistry>, repository: Arc<dyn ConfigRepository>) -> Self {
        Self::with_default_slots(registry, repository, RuleConfigSection::DEFAULT_MAX_SLOTS)
    }

    /// `default_slots` applies to actors with no stored document.
    pub fn with_default_slots(
        registry: Arc<RuleRegistry>,
        repository: Arc<dyn ConfigRepository>,
        default_slots: usize,
    ) -> Self {
        Self {
            registry,
            repository,
            default_slots: default_slots.max(1),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// File-backed under `config.data_dir` when set, in memory otherwise.
    pub fn from_config(registry: Arc<RuleRegistry>, config: &EngineConfig) -> Result<Self> {
        let repository: Arc<dyn ConfigRepository> = match &config.data_dir {
            Some(dir) => Arc::new(FileConfigRepository::new(dir)?),
            None => Arc::new(InMemoryConfigRepository::new()),
        };
        Ok(Self::with_default_slots(registry, repository, config.default_slots))
    }

    /// Enabled ids in the order they were enabled.
    pub fn enabled(&self, actor: ActorId) -> Vec<String> {
        self.view(actor, |config| config.enabled.clone())
    }

    /// Whether `id` is in the actor's selection.
    pub fn is_enabled(&self, actor: ActorId, id: &str) -> bool {
        self.view(actor, |config| config.enabled.iter().any(|e| e == id))
    }

    /// Number of rules the actor has selected.
    pub fn enabled_count(&self, actor: ActorId) -> usize {
        self.view(actor, |config| config.enabled.len())
    }

    /// Slots still free before the capacity is reached.
    pub fn available_slots(&self, actor: ActorId) -> usize {
        self.view(actor, |config| config.max_slots.saturating_sub(config.enabled.len()))
    }

    /// False if already enabled, out of slots or unknown to the registry.
    pub fn enable(&self, actor: ActorId, id: &str) -> bool {
        if !self.registry.has(id) {
            debug!(target: "synergy::rule_config", actor = %actor, rule = id, "Cannot enable unknown rule");
            return false;
        }
        self.mutate(actor, |config| {
            if config.enabled.iter().any(|e| e == id) || config.enabled.len() >= config.max_slots {
                return false;
            }
            config.enabled.push(id.to_owned());
            true
        })
    }

    /// False if the id was not enabled.
    pub fn disable(&self, actor: ActorId, id: &str) -> bool {
        self.mutate(actor, |config| {
            let before = config.enabled.len();
            config.enabled.retain(|e| e != id);
            config.enabled.len() != before
        })
    }

    /// Enables or disables depending on current membership; returns whether
    /// the change was applied.
    pub fn toggle(&self, actor: ActorId, id: &str) -> bool {
        if self.is_enabled(actor, id) {
            self.disable(actor, id)
        } else {
            self.enable(actor, id)
        }
    }

    /// Disables everything. Returns false if nothing was enabled.
    pub fn clear(&self, actor: ActorId) -> bool {
        self.mutate(actor, |config| {
            let had_any = !config.enabled.is_empty();
            config.enabled.clear();
            had_any
        })
    }

    /// Current capacity for the actor.
    pub fn max_slots(&self, actor: ActorId) -> usize {
        self.view(actor, |config| config.max_slots)
    }

    /// Sets the capacity (at least 1). Shrinking below the current count
    /// drops the most recently enabled ids.
    pub fn set_max_slots(&self, actor: ActorId, slots: usize) {
        let slots = slots.max(1);
        self.mutate(actor, |config| {
            if config.max_slots == slots {
                return false;
            }
            config.max_slots = slots;
            if config.enabled.len() > slots {
                let dropped = config.enabled.split_off(slots);
                debug!(
                    target: "synergy::rule_config",
                    actor = %actor,
                    dropped = ?dropped,
                    "Capacity lowered, dropped enabled rules"
                );
            }
            true
        });
    }

    /// Forgets the cached entry (actor disconnect).
    pub fn clear_cache(&self, actor: ActorId) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&actor);
    }

    /// Re-reads the actor's document from storage (actor reconnect).
    pub fn reload(&self, actor: ActorId) {
        self.clear_cache(actor);
        self.view(actor, |_| ());
    }

    /// Number of actors with a cached selection.
    pub fn cached_actors(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn view<R>(&self, actor: ActorId, f: impl FnOnce(&ActorRuleConfig) -> R) -> R {
        if let Some(config) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&actor)
        {
            return f(config);
        }

        let loaded = self.load(actor);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        f(cache.entry(actor).or_insert(loaded))
    }

    /// Applies `f` to the cached entry and writes the result through when
    /// `f` reports a change.
    fn mutate(&self, actor: ActorId, f: impl FnOnce(&mut ActorRuleConfig) -> bool) -> bool {
        let loaded = (!self.is_cached(actor)).then(|| self.load(actor));

        let document = {
            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            let config = cache
                .entry(actor)
                .or_insert_with(|| loaded.unwrap_or_else(|| self.empty()));
            if !f(config) {
                return false;
            }
            config.to_document()
        };

        self.persist(actor, &document);
        true
    }

    fn is_cached(&self, actor: ActorId) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&actor)
    }

    fn load(&self, actor: ActorId) -> ActorRuleConfig {
        match self.repository.load(actor) {
            Ok(Some(document)) => ActorRuleConfig::from_document(document),
            Ok(None) => self.empty(),
            Err(e) => {
                warn!(
                    target: "synergy::rule_config",
                    actor = %actor,
                    code = e.error_code(),
                    error = %e,
                    "Failed to load rule config, starting empty"
                );
                self.empty()
            }
        }
    }

    fn persist(&self, actor: ActorId, document: &RuleConfigDocument) {
        if let Err(e) = self.repository.save(actor, document) {
            error!(
                target: "synergy::rule_config",
                actor = %actor,
                severity = %e.severity(),
                code = e.error_code(),
                error = %e,
                "Failed to persist rule config, keeping cached state"
            );
        }
    }

    fn empty(&self) -> ActorRuleConfig {
        ActorRuleConfig {
            enabled: Vec::new(),
            max_slots: self.default_slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synergy_core::{Effect, RuleDefinition};

    fn registry(ids: &[&str]) -> Arc<RuleRegistry> {
        let registry = Arc::new(RuleRegistry::new());
        for id in ids {
            registry
                .register(
                    RuleDefinition::builder(*id)
                        .require_module("A")
                        .with_effect(Effect::add_rejection(1.0))
                        .build()
                        .unwrap(),
                )
                .unwrap();
        }
        registry
    }

    fn config(repo: Arc<InMemoryConfigRepository>) -> EntityRuleConfig {
        EntityRuleConfig::new(registry(&["a", "b", "c", "d"]), repo)
    }

    /// Repository whose writes always fail.
    struct ReadOnlyRepository;

    impl ConfigRepository for ReadOnlyRepository {
        fn load(&self, _actor: ActorId) -> Result<Option<RuleConfigDocument>> {
            Ok(None)
        }

        fn save(&self, _actor: ActorId, _document: &RuleConfigDocument) -> Result<()> {
            Err(RepositoryError::Io(std::io::Error::other("read-only")))
        }

        fn exists(&self, _actor: ActorId) -> bool {
            false
        }

        fn delete(&self, _actor: ActorId) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn capacity_is_enforced() {
        let rules = config(Arc::new(InMemoryConfigRepository::new()));
        let actor = ActorId(1);

        assert!(rules.enable(actor, "a"));
        assert!(rules.enable(actor, "b"));
        assert!(rules.enable(actor, "c"));
        assert!(!rules.enable(actor, "d"));
        assert_eq!(rules.enabled(actor), ["a", "b", "c"]);

        assert!(rules.disable(actor, "b"));
        assert!(rules.enable(actor, "d"));
        assert_eq!(rules.enabled(actor), ["a", "c", "d"]);
        assert_eq!(rules.available_slots(actor), 0);
    }

    #[test]
    fn enable_rejects_duplicates_and_unknown_ids() {
        let rules = config(Arc::new(InMemoryConfigRepository::new()));
        assert!(rules.enable(ActorId(1), "a"));
        assert!(!rules.enable(ActorId(1), "a"));
        assert!(!rules.enable(ActorId(1), "nope"));
        assert!(!rules.disable(ActorId(1), "nope"));
        assert_eq!(rules.enabled_count(ActorId(1)), 1);
    }

    #[test]
    fn toggle_flips_membership() {
        let rules = config(Arc::new(InMemoryConfigRepository::new()));
        assert!(rules.toggle(ActorId(1), "a"));
        assert!(rules.is_enabled(ActorId(1), "a"));
        assert!(rules.toggle(ActorId(1), "a"));
        assert!(!rules.is_enabled(ActorId(1), "a"));
    }

    #[test]
    fn mutations_write_through_and_survive_reload() {
        let repo = Arc::new(InMemoryConfigRepository::new());
        let rules = config(Arc::clone(&repo));
        let actor = ActorId(9);

        rules.set_max_slots(actor, 4);
        rules.enable(actor, "b");
        rules.enable(actor, "a");
        assert_eq!(
            repo.load(actor).unwrap(),
            Some(RuleConfigDocument::new(vec!["b".into(), "a".into()], 4))
        );

        rules.clear_cache(actor);
        assert_eq!(rules.cached_actors(), 0);
        assert_eq!(rules.enabled(actor), ["b", "a"]);
        assert_eq!(rules.max_slots(actor), 4);

        assert!(rules.clear(actor));
        assert!(!rules.clear(actor));
        rules.reload(actor);
        assert!(rules.enabled(actor).is_empty());
    }

    #[test]
    fn lowering_capacity_drops_latest_ids() {
        let rules = config(Arc::new(InMemoryConfigRepository::new()));
        let actor = ActorId(2);
        rules.enable(actor, "a");
        rules.enable(actor, "b");
        rules.enable(actor, "c");

        rules.set_max_slots(actor, 0);
        assert_eq!(rules.max_slots(actor), 1);
        assert_eq!(rules.enabled(actor), ["a"]);
    }

    #[test]
    fn stored_document_over_capacity_is_truncated_on_load() {
        let repo = Arc::new(InMemoryConfigRepository::new());
        repo.save(
            ActorId(5),
            &RuleConfigDocument::new(vec!["a".into(), "b".into(), "a".into(), "c".into()], 2),
        )
        .unwrap();

        let rules = config(repo);
        assert_eq!(rules.enabled(ActorId(5)), ["a", "b"]);
    }

    #[test]
    fn failed_write_keeps_cached_mutation() {
        let rules = EntityRuleConfig::new(registry(&["a"]), Arc::new(ReadOnlyRepository));
        assert!(rules.enable(ActorId(1), "a"));
        assert!(rules.is_enabled(ActorId(1), "a"));
    }
}
