//! Process-wide table of registered rules and their event-kind index.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use synergy_core::{EventKind, RuleDefinition};
use tracing::{debug, warn};

use crate::error::{RegistryError, Result};

/// A registered rule with its registration sequence number.
///
/// The sequence number breaks priority ties: rules with equal priority run in
/// registration order.
#[derive(Clone, Debug)]
pub struct RegisteredRule {
    pub seq: u64,
    pub rule: Arc<RuleDefinition>,
}

/// Event kind → candidate rules, kept in registration order per kind.
#[derive(Debug, Default)]
struct EventIndex {
    by_kind: HashMap<EventKind, Vec<RegisteredRule>>,
}

impl EventIndex {
    fn insert(&mut self, entry: &RegisteredRule) {
        for kind in entry.rule.triggers() {
            let bucket = self.by_kind.entry(*kind).or_default();
            if !bucket.iter().any(|e| e.rule.id() == entry.rule.id()) {
                bucket.push(entry.clone());
            }
        }
    }

    fn remove(&mut self, id: &str) {
        for bucket in self.by_kind.values_mut() {
            bucket.retain(|e| e.rule.id() != id);
        }
        self.by_kind.retain(|_, bucket| !bucket.is_empty());
    }

    /// Rules indexed under `kind` or the wildcard, de-duplicated, in
    /// registration order. The wildcard itself selects every indexed rule.
    fn candidates(&self, kind: EventKind) -> Vec<RegisteredRule> {
        let buckets: Vec<&Vec<RegisteredRule>> = if kind.is_wildcard() {
            self.by_kind.values().collect()
        } else {
            [kind, EventKind::Any]
                .iter()
                .filter_map(|k| self.by_kind.get(k))
                .collect()
        };

        let mut seen = HashSet::new();
        let mut rules: Vec<RegisteredRule> = buckets
            .into_iter()
            .flatten()
            .filter(|e| seen.insert(e.rule.id().to_owned()))
            .cloned()
            .collect();
        rules.sort_by_key(|e| e.seq);
        rules
    }
}

/// Rules and their index share one lock so they never disagree.
#[derive(Debug, Default)]
struct Table {
    rules: HashMap<String, RegisteredRule>,
    index: EventIndex,
    next_seq: u64,
}

impl Table {
    fn ordered(&self) -> Vec<RegisteredRule> {
        let mut entries: Vec<RegisteredRule> = self.rules.values().cloned().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }
}

/// Id → rule table guarded by a single coarse lock.
///
/// Written at load time and read on every dispatch. The event-kind index is
/// updated under the same write lock as the table, so every mutation path
/// (direct or through [`RuleManager`](crate::RuleManager)) keeps dispatch in
/// step with registration. Enumerations return rules in registration order.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    table: RwLock<Table>,
}

impl RuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts and indexes a rule, failing if its id is already taken.
    pub fn register(&self, rule: RuleDefinition) -> Result<RegisteredRule> {
        let mut table = self
            .table
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;

        if table.rules.contains_key(rule.id()) {
            warn!(
                target: "synergy::registry",
                rule = rule.id(),
                "Rejected duplicate rule id"
            );
            return Err(RegistryError::DuplicateId(rule.id().to_owned()));
        }

        let entry = RegisteredRule {
            seq: table.next_seq,
            rule: Arc::new(rule),
        };
        table.next_seq += 1;
        table.index.insert(&entry);
        table
            .rules
            .insert(entry.rule.id().to_owned(), entry.clone());

        debug!(
            target: "synergy::registry",
            rule = entry.rule.id(),
            seq = entry.seq,
            priority = entry.rule.priority(),
            "Registered rule"
        );
        Ok(entry)
    }

    /// Removes and returns a rule along with its index entries; `None` if
    /// the id is unknown.
    pub fn unregister(&self, id: &str) -> Result<Option<Arc<RuleDefinition>>> {
        let mut table = self
            .table
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;
        let removed = table.rules.remove(id).map(|entry| entry.rule);
        if removed.is_some() {
            table.index.remove(id);
            debug!(target: "synergy::registry", rule = id, "Unregistered rule");
        }
        Ok(removed)
    }

    /// Removes every rule and returns how many were dropped.
    pub fn clear(&self) -> Result<usize> {
        let mut table = self
            .table
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;
        let count = table.rules.len();
        table.rules.clear();
        table.index = EventIndex::default();
        Ok(count)
    }

    /// Looks up a rule by id.
    pub fn get(&self, id: &str) -> Option<Arc<RuleDefinition>> {
        self.read(|table| table.rules.get(id).map(|entry| Arc::clone(&entry.rule)))
    }

    /// Whether a rule with `id` is registered.
    pub fn has(&self, id: &str) -> bool {
        self.read(|table| table.rules.contains_key(id))
    }

    /// Every registered rule, enabled or not.
    pub fn get_all(&self) -> Vec<Arc<RuleDefinition>> {
        self.collect(|_| true)
    }

    /// Rules whose `enabled` flag is set.
    pub fn get_enabled(&self) -> Vec<Arc<RuleDefinition>> {
        self.collect(RuleDefinition::is_enabled)
    }

    /// Rules in `category`, compared case-insensitively.
    pub fn by_category(&self, category: &str) -> Vec<Arc<RuleDefinition>> {
        self.collect(|rule| rule.category().eq_ignore_ascii_case(category))
    }

    /// Enabled rules whose requirements are covered by `installed`, sorted by
    /// priority with registration order breaking ties.
    ///
    /// `installed` must hold normalized (upper-case) module ids.
    pub fn find_applicable(&self, installed: &HashSet<String>) -> Vec<Arc<RuleDefinition>> {
        let mut rules = self.collect(|rule| rule.is_enabled() && rule.requirements_met(installed));
        rules.sort_by_key(|rule| rule.priority());
        rules
    }

    /// Candidate entries for `kind`: rules triggered by it or by the
    /// wildcard, in registration order.
    pub fn candidates(&self, kind: EventKind) -> Vec<RegisteredRule> {
        self.read(|table| table.index.candidates(kind))
    }

    /// Registered entries in registration order.
    pub fn entries(&self) -> Vec<RegisteredRule> {
        self.read(Table::ordered)
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.read(|table| table.rules.len())
    }

    /// Whether no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn collect(&self, keep: impl Fn(&RuleDefinition) -> bool) -> Vec<Arc<RuleDefinition>> {
        self.read(|table| {
            table
                .ordered()
                .into_iter()
                .filter(|entry| keep(&entry.rule))
                .map(|entry| entry.rule)
                .collect()
        })
    }

    fn read<R>(&self, f: impl FnOnce(&Table) -> R) -> R {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        f(&table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synergy_core::Effect;

    fn rule(id: &str, modules: &[&str], priority: i32) -> RuleDefinition {
        RuleDefinition::builder(id)
            .require_modules(modules.iter().copied())
            .with_effect(Effect::add_rejection(1.0))
            .priority(priority)
            .build()
            .unwrap()
    }

    fn ids(rules: &[Arc<RuleDefinition>]) -> Vec<&str> {
        rules.iter().map(|r| r.id()).collect()
    }

    fn candidate_ids(registry: &RuleRegistry, kind: EventKind) -> Vec<String> {
        registry
            .candidates(kind)
            .into_iter()
            .map(|e| e.rule.id().to_owned())
            .collect()
    }

    #[test]
    fn index_follows_every_mutation() {
        let registry = RuleRegistry::new();
        registry
            .register(
                RuleDefinition::builder("hit")
                    .require_module("A")
                    .trigger(EventKind::Attack)
                    .with_effect(Effect::add_rejection(1.0))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry.register(rule("any", &["A"], 1)).unwrap();
        assert_eq!(candidate_ids(&registry, EventKind::Attack), ["hit", "any"]);

        registry.unregister("hit").unwrap();
        assert_eq!(candidate_ids(&registry, EventKind::Attack), ["any"]);

        registry.clear().unwrap();
        assert!(registry.candidates(EventKind::Attack).is_empty());
        assert!(registry.candidates(EventKind::Any).is_empty());
    }

    #[test]
    fn duplicate_registration_keeps_first_definition() {
        let registry = RuleRegistry::new();
        registry.register(rule("x", &["A"], 10)).unwrap();

        let err = registry.register(rule("x", &["B"], 20)).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId("x".into()));

        let kept = registry.get("x").unwrap();
        assert_eq!(kept.priority(), 10);
        assert!(kept.required_modules().contains("A"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unregister_returns_prior_definition() {
        let registry = RuleRegistry::new();
        registry.register(rule("x", &["A"], 10)).unwrap();

        assert_eq!(registry.unregister("x").unwrap().map(|r| r.priority()), Some(10));
        assert!(registry.unregister("x").unwrap().is_none());
        assert!(!registry.has("x"));
        assert!(registry.is_empty());
    }

    #[test]
    fn find_applicable_is_stable_by_priority() {
        let registry = RuleRegistry::new();
        registry.register(rule("late", &["A"], 50)).unwrap();
        registry.register(rule("first_tie", &["A"], 10)).unwrap();
        registry.register(rule("needs_b", &["A", "B"], 1)).unwrap();
        registry.register(rule("second_tie", &["A"], 10)).unwrap();
        registry
            .register(
                RuleDefinition::builder("off")
                    .require_module("A")
                    .with_effect(Effect::add_rejection(1.0))
                    .enabled(false)
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let installed: HashSet<String> = ["A".to_string()].into_iter().collect();
        let applicable = registry.find_applicable(&installed);
        assert_eq!(ids(&applicable), ["first_tie", "second_tie", "late"]);
        assert_eq!(registry.get_enabled().len(), 4);
        assert_eq!(ids(&registry.get_all())[0], "late");
    }

    #[test]
    fn by_category_ignores_case() {
        let registry = RuleRegistry::new();
        registry
            .register(
                RuleDefinition::builder("shield")
                    .require_module("A")
                    .category("Defense")
                    .with_effect(Effect::add_rejection(1.0))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry.register(rule("other", &["A"], 1)).unwrap();

        assert_eq!(ids(&registry.by_category("defense")), ["shield"]);
        assert_eq!(registry.clear().unwrap(), 2);
    }
}
