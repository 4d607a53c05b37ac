//! Rule definitions and their builder.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use super::condition::Condition;
use super::effect::{Effect, EffectError};
use crate::chain::CapabilityChain;
use crate::error::{EngineError, ErrorSeverity};
use crate::event::EventKind;
use crate::snapshot::{EventSnapshot, normalize_module_id};
use crate::state::EntityRuntimeState;

/// Errors raised by [`RuleBuilder::build`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("rule id must not be blank")]
    BlankId,

    #[error("rule `{0}` requires no modules")]
    EmptyRequiredModules(String),

    #[error("rule `{0}` has no effects")]
    EmptyEffects(String),
}

impl EngineError for BuildError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BlankId => "RULE_BLANK_ID",
            Self::EmptyRequiredModules(_) => "RULE_NO_MODULES",
            Self::EmptyEffects(_) => "RULE_NO_EFFECTS",
        }
    }
}

/// Descriptive link between two modules, used for display only.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleLink {
    pub from: String,
    pub to: String,
    pub link_type: String,
}

impl ModuleLink {
    pub const DEFAULT_TYPE: &'static str = "required";

    /// Link between two module ids, normalized.
    pub fn new(from: &str, to: &str, link_type: impl Into<String>) -> Self {
        Self {
            from: normalize_module_id(from),
            to: normalize_module_id(to),
            link_type: link_type.into(),
        }
    }
}

/// An immutable synergy rule.
///
/// Only constructible through [`RuleDefinition::builder`], which guarantees a
/// non-empty required-module set and a non-empty effect list.
pub struct RuleDefinition {
    id: String,
    display_name: String,
    description: String,
    category: String,
    required_modules: BTreeSet<String>,
    chain: Option<CapabilityChain>,
    links: Vec<ModuleLink>,
    triggers: Vec<EventKind>,
    conditions: Vec<Condition>,
    effects: Vec<Effect>,
    priority: i32,
    enabled: bool,
    require_all_modules_active: bool,
}

impl RuleDefinition {
    pub const DEFAULT_PRIORITY: i32 = 100;
    pub const DEFAULT_CATEGORY: &'static str = "misc";

    /// Starts a rule with `id`; see [`RuleBuilder`].
    pub fn builder(id: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(id.into())
    }

    /// Unique id, trimmed.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name shown to players; the id when unset.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Grouping used by catalogue queries.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Normalized (upper-case) module ids.
    pub fn required_modules(&self) -> &BTreeSet<String> {
        &self.required_modules
    }

    /// Chain the required set was derived from, if any.
    pub fn chain(&self) -> Option<&CapabilityChain> {
        self.chain.as_ref()
    }

    /// Declared module links, for display.
    pub fn links(&self) -> &[ModuleLink] {
        &self.links
    }

    /// Declared trigger kinds; `[Any]` when none were given.
    pub fn triggers(&self) -> &[EventKind] {
        &self.triggers
    }

    /// Lower values run first.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether the rule may fire at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether inactive modules fail the requirement check.
    pub fn requires_all_modules_active(&self) -> bool {
        self.require_all_modules_active
    }

    /// Number of declared conditions.
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    /// Number of declared effects.
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// True if any declared trigger matches `kind` (wildcards included).
    pub fn matches_event_type(&self, kind: EventKind) -> bool {
        self.triggers.iter().any(|t| t.matches(kind))
    }

    /// True if every required module is in `ids` (normalized ids).
    pub fn requirements_met(&self, ids: &HashSet<String>) -> bool {
        self.required_modules.iter().all(|id| ids.contains(id))
    }

    /// Module requirement followed by every condition, short-circuiting.
    pub fn matches(&self, snapshot: &EventSnapshot, state: &EntityRuntimeState) -> bool {
        let ids = if self.require_all_modules_active {
            snapshot.active_module_ids()
        } else {
            snapshot.installed_module_ids()
        };
        self.requirements_met(ids) && self.conditions.iter().all(|c| c.evaluate(snapshot, state))
    }

    /// Runs every effect in declared order; the first failure aborts the rest.
    pub fn execute(
        &self,
        snapshot: &EventSnapshot,
        state: &mut EntityRuntimeState,
    ) -> Result<(), EffectError> {
        for effect in &self.effects {
            effect.apply(snapshot, state)?;
        }
        Ok(())
    }
}

impl fmt::Debug for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDefinition")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("required_modules", &self.required_modules)
            .field("triggers", &self.triggers)
            .field("conditions", &self.conditions.len())
            .field("effects", &self.effects.len())
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RuleDefinition`].
#[derive(Debug)]
pub struct RuleBuilder {
    id: String,
    display_name: Option<String>,
    description: String,
    category: String,
    required_modules: BTreeSet<String>,
    chain: Option<CapabilityChain>,
    links: Vec<ModuleLink>,
    triggers: Vec<EventKind>,
    conditions: Vec<Condition>,
    effects: Vec<Effect>,
    priority: i32,
    enabled: bool,
    require_all_modules_active: bool,
}

impl RuleBuilder {
    fn new(id: String) -> Self {
        Self {
            id,
            display_name: None,
            description: String::new(),
            category: RuleDefinition::DEFAULT_CATEGORY.to_owned(),
            required_modules: BTreeSet::new(),
            chain: None,
            links: Vec::new(),
            triggers: Vec::new(),
            conditions: Vec::new(),
            effects: Vec::new(),
            priority: RuleDefinition::DEFAULT_PRIORITY,
            enabled: true,
            require_all_modules_active: true,
        }
    }

    /// Name shown to players.
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Free-form description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Grouping used by catalogue queries.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Adds module ids to the required set; ids are normalized.
    pub fn require_modules<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.required_modules
            .extend(ids.into_iter().map(|id| normalize_module_id(id.as_ref())));
        self
    }

    /// Adds one module id to the required set.
    pub fn require_module(self, id: impl AsRef<str>) -> Self {
        self.require_modules([id])
    }

    /// Sets the chain and adds every id it touches to the required set.
    pub fn chain(mut self, chain: CapabilityChain) -> Self {
        self.required_modules.extend(chain.all_ids().iter().cloned());
        self.chain = Some(chain);
        self
    }

    /// Declares a link with the default type.
    pub fn link(self, from: &str, to: &str) -> Self {
        self.link_typed(from, to, ModuleLink::DEFAULT_TYPE)
    }

    /// Declares a typed link between two modules.
    pub fn link_typed(mut self, from: &str, to: &str, link_type: impl Into<String>) -> Self {
        self.links.push(ModuleLink::new(from, to, link_type));
        self
    }

    /// Adds a trigger kind; duplicates are ignored.
    pub fn trigger(mut self, kind: EventKind) -> Self {
        if !self.triggers.contains(&kind) {
            self.triggers.push(kind);
        }
        self
    }

    /// Adds several trigger kinds.
    pub fn triggers(self, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        kinds.into_iter().fold(self, Self::trigger)
    }

    /// Adds a snapshot-only predicate.
    pub fn condition<F>(self, f: F) -> Self
    where
        F: Fn(&EventSnapshot) -> bool + Send + Sync + 'static,
    {
        self.with_condition(Condition::snapshot(f))
    }

    /// Adds a predicate that also reads the actor's runtime state.
    pub fn state_condition<F>(self, f: F) -> Self
    where
        F: Fn(&EventSnapshot, &EntityRuntimeState) -> bool + Send + Sync + 'static,
    {
        self.with_condition(Condition::stateful(f))
    }

    /// Appends a prebuilt condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Appends an effect that may fail.
    pub fn effect<F>(self, f: F) -> Self
    where
        F: Fn(&EventSnapshot, &mut EntityRuntimeState) -> Result<(), EffectError>
            + Send
            + Sync
            + 'static,
    {
        self.with_effect(Effect::new(f))
    }

    /// Adds an effect that cannot fail.
    pub fn action<F>(self, f: F) -> Self
    where
        F: Fn(&EventSnapshot, &mut EntityRuntimeState) + Send + Sync + 'static,
    {
        self.with_effect(Effect::infallible(f))
    }

    /// Appends a prebuilt effect.
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Dispatch order; lower runs first, ties keep registration order.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Registers the rule switched on or off.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// When false, installed but inactive modules also satisfy requirements.
    pub fn require_all_modules_active(mut self, required: bool) -> Self {
        self.require_all_modules_active = required;
        self
    }

    /// Validates and freezes the rule.
    ///
    /// Fails on a blank id, an empty required set or no effects.
    pub fn build(self) -> Result<RuleDefinition, BuildError> {
        let id = self.id.trim().to_owned();
        if id.is_empty() {
            return Err(BuildError::BlankId);
        }
        if self.required_modules.is_empty() {
            return Err(BuildError::EmptyRequiredModules(id));
        }
        if self.effects.is_empty() {
            return Err(BuildError::EmptyEffects(id));
        }

        let triggers = if self.triggers.is_empty() {
            vec![EventKind::Any]
        } else {
            self.triggers
        };

        Ok(RuleDefinition {
            display_name: self.display_name.unwrap_or_else(|| id.clone()),
            id,
            description: self.description,
            category: self.category,
            required_modules: self.required_modules,
            chain: self.chain,
            links: self.links,
            triggers,
            conditions: self.conditions,
            effects: self.effects,
            priority: self.priority,
            enabled: self.enabled,
            require_all_modules_active: self.require_all_modules_active,
        })
    }
}
