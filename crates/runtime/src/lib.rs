//! Runtime orchestration for the synergy rule engine.
//!
//! This crate wires the pure rule model from `synergy-core` into a working
//! engine: a process-wide [`RuleRegistry`], the [`RuleManager`] that indexes
//! rules by event kind and dispatches events, the persisted per-actor
//! [`EntityRuleConfig`], and the [`EventAdapter`] hosts call from their own
//! lifecycle callbacks.
//!
//! Modules are organized by responsibility:
//! - [`registry`] and [`manager`] host registration and dispatch
//! - [`rule_config`] persists each actor's selected rules
//! - [`adapter`] translates host callbacks and runs energy upkeep
//! - [`config`] and [`error`] carry the ambient configuration and errors
pub mod adapter;
pub mod config;
pub mod error;
pub mod manager;
pub mod registry;
pub mod rule_config;

pub use adapter::{
    ActorInfo, ActorNotifier, AttackEvent, DamageEvent, DamageSource, DeathEvent, EnergySource,
    EventAdapter, HostSide, MaintenanceOutcome, Notice, maintenance_cost,
};
pub use config::EngineConfig;
pub use error::{RegistryError, Result};
pub use manager::{RuleManager, RuleManagerBuilder};
pub use registry::{RegisteredRule, RuleRegistry};
pub use rule_config::{
    ConfigRepository, EntityRuleConfig, FileConfigRepository, InMemoryConfigRepository,
    RepositoryError, RuleConfigDocument,
};
