//! Persisted rule selections through the file-backed repository.

mod common;

use std::fs;
use std::sync::Arc;

use common::init_tracing;
use synergy_core::{ActorId, Effect, RuleDefinition};
use synergy_runtime::{
    ConfigRepository, EntityRuleConfig, FileConfigRepository, RuleConfigDocument, RuleRegistry,
};
use tempfile::TempDir;

const PLAYER: ActorId = ActorId(7);

fn registry_with(ids: &[&str]) -> Arc<RuleRegistry> {
    let registry = Arc::new(RuleRegistry::new());
    for id in ids {
        registry
            .register(
                RuleDefinition::builder(*id)
                    .require_module("core")
                    .with_effect(Effect::add_rejection(1.0))
                    .build()
                    .unwrap(),
            )
            .unwrap();
    }
    registry
}

fn file_config(dir: &TempDir, registry: &Arc<RuleRegistry>) -> EntityRuleConfig {
    let repository = FileConfigRepository::new(dir.path()).unwrap();
    EntityRuleConfig::new(Arc::clone(registry), Arc::new(repository))
}

/// With three slots, enabling X, Y, Z succeeds, W is refused, and after
/// disabling Y the next enable of W succeeds. The final selection survives a
/// fresh instance reading the same directory.
#[test]
fn capacity_is_enforced_and_persisted() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let registry = registry_with(&["X", "Y", "Z", "W"]);
    let config = file_config(&dir, &registry);

    assert_eq!(config.max_slots(PLAYER), 3);
    assert!(config.enable(PLAYER, "X"));
    assert!(config.enable(PLAYER, "Y"));
    assert!(config.enable(PLAYER, "Z"));
    assert!(!config.enable(PLAYER, "W"));
    assert_eq!(config.available_slots(PLAYER), 0);

    assert!(config.disable(PLAYER, "Y"));
    assert!(config.enable(PLAYER, "W"));
    assert_eq!(config.enabled(PLAYER), ["X", "Z", "W"]);

    let reopened = file_config(&dir, &registry);
    assert_eq!(reopened.enabled(PLAYER), ["X", "Z", "W"]);
    assert_eq!(reopened.max_slots(PLAYER), 3);
}

#[test]
fn document_uses_host_facing_keys() {
    let dir = TempDir::new().unwrap();
    let registry = registry_with(&["X"]);
    let config = file_config(&dir, &registry);
    assert!(config.enable(PLAYER, "X"));

    let raw = fs::read_to_string(dir.path().join("rules_7.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["SynergyConfig"]["EnabledSynergies"][0], "X");
    assert_eq!(json["SynergyConfig"]["MaxSlots"], 3);
}

#[test]
fn reload_picks_up_external_edits_and_clamps_to_capacity() {
    let dir = TempDir::new().unwrap();
    let registry = registry_with(&["X", "Y", "Z"]);
    let config = file_config(&dir, &registry);
    assert!(config.enabled(PLAYER).is_empty());

    let repository = FileConfigRepository::new(dir.path()).unwrap();
    let edited = RuleConfigDocument::new(vec!["Z".into(), "X".into(), "Z".into(), "Y".into()], 2);
    repository.save(PLAYER, &edited).unwrap();

    // Still served from cache until reloaded.
    assert!(config.enabled(PLAYER).is_empty());

    config.reload(PLAYER);
    assert_eq!(config.enabled(PLAYER), ["Z", "X"]);
    assert_eq!(config.max_slots(PLAYER), 2);
}

#[test]
fn malformed_document_starts_empty() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("rules_7.json"), b"{ not json").unwrap();

    let registry = registry_with(&["X"]);
    let config = file_config(&dir, &registry);
    assert!(config.enabled(PLAYER).is_empty());
    assert_eq!(config.max_slots(PLAYER), 3);

    // The next change overwrites the broken document.
    assert!(config.enable(PLAYER, "X"));
    let reopened = file_config(&dir, &registry);
    assert_eq!(reopened.enabled(PLAYER), ["X"]);
}

#[test]
fn shrinking_capacity_drops_latest_selections() {
    let dir = TempDir::new().unwrap();
    let registry = registry_with(&["X", "Y", "Z"]);
    let config = file_config(&dir, &registry);
    for id in ["X", "Y", "Z"] {
        assert!(config.enable(PLAYER, id));
    }

    config.set_max_slots(PLAYER, 1);
    assert_eq!(config.enabled(PLAYER), ["X"]);

    let reopened = file_config(&dir, &registry);
    assert_eq!(reopened.enabled(PLAYER), ["X"]);
    assert_eq!(reopened.max_slots(PLAYER), 1);
}

#[test]
fn actors_are_stored_independently() {
    let dir = TempDir::new().unwrap();
    let registry = registry_with(&["X", "Y"]);
    let config = file_config(&dir, &registry);
    let other = ActorId(8);

    assert!(config.enable(PLAYER, "X"));
    assert!(config.enable(other, "Y"));
    assert_eq!(config.enabled(PLAYER), ["X"]);
    assert_eq!(config.enabled(other), ["Y"]);
    assert_eq!(config.cached_actors(), 2);

    config.clear_cache(PLAYER);
    assert_eq!(config.cached_actors(), 1);
    assert!(dir.path().join("rules_8.json").exists());
}

#[test]
fn engine_config_selects_storage_and_capacity() {
    let dir = TempDir::new().unwrap();
    let registry = registry_with(&["X", "Y"]);
    let mut engine = synergy_runtime::EngineConfig::default();
    engine.data_dir = Some(dir.path().join("rules"));
    engine.default_slots = 1;

    let config = EntityRuleConfig::from_config(Arc::clone(&registry), &engine).unwrap();
    assert_eq!(config.max_slots(PLAYER), 1);
    assert!(config.enable(PLAYER, "X"));
    assert!(!config.enable(PLAYER, "Y"));
    assert!(dir.path().join("rules/rules_7.json").exists());

    engine.data_dir = None;
    let in_memory = EntityRuleConfig::from_config(registry, &engine).unwrap();
    assert!(in_memory.enabled(PLAYER).is_empty());
}
