//! Host callback adapter.
//!
//! [`EventAdapter`] turns host lifecycle callbacks (tick, attack, damage,
//! death, login/logout) into [`RuleManager::process_event`] calls. Callbacks
//! from the non-authoritative side are ignored, damage tagged as produced by
//! the engine is never re-dispatched, and no failure ever propagates back to
//! the host.

mod events;
mod maintenance;

pub use events::{ActorInfo, AttackEvent, DamageEvent, DamageSource, DeathEvent, HostSide};
pub use maintenance::{
    ActorNotifier, EnergySource, LOW_ENERGY_WARNING, MaintenanceOutcome, Notice, maintenance_cost,
    run_maintenance,
};

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use synergy_core::{ActorId, EventKind, EventPayload, HostObject};
use tracing::{error, info};

use crate::config::EngineConfig;
use crate::manager::RuleManager;
use crate::rule_config::EntityRuleConfig;

/// Adapter between host callbacks and the rule manager.
pub struct EventAdapter {
    manager: Arc<RuleManager>,
    rule_config: Option<Arc<EntityRuleConfig>>,
    energy: Option<Arc<dyn EnergySource>>,
    notifier: Option<Arc<dyn ActorNotifier>>,
    tick_interval: u64,
    maintenance_interval: u64,
}

impl EventAdapter {
    /// Adapter with no energy source, notifier or persisted selection.
    pub fn new(manager: Arc<RuleManager>, config: &EngineConfig) -> Self {
        Self {
            manager,
            rule_config: None,
            energy: None,
            notifier: None,
            tick_interval: config.tick_interval.max(1),
            maintenance_interval: config.maintenance_interval.max(1),
        }
    }

    /// Persisted selections restored into the activation gate on login.
    pub fn with_rule_config(mut self, rule_config: Arc<EntityRuleConfig>) -> Self {
        self.rule_config = Some(rule_config);
        self
    }

    /// Enables energy upkeep for activated rules.
    pub fn with_energy(mut self, energy: Arc<dyn EnergySource>) -> Self {
        self.energy = Some(energy);
        self
    }

    /// Player-facing notices for upkeep warnings and deactivation.
    pub fn with_notifier(mut self, notifier: Arc<dyn ActorNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The manager callbacks dispatch into.
    pub fn manager(&self) -> &Arc<RuleManager> {
        &self.manager
    }

    fn is_live(&self) -> bool {
        self.manager.is_initialized() && self.manager.is_enabled()
    }

    // ========================================================================
    // Callbacks
    // ========================================================================

    /// Per-host-tick update for a player.
    ///
    /// Updates runtime state every tick, dispatches TICK once per tick
    /// interval and runs energy upkeep once per maintenance interval. Returns
    /// the number of rules executed.
    pub fn on_player_tick(&self, player: &ActorInfo, world_time: u64, side: HostSide) -> usize {
        if !side.is_authoritative() || !player.is_player || !self.is_live() {
            return 0;
        }

        let expired = self
            .manager
            .states()
            .tick(player.id, &player.sample(world_time), self.manager.now());
        if !expired.is_empty() && self.manager.is_debug_mode() {
            info!(
                target: "synergy::adapter",
                actor = %player.id,
                expired = ?expired,
                "Timed states expired"
            );
        }

        let mut executed = 0;
        if world_time % self.tick_interval == 0 {
            executed = self.dispatch("tick", player.id, EventKind::Tick, EventPayload::new());
        }

        if world_time % self.maintenance_interval == 0
            && let Some(energy) = &self.energy
        {
            let manager = &self.manager;
            let notifier = self.notifier.as_deref();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                run_maintenance(manager, energy.as_ref(), notifier, player.id)
            }));
            if outcome.is_err() {
                error!(
                    target: "synergy::adapter",
                    actor = %player.id,
                    "Energy maintenance panicked"
                );
            }
        }

        executed
    }

    /// Pre-damage callback: ATTACK for the attacking player.
    pub fn on_attack(&self, event: &AttackEvent) -> usize {
        if !event.side.is_authoritative()
            || event.source.is_engine_origin()
            || !event.attacker.is_player
            || !self.is_live()
        {
            return 0;
        }

        let payload = EventPayload::new()
            .trigger(Arc::new(event.clone()) as HostObject)
            .target(event.target.id)
            .magnitude(event.amount);
        self.dispatch("attack", event.attacker.id, EventKind::Attack, payload)
    }

    /// Post-damage callback, dispatched for both sides.
    ///
    /// The attacking player gets ATTACK, plus CRITICAL_HIT while falling onto
    /// the target. The victim, if a player, gets HURT or ENVIRONMENTAL_DAMAGE.
    pub fn on_damage(&self, event: &DamageEvent) -> usize {
        if !event.side.is_authoritative() || event.source.is_engine_origin() || !self.is_live() {
            return 0;
        }

        let trigger: HostObject = Arc::new(event.clone());
        let mut executed = 0;

        if let Some(attacker) = event.attacker.as_ref().filter(|a| a.is_player) {
            let payload = EventPayload::new()
                .trigger(Arc::clone(&trigger))
                .target(event.victim.id)
                .magnitude(event.amount);
            executed += self.dispatch("damage_dealt", attacker.id, EventKind::Attack, payload.clone());

            if attacker.is_critical_strike() {
                executed += self.dispatch("critical_hit", attacker.id, EventKind::CriticalHit, payload);
            }
        }

        if event.victim.is_player {
            let kind = if event.source.is_environmental() {
                EventKind::EnvironmentalDamage
            } else {
                EventKind::Hurt
            };
            let payload = EventPayload::new()
                .trigger(trigger)
                .maybe_target(event.attacker.as_ref().map(|a| a.id))
                .magnitude(event.amount);
            executed += self.dispatch("damage_taken", event.victim.id, kind, payload);
        }

        executed
    }

    /// KILL for the killing player, DEATH for a dying player.
    pub fn on_death(&self, event: &DeathEvent) -> usize {
        if !event.side.is_authoritative() || !self.is_live() {
            return 0;
        }

        let trigger: HostObject = Arc::new(event.clone());
        let mut executed = 0;

        if let Some(killer) = event.killer.as_ref().filter(|k| k.is_player) {
            let payload = EventPayload::new()
                .trigger(Arc::clone(&trigger))
                .target(event.victim.id)
                .magnitude(0.0);
            executed += self.dispatch("kill", killer.id, EventKind::Kill, payload);
        }

        if event.victim.is_player {
            let payload = EventPayload::new()
                .trigger(trigger)
                .maybe_target(event.killer.as_ref().map(|k| k.id))
                .magnitude(0.0);
            executed += self.dispatch("death", event.victim.id, EventKind::Death, payload);
        }

        executed
    }

    /// Restores the actor's persisted selection into the activation gate.
    ///
    /// Returns how many rules were activated.
    pub fn on_login(&self, actor: ActorId) -> usize {
        let Some(rule_config) = &self.rule_config else {
            return 0;
        };
        rule_config.reload(actor);
        let restored = self
            .manager
            .restore_activation(actor, rule_config.enabled(actor));
        info!(
            target: "synergy::adapter",
            actor = %actor,
            restored,
            "Restored rule activations"
        );
        restored
    }

    /// Drops activations, runtime state and the cached rule config.
    pub fn on_logout(&self, actor: ActorId) {
        self.manager.cleanup_actor(actor);
        if let Some(rule_config) = &self.rule_config {
            rule_config.clear_cache(actor);
        }
    }

    fn dispatch(
        &self,
        callback: &'static str,
        actor: ActorId,
        kind: EventKind,
        payload: EventPayload,
    ) -> usize {
        let manager = &self.manager;
        match panic::catch_unwind(AssertUnwindSafe(|| manager.process_event(actor, kind, payload))) {
            Ok(executed) => executed,
            Err(_) => {
                error!(
                    target: "synergy::adapter",
                    callback,
                    actor = %actor,
                    kind = %kind,
                    "Dispatch panicked, event dropped"
                );
                0
            }
        }
    }
}
