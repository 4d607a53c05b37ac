//! Stock synergy rules.
//!
//! Each constructor only uses the public rule builder; world side effects go
//! through the host's [`WorldEffects`].

use std::sync::Arc;

use synergy_core::{BuildError, EffectError, EventKind, RuleDefinition};

use crate::conditions;
use crate::tuning::{CatalogueTuning, CombatEchoTuning, EnergyLoopTuning, SurvivalShieldTuning};
use crate::world::WorldEffects;

pub const ENERGY_LOOP: &str = "energy_loop";
pub const COMBAT_ECHO: &str = "combat_echo";
pub const SURVIVAL_SHIELD: &str = "survival_shield";

/// Every stock rule, built with `tuning`.
pub fn stock_rules(
    world: Arc<dyn WorldEffects>,
    tuning: &CatalogueTuning,
) -> Result<Vec<RuleDefinition>, BuildError> {
    Ok(vec![
        energy_loop(Arc::clone(&world), &tuning.energy_loop)?,
        combat_echo(Arc::clone(&world), &tuning.combat_echo)?,
        survival_shield(world, &tuning.survival_shield)?,
    ])
}

/// Kinetic + solar generators: on TICK, a chance to restore energy scaled by
/// the combined generator level.
pub fn energy_loop(
    world: Arc<dyn WorldEffects>,
    tuning: &EnergyLoopTuning,
) -> Result<RuleDefinition, BuildError> {
    let restore = tuning.clone();
    let notify = Arc::clone(&world);

    RuleDefinition::builder(ENERGY_LOOP)
        .display_name("Energy Loop")
        .description("Generators feed each other: chance to restore energy every second")
        .category("energy")
        .require_modules(["KINETIC_GENERATOR", "SOLAR_GENERATOR"])
        .link_typed("KINETIC_GENERATOR", "SOLAR_GENERATOR", "synergy")
        .trigger(EventKind::Tick)
        .with_condition(conditions::percent(tuning.chance_percent))
        .action(move |s, _| {
            let levels = u64::from(
                s.module_level("KINETIC_GENERATOR") + s.module_level("SOLAR_GENERATOR"),
            );
            world.add_energy(s.actor(), restore.base_energy + levels * restore.energy_per_level);
        })
        .action(move |s, _| notify.status_message(s.actor(), "Energy Loop +"))
        .priority(tuning.priority)
        .enabled(tuning.enabled)
        .build()
}

/// Critical strike + damage boost: critical hits on non-players echo part of
/// the hit as true damage.
pub fn combat_echo(
    world: Arc<dyn WorldEffects>,
    tuning: &CombatEchoTuning,
) -> Result<RuleDefinition, BuildError> {
    let echo = tuning.clone();
    let damage = Arc::clone(&world);
    let notify = Arc::clone(&world);

    RuleDefinition::builder(COMBAT_ECHO)
        .display_name("Combat Echo")
        .description("Critical hits deal extra true damage")
        .category("combat")
        .require_modules(["CRITICAL_STRIKE", "DAMAGE_BOOST"])
        .link_typed("CRITICAL_STRIKE", "DAMAGE_BOOST", "synergy")
        .trigger(EventKind::CriticalHit)
        .with_condition(conditions::target_is_not_player(world))
        .effect(move |s, _| {
            let target = s.target().ok_or(EffectError::MissingTarget)?;
            let levels =
                (s.module_level("CRITICAL_STRIKE") + s.module_level("DAMAGE_BOOST")) as f32;
            let amount = s.magnitude_or(0.0) * echo.damage_ratio * levels / 2.0;
            if amount > echo.min_damage {
                damage.deal_true_damage(s.actor(), target, amount);
            }
            Ok(())
        })
        .action(move |s, _| notify.status_message(s.actor(), "Combat Echo!"))
        .priority(tuning.priority)
        .enabled(tuning.enabled)
        .build()
}

/// Shield + fire extinguisher: environmental damage grants absorption,
/// capped by the shield level, at an energy cost.
pub fn survival_shield(
    world: Arc<dyn WorldEffects>,
    tuning: &SurvivalShieldTuning,
) -> Result<RuleDefinition, BuildError> {
    let shield = tuning.clone();
    let absorb = Arc::clone(&world);
    let notify = Arc::clone(&world);
    let energy = world;
    let energy_cost = tuning.energy_cost;

    RuleDefinition::builder(SURVIVAL_SHIELD)
        .display_name("Survival Shield")
        .description("Environmental damage grants extra absorption")
        .category("defense")
        .require_modules(["YELLOW_SHIELD", "FIRE_EXTINGUISH"])
        .link_typed("YELLOW_SHIELD", "FIRE_EXTINGUISH", "synergy")
        .trigger(EventKind::EnvironmentalDamage)
        .action(move |s, _| {
            let shield_level = s.module_level("YELLOW_SHIELD") as f32;
            let fire_level = s.module_level("FIRE_EXTINGUISH") as f32;
            let gain = shield.base_absorption + (shield_level + fire_level) / 2.0;
            let cap = shield_level * shield.cap_per_shield_level;

            let current = absorb.absorption(s.actor());
            let next = (current + gain).min(cap);
            if next > current {
                absorb.set_absorption(s.actor(), next);
            }
        })
        .action(move |s, _| notify.status_message(s.actor(), "Survival Shield active!"))
        .effect(move |s, _| {
            if energy.consume_energy(s.actor(), energy_cost) {
                Ok(())
            } else {
                Err(EffectError::InsufficientResource {
                    resource: "energy",
                    required: energy_cost as f64,
                    available: energy.energy(s.actor()) as f64,
                })
            }
        })
        .priority(tuning.priority)
        .enabled(tuning.enabled)
        .build()
}
