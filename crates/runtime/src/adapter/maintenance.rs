//! Energy upkeep for activated rules.
//!
//! Every maintenance interval an actor pays for its activated rules. The cost
//! grows faster than linearly so that stacking many rules gets expensive:
//!
//! | activated | cost |
//! |-----------|------|
//! | 1         | 30   |
//! | 3         | 120  |
//! | 5         | 250  |

use synergy_core::ActorId;
use tracing::{debug, info};

use crate::manager::RuleManager;

/// Base upkeep per activated rule.
pub const BASE_COST_PER_RULE: u64 = 25;
/// Extra upkeep per rule for every activated rule.
pub const SCALING_COST_PER_RULE: u64 = 5;
/// Fraction of capacity under which the actor is warned once.
pub const LOW_ENERGY_WARNING: f32 = 0.10;

/// Upkeep for `count` activated rules: `n * (25 + 5n)`.
pub const fn maintenance_cost(count: u64) -> u64 {
    count * (BASE_COST_PER_RULE + count * SCALING_COST_PER_RULE)
}

/// Energy storage of an actor's capability carrier.
pub trait EnergySource: Send + Sync {
    fn current(&self, actor: ActorId) -> u64;

    fn capacity(&self, actor: ActorId) -> u64;

    /// Draws `amount`; false (and no change) if not enough is stored.
    fn consume(&self, actor: ActorId, amount: u64) -> bool;

    /// Stored fraction in `[0, 1]`; 0 without capacity.
    fn fraction(&self, actor: ActorId) -> f32 {
        let capacity = self.capacity(actor);
        if capacity == 0 {
            return 0.0;
        }
        (self.current(actor) as f64 / capacity as f64).clamp(0.0, 1.0) as f32
    }
}

/// Status message shown to an actor.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    /// Upkeep could not be paid and every activation was dropped.
    RulesDeactivated { count: usize, required: u64, available: u64 },
    /// Stored energy just fell below the warning threshold.
    LowEnergy { fraction: f32 },
}

pub trait ActorNotifier: Send + Sync {
    fn notify(&self, actor: ActorId, notice: Notice);
}

/// Result of one upkeep run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaintenanceOutcome {
    /// Nothing activated, nothing paid.
    Idle,
    Paid { cost: u64 },
    Deactivated { count: usize },
}

/// Charges `actor` for its activated rules, deactivating all of them when the
/// upkeep cannot be paid.
pub fn run_maintenance(
    manager: &RuleManager,
    energy: &dyn EnergySource,
    notifier: Option<&dyn ActorNotifier>,
    actor: ActorId,
) -> MaintenanceOutcome {
    let count = manager.activated_count(actor);
    if count == 0 {
        return MaintenanceOutcome::Idle;
    }

    let cost = maintenance_cost(count as u64);
    let available = energy.current(actor);
    let before = energy.fraction(actor);

    if available < cost || !energy.consume(actor, cost) {
        let count = manager.deactivate_all(actor);
        info!(
            target: "synergy::maintenance",
            actor = %actor,
            deactivated = count,
            required = cost,
            available,
            "Insufficient energy, deactivated all rules"
        );
        if let Some(notifier) = notifier {
            notifier.notify(
                actor,
                Notice::RulesDeactivated {
                    count,
                    required: cost,
                    available,
                },
            );
        }
        return MaintenanceOutcome::Deactivated { count };
    }

    let after = energy.fraction(actor);
    if after <= LOW_ENERGY_WARNING
        && before > LOW_ENERGY_WARNING
        && let Some(notifier) = notifier
    {
        notifier.notify(actor, Notice::LowEnergy { fraction: after });
    }

    if manager.is_debug_mode() {
        debug!(
            target: "synergy::maintenance",
            actor = %actor,
            rules = count,
            cost,
            remaining = energy.current(actor),
            "Paid rule upkeep"
        );
    }
    MaintenanceOutcome::Paid { cost }
}
