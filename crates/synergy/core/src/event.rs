//! Event taxonomy - the closed set of event kinds a rule can trigger on.
//!
//! Host callbacks are translated into one of these kinds before dispatch.
//! [`EventKind::Any`] is a wildcard: it matches every kind in both directions.
//! The grouping predicates (`is_combat`, `is_energy`, ...) are conveniences for
//! content code; dispatch never consults them.

/// Kind of event dispatched to the rule engine.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EventKind {
    /// Wildcard, matches every other kind.
    Any,

    // ===== periodic =====
    /// Throttled periodic update (once per second of host time).
    Tick,

    // ===== combat =====
    /// Acting side dealt (or is about to deal) damage.
    Attack,
    /// Attack that satisfied the critical-hit heuristic.
    CriticalHit,
    /// Attack from behind the target.
    Backstab,
    /// Acting side killed its target.
    Kill,
    /// Consecutive hits within the combo window.
    Combo,
    /// Incoming attack was blocked.
    Block,
    /// Incoming attack was blocked with perfect timing.
    PerfectBlock,
    /// Incoming attack was evaded.
    Dodge,

    // ===== health =====
    /// Receiving side took damage from another actor.
    Hurt,
    /// Receiving side took damage from the environment (fire, fall, ...).
    EnvironmentalDamage,
    /// Incoming damage would be lethal.
    FatalDamage,
    /// Health dropped below the low-health threshold.
    LowHealth,
    /// Receiving side was healed.
    Heal,
    /// Receiving side died.
    Death,

    // ===== energy =====
    /// Energy was drawn from the capability carrier.
    EnergyConsumed,
    /// Energy dropped below the low-energy threshold.
    EnergyLow,
    /// Energy storage reached capacity.
    EnergyFull,

    // ===== movement =====
    Sneak,
    Sprint,
    Jump,

    // ===== modules =====
    ModuleActivate,
    ModuleDeactivate,
    SkillActivate,

    /// Explicitly requested by the host (commands, key presses).
    Manual,
}

impl EventKind {
    /// Returns true if `self` and `other` are equal or either is the wildcard.
    pub fn matches(self, other: EventKind) -> bool {
        self == other || self == Self::Any || other == Self::Any
    }

    /// Returns true for the wildcard kind.
    pub const fn is_wildcard(self) -> bool {
        matches!(self, Self::Any)
    }

    /// Kinds raised by attacking or being attacked.
    pub const fn is_combat(self) -> bool {
        matches!(
            self,
            Self::Attack
                | Self::CriticalHit
                | Self::Backstab
                | Self::Kill
                | Self::Combo
                | Self::Block
                | Self::PerfectBlock
                | Self::Dodge
        )
    }

    /// Kinds raised by energy changes.
    pub const fn is_energy(self) -> bool {
        matches!(self, Self::EnergyConsumed | Self::EnergyLow | Self::EnergyFull)
    }

    /// Kinds raised by player movement.
    pub const fn is_movement(self) -> bool {
        matches!(self, Self::Sneak | Self::Sprint | Self::Jump | Self::Dodge)
    }

    /// Kinds that change the actor's health.
    pub const fn is_health(self) -> bool {
        matches!(
            self,
            Self::Hurt
                | Self::EnvironmentalDamage
                | Self::FatalDamage
                | Self::LowHealth
                | Self::Heal
                | Self::Death
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn wildcard_matches_in_both_directions() {
        for kind in EventKind::iter() {
            assert!(EventKind::Any.matches(kind));
            assert!(kind.matches(EventKind::Any));
            assert!(kind.matches(kind));
        }
    }

    #[test]
    fn distinct_concrete_kinds_do_not_match() {
        assert!(!EventKind::Attack.matches(EventKind::Hurt));
        assert!(!EventKind::Tick.matches(EventKind::Kill));
    }

    #[test]
    fn groupings_classify_kinds() {
        assert!(EventKind::CriticalHit.is_combat());
        assert!(!EventKind::Tick.is_combat());
        assert!(EventKind::EnergyLow.is_energy());
        assert!(EventKind::Sprint.is_movement());
        assert!(EventKind::EnvironmentalDamage.is_health());
        assert!(!EventKind::Any.is_health());
    }

    #[test]
    fn names_round_trip_through_strum() {
        assert_eq!(EventKind::CriticalHit.to_string(), "critical_hit");
        assert_eq!(
            "ENVIRONMENTAL_DAMAGE".parse::<EventKind>().ok(),
            Some(EventKind::EnvironmentalDamage)
        );
    }
}
