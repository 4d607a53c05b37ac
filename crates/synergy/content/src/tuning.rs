//! Tunable numbers for the stock catalogue.

/// Per-rule tuning; every field has a default so partial files are valid.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CatalogueTuning {
    pub energy_loop: EnergyLoopTuning,
    pub combat_echo: CombatEchoTuning,
    pub survival_shield: SurvivalShieldTuning,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnergyLoopTuning {
    pub enabled: bool,
    pub priority: i32,
    /// Chance per TICK, in percent.
    pub chance_percent: u32,
    pub base_energy: u64,
    /// Added per combined generator level.
    pub energy_per_level: u64,
}

impl Default for EnergyLoopTuning {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 100,
            chance_percent: 20,
            base_energy: 50,
            energy_per_level: 25,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatEchoTuning {
    pub enabled: bool,
    pub priority: i32,
    /// Fraction of the hit echoed per averaged module level.
    pub damage_ratio: f32,
    /// Echoes at or below this amount are dropped.
    pub min_damage: f32,
}

impl Default for CombatEchoTuning {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 50,
            damage_ratio: 0.1,
            min_damage: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SurvivalShieldTuning {
    pub enabled: bool,
    pub priority: i32,
    pub base_absorption: f32,
    /// Absorption cap per shield module level.
    pub cap_per_shield_level: f32,
    pub energy_cost: u64,
}

impl Default for SurvivalShieldTuning {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 80,
            base_absorption: 2.0,
            cap_per_shield_level: 4.0,
            energy_cost: 30,
        }
    }
}
