//! Durable rule-config document.
//!
//! ```json
//! { "SynergyConfig": { "EnabledSynergies": ["energy_loop"], "MaxSlots": 3 } }
//! ```
//!
//! Absent fields default to an empty list and a capacity of 3.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfigDocument {
    #[serde(rename = "SynergyConfig", default)]
    pub config: RuleConfigSection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfigSection {
    #[serde(rename = "EnabledSynergies", default)]
    pub enabled: Vec<String>,

    #[serde(rename = "MaxSlots", default = "default_max_slots")]
    pub max_slots: usize,
}

impl RuleConfigSection {
    pub const DEFAULT_MAX_SLOTS: usize = 3;
}

impl Default for RuleConfigSection {
    fn default() -> Self {
        Self {
            enabled: Vec::new(),
            max_slots: Self::DEFAULT_MAX_SLOTS,
        }
    }
}

fn default_max_slots() -> usize {
    RuleConfigSection::DEFAULT_MAX_SLOTS
}

impl RuleConfigDocument {
    /// Document holding `enabled` in selection order.
    pub fn new(enabled: Vec<String>, max_slots: usize) -> Self {
        Self {
            config: RuleConfigSection { enabled, max_slots },
        }
    }
}
