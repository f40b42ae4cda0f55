//! Static catalogue of power entities.
//!
//! Built once from configuration when providers are registered. Hosts that
//! report numeric identifiers map records back to ids through this catalogue.

use serde::{Deserialize, Serialize};

/// One configured state of a power entity.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct StateInfo {
    /// Dense per-entity index, in configuration order.
    pub id: u32,
    pub name: String,
}

/// One configured power entity.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct PowerEntityInfo {
    /// Dense index across all registered providers, in registration order.
    pub id: u32,
    pub name: String,
    /// Empty when the provider discovers states at collection time (devfreq).
    pub states: Vec<StateInfo>,
}

impl PowerEntityInfo {
    /// Looks up a state id by name.
    pub fn state_id(&self, state_name: &str) -> Option<u32> {
        self.states
            .iter()
            .find(|s| s.name == state_name)
            .map(|s| s.id)
    }
}
