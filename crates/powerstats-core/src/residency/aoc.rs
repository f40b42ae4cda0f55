//! Provider for always-on compute (AoC) co-processor residency.
//!
//! The AoC driver exposes one file per core and state, e.g.
//! `control/a32_off`, each holding a small counter block measured in AoC
//! clock ticks:
//!
//! ```text
//! Counter: 12
//! Cumulative time: 2457600
//! Time last entered: 49152
//! ```
//!
//! The provider is a composition of generic providers, one per file.

use crate::collector::traits::FileSystem;
use crate::models::{PowerEntityInfo, Snapshot, StateInfo};
use crate::residency::config::{
    PowerEntityConfig, StateResidencyConfig, StateResidencyTemplate, Transform,
};
use crate::residency::generic::GenericStateResidencyProvider;
use crate::residency::provider::StateResidencyProvider;
use crate::residency::source::SourcePath;

/// AoC clock ticks per millisecond.
pub const AOC_CLOCK: u64 = 24_576;

fn aoc_template(clock: u64) -> StateResidencyTemplate {
    StateResidencyTemplate::new()
        .entry_count("Counter:")
        .total_time("Cumulative time:", Transform::DivideBy(clock))
        .last_entry("Time last entered:", Transform::DivideBy(clock))
}

/// Collects residency of AoC cores (or voltage rails, monitor modes) from
/// per-state files.
pub struct AocStateResidencyProvider<F: FileSystem> {
    entities: Vec<PowerEntityInfo>,
    providers: Vec<GenericStateResidencyProvider<F>>,
    name: String,
}

impl<F: FileSystem + Clone> AocStateResidencyProvider<F> {
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `cores` - `(entity name, path prefix)` pairs, e.g. `("AoC-A32", ".../control/a32_")`
    /// * `states` - `(state name, file suffix)` pairs, e.g. `("DWN", "off")`
    /// * `clock` - AoC clock ticks per millisecond
    pub fn new(fs: F, cores: &[(&str, String)], states: &[(&str, &str)], clock: u64) -> Self {
        let template = aoc_template(clock);
        let mut providers = Vec::with_capacity(cores.len() * states.len());
        let mut entities = Vec::with_capacity(cores.len());

        for (id, (core_name, prefix)) in cores.iter().enumerate() {
            for (state_name, suffix) in states {
                let state = StateResidencyConfig::from_template(&template, *state_name, "");
                providers.push(GenericStateResidencyProvider::new(
                    fs.clone(),
                    SourcePath::fixed(format!("{prefix}{suffix}")),
                    vec![PowerEntityConfig::new(*core_name, "", vec![state])],
                ));
            }
            entities.push(PowerEntityInfo {
                id: id as u32,
                name: core_name.to_string(),
                states: states
                    .iter()
                    .enumerate()
                    .map(|(state_id, (state_name, _))| StateInfo {
                        id: state_id as u32,
                        name: state_name.to_string(),
                    })
                    .collect(),
            });
        }

        let name = cores
            .first()
            .map(|(_, prefix)| format!("{prefix}*"))
            .unwrap_or_default();

        Self {
            entities,
            providers,
            name,
        }
    }
}

impl<F: FileSystem> StateResidencyProvider for AocStateResidencyProvider<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn entities(&self) -> Vec<PowerEntityInfo> {
        self.entities.clone()
    }

    fn collect(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for provider in &self.providers {
            snapshot.merge(provider.collect());
        }
        snapshot
    }
}
