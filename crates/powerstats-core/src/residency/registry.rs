//! Registry of residency providers exposed to the hosting stats service.
//!
//! The host registers providers once at start-up, then pulls
//! [`PowerStats::collect`] from its polling loop.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::collector::traits::FileSystem;
use crate::models::{PowerEntityInfo, Snapshot};
use crate::residency::config::PowerEntityConfig;
use crate::residency::generic::GenericStateResidencyProvider;
use crate::residency::provider::StateResidencyProvider;
use crate::residency::source::SourcePath;

/// Timing information for one provider from the last collection.
#[derive(Debug, Clone)]
pub struct ProviderTiming {
    pub provider: String,
    pub elapsed: Duration,
    pub records: usize,
}

/// Timing information for the last [`PowerStats::collect`] call.
#[derive(Debug, Clone, Default)]
pub struct CollectorTiming {
    /// Total collection time.
    pub total: Duration,
    pub providers: Vec<ProviderTiming>,
}

/// All registered residency providers.
#[derive(Default)]
pub struct PowerStats {
    providers: Vec<Box<dyn StateResidencyProvider>>,
    last_timing: Option<CollectorTiming>,
}

impl PowerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider. Its records follow those of earlier providers.
    pub fn add_provider(&mut self, provider: Box<dyn StateResidencyProvider>) {
        debug!(provider = provider.name(), "registered residency provider");
        self.providers.push(provider);
    }

    /// Registers a generic provider for `source` laid out as `entities`.
    pub fn add_generic<F: FileSystem + 'static>(
        &mut self,
        fs: F,
        source: SourcePath,
        entities: Vec<PowerEntityConfig>,
    ) {
        self.add_provider(Box::new(GenericStateResidencyProvider::new(
            fs, source, entities,
        )));
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Catalogue of every configured entity.
    ///
    /// Entity ids are dense across providers in registration order.
    pub fn power_entity_info(&self) -> Vec<PowerEntityInfo> {
        self.providers
            .iter()
            .flat_map(|p| p.entities())
            .enumerate()
            .map(|(id, mut entity)| {
                entity.id = id as u32;
                entity
            })
            .collect()
    }

    /// Collects every provider into one snapshot.
    ///
    /// Records keep registration order. With no providers the snapshot is empty.
    pub fn collect(&mut self) -> Snapshot {
        let total_start = Instant::now();
        let mut timing = CollectorTiming::default();
        let mut snapshot = Snapshot::new();

        for provider in &self.providers {
            let start = Instant::now();
            let part = provider.collect();
            timing.providers.push(ProviderTiming {
                provider: provider.name().to_string(),
                elapsed: start.elapsed(),
                records: part.len(),
            });
            snapshot.merge(part);
        }

        timing.total = total_start.elapsed();
        self.last_timing = Some(timing);
        snapshot
    }

    /// Returns timing information from the last `collect` call.
    pub fn last_timing(&self) -> Option<&CollectorTiming> {
        self.last_timing.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::residency::config::{StateResidencyTemplate, generate_state_residency_configs};
    use crate::residency::devfreq::DevfreqStateResidencyProvider;

    fn count_entity(name: &str, header: &str) -> PowerEntityConfig {
        PowerEntityConfig::new(
            name,
            header,
            generate_state_residency_configs(
                &StateResidencyTemplate::new().entry_count("count:"),
                &[("ON", "ON "), ("OFF", "OFF ")],
            ),
        )
    }

    #[test]
    fn test_empty_registry() {
        let mut stats = PowerStats::new();
        assert!(stats.collect().is_empty());
        assert!(stats.power_entity_info().is_empty());
        assert!(stats.last_timing().unwrap().providers.is_empty());
    }

    #[test]
    fn test_failing_source_does_not_stop_others() {
        let mut fs = MockFs::new();
        fs.add_unreadable("/sys/a/power_stats");
        fs.add_file("/sys/b/power_stats", "count:ON 1\ncount:OFF 2\n");

        let mut stats = PowerStats::new();
        stats.add_generic(
            fs.clone(),
            SourcePath::fixed("/sys/a/power_stats"),
            vec![count_entity("A", "")],
        );
        stats.add_generic(
            fs.clone(),
            SourcePath::fixed("/sys/missing"),
            vec![count_entity("M", "")],
        );
        stats.add_generic(
            fs,
            SourcePath::fixed("/sys/b/power_stats"),
            vec![count_entity("B", "")],
        );

        let snapshot = stats.collect();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.find("B", "OFF").unwrap().entry_count, Some(2));

        let timing = stats.last_timing().unwrap();
        assert_eq!(timing.providers.len(), 3);
        assert_eq!(timing.providers[2].records, 2);
        assert_eq!(timing.providers[0].provider, "/sys/a/power_stats");
    }

    #[test]
    fn test_records_follow_registration_order() {
        let mut fs = MockFs::new();
        fs.add_file("/sys/b/power_stats", "count:ON 1\n");
        fs.add_file("/sys/gpu/time_in_state", "150000 10\n");

        let mut stats = PowerStats::new();
        stats.add_provider(Box::new(DevfreqStateResidencyProvider::new(
            fs.clone(),
            "GPU",
            "/sys/gpu",
        )));
        stats.add_generic(
            fs,
            SourcePath::fixed("/sys/b/power_stats"),
            vec![count_entity("B", "")],
        );

        let entities: Vec<_> = stats
            .collect()
            .iter()
            .map(|r| r.entity_name.clone())
            .collect();
        assert_eq!(entities, vec!["GPU", "B", "B"]);
    }

    #[test]
    fn test_entity_ids_are_global() {
        let fs = MockFs::new();
        let mut stats = PowerStats::new();
        stats.add_generic(
            fs.clone(),
            SourcePath::fixed("/sys/soc_stats"),
            vec![count_entity("LPM", "LPM:"), count_entity("MIF", "MIF:")],
        );
        stats.add_generic(
            fs,
            SourcePath::fixed("/sys/power_stats"),
            vec![count_entity("MODEM", "")],
        );

        let info = stats.power_entity_info();
        let ids: Vec<_> = info.iter().map(|e| (e.id, e.name.as_str())).collect();
        assert_eq!(ids, vec![(0, "LPM"), (1, "MIF"), (2, "MODEM")]);
        assert_eq!(info[2].state_id("OFF"), Some(1));
        assert_eq!(stats.provider_count(), 2);
    }
}
