//! Generic provider for "prefix: value" counter files.
//!
//! One provider owns one source file (or the first present of several candidates) and any
//! number of power entities laid out in it. Entities sharing a file are
//! delimited by their headers; see [`entity_scope`] for the boundary rule.

use tracing::{debug, warn};

use crate::collector::traits::FileSystem;
use crate::models::{PowerEntityInfo, Snapshot, StateInfo};
use crate::residency::config::PowerEntityConfig;
use crate::residency::parser::{entity_scope, parse_entity};
use crate::residency::provider::StateResidencyProvider;
use crate::residency::source::{CollectError, SourcePath, read_source};

/// Collects state residency from a single counter file.
pub struct GenericStateResidencyProvider<F: FileSystem> {
    fs: F,
    source: SourcePath,
    entities: Vec<PowerEntityConfig>,
    name: String,
}

impl<F: FileSystem> GenericStateResidencyProvider<F> {
    /// Creates a provider.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `source` - Fixed path or candidate list
    /// * `entities` - Entities laid out in the source, in reporting order
    pub fn new(fs: F, source: SourcePath, entities: Vec<PowerEntityConfig>) -> Self {
        let name = source.display_path().display().to_string();
        Self {
            fs,
            source,
            entities,
            name,
        }
    }

    /// Reads the source and parses every entity, skipping entities whose
    /// header is missing.
    fn collect_source(&self) -> Result<Snapshot, CollectError> {
        let content = read_source(&self.fs, &self.source)?;
        let headers: Vec<&str> = self.entities.iter().map(|e| e.header.as_str()).collect();

        let mut snapshot = Snapshot::new();
        for entity in &self.entities {
            match entity_scope(&content, &entity.header, &headers) {
                Some(scope) => snapshot.records.extend(parse_entity(scope, entity)),
                None => {
                    let e = CollectError::HeaderNotFound {
                        entity: entity.name.clone(),
                        header: entity.header.clone(),
                    };
                    debug!(source = %self.name, error = %e, "skipping entity");
                }
            }
        }
        Ok(snapshot)
    }
}

impl<F: FileSystem> StateResidencyProvider for GenericStateResidencyProvider<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn entities(&self) -> Vec<PowerEntityInfo> {
        self.entities
            .iter()
            .enumerate()
            .map(|(id, entity)| PowerEntityInfo {
                id: id as u32,
                name: entity.name.clone(),
                states: entity
                    .states
                    .iter()
                    .enumerate()
                    .map(|(state_id, state)| StateInfo {
                        id: state_id as u32,
                        name: state.name.clone(),
                    })
                    .collect(),
            })
            .collect()
    }

    fn collect(&self) -> Snapshot {
        match self.collect_source() {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_not_found() => {
                debug!(source = %self.name, error = %e, "source not present");
                Snapshot::new()
            }
            Err(e) => {
                warn!(source = %self.name, error = %e, "failed to read residency source");
                Snapshot::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{MockFs, RealFs};
    use crate::residency::config::{
        NS_TO_MS, StateResidencyTemplate, Transform, generate_state_residency_configs,
    };

    const SOC_STATS: &str = "/sys/devices/platform/acpm_stats/soc_stats";

    fn lpm_template() -> StateResidencyTemplate {
        StateResidencyTemplate::new()
            .entry_count("success_count:")
            .total_time("total_time_ns:", Transform::DivideBy(NS_TO_MS))
            .last_entry("last_entry_time_ns:", Transform::DivideBy(NS_TO_MS))
    }

    fn shared_file_entities() -> Vec<PowerEntityConfig> {
        let states = [("SICD", "SICD"), ("STOP", "STOP")];
        vec![
            PowerEntityConfig::new(
                "LPM",
                "LPM:",
                generate_state_residency_configs(&lpm_template(), &states),
            ),
            PowerEntityConfig::new(
                "SLC",
                "SLC:",
                generate_state_residency_configs(&lpm_template(), &states),
            ),
        ]
    }

    #[test]
    fn test_entity_isolation_when_header_missing() {
        let mut fs = MockFs::new();
        fs.add_file(
            SOC_STATS,
            "\
LPM:
success_count:SICD 10
total_time_ns:SICD 2000000000
last_entry_time_ns:SICD 3000000
success_count:STOP 1
total_time_ns:STOP 5000000
last_entry_time_ns:STOP 9000000
",
        );

        let provider = GenericStateResidencyProvider::new(
            fs,
            SourcePath::fixed(SOC_STATS),
            shared_file_entities(),
        );
        let snapshot = provider.collect();

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.entity("SLC").is_empty());

        let sicd = snapshot.find("LPM", "SICD").unwrap();
        assert_eq!(sicd.entry_count, Some(10));
        assert_eq!(sicd.total_time_ms, Some(2000));
        assert_eq!(sicd.last_entry_timestamp_ms, Some(3));

        let stop = snapshot.find("LPM", "STOP").unwrap();
        assert_eq!(stop.entry_count, Some(1));
        assert_eq!(stop.total_time_ms, Some(5));
        assert_eq!(stop.last_entry_timestamp_ms, Some(9));
    }

    #[test]
    fn test_shared_file_entities_do_not_bleed() {
        let mut fs = MockFs::new();
        fs.add_file(
            SOC_STATS,
            "\
LPM:
success_count:SICD 10
SLC:
success_count:SICD 20
success_count:STOP 21
",
        );

        let provider = GenericStateResidencyProvider::new(
            fs,
            SourcePath::fixed(SOC_STATS),
            shared_file_entities(),
        );
        let snapshot = provider.collect();

        assert_eq!(snapshot.find("LPM", "SICD").unwrap().entry_count, Some(10));
        // LPM has no STOP block of its own; SLC's must not leak into it
        assert!(snapshot.find("LPM", "STOP").unwrap().is_empty());
        assert_eq!(snapshot.find("SLC", "SICD").unwrap().entry_count, Some(20));
        assert_eq!(snapshot.find("SLC", "STOP").unwrap().entry_count, Some(21));
    }

    #[test]
    fn test_first_present_candidate_is_read() {
        let candidates: Vec<String> = (0..3)
            .map(|i| format!("/sys/devices/platform/10c80000.hsi2c/i2c-{i}/{i}-0008/power_stats"))
            .collect();

        let mut fs = MockFs::new();
        fs.add_file(&candidates[1], "NFC subsystem\nCumulative count:Idle mode: 8\n");

        let states = generate_state_residency_configs(
            &StateResidencyTemplate::new().entry_count("Cumulative count:"),
            &[("IDLE", "Idle mode:")],
        );
        let provider = GenericStateResidencyProvider::new(
            fs,
            SourcePath::candidates(candidates),
            vec![PowerEntityConfig::new("NFC", "NFC subsystem", states)],
        );

        let snapshot = provider.collect();
        assert_eq!(snapshot.find("NFC", "IDLE").unwrap().entry_count, Some(8));
    }

    #[test]
    fn test_missing_source_yields_empty_snapshot() {
        let provider = GenericStateResidencyProvider::new(
            MockFs::new(),
            SourcePath::fixed("/dev/bbd_pwrstat"),
            shared_file_entities(),
        );
        assert!(provider.collect().is_empty());
    }

    #[test]
    fn test_unreadable_source_yields_empty_snapshot() {
        let mut fs = MockFs::new();
        fs.add_unreadable(SOC_STATS);
        let provider = GenericStateResidencyProvider::new(
            fs,
            SourcePath::fixed(SOC_STATS),
            shared_file_entities(),
        );
        assert!(provider.collect().is_empty());
    }

    #[test]
    fn test_no_entities_yields_empty_snapshot() {
        let mut fs = MockFs::new();
        fs.add_file(SOC_STATS, "LPM:\n");
        let provider =
            GenericStateResidencyProvider::new(fs, SourcePath::fixed(SOC_STATS), Vec::new());
        assert!(provider.collect().is_empty());
    }

    #[test]
    fn test_collect_is_idempotent() {
        let mut fs = MockFs::new();
        fs.add_file(
            SOC_STATS,
            "LPM:\nsuccess_count:SICD 10\nSLC:\nsuccess_count:STOP 3\n",
        );
        let provider = GenericStateResidencyProvider::new(
            fs,
            SourcePath::fixed(SOC_STATS),
            shared_file_entities(),
        );

        let first = provider.collect();
        let second = provider.collect();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_entities_catalogue() {
        let provider = GenericStateResidencyProvider::new(
            MockFs::new(),
            SourcePath::fixed(SOC_STATS),
            shared_file_entities(),
        );
        let entities = provider.entities();

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].id, 1);
        assert_eq!(entities[1].name, "SLC");
        assert_eq!(entities[1].state_id("STOP"), Some(1));
        assert_eq!(provider.name(), SOC_STATS);
    }

    #[test]
    fn test_invalid_utf8_line_only_spoils_itself() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("power_stats");
        std::fs::write(&path, b"count:ON 5\ncount:OFF 7\nvendor_note: \xff\xfe\n").unwrap();

        let states = generate_state_residency_configs(
            &StateResidencyTemplate::new().entry_count("count:"),
            &[("ON", "ON"), ("OFF", "OFF")],
        );
        let provider = GenericStateResidencyProvider::new(
            RealFs::new(),
            SourcePath::fixed(path.clone()),
            vec![PowerEntityConfig::new("RADIO", "", states)],
        );

        let snapshot = provider.collect();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.find("RADIO", "ON").unwrap().entry_count, Some(5));
        assert_eq!(snapshot.find("RADIO", "OFF").unwrap().entry_count, Some(7));
    }
}
