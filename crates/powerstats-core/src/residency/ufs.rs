//! Provider for UFS link hibernation residency from `ufs_stats/`.
//!
//! Each counter lives in its own single-value file:
//! `hibern8_exit_cnt`, `hibern8_total_us` and `last_hibern8_enter_time` (us).

use std::path::PathBuf;

use tracing::{debug, trace, warn};

use crate::collector::traits::FileSystem;
use crate::models::{PowerEntityInfo, ResidencyRecord, Snapshot, StateInfo};
use crate::residency::config::US_TO_MS;
use crate::residency::parser::parse_value;
use crate::residency::provider::StateResidencyProvider;

const ENTITY: &str = "UFS";
const STATE: &str = "HIBERN8";

const ENTRY_COUNT: &str = "hibern8_exit_cnt";
const TOTAL_TIME_US: &str = "hibern8_total_us";
const LAST_ENTRY_US: &str = "last_hibern8_enter_time";

/// Collects UFS hibern8 residency.
pub struct UfsStateResidencyProvider<F: FileSystem> {
    fs: F,
    dir: PathBuf,
    name: String,
}

impl<F: FileSystem> UfsStateResidencyProvider<F> {
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `dir` - The host controller's `ufs_stats` directory
    pub fn new(fs: F, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = dir.display().to_string();
        Self { fs, dir, name }
    }

    /// Reads one counter file. Unreadable or malformed files give `None`.
    fn read_counter(&self, file: &str) -> Option<u64> {
        let path = self.dir.join(file);
        let content = match self.fs.read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!(source = %self.name, file, "counter not present");
                return None;
            }
            Err(e) => {
                warn!(source = %path.display(), error = %e, "failed to read ufs counter");
                return None;
            }
        };
        match parse_value(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                trace!(source = %self.name, file, error = %e, "omitting ufs counter");
                None
            }
        }
    }
}

impl<F: FileSystem> StateResidencyProvider for UfsStateResidencyProvider<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn entities(&self) -> Vec<PowerEntityInfo> {
        vec![PowerEntityInfo {
            id: 0,
            name: ENTITY.to_string(),
            states: vec![StateInfo {
                id: 0,
                name: STATE.to_string(),
            }],
        }]
    }

    fn collect(&self) -> Snapshot {
        if !self.fs.exists(&self.dir) {
            debug!(source = %self.name, "ufs stats not present");
            return Snapshot::new();
        }

        let mut record = ResidencyRecord::new(ENTITY, STATE);
        record.entry_count = self.read_counter(ENTRY_COUNT);
        record.total_time_ms = self.read_counter(TOTAL_TIME_US).map(|us| us / US_TO_MS);
        record.last_entry_timestamp_ms = self.read_counter(LAST_ENTRY_US).map(|us| us / US_TO_MS);
        std::iter::once(record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;

    const UFS_STATS: &str = "/sys/bus/platform/devices/13200000.ufs/ufs_stats";

    #[test]
    fn test_ufs_collect() {
        let mut fs = MockFs::new();
        fs.add_file(format!("{UFS_STATS}/hibern8_exit_cnt"), "4521\n");
        fs.add_file(format!("{UFS_STATS}/hibern8_total_us"), "98765432\n");
        fs.add_file(format!("{UFS_STATS}/last_hibern8_enter_time"), "1234567\n");

        let snapshot = UfsStateResidencyProvider::new(fs, UFS_STATS).collect();

        assert_eq!(snapshot.len(), 1);
        let record = snapshot.find("UFS", "HIBERN8").unwrap();
        assert_eq!(record.entry_count, Some(4521));
        assert_eq!(record.total_time_ms, Some(98_765));
        assert_eq!(record.last_entry_timestamp_ms, Some(1_234));
    }

    #[test]
    fn test_ufs_partial_counters() {
        let mut fs = MockFs::new();
        fs.add_file(format!("{UFS_STATS}/hibern8_exit_cnt"), "12\n");
        fs.add_file(format!("{UFS_STATS}/hibern8_total_us"), "-1\n");
        fs.add_unreadable(format!("{UFS_STATS}/last_hibern8_enter_time"));

        let snapshot = UfsStateResidencyProvider::new(fs, UFS_STATS).collect();

        let record = snapshot.find("UFS", "HIBERN8").unwrap();
        assert_eq!(record.entry_count, Some(12));
        assert_eq!(record.total_time_ms, None);
        assert_eq!(record.last_entry_timestamp_ms, None);
    }

    #[test]
    fn test_ufs_missing_dir() {
        let provider = UfsStateResidencyProvider::new(MockFs::new(), UFS_STATS);
        assert!(provider.collect().is_empty());
        assert_eq!(provider.entities()[0].state_id("HIBERN8"), Some(0));
    }
}
