//! Provider for per-frequency DVFS residency from `fvp_stats`.
//!
//! The file holds one block per domain, headed by the domain name, with one
//! line per operating point:
//!
//! ```text
//! CL0
//!   2850000  120  5400000000
//!   1950000  300  9100000000
//! AUR
//!   1065000  12  3400000000
//! ```
//!
//! Point lines are `<frequency> <entry_count> <time>`; the time unit is
//! converted with the provider's [`Transform`]. Blocks of unconfigured
//! domains are ignored.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::collector::traits::FileSystem;
use crate::models::{PowerEntityInfo, ResidencyRecord, Snapshot, StateInfo};
use crate::residency::config::Transform;
use crate::residency::devfreq::parse_time_in_state_line;
use crate::residency::parser::parse_counter_blocks;
use crate::residency::provider::StateResidencyProvider;

/// One DVFS domain and its operating points.
#[derive(Debug, Clone)]
pub struct DvfsDomain {
    /// Entity name, also the block header in the stats file.
    pub name: String,
    /// `(state name, frequency token)` pairs.
    pub states: Vec<(String, String)>,
}

impl DvfsDomain {
    pub fn new(name: impl Into<String>, states: &[(&str, &str)]) -> Self {
        Self {
            name: name.into(),
            states: states
                .iter()
                .map(|(state, freq)| (state.to_string(), freq.to_string()))
                .collect(),
        }
    }
}

/// Names a frequency in kHz as whole megahertz, e.g. `1065000` -> `1065MHz`.
fn mhz_name(freq_khz: &str) -> String {
    match freq_khz.parse::<u64>() {
        Ok(khz) => format!("{}MHz", khz / 1000),
        Err(_) => freq_khz.to_string(),
    }
}

/// Collects DVFS residency for a set of domains sharing one stats file.
pub struct DvfsStateResidencyProvider<F: FileSystem> {
    fs: F,
    path: PathBuf,
    time: Transform,
    domains: Vec<DvfsDomain>,
    name: String,
}

impl<F: FileSystem> DvfsStateResidencyProvider<F> {
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `path` - Stats file, e.g. `.../acpm_stats/fvp_stats`
    /// * `time` - Conversion of the time column to milliseconds
    /// * `domains` - Domains with statically known operating points
    pub fn new(
        fs: F,
        path: impl Into<PathBuf>,
        time: Transform,
        domains: Vec<DvfsDomain>,
    ) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self {
            fs,
            path,
            time,
            domains,
            name,
        }
    }

    /// Builds a provider whose operating points are discovered from each
    /// domain's frequency table (`<dir>/time_in_state`).
    ///
    /// The tables are read once, here. A domain whose table is unreadable is
    /// kept with no states.
    pub fn adaptive(
        fs: F,
        path: impl Into<PathBuf>,
        time: Transform,
        domains: &[(&str, PathBuf)],
    ) -> Self {
        let domains = domains
            .iter()
            .map(|(name, dir)| DvfsDomain {
                name: name.to_string(),
                states: discover_frequencies(&fs, &dir.join("time_in_state"))
                    .into_iter()
                    .map(|freq| (mhz_name(&freq), freq))
                    .collect(),
            })
            .collect();
        Self::new(fs, path, time, domains)
    }
}

/// Frequencies listed in a `time_in_state` table, in file order.
fn discover_frequencies<F: FileSystem>(fs: &F, table: &std::path::Path) -> Vec<String> {
    match fs.read_to_string(table) {
        Ok(content) => content
            .lines()
            .filter_map(|line| parse_time_in_state_line(line).ok())
            .map(|(freq, _)| freq.to_string())
            .collect(),
        Err(e) => {
            debug!(source = %table.display(), error = %e, "frequency table unavailable");
            Vec::new()
        }
    }
}

impl<F: FileSystem> StateResidencyProvider for DvfsStateResidencyProvider<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn entities(&self) -> Vec<PowerEntityInfo> {
        self.domains
            .iter()
            .enumerate()
            .map(|(id, domain)| PowerEntityInfo {
                id: id as u32,
                name: domain.name.clone(),
                states: domain
                    .states
                    .iter()
                    .enumerate()
                    .map(|(state_id, (state, _))| StateInfo {
                        id: state_id as u32,
                        name: state.clone(),
                    })
                    .collect(),
            })
            .collect()
    }

    fn collect(&self) -> Snapshot {
        let content = match self.fs.read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(source = %self.name, "dvfs stats not present");
                return Snapshot::new();
            }
            Err(e) => {
                warn!(source = %self.name, error = %e, "failed to read dvfs stats");
                return Snapshot::new();
            }
        };

        let headers: Vec<&str> = self.domains.iter().map(|d| d.name.as_str()).collect();
        let mut snapshot = Snapshot::new();

        for domain in &self.domains {
            // Domains have disjoint point sets, so each is parsed on its own
            let freqs: Vec<&str> = domain.states.iter().map(|(_, f)| f.as_str()).collect();
            let blocks = parse_counter_blocks(&content, &headers, &freqs);
            let block = headers
                .iter()
                .position(|h| *h == domain.name)
                .and_then(|idx| blocks.into_iter().nth(idx).flatten());

            let Some(block) = block else {
                debug!(source = %self.name, entity = %domain.name, "dvfs block not found");
                continue;
            };
            for ((state, _), counters) in domain.states.iter().zip(block) {
                let mut record = ResidencyRecord::new(&domain.name, state);
                if let Some(c) = counters {
                    record.entry_count = Some(c.entry_count);
                    record.total_time_ms = self.time.apply(c.time);
                }
                snapshot.records.push(record);
            }
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::residency::config::NS_TO_MS;

    const FVP_STATS: &str = "/sys/devices/platform/acpm_stats/fvp_stats";
    const POLICY0: &str = "/sys/devices/system/cpu/cpufreq/policy0/stats";

    const FVP: &str = "\
CL0
  1950000  300  9100000000
  2850000  120  5400000000
AUR
  1065000  12  3400000000
  861000  4  bogus
";

    fn aur() -> DvfsDomain {
        DvfsDomain::new(
            "AUR",
            &[("1065MHz", "1065000"), ("861MHz", "861000"), ("713MHz", "713000")],
        )
    }

    #[test]
    fn test_mhz_name() {
        assert_eq!(mhz_name("1065000"), "1065MHz");
        assert_eq!(mhz_name("max"), "max");
    }

    #[test]
    fn test_dvfs_static_points() {
        let mut fs = MockFs::new();
        fs.add_file(FVP_STATS, FVP);

        let provider = DvfsStateResidencyProvider::new(
            fs,
            FVP_STATS,
            Transform::DivideBy(NS_TO_MS),
            vec![aur()],
        );
        let snapshot = provider.collect();

        assert_eq!(snapshot.len(), 3);
        let top = snapshot.find("AUR", "1065MHz").unwrap();
        assert_eq!(top.entry_count, Some(12));
        assert_eq!(top.total_time_ms, Some(3400));
        // Malformed and absent points keep their record, without counters
        assert!(snapshot.find("AUR", "861MHz").unwrap().is_empty());
        assert!(snapshot.find("AUR", "713MHz").unwrap().is_empty());
    }

    #[test]
    fn test_dvfs_adaptive_discovers_points() {
        let mut fs = MockFs::new();
        fs.add_file(FVP_STATS, FVP);
        fs.add_file(
            format!("{POLICY0}/time_in_state"),
            "2850000 10\n1950000 20\n",
        );

        let provider = DvfsStateResidencyProvider::adaptive(
            fs,
            FVP_STATS,
            Transform::DivideBy(NS_TO_MS),
            &[("CL0", PathBuf::from(POLICY0)), ("CL1", PathBuf::from("/sys/nope"))],
        );

        let entities = provider.entities();
        assert_eq!(entities[0].state_id("2850MHz"), Some(0));
        assert_eq!(entities[0].state_id("1950MHz"), Some(1));
        assert!(entities[1].states.is_empty());

        let snapshot = provider.collect();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.find("CL0", "2850MHz").unwrap().total_time_ms, Some(5400));
        assert_eq!(snapshot.find("CL0", "1950MHz").unwrap().entry_count, Some(300));
    }

    #[test]
    fn test_dvfs_missing_stats() {
        let provider = DvfsStateResidencyProvider::new(
            MockFs::new(),
            FVP_STATS,
            Transform::DivideBy(NS_TO_MS),
            vec![aur()],
        );
        assert!(provider.collect().is_empty());
        assert_eq!(provider.entities()[0].states.len(), 3);
    }
}
