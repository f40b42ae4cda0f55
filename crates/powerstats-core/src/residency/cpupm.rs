//! Provider for per-CPU idle residency from the cpupm driver.
//!
//! `time_in_state` carries one block per CPU, headed by the CPU token, with
//! one line per idle state:
//!
//! ```text
//! cpu0
//!   [state1]  1200  340000000
//! cpu1
//!   [state1]  900  120000000
//! ```
//!
//! State lines are `<state token> <entry_count> <total_time_us>`. The driver
//! stops counting while the whole SoC sleeps, so the SoC sleep time from
//! `soc_stats` is added to every CPU's total.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::collector::traits::FileSystem;
use crate::models::{PowerEntityInfo, ResidencyRecord, Snapshot, StateInfo};
use crate::residency::config::{NS_TO_MS, US_TO_MS};
use crate::residency::parser::{
    ParseError, entity_scope, find_field, parse_counter_blocks, parse_value,
};
use crate::residency::provider::StateResidencyProvider;

/// Where the SoC-wide sleep time is read from.
#[derive(Debug, Clone)]
pub struct CpupmSleepConfig {
    pub path: PathBuf,
    /// Entity header in the sleep file, e.g. `LPM:`.
    pub header: String,
    /// Sleep state fragment, e.g. `SLEEP`.
    pub state: String,
    /// Time label in nanoseconds, e.g. `total_time_ns:`.
    pub time_prefix: String,
}

/// Collects per-CPU idle state residency.
pub struct CpupmStateResidencyProvider<F: FileSystem> {
    fs: F,
    path: PathBuf,
    /// `(entity name, cpu token)`
    cpus: Vec<(String, String)>,
    /// `(state name, state token)`
    states: Vec<(String, String)>,
    sleep: Option<CpupmSleepConfig>,
    name: String,
}

impl<F: FileSystem> CpupmStateResidencyProvider<F> {
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `path` - cpupm `time_in_state` file
    /// * `cpus` - `(entity name, cpu token)` pairs, e.g. `("CPU0", "cpu0")`
    /// * `states` - `(state name, state token)` pairs, e.g. `("DOWN", "[state1]")`
    /// * `sleep` - SoC sleep time added to every CPU total, if any
    pub fn new(
        fs: F,
        path: impl Into<PathBuf>,
        cpus: &[(&str, &str)],
        states: &[(&str, &str)],
        sleep: Option<CpupmSleepConfig>,
    ) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        let owned = |pairs: &[(&str, &str)]| -> Vec<(String, String)> {
            pairs
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect()
        };
        Self {
            fs,
            path,
            cpus: owned(cpus),
            states: owned(states),
            sleep,
            name,
        }
    }

    /// SoC sleep time in milliseconds, or 0 if it cannot be read.
    fn sleep_time_ms(&self) -> u64 {
        let Some(sleep) = &self.sleep else {
            return 0;
        };

        let content = match self.fs.read_to_string(&sleep.path) {
            Ok(content) => content,
            Err(e) => {
                debug!(source = %sleep.path.display(), error = %e, "sleep time unavailable");
                return 0;
            }
        };

        let prefix = format!("{}{}", sleep.time_prefix, sleep.state);
        let value = entity_scope(&content, &sleep.header, &[])
            .and_then(|scope| find_field(scope, &prefix))
            .ok_or_else(|| ParseError::new(format!("prefix {:?} not found", prefix)))
            .and_then(parse_value);

        match value {
            Ok(ns) => ns / NS_TO_MS,
            Err(e) => {
                debug!(source = %sleep.path.display(), error = %e, "sleep time unavailable");
                0
            }
        }
    }
}

impl<F: FileSystem> StateResidencyProvider for CpupmStateResidencyProvider<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn entities(&self) -> Vec<PowerEntityInfo> {
        self.cpus
            .iter()
            .enumerate()
            .map(|(id, (name, _))| PowerEntityInfo {
                id: id as u32,
                name: name.clone(),
                states: self
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
                debug!(source = %self.name, "cpupm table not present");
                return Snapshot::new();
            }
            Err(e) => {
                warn!(source = %self.name, error = %e, "failed to read cpupm table");
                return Snapshot::new();
            }
        };

        let cpu_tokens: Vec<&str> = self.cpus.iter().map(|(_, t)| t.as_str()).collect();
        let state_tokens: Vec<&str> = self.states.iter().map(|(_, t)| t.as_str()).collect();
        let blocks = parse_counter_blocks(&content, &cpu_tokens, &state_tokens);
        let sleep_ms = self.sleep_time_ms();

        let mut snapshot = Snapshot::new();
        for ((entity, _), block) in self.cpus.iter().zip(blocks) {
            let Some(block) = block else {
                debug!(source = %self.name, entity = %entity, "cpu block not found");
                continue;
            };
            for ((state, _), counters) in self.states.iter().zip(block) {
                let mut record = ResidencyRecord::new(entity, state);
                if let Some(c) = counters {
                    record.entry_count = Some(c.entry_count);
                    record.total_time_ms = Some(c.time / US_TO_MS + sleep_ms);
                }
                snapshot.records.push(record);
            }
        }
        snapshot
    }
}
