//! Provider for devfreq `time_in_state` tables.
//!
//! Unlike the generic provider the states are not known up front: every line
//! of `<dir>/time_in_state` is a `<frequency> <time_ms>` pair and becomes one
//! state named after the frequency.

use std::path::PathBuf;

use tracing::{debug, trace, warn};

use crate::collector::traits::FileSystem;
use crate::models::{PowerEntityInfo, ResidencyRecord, Snapshot};
use crate::residency::parser::{ParseError, parse_value};
use crate::residency::provider::StateResidencyProvider;

/// Parses one `time_in_state` line into `(frequency, time_ms)`.
pub fn parse_time_in_state_line(line: &str) -> Result<(&str, u64), ParseError> {
    let mut parts = line.split_whitespace();
    let freq = parts
        .next()
        .ok_or_else(|| ParseError::new("empty line"))?;
    if !freq.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(format!("invalid frequency {:?}", freq)));
    }
    let time = parse_value(parts.next().unwrap_or(""))?;
    Ok((freq, time))
}

/// Collects per-frequency residency for one devfreq domain.
pub struct DevfreqStateResidencyProvider<F: FileSystem> {
    fs: F,
    entity_name: String,
    path: PathBuf,
    name: String,
}

impl<F: FileSystem> DevfreqStateResidencyProvider<F> {
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `entity_name` - Reported entity (e.g. "MIF", "GPU")
    /// * `devfreq_dir` - Devfreq device directory containing `time_in_state`
    pub fn new(fs: F, entity_name: impl Into<String>, devfreq_dir: impl Into<PathBuf>) -> Self {
        let path = devfreq_dir.into().join("time_in_state");
        let name = path.display().to_string();
        Self {
            fs,
            entity_name: entity_name.into(),
            path,
            name,
        }
    }
}

impl<F: FileSystem> StateResidencyProvider for DevfreqStateResidencyProvider<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn entities(&self) -> Vec<PowerEntityInfo> {
        vec![PowerEntityInfo {
            id: 0,
            name: self.entity_name.clone(),
            states: Vec::new(),
        }]
    }

    fn collect(&self) -> Snapshot {
        let content = match self.fs.read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(source = %self.name, "devfreq table not present");
                return Snapshot::new();
            }
            Err(e) => {
                warn!(source = %self.name, error = %e, "failed to read devfreq table");
                return Snapshot::new();
            }
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match parse_time_in_state_line(line) {
                Ok((freq, time_ms)) => Some(ResidencyRecord {
                    total_time_ms: Some(time_ms),
                    ..ResidencyRecord::new(&self.entity_name, freq)
                }),
                Err(e) => {
                    trace!(source = %self.name, error = %e, "skipping line");
                    None
                }
            })
            .collect()
    }
}
