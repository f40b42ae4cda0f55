//! Provider for TPU per-frequency residency from `tpu_usage`.
//!
//! The driver accounts active time per client uid, in ticks, one column per
//! operating frequency:
//!
//! ```text
//! uid: 1119000 1066000 845000
//! 1000: 120 0 35
//! 10211: 80 400 0
//! ```
//!
//! Each state's time is the sum of its column over all uids.

use std::path::PathBuf;

use tracing::{debug, trace, warn};

use crate::collector::traits::FileSystem;
use crate::models::{PowerEntityInfo, ResidencyRecord, Snapshot, StateInfo};
use crate::residency::parser::{ParseError, parse_value};
use crate::residency::provider::StateResidencyProvider;

/// Driver ticks per millisecond of TPU time.
pub const TICK_TO_MS: u64 = 100;

const ENTITY: &str = "TPU";

/// Collects TPU residency summed over client uids.
pub struct TpuDvfsStateResidencyProvider<F: FileSystem> {
    fs: F,
    path: PathBuf,
    freqs: Vec<String>,
    ticks_per_ms: u64,
    name: String,
}

impl<F: FileSystem> TpuDvfsStateResidencyProvider<F> {
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `path` - `tpu_usage` file
    /// * `freqs` - Reported frequencies, also the state names
    /// * `ticks_per_ms` - Usually [`TICK_TO_MS`]
    pub fn new(fs: F, path: impl Into<PathBuf>, freqs: &[&str], ticks_per_ms: u64) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self {
            fs,
            path,
            freqs: freqs.iter().map(|f| f.to_string()).collect(),
            ticks_per_ms,
            name,
        }
    }
}

/// Sums every uid row of a usage table, per header column.
///
/// Returns the header frequencies and their tick totals. Rows whose column
/// count differs from the header are skipped.
pub fn parse_tpu_usage(content: &str) -> Result<(Vec<&str>, Vec<u64>), ParseError> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| ParseError::new("empty usage table"))?;
    let mut columns = header.split_whitespace();
    if columns.next() != Some("uid:") {
        return Err(ParseError::new(format!("unexpected header {:?}", header)));
    }
    let freqs: Vec<&str> = columns.collect();
    let mut totals = vec![0u64; freqs.len()];

    for line in lines {
        let mut tokens = line.split_whitespace();
        let uid = tokens.next().unwrap_or("");
        let ticks: Result<Vec<u64>, ParseError> = tokens.map(parse_value).collect();
        match ticks {
            Ok(ticks) if ticks.len() == freqs.len() => {
                for (total, t) in totals.iter_mut().zip(ticks) {
                    *total = total.saturating_add(t);
                }
            }
            Ok(ticks) => {
                trace!(uid, columns = ticks.len(), "skipping usage row");
            }
            Err(e) => {
                trace!(uid, error = %e, "skipping usage row");
            }
        }
    }
    Ok((freqs, totals))
}

impl<F: FileSystem> StateResidencyProvider for TpuDvfsStateResidencyProvider<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn entities(&self) -> Vec<PowerEntityInfo> {
        vec![PowerEntityInfo {
            id: 0,
            name: ENTITY.to_string(),
            states: self
                .freqs
                .iter()
                .enumerate()
                .map(|(id, freq)| StateInfo {
                    id: id as u32,
                    name: freq.clone(),
                })
                .collect(),
        }]
    }

    fn collect(&self) -> Snapshot {
        let content = match self.fs.read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(source = %self.name, "tpu usage not present");
                return Snapshot::new();
            }
            Err(e) => {
                warn!(source = %self.name, error = %e, "failed to read tpu usage");
                return Snapshot::new();
            }
        };

        let (columns, totals) = match parse_tpu_usage(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(source = %self.name, error = %e, "tpu usage unreadable");
                return Snapshot::new();
            }
        };

        self.freqs
            .iter()
            .map(|freq| {
                let mut record = ResidencyRecord::new(ENTITY, freq);
                record.total_time_ms = columns
                    .iter()
                    .position(|c| c == freq)
                    .and_then(|idx| totals[idx].checked_div(self.ticks_per_ms));
                record
            })
            .collect()
    }
}
