//! Capability interface shared by all residency providers.

use crate::models::{PowerEntityInfo, Snapshot};

/// A source of power entity state residency.
///
/// Implementations are synchronous: `collect()` reads its files inline and
/// returns. Failures inside a provider are logged and reduce the snapshot,
/// they are never returned to the caller.
pub trait StateResidencyProvider: Send {
    /// Short label used in logs and timings, usually the source path.
    fn name(&self) -> &str;

    /// Configured entities and their states.
    ///
    /// Ids are local to the provider; the registry renumbers entities.
    fn entities(&self) -> Vec<PowerEntityInfo>;

    /// Reads the current counters.
    fn collect(&self) -> Snapshot;
}
