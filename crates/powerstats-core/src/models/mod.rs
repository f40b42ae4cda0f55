//! Data models produced by residency providers.
//!
//! - [`residency`]: per-state records and the [`Snapshot`] returned by `collect()`
//! - [`entity`]: static catalogue of configured power entities and their states

mod entity;
mod residency;

pub use entity::{PowerEntityInfo, StateInfo};
pub use residency::{ResidencyRecord, Snapshot};
