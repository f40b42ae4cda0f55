//! State residency extraction and aggregation.
//!
//! - [`config`] - extraction rules, rule generator, entity configs
//! - [`parser`] - pure text scoping and field extraction
//! - [`source`] - fixed/candidate source paths and collection errors
//! - [`generic`], [`devfreq`], [`aoc`], [`cpupm`], [`dvfs`], [`tpu`], [`ufs`] -
//!   provider variants
//! - [`registry`] - the [`PowerStats`] registry hosts pull from

pub mod aoc;
pub mod config;
pub mod cpupm;
pub mod devfreq;
pub mod dvfs;
pub mod generic;
pub mod parser;
pub mod provider;
pub mod registry;
pub mod source;
pub mod tpu;
pub mod ufs;

pub use aoc::{AOC_CLOCK, AocStateResidencyProvider};
pub use config::{
    FieldRule, NS_TO_MS, PowerEntityConfig, StateResidencyConfig, StateResidencyTemplate,
    Transform, US_TO_MS, generate_state_residency_configs,
};
pub use cpupm::{CpupmSleepConfig, CpupmStateResidencyProvider};
pub use devfreq::DevfreqStateResidencyProvider;
pub use dvfs::{DvfsDomain, DvfsStateResidencyProvider};
pub use generic::GenericStateResidencyProvider;
pub use parser::ParseError;
pub use provider::StateResidencyProvider;
pub use registry::{CollectorTiming, PowerStats, ProviderTiming};
pub use source::{CollectError, SourcePath};
pub use tpu::{TICK_TO_MS, TpuDvfsStateResidencyProvider};
pub use ufs::UfsStateResidencyProvider;
