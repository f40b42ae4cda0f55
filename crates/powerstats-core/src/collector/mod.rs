//! Filesystem access for residency providers.
//!
//! Providers never touch `std::fs` directly. They read through the
//! [`FileSystem`] trait so the same parsing code runs against real sysfs on a
//! device and against an in-memory [`MockFs`] in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         PowerStats                          │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌─────────────┐  │
//! │  │ GenericProvider  │ │ DevfreqProvider  │ │ AocProvider │  │
//! │  │ - soc_stats      │ │ - time_in_state  │ │ - a32_off   │  │
//! │  │ - power_stats    │ │                  │ │ - hf0_wfi   │  │
//! │  └────────┬─────────┘ └────────┬─────────┘ └──────┬──────┘  │
//! │           └────────────────────┼──────────────────┘         │
//! │                         ┌──────▼──────┐                     │
//! │                         │  FileSystem │ (trait)             │
//! │                         └──────┬──────┘                     │
//! └────────────────────────────────┼────────────────────────────┘
//!                                  │
//!                  ┌───────────────┼───────────────┐
//!                  │               │               │
//!           ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//!           │   RealFs    │ │   MockFs    │ │  Scenarios  │
//!           │ (device)    │ │ (Testing)   │ │ (Fixtures)  │
//!           └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use std::path::Path;
//! use powerstats_core::collector::MockFs;
//! use powerstats_core::device;
//!
//! let fs = MockFs::typical_device();
//! let mut stats = device::build(fs, Path::new("/"));
//! let snapshot = stats.collect();
//! assert!(!snapshot.is_empty());
//! ```

pub mod mock;
pub mod traits;

pub use mock::MockFs;
pub use traits::{FileSystem, RealFs};
