//! powerstats-core - power-entity state residency collection.
//!
//! Provides:
//! - `collector` - filesystem abstraction (real sysfs and in-memory mock)
//! - `residency` - extraction rules, text parser, residency providers, registry
//! - `models` - snapshot data model handed to the hosting stats service
//! - `device` - static wiring tables for a representative SoC

pub mod collector;
pub mod device;
pub mod models;
pub mod residency;
