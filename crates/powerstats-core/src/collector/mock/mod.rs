//! Mock filesystem implementations for testing.
//!
//! This module provides `MockFs` and pre-built device scenarios for testing
//! residency providers without access to real kernel counter files.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
