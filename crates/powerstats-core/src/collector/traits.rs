//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait lets residency providers read kernel counter files
//! from real sysfs on a device or from a mock implementation in tests and CI.

use std::io;
use std::path::Path;

/// Abstraction for the filesystem operations providers need.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    ///
    /// Invalid UTF-8 is replaced rather than rejected, so one garbled line
    /// does not hide the rest of a counter file.
    ///
    /// # Arguments
    /// * `path` - Path to the file to read
    ///
    /// # Returns
    /// The file contents, or an I/O error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    ///
    /// Used to pick the first present candidate when a source lists several candidates
    /// across several bus indices.
    fn exists(&self, path: &Path) -> bool;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
