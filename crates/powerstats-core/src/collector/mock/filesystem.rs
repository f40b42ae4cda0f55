//! In-memory mock filesystem for testing providers without real sysfs.
//!
//! `MockFs` simulates a filesystem in memory so residency parsing can be
//! exercised on any host, including CI machines without the kernel drivers.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories implied by added files.
    directories: HashSet<PathBuf>,
    /// Paths that exist but fail to read (permission denied).
    unreadable: HashSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds a file that exists but cannot be read.
    pub fn add_unreadable(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.unreadable.insert(path);
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }

    /// Loads a mock filesystem from a captured directory tree.
    ///
    /// Files under `dir` are mounted at `mount_point`, so a copy of a device's
    /// `/sys/devices/platform` can be replayed in regression tests.
    pub fn from_snapshot(dir: &Path, mount_point: &Path) -> io::Result<Self> {
        let mut fs = Self::new();
        load_directory_recursive(&mut fs, dir, mount_point)?;
        Ok(fs)
    }
}

fn load_directory_recursive(
    fs: &mut MockFs,
    real_path: &Path,
    virtual_path: &Path,
) -> io::Result<()> {
    fs.directories.insert(virtual_path.to_path_buf());

    for entry in std::fs::read_dir(real_path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let real_child = entry.path();
        let virtual_child = virtual_path.join(entry.file_name());

        if file_type.is_dir() {
            load_directory_recursive(fs, &real_child, &virtual_child)?;
        } else if file_type.is_file() {
            // Skip binary attributes
            if let Ok(content) = std::fs::read_to_string(&real_child) {
                fs.add_file(&virtual_child, content);
            }
        }
    }
    Ok(())
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if self.unreadable.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {:?}", path),
            ));
        }
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
            || self.directories.contains(path)
            || self.unreadable.contains(path)
    }
}
