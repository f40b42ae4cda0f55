//! Source resolution and per-source errors.

use std::path::{Path, PathBuf};

use crate::collector::traits::FileSystem;

/// Error type for source- and entity-level collection failures.
///
/// These never escape `collect()`; providers log them and skip the affected
/// source or entity.
#[derive(Debug)]
pub enum CollectError {
    /// None of the candidate paths exist.
    NoSource { candidates: Vec<PathBuf> },
    /// The resolved file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An entity header was not found in its source.
    HeaderNotFound { entity: String, header: String },
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::NoSource { candidates } => match candidates.as_slice() {
                [single] => write!(f, "{} does not exist", single.display()),
                _ => write!(f, "none of {} candidate paths exist", candidates.len()),
            },
            CollectError::Io { path, source } => {
                write!(f, "I/O error reading {}: {}", path.display(), source)
            }
            CollectError::HeaderNotFound { entity, header } => {
                write!(f, "header {:?} for entity {} not found", header, entity)
            }
        }
    }
}

impl CollectError {
    /// True when the source is simply absent on this device.
    pub fn is_not_found(&self) -> bool {
        match self {
            CollectError::NoSource { .. } => true,
            CollectError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            CollectError::HeaderNotFound { .. } => false,
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Where a provider reads its counters from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePath {
    /// A single fixed file.
    Fixed(PathBuf),
    /// Candidate files tried in order; the first one that exists is read.
    Candidates(Vec<PathBuf>),
}

impl SourcePath {
    pub fn fixed(path: impl Into<PathBuf>) -> Self {
        SourcePath::Fixed(path.into())
    }

    pub fn candidates<I, P>(candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        SourcePath::Candidates(candidates.into_iter().map(Into::into).collect())
    }

    /// Picks the path to read this cycle.
    ///
    /// A fixed path is returned as is; its absence surfaces as a read error.
    pub fn resolve<F: FileSystem>(&self, fs: &F) -> Result<PathBuf, CollectError> {
        match self {
            SourcePath::Fixed(path) => Ok(path.clone()),
            SourcePath::Candidates(candidates) => candidates
                .iter()
                .find(|p| fs.exists(p))
                .cloned()
                .ok_or_else(|| CollectError::NoSource {
                    candidates: candidates.clone(),
                }),
        }
    }

    /// Path used in log messages and provider names.
    pub fn display_path(&self) -> &Path {
        match self {
            SourcePath::Fixed(path) => path,
            SourcePath::Candidates(candidates) => {
                candidates.first().map(PathBuf::as_path).unwrap_or(Path::new(""))
            }
        }
    }
}

/// Resolves `source` and reads its full contents.
pub fn read_source<F: FileSystem>(fs: &F, source: &SourcePath) -> Result<String, CollectError> {
    let path = source.resolve(fs)?;
    fs.read_to_string(&path)
        .map_err(|e| CollectError::Io { path, source: e })
}
