use std::path::PathBuf;

use crate::copy::Summary;

/// Failure of a single copy operation, carrying the work completed before the batch aborted.
///
/// # Logging Convention
/// The Display implementation shows the full error chain:
/// ```ignore
/// tracing::error!("copy failed: {}", &error);
/// ```
#[derive(Debug, thiserror::Error)]
#[error("copy: {src:?} -> {dst:?} failed: {source:#}")]
pub struct CopyError {
    pub src: PathBuf,
    pub dst: PathBuf,
    #[source]
    pub source: anyhow::Error,
    pub summary: Summary,
}

impl CopyError {
    #[must_use]
    pub fn new(src: PathBuf, dst: PathBuf, source: anyhow::Error) -> Self {
        Self {
            src,
            dst,
            source,
            summary: Summary::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// every pattern was a negation (or none were given)
    #[error("No source patterns given, at least one pattern must not start with '!'")]
    NoSourcePatterns,
    /// patterns were valid but nothing matched
    #[error("No files matched the given patterns")]
    NoMatch,
    #[error("Invalid option: {0}")]
    InvalidOption(String),
    #[error("Invalid glob pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("Failed reading {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Copy(#[from] CopyError),
}
