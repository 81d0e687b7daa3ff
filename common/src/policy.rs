//! Per-file copy decisions
//!
//! The decision for each planned copy is made right before it would execute, so destination
//! existence reflects the filesystem at that moment rather than at planning time.

use std::path::Path;
use std::time::SystemTime;

use tracing::instrument;

use crate::config::CopyOptions;
use crate::pattern::MatchedFile;

/// The subset of metadata the policy looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub modified: SystemTime,
}

impl FileStat {
    pub fn from_metadata(metadata: &std::fs::Metadata) -> std::io::Result<Self> {
        Ok(Self {
            size: metadata.len(),
            modified: metadata.modified()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Copy,
    Skip,
}

/// Which rule decides the fate of a file whose destination may already exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// skip whenever the destination exists
    IgnoreExisting,
    /// copy only when the source is newer, or same age with a different size
    Update,
    /// `--no-overwrite`: never touch an existing destination
    KeepExisting,
    /// always copy, clobbering the destination
    Overwrite,
}

impl Policy {
    pub fn from_options(options: &CopyOptions) -> Self {
        if options.ignore_existing {
            Self::IgnoreExisting
        } else if options.update {
            Self::Update
        } else if !options.overwrite {
            Self::KeepExisting
        } else {
            Self::Overwrite
        }
    }

    #[instrument(skip(source))]
    pub async fn decide(&self, source: &MatchedFile, destination: &Path) -> std::io::Result<Action> {
        match self {
            Self::Overwrite => Ok(Action::Copy),
            Self::IgnoreExisting | Self::KeepExisting => {
                if destination_exists(destination).await? {
                    tracing::debug!("destination exists, skipping");
                    Ok(Action::Skip)
                } else {
                    Ok(Action::Copy)
                }
            }
            Self::Update => match destination_stat(destination).await? {
                None => Ok(Action::Copy),
                Some(existing) => {
                    let source = source.stat().await?;
                    Ok(update_action(&source, &existing))
                }
            },
        }
    }
}

/// Copy when the source is strictly newer, or when modification times are equal and the sizes
/// differ.
pub fn update_action(source: &FileStat, destination: &FileStat) -> Action {
    if source.modified > destination.modified
        || (source.modified == destination.modified && source.size != destination.size)
    {
        Action::Copy
    } else {
        Action::Skip
    }
}

async fn destination_exists(path: &Path) -> std::io::Result<bool> {
    // a dangling symlink still occupies the destination name
    match tokio::fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(error) => Err(error),
    }
}

async fn destination_stat(path: &Path) -> std::io::Result<Option<FileStat>> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(Some(FileStat::from_metadata(&metadata)?)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}
