//! Destination planning
//!
//! Maps each matched source onto an absolute destination path. Computing a destination is a
//! pure function of the source and the options: no I/O, no hidden state.
//!
//! # Copy Semantics
//!
//! - **Pattern to directory** (the general case): every match lands inside the destination
//!   root, keeping its path relative to either the working directory (`--base=cwd`) or the
//!   non-glob prefix of its pattern (`--base=pattern`).
//!   - `cpy 'src/**/*.png' dist` → `src/x/1.png` lands at `dist/x/1.png`
//!   - `cpy 'src/**/*.png' dist --flat` → `src/x/1.png` lands at `dist/1.png`
//! - **File to file**: a single literal source copied onto a destination that is neither an
//!   existing directory nor written with a trailing slash.
//!   - `cpy .env.development .env` → creates `.env`

use std::path::{Component, Path, PathBuf};

use tracing::instrument;

use crate::config::{BaseMode, CopyOptions};
use crate::error::Error;
use crate::pattern::{MatchedFile, PatternSet, is_dynamic_pattern};

/// Lexically normalize a path: drop `.` components and resolve `..` against the preceding
/// component. Does not touch the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

pub fn has_trailing_separator(path: &str) -> bool {
    path.ends_with(std::path::MAIN_SEPARATOR) || path.ends_with('/')
}

async fn is_directory(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|metadata| metadata.is_dir())
}

/// Returns the destination file name when the invocation is a plain file-to-file copy.
///
/// That is the case when there is exactly one positive pattern, it has no glob syntax, it does
/// not name a directory, and the destination neither ends with a separator nor names an
/// existing directory.
#[instrument(skip(patterns, options))]
pub async fn file_to_file_target(
    patterns: &PatternSet,
    destination: &str,
    options: &CopyOptions,
) -> Option<PathBuf> {
    let mut sources = patterns.positive_patterns();
    let (Some(source), None) = (sources.next(), sources.next()) else {
        return None;
    };
    if is_dynamic_pattern(source) || has_trailing_separator(destination) {
        return None;
    }
    let working_directory = &options.working_directory;
    if is_directory(&working_directory.join(source)).await {
        return None;
    }
    let target = normalize_path(&working_directory.join(destination));
    if target.file_name().is_none() || is_directory(&target).await {
        return None;
    }
    Some(target)
}

/// Resolved destination root and the options planning runs with
#[derive(Debug, Clone)]
pub struct CopyPlan {
    pub options: CopyOptions,
    pub destination_root: PathBuf,
    pub file_to_file: bool,
}

/// Decide between a file-to-file copy and the general pattern-to-directory copy.
pub async fn prepare(
    patterns: &PatternSet,
    destination: &str,
    options: CopyOptions,
) -> Result<CopyPlan, Error> {
    if destination.is_empty() {
        return Err(Error::InvalidOption(
            "destination must not be empty".to_string(),
        ));
    }
    if let Some(target) = file_to_file_target(patterns, destination, &options).await {
        // file_to_file_target only returns targets with a file name and hence a parent
        if let (Some(parent), Some(file_name)) = (target.parent(), target.file_name()) {
            tracing::debug!("file-to-file copy into {:?}", &target);
            return Ok(CopyPlan {
                options: options.for_file_to_file(file_name),
                destination_root: parent.to_path_buf(),
                file_to_file: true,
            });
        }
    }
    let destination_root = normalize_path(&options.working_directory.join(destination));
    Ok(CopyPlan {
        options,
        destination_root,
        file_to_file: false,
    })
}

/// Computes destination paths for matched files
#[derive(Debug, Clone)]
pub struct Planner {
    options: CopyOptions,
    root: PathBuf,
}

impl Planner {
    pub fn new(plan: &CopyPlan) -> Self {
        Self {
            options: plan.options.clone(),
            root: plan.destination_root.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `file` relative to the destination root, before renaming.
    fn relative_path(&self, file: &MatchedFile) -> PathBuf {
        let file_name = file.path.file_name().map(PathBuf::from).unwrap_or_default();
        if self.options.flatten {
            return file_name;
        }
        let anchor = match self.options.base {
            BaseMode::Cwd => &self.options.working_directory,
            BaseMode::Pattern => &file.base,
        };
        match file.path.strip_prefix(anchor) {
            Ok(relative) if !relative.as_os_str().is_empty() => relative.to_path_buf(),
            // files outside the anchor keep only their name so they stay inside the root
            _ => file_name,
        }
    }

    pub fn destination_for(&self, file: &MatchedFile) -> PathBuf {
        let mut relative = self.relative_path(file);
        if let Some(file_name) = relative.file_name() {
            let renamed = self.options.rename.apply(file_name);
            relative.set_file_name(renamed);
        }
        self.root.join(relative)
    }
}
