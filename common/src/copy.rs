use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::instrument;

use crate::error::{CopyError, Error};
use crate::pattern::{self, MatchedFile, PatternSet};
use crate::plan::{self, CopyPlan, Planner};
use crate::policy::{Action, Policy};

/// Receives every approved copy as soon as it completes (or, in dry-run mode, as soon as it is
/// decided).
pub type Observer = Arc<dyn Fn(&PlannedCopy) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCopy {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub action: Action,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub bytes_copied: u64,
    /// copies performed, or in dry-run mode copies that would be performed
    pub files_copied: usize,
    pub files_skipped: usize,
}

impl std::ops::Add for Summary {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            bytes_copied: self.bytes_copied + other.bytes_copied,
            files_copied: self.files_copied + other.files_copied,
            files_skipped: self.files_skipped + other.files_skipped,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "bytes copied: {}\n\
            files copied: {}\n\
            files skipped: {}",
            bytesize::ByteSize(self.bytes_copied),
            self.files_copied,
            self.files_skipped,
        )
    }
}

/// Outcome of a whole invocation
#[derive(Debug, Clone, Default)]
pub struct CopyResult {
    /// approved copies, in completion order
    pub copies: Vec<PlannedCopy>,
    /// at least one pattern produced a candidate, even if every candidate was skipped
    pub any_matched: bool,
    pub summary: Summary,
    /// highest number of copies that were in flight at once
    pub peak_concurrency: usize,
}

/// Whether `src` and `dst` name the same file, either literally or after resolving symlinks.
async fn is_same_file(src: &Path, dst: &Path) -> bool {
    if src == dst {
        return true;
    }
    match (
        tokio::fs::canonicalize(src).await,
        tokio::fs::canonicalize(dst).await,
    ) {
        (Ok(src), Ok(dst)) => src == dst,
        _ => false,
    }
}

#[instrument]
async fn copy_file(src: &Path, dst: &Path) -> anyhow::Result<u64> {
    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("cannot create directory {parent:?}"))?;
    }
    tracing::debug!("copying data");
    let bytes = tokio::fs::copy(src, dst)
        .await
        .with_context(|| format!("failed copying {src:?} to {dst:?}"))?;
    let src_metadata = tokio::fs::metadata(src)
        .await
        .with_context(|| format!("failed reading metadata from {src:?}"))?;
    // keep the source mtime so later --update runs see identical files as unchanged
    let mtime = filetime::FileTime::from_last_modification_time(&src_metadata);
    let atime = filetime::FileTime::from_last_access_time(&src_metadata);
    let dst_owned = dst.to_path_buf();
    tokio::task::spawn_blocking(move || filetime::set_file_times(&dst_owned, atime, mtime))
        .await?
        .with_context(|| format!("failed setting timestamps on {dst:?}"))?;
    Ok(bytes)
}

struct Task {
    planner: Arc<Planner>,
    policy: Policy,
    dry_run: bool,
    observer: Option<Observer>,
}

impl Task {
    async fn run(&self, file: MatchedFile) -> Result<(PlannedCopy, Summary), CopyError> {
        let destination = self.planner.destination_for(&file);
        tracing::debug!("planned {:?} -> {:?}", &file.path, &destination);
        // copying a file onto itself would truncate it before reading
        let action = if is_same_file(&file.path, &destination).await {
            tracing::debug!("source and destination are the same file, skipping");
            Action::Skip
        } else {
            self.policy
                .decide(&file, &destination)
                .await
                .with_context(|| format!("failed checking destination {destination:?}"))
                .map_err(|err| CopyError::new(file.path.clone(), destination.clone(), err))?
        };
        let planned = PlannedCopy {
            source: file.path,
            destination,
            action,
        };
        if action == Action::Skip {
            return Ok((
                planned,
                Summary {
                    files_skipped: 1,
                    ..Default::default()
                },
            ));
        }
        let mut summary = Summary {
            files_copied: 1,
            ..Default::default()
        };
        if !self.dry_run {
            summary.bytes_copied = copy_file(&planned.source, &planned.destination)
                .await
                .map_err(|err| {
                    CopyError::new(planned.source.clone(), planned.destination.clone(), err)
                })?;
            tracing::info!("copied {:?} -> {:?}", &planned.source, &planned.destination);
        }
        if let Some(observer) = &self.observer {
            observer(&planned);
        }
        Ok((planned, summary))
    }
}

type TaskOutcome = Result<Result<(PlannedCopy, Summary), CopyError>, tokio::task::JoinError>;

fn record(result: &mut CopyResult, outcome: TaskOutcome) -> Result<(), Error> {
    match outcome {
        Ok(Ok((planned, summary))) => {
            result.summary = result.summary + summary;
            if planned.action == Action::Copy {
                result.copies.push(planned);
            }
            Ok(())
        }
        Ok(Err(mut error)) => {
            tracing::error!("{}", &error);
            error.summary = error.summary + result.summary;
            Err(error.into())
        }
        // tasks are never aborted, so this is a panic inside a copy task
        Err(error) => std::panic::resume_unwind(error.into_panic()),
    }
}

/// Runs planned copies with at most `options.concurrency` in flight.
///
/// Files are scheduled in the order given. The first failure aborts the batch: no further
/// files are scheduled and the error is returned together with a summary of what completed.
/// Copies already in flight are left to finish on their own but their results are dropped.
#[instrument(skip_all, fields(root = ?plan.destination_root, files = files.len()))]
pub async fn execute(
    plan: &CopyPlan,
    files: Vec<MatchedFile>,
    observer: Option<Observer>,
) -> Result<CopyResult, Error> {
    let limit = throttle::ConcurrencyLimit::new(plan.options.concurrency);
    let task = Arc::new(Task {
        planner: Arc::new(Planner::new(plan)),
        policy: Policy::from_options(&plan.options),
        dry_run: plan.options.dry_run,
        observer,
    });
    let mut result = CopyResult {
        any_matched: !files.is_empty(),
        ..Default::default()
    };
    let mut join_set = tokio::task::JoinSet::new();
    for file in files {
        let permit = limit.permit().await;
        tracing::trace!("scheduling {:?}, in flight: {}", &file.path, limit.in_flight());
        while let Some(outcome) = join_set.try_join_next() {
            if let Err(error) = record(&mut result, outcome) {
                join_set.detach_all();
                return Err(error);
            }
        }
        let task = task.clone();
        join_set.spawn(async move {
            let _permit = permit;
            task.run(file).await
        });
    }
    while let Some(outcome) = join_set.join_next().await {
        if let Err(error) = record(&mut result, outcome) {
            join_set.detach_all();
            return Err(error);
        }
    }
    result.peak_concurrency = limit.peak();
    tracing::debug!("peak concurrency: {}/{}", result.peak_concurrency, limit.limit());
    Ok(result)
}

/// Full pipeline: parse patterns, plan the destination, expand matches and execute.
///
/// Returns [`Error::NoMatch`] when no pattern produced a single file.
pub async fn copy_patterns<S: AsRef<str>>(
    patterns: &[S],
    destination: &str,
    options: crate::config::CopyOptions,
    observer: Option<Observer>,
) -> Result<CopyResult, Error> {
    let patterns = PatternSet::parse(patterns)?;
    let plan = plan::prepare(&patterns, destination, options).await?;
    let resolution = pattern::resolve(&patterns, &plan.options).await?;
    if !resolution.any_matched {
        return Err(Error::NoMatch);
    }
    execute(&plan, resolution.files, observer).await
}
