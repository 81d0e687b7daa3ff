//! Core library for the `cpy` bulk file copy tool
//!
//! Copying happens in four stages:
//!
//! - [`pattern`]: expand source patterns into concrete files, each remembering the base it
//!   was found under
//! - [`plan`]: compute the destination of every file (flatten, base mode, rename)
//! - [`policy`]: decide whether a planned copy runs given what already exists at the destination
//! - [`copy`]: execute approved copies with bounded concurrency, stopping at the first failure
//!
//! The [`run`] function wraps an async entry point with the tokio runtime and logging setup
//! shared by the command-line tool.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), common::Error> {
//! let context = common::Context {
//!     current_dir: std::env::current_dir().unwrap(),
//!     cpu_count: 4,
//! };
//! let options = common::CopyOptions::resolve(
//!     &common::Flags {
//!         flat: true,
//!         ..Default::default()
//!     },
//!     &context,
//! )?;
//! let result = common::copy_patterns(&["src/*.png", "!src/goat.png"], "dist", options, None).await?;
//! println!("{}", result.summary);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod copy;
pub mod error;
pub mod pattern;
pub mod plan;
pub mod policy;

#[cfg(test)]
mod testutils;

pub use config::{
    BASENAME_PLACEHOLDER, BaseMode, Context, CopyOptions, Flags, OutputConfig, RenameRule,
    RuntimeConfig,
};
pub use copy::{CopyResult, Observer, PlannedCopy, Summary, copy_patterns};
pub use error::{CopyError, Error};

fn init_tracing(output: &OutputConfig) {
    if output.quiet {
        return;
    }
    let level = match output.verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG takes precedence over -v
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Runs `func` on a freshly built tokio runtime.
///
/// Returns `None` when the runtime could not be created or `func` failed; the error has already
/// been reported on stderr (unless `quiet`) by the time this returns.
pub fn run<Fut>(
    output: OutputConfig,
    runtime: RuntimeConfig,
    func: impl FnOnce() -> Fut,
) -> Option<Summary>
where
    Fut: std::future::Future<Output = anyhow::Result<Summary>>,
{
    init_tracing(&output);
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if runtime.max_workers > 0 {
        builder.worker_threads(runtime.max_workers);
    }
    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(error) => {
            if !output.quiet {
                eprintln!("failed to start tokio runtime: {error:#}");
            }
            return None;
        }
    };
    let res = runtime.block_on(func());
    match res {
        Ok(summary) => {
            if output.print_summary || output.verbose > 0 {
                println!("{summary}");
            }
            Some(summary)
        }
        Err(error) => {
            if !output.quiet {
                eprintln!("{error:#}");
            }
            None
        }
    }
}
