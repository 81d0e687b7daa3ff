use anyhow::Context;
use clap::Parser;
use tracing::instrument;

use cpy_tools_cpy::path;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cpy",
    version,
    about = "Copy files matched by glob patterns",
    long_about = "`cpy` copies every file matched by the given source patterns into a destination directory.

<source> can contain globs if quoted. Patterns starting with '!' exclude matches.

Errors if no files match, similar to cp.

--update is ignored when --no-overwrite or --ignore-existing is set.

If the source is a single file and the destination is not an existing directory, it will be treated as a file-to-file copy (like cp).

EXAMPLES:
    # Copy all .png files in src folder into dist except src/goat.png
    cpy 'src/*.png' '!src/goat.png' dist

    # Copy all files inside src folder into dist and preserve path structure
    cpy . '../dist/' --cwd=src

    # Copy a single file to a specific filename
    cpy .env.development .env

    # Copy all .png files in the src folder to dist and prefix the image filenames
    cpy 'src/*.png' dist --cwd=src --rename=hi-{{basename}}

    # Copy only when the source is newer, or if sizes differ with the same modification time
    cpy src dist --update"
)]
struct Args {
    // Copy options
    /// Don't overwrite the destination
    #[arg(long, help_heading = "Copy options")]
    no_overwrite: bool,

    /// Skip files that already exist at the destination
    #[arg(long, help_heading = "Copy options")]
    ignore_existing: bool,

    /// Only overwrite if the source is newer, or if sizes differ with the same modification time
    #[arg(long, help_heading = "Copy options")]
    update: bool,

    /// Working directory for files
    #[arg(long, value_name = "DIR", help_heading = "Copy options")]
    cwd: Option<std::path::PathBuf>,

    /// Base mode for destination paths
    #[arg(long, value_enum, value_name = "MODE", help_heading = "Copy options")]
    base: Option<common::BaseMode>,

    /// Rename all source filenames to `FILENAME`
    ///
    /// Supports the {{basename}} template, replaced with the source name without its extension.
    /// The source extension is kept when the template is used.
    #[arg(long, value_name = "FILENAME", help_heading = "Copy options")]
    rename: Option<String>,

    /// Allow patterns to match entries that begin with a period (.)
    #[arg(long, help_heading = "Copy options")]
    dot: bool,

    /// Flatten directory structure. All copied files will be put in the same directory.
    #[arg(long, help_heading = "Copy options")]
    flat: bool,

    /// List files that would be copied without actually copying
    #[arg(long, help_heading = "Copy options")]
    dry_run: bool,

    // Progress & output
    /// Print summary at the end
    #[arg(long, help_heading = "Progress & output")]
    summary: bool,

    /// Verbose level (implies "summary"): -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Quiet mode, don't report errors
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,

    // Performance
    /// Number of files being copied concurrently (default: twice the number of CPU cores)
    #[arg(long, value_name = "N", help_heading = "Performance")]
    concurrency: Option<usize>,

    /// Number of worker threads (0 = number of CPU cores)
    #[arg(
        long,
        default_value = "0",
        value_name = "N",
        help_heading = "Performance"
    )]
    max_workers: usize,

    // ARGUMENTS
    /// Source pattern(s) and destination path
    #[arg(value_name = "SOURCE... DESTINATION")]
    paths: Vec<String>,
}

#[instrument]
async fn async_main(args: Args) -> anyhow::Result<common::Summary> {
    let (sources, destination) = path::split_inputs(&args.paths)?;
    let context = common::Context {
        current_dir: std::env::current_dir().context("failed to read the current directory")?,
        cpu_count: num_cpus::get(),
    };
    let flags = common::Flags {
        no_overwrite: args.no_overwrite,
        ignore_existing: args.ignore_existing,
        update: args.update,
        cwd: args.cwd.clone(),
        base: args.base,
        rename: args.rename.clone(),
        dot: args.dot,
        flat: args.flat,
        dry_run: args.dry_run,
        concurrency: args.concurrency,
    };
    let options = common::CopyOptions::resolve(&flags, &context)?;
    tracing::debug!("copy options: {:?}", &options);
    let result = match common::copy_patterns(sources, destination, options, None).await {
        Ok(result) => result,
        Err(common::Error::Copy(error)) if args.summary => {
            return Err(anyhow::anyhow!("{}\n\n{}", error, &error.summary));
        }
        Err(error) => return Err(error.into()),
    };
    if args.dry_run {
        for planned in &result.copies {
            println!(
                "{} → {}",
                path::relative_to(&planned.source, &context.current_dir).display(),
                path::relative_to(&planned.destination, &context.current_dir).display()
            );
        }
    }
    Ok(result.summary)
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    let func = {
        let args = args.clone();
        || async_main(args)
    };
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        print_summary: args.summary,
    };
    let runtime = common::RuntimeConfig {
        max_workers: args.max_workers,
    };
    let res = common::run(output, runtime, func);
    if res.is_none() {
        std::process::exit(1);
    }
    Ok(())
}
