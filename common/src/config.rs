//! Configuration types for a single `cpy` invocation
//!
//! Raw command-line values are collected in [`Flags`] and resolved exactly once into an
//! immutable [`CopyOptions`]. Ambient process state (current directory, CPU count) is passed in
//! through [`Context`] so that resolution does not depend on the host environment.

use std::ffi::{OsStr, OsString};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::error::Error;

/// Token replaced by the source file name (without extension) in rename templates
pub const BASENAME_PLACEHOLDER: &str = "{{basename}}";

/// Runtime configuration for tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeConfig {
    /// Number of worker threads (0 = number of CPU cores)
    pub max_workers: usize,
}

/// Output and logging configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Suppress error output
    pub quiet: bool,
    /// Verbosity level: 0=ERROR, 1=INFO, 2=DEBUG, 3=TRACE
    pub verbose: u8,
    /// Print summary statistics at the end
    pub print_summary: bool,
}

/// Process state the planner would otherwise read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Absolute directory the tool was invoked from
    pub current_dir: PathBuf,
    /// Number of CPUs detected on the host
    pub cpu_count: usize,
}

impl Context {
    /// Twice the CPU count, treating an undetected count as a single CPU.
    pub fn default_concurrency(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.cpu_count.max(1) * 2).unwrap_or(NonZeroUsize::MIN)
    }
}

/// How the relative part of a destination path is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BaseMode {
    /// relative to the working directory
    Cwd,
    /// relative to the non-glob prefix of the originating pattern
    #[default]
    Pattern,
}

/// How the file name of each destination is chosen
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RenameRule {
    /// keep the source file name
    #[default]
    Passthrough,
    /// replace the file name outright
    Literal(OsString),
    /// substitute [`BASENAME_PLACEHOLDER`] with the name without extension, keep the extension
    Template(String),
}

impl RenameRule {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None => Self::Passthrough,
            Some(value) if value.contains(BASENAME_PLACEHOLDER) => {
                Self::Template(value.to_string())
            }
            Some(value) => Self::Literal(OsString::from(value)),
        }
    }

    pub fn apply(&self, file_name: &OsStr) -> OsString {
        match self {
            Self::Passthrough => file_name.to_os_string(),
            Self::Literal(name) => name.clone(),
            Self::Template(template) => {
                let path = std::path::Path::new(file_name);
                let stem = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy())
                    .unwrap_or_default();
                let mut renamed = OsString::from(template.replace(BASENAME_PLACEHOLDER, &stem));
                if let Some(extension) = path.extension().filter(|ext| !ext.is_empty()) {
                    renamed.push(".");
                    renamed.push(extension);
                }
                renamed
            }
        }
    }
}

/// Flags as given on the command line, before resolution
#[derive(Debug, Clone, Default)]
pub struct Flags {
    pub no_overwrite: bool,
    pub ignore_existing: bool,
    pub update: bool,
    pub cwd: Option<PathBuf>,
    pub base: Option<BaseMode>,
    pub rename: Option<String>,
    pub dot: bool,
    pub flat: bool,
    pub dry_run: bool,
    pub concurrency: Option<usize>,
}

/// Immutable settings shared by every stage of the copy pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOptions {
    /// Absolute, normalized directory that patterns and destinations are resolved against
    pub working_directory: PathBuf,
    pub base: BaseMode,
    pub rename: RenameRule,
    pub flatten: bool,
    pub include_dotfiles: bool,
    pub overwrite: bool,
    pub ignore_existing: bool,
    /// Effective update flag - already cleared when overwrite is off or ignore-existing is on
    pub update: bool,
    pub concurrency: NonZeroUsize,
    pub dry_run: bool,
}

impl CopyOptions {
    pub fn resolve(flags: &Flags, context: &Context) -> Result<Self, Error> {
        let concurrency = match flags.concurrency {
            Some(value) => NonZeroUsize::new(value).ok_or_else(|| {
                Error::InvalidOption("--concurrency must be a positive integer".to_string())
            })?,
            None => context.default_concurrency(),
        };
        let working_directory = match &flags.cwd {
            Some(cwd) => crate::plan::normalize_path(&context.current_dir.join(cwd)),
            None => crate::plan::normalize_path(&context.current_dir),
        };
        if !working_directory.is_absolute() {
            return Err(Error::InvalidOption(format!(
                "working directory {working_directory:?} is not absolute"
            )));
        }
        let overwrite = !flags.no_overwrite;
        let update = flags.update && overwrite && !flags.ignore_existing;
        if flags.update && !update {
            tracing::info!("--update is ignored with --no-overwrite or --ignore-existing");
        }
        Ok(Self {
            working_directory,
            base: flags.base.unwrap_or_default(),
            rename: RenameRule::parse(flags.rename.as_deref()),
            flatten: flags.flat,
            include_dotfiles: flags.dot,
            overwrite,
            ignore_existing: flags.ignore_existing,
            update,
            concurrency,
            dry_run: flags.dry_run,
        })
    }

    /// Options for a direct file-to-file copy: flattened output named `file_name`.
    pub fn for_file_to_file(&self, file_name: &OsStr) -> Self {
        Self {
            flatten: true,
            rename: RenameRule::Literal(file_name.to_os_string()),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Context {
        Context {
            current_dir: PathBuf::from("/home/user/project"),
            cpu_count: 4,
        }
    }

    #[test]
    fn defaults() {
        let options = CopyOptions::resolve(&Flags::default(), &context()).unwrap();
        assert_eq!(options.working_directory, PathBuf::from("/home/user/project"));
        assert_eq!(options.base, BaseMode::Pattern);
        assert_eq!(options.rename, RenameRule::Passthrough);
        assert!(options.overwrite);
        assert!(!options.update);
        assert_eq!(options.concurrency.get(), 8);
    }

    #[test]
    fn concurrency_defaults_to_two_with_unknown_cpu_count() {
        let context = Context {
            cpu_count: 0,
            ..context()
        };
        assert_eq!(context.default_concurrency().get(), 2);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let flags = Flags {
            concurrency: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            CopyOptions::resolve(&flags, &context()),
            Err(Error::InvalidOption(_))
        ));
    }

    #[test]
    fn cwd_is_resolved_against_current_dir() {
        let flags = Flags {
            cwd: Some(PathBuf::from("../other/./src")),
            ..Default::default()
        };
        let options = CopyOptions::resolve(&flags, &context()).unwrap();
        assert_eq!(options.working_directory, PathBuf::from("/home/user/other/src"));
        let flags = Flags {
            cwd: Some(PathBuf::from("/srv/data")),
            ..Default::default()
        };
        let options = CopyOptions::resolve(&flags, &context()).unwrap();
        assert_eq!(options.working_directory, PathBuf::from("/srv/data"));
    }

    #[test]
    fn update_requires_overwrite_and_no_ignore_existing() {
        let update = |no_overwrite, ignore_existing| {
            let flags = Flags {
                update: true,
                no_overwrite,
                ignore_existing,
                ..Default::default()
            };
            CopyOptions::resolve(&flags, &context()).unwrap().update
        };
        assert!(update(false, false));
        assert!(!update(true, false));
        assert!(!update(false, true));
        assert!(!update(true, true));
    }

    #[test]
    fn rename_rule_variants() {
        assert_eq!(RenameRule::parse(None), RenameRule::Passthrough);
        assert_eq!(
            RenameRule::parse(Some("out.txt")),
            RenameRule::Literal(OsString::from("out.txt"))
        );
        assert_eq!(
            RenameRule::parse(Some("hi-{{basename}}")),
            RenameRule::Template("hi-{{basename}}".to_string())
        );
    }

    #[test]
    fn template_keeps_extension() {
        let rule = RenameRule::parse(Some("hi-{{basename}}"));
        assert_eq!(rule.apply(OsStr::new("photo.png")), OsString::from("hi-photo.png"));
        assert_eq!(
            rule.apply(OsStr::new("archive.tar.gz")),
            OsString::from("hi-archive.tar.gz")
        );
    }

    #[test]
    fn template_without_extension_appends_no_dot() {
        let rule = RenameRule::parse(Some("{{basename}}-copy"));
        assert_eq!(rule.apply(OsStr::new("Makefile")), OsString::from("Makefile-copy"));
        assert_eq!(rule.apply(OsStr::new(".env")), OsString::from(".env-copy"));
    }

    #[test]
    fn template_replaces_every_placeholder() {
        let rule = RenameRule::parse(Some("{{basename}}_{{basename}}"));
        assert_eq!(rule.apply(OsStr::new("a.md")), OsString::from("a_a.md"));
    }

    #[test]
    fn literal_and_passthrough() {
        assert_eq!(
            RenameRule::parse(Some("fixed")).apply(OsStr::new("photo.png")),
            OsString::from("fixed")
        );
        assert_eq!(
            RenameRule::Passthrough.apply(OsStr::new("photo.png")),
            OsString::from("photo.png")
        );
    }

    #[test]
    fn file_to_file_overrides_rename_and_flatten() {
        let flags = Flags {
            rename: Some("hi-{{basename}}".to_string()),
            ..Default::default()
        };
        let options = CopyOptions::resolve(&flags, &context()).unwrap();
        let direct = options.for_file_to_file(OsStr::new("b.txt"));
        assert!(direct.flatten);
        assert_eq!(direct.rename, RenameRule::Literal(OsString::from("b.txt")));
        // the resolved options are left untouched
        assert!(!options.flatten);
    }
}
