//! Source pattern resolution
//!
//! Turns the user-supplied source patterns into a de-duplicated list of concrete files.
//!
//! # Pattern Syntax
//!
//! - `*` matches anything except `/`
//! - `**` matches anything including `/` (crosses directories)
//! - `?` matches a single character (except `/`)
//! - `[...]` character classes, `{a,b}` alternatives
//! - a leading `!` turns the pattern into an exclusion
//!
//! Patterns without any glob syntax are literal paths: a file matches itself, a directory
//! matches every file below it. Relative patterns are resolved against the working directory.
//!
//! Entries whose name starts with `.` are only matched by wildcards when dotfiles are enabled,
//! or when the pattern itself spells out a dot-prefixed component.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_recursion::async_recursion;
use tracing::instrument;

use crate::config::CopyOptions;
use crate::error::Error;
use crate::plan::normalize_path;
use crate::policy::FileStat;

const NEGATION_PREFIX: char = '!';

/// A raw pattern tagged by whether it adds or removes files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePattern {
    Positive(String),
    Negative(String),
}

impl SourcePattern {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(NEGATION_PREFIX) {
            Some(pattern) => Self::Negative(pattern.to_string()),
            None => Self::Positive(raw.to_string()),
        }
    }
}

/// Whether the pattern contains any glob syntax
pub fn is_dynamic_pattern(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Split a glob into its literal directory prefix and the remaining glob.
/// Examples:
/// - "src/**/*.png" -> ("src", "**/*.png")
/// - "*.txt" -> ("", "*.txt")
/// - "/data/a*/b.txt" -> ("/data", "a*/b.txt")
fn split_glob(pattern: &str) -> (PathBuf, String) {
    let mut components = pattern.split('/').peekable();
    let mut prefix = Vec::new();
    while let Some(component) = components.next_if(|component| !is_dynamic_pattern(component)) {
        prefix.push(component);
    }
    let rest = components.collect::<Vec<_>>().join("/");
    let prefix = prefix.join("/");
    if prefix.is_empty() && pattern.starts_with('/') {
        return (PathBuf::from("/"), rest);
    }
    (PathBuf::from(prefix), rest)
}

fn compile(pattern: &str, glob: &str) -> Result<globset::GlobMatcher, Error> {
    let glob = globset::GlobBuilder::new(glob)
        .literal_separator(true) // * doesn't match /
        .build()
        .map_err(|source| Error::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
    Ok(glob.compile_matcher())
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.as_encoded_bytes().starts_with(b".")
}

#[derive(Debug, Clone)]
enum Source {
    Literal(String),
    Glob {
        original: String,
        prefix: PathBuf,
        matcher: globset::GlobMatcher,
        /// some component of the glob itself starts with a dot
        explicit_dot: bool,
    },
}

#[derive(Debug, Clone)]
struct Exclusion {
    original: String,
    /// literal directory prefix, resolved against the working directory like positive patterns
    prefix: PathBuf,
    /// glob for the part below `prefix`, `None` when the whole pattern is literal
    matcher: Option<globset::GlobMatcher>,
}

impl Exclusion {
    fn parse(pattern: String) -> Result<Self, Error> {
        let trimmed = pattern.trim_start_matches("./").trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Error::InvalidOption(format!(
                "negation pattern '!{pattern}' excludes nothing"
            )));
        }
        let (prefix, matcher) = if is_dynamic_pattern(trimmed) {
            let (prefix, glob) = split_glob(trimmed);
            (prefix, Some(compile(&pattern, &glob)?))
        } else {
            (PathBuf::from(trimmed), None)
        };
        Ok(Self {
            original: pattern,
            prefix,
            matcher,
        })
    }

    /// Matches the path itself or any of its ancestors, so excluding a directory excludes its
    /// contents.
    fn matches(&self, path: &Path, working_directory: &Path) -> bool {
        let anchor = normalize_path(&working_directory.join(&self.prefix));
        let Ok(relative) = path.strip_prefix(&anchor) else {
            return false;
        };
        match &self.matcher {
            // a literal exclusion covers the path and everything below it
            None => true,
            Some(matcher) => relative
                .ancestors()
                .filter(|ancestor| !ancestor.as_os_str().is_empty())
                .any(|ancestor| matcher.is_match(ancestor)),
        }
    }
}

/// Compiled source patterns. All glob syntax errors surface here, before any I/O.
#[derive(Debug, Clone)]
pub struct PatternSet {
    sources: Vec<Source>,
    exclusions: Vec<Exclusion>,
}

impl PatternSet {
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, Error> {
        let mut sources = Vec::new();
        let mut exclusions = Vec::new();
        for pattern in raw {
            match SourcePattern::parse(pattern.as_ref()) {
                SourcePattern::Positive(pattern) => {
                    if pattern.is_empty() {
                        return Err(Error::InvalidOption(
                            "empty source pattern is not allowed".to_string(),
                        ));
                    }
                    if !is_dynamic_pattern(&pattern) {
                        sources.push(Source::Literal(pattern));
                        continue;
                    }
                    let (prefix, glob) = split_glob(&pattern);
                    let matcher = compile(&pattern, &glob)?;
                    let explicit_dot = glob
                        .split('/')
                        .any(|component| component.starts_with('.'));
                    sources.push(Source::Glob {
                        original: pattern,
                        prefix,
                        matcher,
                        explicit_dot,
                    });
                }
                SourcePattern::Negative(pattern) => {
                    exclusions.push(Exclusion::parse(pattern)?);
                }
            }
        }
        if sources.is_empty() {
            return Err(Error::NoSourcePatterns);
        }
        Ok(Self {
            sources,
            exclusions,
        })
    }

    /// Positive patterns in the order they were given
    pub fn positive_patterns(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|source| match source {
            Source::Literal(pattern) => pattern.as_str(),
            Source::Glob { original, .. } => original.as_str(),
        })
    }

    fn excluded_by(&self, path: &Path, working_directory: &Path) -> Option<&str> {
        self.exclusions
            .iter()
            .find(|exclusion| exclusion.matches(path, working_directory))
            .map(|exclusion| exclusion.original.as_str())
    }
}

/// A concrete source file produced by pattern expansion
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchedFile {
    /// absolute path of the file
    pub path: PathBuf,
    /// non-glob prefix of the originating pattern (absolute)
    pub base: PathBuf,
}

impl MatchedFile {
    pub fn new(path: PathBuf, base: PathBuf) -> Self {
        Self { path, base }
    }

    /// Size and modification time, read on demand.
    pub async fn stat(&self) -> std::io::Result<FileStat> {
        let metadata = tokio::fs::metadata(&self.path).await?;
        FileStat::from_metadata(&metadata)
    }
}

/// Output of pattern expansion
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub files: Vec<MatchedFile>,
    /// at least one pattern produced a candidate file, regardless of later skip decisions
    pub any_matched: bool,
}

fn is_missing(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
    )
}

#[async_recursion]
async fn walk_files(dir: &Path, skip_hidden: bool, found: &mut Vec<PathBuf>) -> Result<(), Error> {
    let io_error = |source| Error::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_error)?;
    let mut children = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        if skip_hidden && is_hidden(&entry.file_name()) {
            continue;
        }
        let file_type = entry.file_type().await.map_err(io_error)?;
        children.push((entry.path(), file_type));
    }
    // release the directory handle before descending
    drop(entries);
    children.sort_by(|(a, _), (b, _)| a.cmp(b));
    for (path, file_type) in children {
        if file_type.is_dir() {
            walk_files(&path, skip_hidden, found).await?;
        } else if file_type.is_file() {
            found.push(path);
        } else if file_type.is_symlink() {
            // symlinks to files are copied as files, links to directories are not followed
            if tokio::fs::metadata(&path).await.is_ok_and(|md| md.is_file()) {
                found.push(path);
            }
        }
    }
    Ok(())
}

async fn expand(source: &Source, options: &CopyOptions) -> Result<Vec<MatchedFile>, Error> {
    let working_directory = &options.working_directory;
    match source {
        Source::Literal(pattern) => {
            let path = normalize_path(&working_directory.join(pattern));
            let metadata = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(error) if is_missing(&error) => {
                    tracing::debug!("{:?} does not exist", &path);
                    return Ok(vec![]);
                }
                Err(source) => return Err(Error::Io { path, source }),
            };
            if metadata.is_dir() {
                let mut found = Vec::new();
                walk_files(&path, !options.include_dotfiles, &mut found).await?;
                return Ok(found
                    .into_iter()
                    .map(|file| MatchedFile::new(file, path.clone()))
                    .collect());
            }
            if !metadata.is_file() {
                tracing::debug!("{:?} is neither a file nor a directory, ignoring", &path);
                return Ok(vec![]);
            }
            let base = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| path.clone());
            Ok(vec![MatchedFile::new(path, base)])
        }
        Source::Glob {
            prefix,
            matcher,
            explicit_dot,
            ..
        } => {
            let base = normalize_path(&working_directory.join(prefix));
            match tokio::fs::metadata(&base).await {
                Ok(metadata) if metadata.is_dir() => {}
                Ok(_) => return Ok(vec![]),
                Err(error) if is_missing(&error) => return Ok(vec![]),
                Err(source) => return Err(Error::Io { path: base, source }),
            }
            let mut found = Vec::new();
            let skip_hidden = !options.include_dotfiles && !explicit_dot;
            walk_files(&base, skip_hidden, &mut found).await?;
            Ok(found
                .into_iter()
                .filter(|file| {
                    file.strip_prefix(&base)
                        .is_ok_and(|relative| matcher.is_match(relative))
                })
                .map(|file| MatchedFile::new(file, base.clone()))
                .collect())
        }
    }
}

/// Expand every positive pattern, drop excluded paths and duplicates.
///
/// Files are reported in pattern order; within a pattern, in sorted path order. When two
/// patterns yield the same file, the first one wins (including its base).
#[instrument(skip(patterns, options))]
pub async fn resolve(patterns: &PatternSet, options: &CopyOptions) -> Result<Resolution, Error> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for source in &patterns.sources {
        for file in expand(source, options).await? {
            if let Some(exclusion) = patterns.excluded_by(&file.path, &options.working_directory)
            {
                tracing::debug!("{:?} excluded by '!{}'", &file.path, exclusion);
                continue;
            }
            if seen.insert(file.path.clone()) {
                files.push(file);
            }
        }
    }
    tracing::info!("matched {} file(s)", files.len());
    Ok(Resolution {
        any_matched: !files.is_empty(),
        files,
    })
}
