//! Collector configuration: where sources live, where artifacts go, and
//! which files are kept out of the measurement and out of the reports.

use std::path::{Component, Path, PathBuf};

use regex::Regex;

use crate::error::Result;

/// Subdirectory of the output root holding one artifact per test.
pub const PER_TEST_DIR: &str = "per-test-coverage";

/// Subdirectory reserved for a whole-run report. Created, never written.
pub const AGGREGATE_DIR: &str = "aggregate-coverage";

pub const DEFAULT_OUTPUT_ROOT: &str = ".tia";

/// Schema tag stamped on every file report.
pub const DEFAULT_SCHEMA_TAG: &str = "tia-coverage-1.0.0";

/// A file-exclusion rule, evaluated against the path relative to the
/// source root. Excluded files are measured but never reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExcludeRule {
    Contains(String),
    EndsWith(String),
}

impl ExcludeRule {
    #[must_use]
    pub fn matches(&self, rel_path: &str) -> bool {
        match self {
            ExcludeRule::Contains(needle) => rel_path.contains(needle.as_str()),
            ExcludeRule::EndsWith(suffix) => rel_path.ends_with(suffix.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    /// Glob patterns (relative to `source_root`) the tracer ignores. The
    /// output root is omitted on top of these.
    pub omit: Vec<String>,
    pub exclude: Vec<ExcludeRule>,
    pub schema_tag: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            omit: vec!["tests/**".to_string()],
            exclude: vec![ExcludeRule::Contains("test".to_string())],
            schema_tag: DEFAULT_SCHEMA_TAG.to_string(),
        }
    }
}

impl CollectorConfig {
    #[must_use]
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = root.into();
        self
    }

    #[must_use]
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    #[must_use]
    pub fn with_omit(mut self, omit: Vec<String>) -> Self {
        self.omit = omit;
        self
    }

    #[must_use]
    pub fn with_exclude(mut self, exclude: Vec<ExcludeRule>) -> Self {
        self.exclude = exclude;
        self
    }

    #[must_use]
    pub fn with_schema_tag(mut self, tag: impl Into<String>) -> Self {
        self.schema_tag = tag.into();
        self
    }

    #[must_use]
    pub fn per_test_dir(&self) -> PathBuf {
        self.output_root.join(PER_TEST_DIR)
    }

    #[must_use]
    pub fn aggregate_dir(&self) -> PathBuf {
        self.output_root.join(AGGREGATE_DIR)
    }

    #[must_use]
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        self.exclude.iter().any(|rule| rule.matches(rel_path))
    }

    /// Compile the tracing scope. Fails only on a malformed omit pattern.
    pub fn trace_scope(&self) -> Result<TraceScope> {
        let mut scope = TraceScope::new(&self.source_root, &self.omit)?;
        scope.omit_dir(&self.output_root)?;
        Ok(scope)
    }
}

/// What a tracer is allowed to measure: files under `root` that match
/// none of the omit globs.
#[derive(Debug, Clone)]
pub struct TraceScope {
    root: PathBuf,
    omit: Vec<Regex>,
}

impl TraceScope {
    pub fn new(root: &Path, omit: &[String]) -> Result<Self> {
        let omit = omit
            .iter()
            .map(|p| Regex::new(&glob_to_regex(p)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            root: absolute(root),
            omit,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Leave everything under `dir` untraced. A no-op when `dir` is outside
    /// the root or is the root itself.
    pub fn omit_dir(&mut self, dir: &Path) -> Result<()> {
        let dir = absolute(dir);
        let Ok(rel) = dir.strip_prefix(&self.root) else {
            return Ok(());
        };
        let rel = slash_path(rel);
        if !rel.is_empty() {
            self.omit.push(Regex::new(&glob_to_regex(&format!("{rel}/**")))?);
        }
        Ok(())
    }

    /// Resolve a traced path to `(absolute, relative)` if it is in scope.
    /// Relative inputs are taken relative to the root.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> Option<(PathBuf, String)> {
        let abs = if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.root.join(path))
        };
        // symlinked roots (e.g. /tmp on macOS) only line up once canonical,
        // and every spelling of a file must land on the same key
        let (abs, rel) = match abs.strip_prefix(&self.root).ok().map(slash_path) {
            Some(rel) => (abs, rel),
            None => {
                let canonical = abs.canonicalize().ok()?;
                let rel = slash_path(canonical.strip_prefix(&self.root).ok()?);
                (canonical, rel)
            }
        };
        if rel.is_empty() || self.is_omitted(&rel) {
            return None;
        }
        Some((abs, rel))
    }

    #[must_use]
    pub fn is_omitted(&self, rel_path: &str) -> bool {
        self.omit.iter().any(|re| re.is_match(rel_path))
    }
}

/// Translate a path glob into an anchored regex. `**` spans directories,
/// `*` and `?` stay within one path segment.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str(".*");
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    out
}

fn absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let path = if path.is_absolute() {
        normalize(path)
    } else {
        let cwd = std::env::current_dir().unwrap_or_default();
        normalize(&cwd.join(path))
    };
    // not created yet: canonicalize the part that exists
    for ancestor in path.ancestors().skip(1) {
        if let Ok(canonical) = ancestor.canonicalize() {
            let rest = path.strip_prefix(ancestor).unwrap_or(Path::new(""));
            return canonical.join(rest);
        }
    }
    path
}

/// Lexically drop `.` and resolve `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
