//! In-memory representation of a single test's coverage, from the raw
//! executed-line sets reported by a tracer to the statement-map report
//! that gets persisted per test.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// A test as the host runner describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDescriptor {
    pub name: String,
    /// Enclosing class/suite/module, when the runner has one.
    pub class: Option<String>,
}

impl TestDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: None,
        }
    }

    pub fn in_class(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: Some(class.into()),
        }
    }
}

/// Filesystem-safe names derived from a [`TestDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestIdentity {
    pub test: String,
    pub class: String,
}

impl TestIdentity {
    /// `<class>__<test>.json`
    #[must_use]
    pub fn artifact_file_name(&self) -> String {
        format!("{}__{}.json", self.class, self.test)
    }
}

/// Executed lines per measured file, as reported by a tracer when a
/// session stops. A file may be measured with no executed lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMeasurement {
    files: BTreeMap<PathBuf, BTreeSet<u32>>,
}

impl RawMeasurement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a file as measured without recording any executed line.
    pub fn touch(&mut self, path: impl Into<PathBuf>) {
        self.files.entry(path.into()).or_default();
    }

    pub fn record(&mut self, path: impl Into<PathBuf>, line: u32) {
        self.files.entry(path.into()).or_default().insert(line);
    }

    pub fn measured_files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Executed lines for `path`, or `None` if the file was not measured.
    pub fn executed_lines(&self, path: &Path) -> Option<&BTreeSet<u32>> {
        self.files.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSpan {
    pub start: Position,
    pub end: Position,
}

/// Statement-level coverage for one source file, in the
/// `statementMap`/`fnMap`/`branchMap` shape used by Istanbul consumers.
///
/// Statement ids are sequential integers; `BTreeMap<u32, _>` keeps them
/// in numeric order and serializes them as JSON string keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCoverageReport {
    pub path: String,
    #[serde(rename = "statementMap")]
    pub statement_map: BTreeMap<u32, StatementSpan>,
    #[serde(rename = "fnMap", default)]
    pub fn_map: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "branchMap", default)]
    pub branch_map: BTreeMap<String, serde_json::Value>,
    /// Hit count per statement id: 1 if executed, 0 otherwise.
    pub s: BTreeMap<u32, u64>,
    #[serde(default)]
    pub f: BTreeMap<String, u64>,
    #[serde(default)]
    pub b: BTreeMap<String, Vec<u64>>,
    #[serde(rename = "_coverageSchema")]
    pub coverage_schema: String,
}

impl FileCoverageReport {
    #[must_use]
    pub fn total_statements(&self) -> u64 {
        self.statement_map.len() as u64
    }

    #[must_use]
    pub fn covered_statements(&self) -> u64 {
        self.s.values().filter(|&&hits| hits > 0).count() as u64
    }

    #[must_use]
    pub fn line_rate(&self) -> f64 {
        rate(self.covered_statements(), self.total_statements())
    }

    /// Lines whose statement was hit, ascending.
    #[must_use]
    pub fn executed_lines(&self) -> Vec<u32> {
        self.statement_map
            .iter()
            .filter(|(id, _)| self.s.get(id).copied().unwrap_or(0) > 0)
            .map(|(_, span)| span.start.line)
            .collect()
    }

    /// Hit count for the statement starting on `line`, if one exists.
    #[must_use]
    pub fn hits_for_line(&self, line: u32) -> Option<u64> {
        self.statement_map
            .iter()
            .find(|(_, span)| span.start.line == line)
            .map(|(id, _)| self.s.get(id).copied().unwrap_or(0))
    }
}

/// Everything one test touched: relative source path → report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerTestArtifact {
    pub files: BTreeMap<String, FileCoverageReport>,
}

impl PerTestArtifact {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, report: FileCoverageReport) {
        self.files.insert(report.path.clone(), report);
    }

    pub fn get(&self, path: &str) -> Option<&FileCoverageReport> {
        self.files.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}
