#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tiacov::config::CollectorConfig;
use tiacov::hooks::HookAdapter;
use tiacov::model::TestDescriptor;
use tiacov::tracer::Tracer;

/// A scratch project: sources under `<dir>/src`, artifacts under `<dir>/.tia`.
/// The caller must hold onto `TempDir` to keep the directory alive.
pub fn setup_project() -> (TempDir, CollectorConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = CollectorConfig::default()
        .with_source_root(dir.path())
        .with_output_root(dir.path().join(".tia"));
    (dir, config)
}

/// Write a source file with `lines` numbered lines and return its path.
pub fn write_source(root: &Path, rel: &str, lines: usize) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let body: String = (1..=lines).map(|i| format!("line_{i}();\n")).collect();
    std::fs::write(&path, body).unwrap();
    path
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
}

/// Minimal sequential host runner: setup, body, teardown, in that order.
pub fn run_test<T: Tracer>(
    hooks: &mut HookAdapter<T>,
    test: &TestDescriptor,
    body: impl FnOnce() -> bool,
) -> Outcome {
    hooks.on_test_setup(test);
    let outcome = if body() {
        Outcome::Passed
    } else {
        Outcome::Failed
    };
    hooks.on_test_teardown(test, None);
    outcome
}
