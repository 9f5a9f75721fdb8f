//! Raw executed-line sets → statement-map reports.
//!
//! Every line of a measured file becomes one statement. Statement ids are
//! assigned in ascending line order, and a statement is hit (`1`) exactly
//! when its line executed. Function and branch maps are left empty.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::debug;

use crate::config::{CollectorConfig, TraceScope};
use crate::model::{FileCoverageReport, PerTestArtifact, Position, RawMeasurement, StatementSpan};

/// Build one report per measured file that is in scope and not excluded.
pub fn convert(
    measurement: &RawMeasurement,
    scope: &TraceScope,
    config: &CollectorConfig,
) -> PerTestArtifact {
    let mut artifact = PerTestArtifact::new();

    for path in measurement.measured_files() {
        let Some((abs, rel)) = scope.resolve(path) else {
            continue;
        };
        if config.is_excluded(&rel) {
            debug!(file = %rel, "excluded from report");
            continue;
        }
        let Some(executed) = measurement.executed_lines(path) else {
            continue;
        };
        artifact.insert(build_file_report(&abs, &rel, executed, &config.schema_tag));
    }

    artifact
}

/// Statement-map report for a single file.
///
/// The source is read to learn its line count and line widths. If it
/// cannot be read, only the executed lines appear, with end column 0.
pub fn build_file_report(
    source: &Path,
    rel_path: &str,
    executed: &BTreeSet<u32>,
    schema_tag: &str,
) -> FileCoverageReport {
    let source_lines = read_source_lines(source);

    let line_count = source_lines.len() as u32;
    let all_lines: BTreeSet<u32> = executed.iter().copied().chain(1..=line_count).collect();

    let mut statement_map = BTreeMap::new();
    let mut s = BTreeMap::new();

    for (id, line) in all_lines.into_iter().enumerate() {
        let id = id as u32;
        // the file may have shrunk since it was traced
        let end_column = (line as usize)
            .checked_sub(1)
            .and_then(|idx| source_lines.get(idx))
            .map_or(0, |text| text.trim_end().chars().count() as u32);

        statement_map.insert(
            id,
            StatementSpan {
                start: Position { line, column: 0 },
                end: Position {
                    line,
                    column: end_column,
                },
            },
        );
        s.insert(id, u64::from(executed.contains(&line)));
    }

    FileCoverageReport {
        path: rel_path.to_string(),
        statement_map,
        fn_map: BTreeMap::new(),
        branch_map: BTreeMap::new(),
        s,
        f: BTreeMap::new(),
        b: BTreeMap::new(),
        coverage_schema: schema_tag.to_string(),
    }
}

fn read_source_lines(source: &Path) -> Vec<String> {
    match std::fs::read(source) {
        Ok(bytes) => String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_owned)
            .collect(),
        Err(e) => {
            debug!(file = %source.display(), error = %e, "source unreadable, reporting executed lines only");
            Vec::new()
        }
    }
}
