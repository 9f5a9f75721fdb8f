//! Human-readable rendering of a persisted per-test artifact.

use std::fmt::Write;

use crate::model::{rate, PerTestArtifact};

/// Group sorted line numbers into inclusive `(start, end)` runs of
/// consecutive lines.
#[must_use]
pub fn coalesce_ranges(lines: &[u32]) -> Vec<(u32, u32)> {
    let Some((&first, rest)) = lines.split_first() else {
        return Vec::new();
    };

    debug_assert!(
        lines.windows(2).all(|w| w[0] < w[1]),
        "coalesce_ranges requires sorted, deduplicated input"
    );

    let mut ranges = Vec::new();
    let (mut start, mut end) = (first, first);
    for &line in rest {
        if line == end + 1 {
            end = line;
        } else {
            ranges.push((start, end));
            start = line;
            end = line;
        }
    }
    ranges.push((start, end));
    ranges
}

/// Format line numbers into compact range notation, e.g. "1, 3-5, 8".
#[must_use]
pub fn format_line_ranges(lines: &[u32]) -> String {
    coalesce_ranges(lines)
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Per-file statement table plus the executed line ranges of each file.
#[must_use]
pub fn format_summary(artifact: &PerTestArtifact) -> String {
    let mut out = String::new();
    if artifact.is_empty() {
        out.push_str("No files recorded for this test.\n");
        return out;
    }

    writeln!(out, "{:<50} {:>8} {:>8} {:>8}", "FILE", "STMTS", "HIT", "RATE").unwrap();
    writeln!(out, "{}", "-".repeat(77)).unwrap();

    let mut total = 0;
    let mut covered = 0;
    for (path, report) in &artifact.files {
        total += report.total_statements();
        covered += report.covered_statements();
        writeln!(
            out,
            "{:<50} {:>8} {:>8} {:>7.1}%",
            path,
            report.total_statements(),
            report.covered_statements(),
            report.line_rate() * 100.0
        )
        .unwrap();
        let executed = report.executed_lines();
        if !executed.is_empty() {
            writeln!(out, "    executed: {}", format_line_ranges(&executed)).unwrap();
        }
    }

    writeln!(out, "{}", "-".repeat(77)).unwrap();
    writeln!(
        out,
        "{:<50} {:>8} {:>8} {:>7.1}%",
        "TOTAL",
        total,
        covered,
        rate(covered, total) * 100.0
    )
    .unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::build_file_report;
    use std::collections::BTreeSet;

    #[test]
    fn test_coalesce_ranges() {
        assert_eq!(coalesce_ranges(&[]), Vec::<(u32, u32)>::new());
        assert_eq!(coalesce_ranges(&[5]), vec![(5, 5)]);
        assert_eq!(coalesce_ranges(&[1, 2, 3, 7, 9, 10]), vec![(1, 3), (7, 7), (9, 10)]);
    }

    #[test]
    fn test_format_line_ranges() {
        assert_eq!(format_line_ranges(&[1, 3, 4, 5, 8]), "1, 3-5, 8");
        assert_eq!(format_line_ranges(&[]), "");
    }

    #[test]
    fn test_format_summary() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("app.rs");
        std::fs::write(&source, "a\nb\nc\nd\n").unwrap();

        let mut artifact = PerTestArtifact::new();
        artifact.insert(build_file_report(&source, "src/app.rs", &BTreeSet::from([2, 3]), "t"));
        let out = format_summary(&artifact);

        assert!(out.contains("src/app.rs"));
        assert!(out.contains("executed: 2-3"));
        assert!(out.contains("50.0%"));
    }

    #[test]
    fn test_format_summary_empty() {
        assert_eq!(
            format_summary(&PerTestArtifact::new()),
            "No files recorded for this test.\n"
        );
    }
}
