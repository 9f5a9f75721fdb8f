//! Out-of-process tracer: an instrumented program writes a line coverage
//! dump (LCOV or a Go cover profile) to a known path, and the session
//! reads it back when it stops.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::Tracer;
use crate::config::TraceScope;
use crate::error::{Result, TiaError};
use crate::model::RawMeasurement;
use crate::parsers::{self, Format};

/// Environment variable telling an instrumented child where to write its dump.
pub const DUMP_ENV_VAR: &str = "TIA_COVERAGE_DUMP";

#[derive(Debug)]
pub struct DumpTracer {
    dump_path: PathBuf,
    format: Option<Format>,
    scope: Option<TraceScope>,
}

impl DumpTracer {
    /// `format: None` auto-detects on every read.
    pub fn new(dump_path: impl Into<PathBuf>, format: Option<Format>) -> Self {
        Self {
            dump_path: dump_path.into(),
            format,
            scope: None,
        }
    }

    pub fn dump_path(&self) -> &Path {
        &self.dump_path
    }

    /// Read the dump as it currently is, keeping in-scope files only.
    /// A missing dump is an empty measurement.
    pub fn read_measurement(&self, scope: &TraceScope) -> Result<RawMeasurement> {
        let mut measurement = RawMeasurement::new();
        if !self.dump_path.exists() {
            warn!(dump = %self.dump_path.display(), "no coverage dump was written");
            return Ok(measurement);
        }

        let (format, files) = parsers::read_dump(&self.dump_path, self.format)?;
        debug!(dump = %self.dump_path.display(), %format, files = files.len(), "read coverage dump");

        for file in files {
            let Some((abs, _)) = scope.resolve(Path::new(&file.path)) else {
                continue;
            };
            measurement.touch(abs.clone());
            for line in file.executed() {
                measurement.record(abs.clone(), line);
            }
        }
        Ok(measurement)
    }
}

impl Tracer for DumpTracer {
    fn start(&mut self, scope: &TraceScope) -> Result<()> {
        if self.scope.is_some() {
            return Err(TiaError::Other("tracer is already running".to_string()));
        }
        // a leftover dump belongs to some earlier test
        match std::fs::remove_file(&self.dump_path) {
            Ok(()) => debug!(dump = %self.dump_path.display(), "removed stale coverage dump"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.scope = Some(scope.clone());
        Ok(())
    }

    fn stop(&mut self) -> Result<RawMeasurement> {
        let scope = self
            .scope
            .take()
            .ok_or_else(|| TiaError::Other("tracer is not running".to_string()))?;
        self.read_measurement(&scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_removes_stale_dump() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("cov.lcov");
        std::fs::write(&dump, "SF:src/a.rs\nDA:1,1\nend_of_record\n").unwrap();

        let scope = TraceScope::new(dir.path(), &[]).unwrap();
        let mut tracer = DumpTracer::new(&dump, None);
        tracer.start(&scope).unwrap();
        assert!(!dump.exists());

        let m = tracer.stop().unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn test_stop_reads_executed_lines_in_scope() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("cov.lcov");
        let scope = TraceScope::new(dir.path(), &["tests/**".to_string()]).unwrap();

        let mut tracer = DumpTracer::new(&dump, None);
        tracer.start(&scope).unwrap();
        std::fs::write(
            &dump,
            "SF:src/a.rs\nDA:1,1\nDA:2,0\nend_of_record\n\
             SF:src/b.rs\nDA:1,0\nend_of_record\n\
             SF:tests/t.rs\nDA:1,1\nend_of_record\n\
             SF:/elsewhere/c.rs\nDA:1,1\nend_of_record\n",
        )
        .unwrap();
        let m = tracer.stop().unwrap();

        assert_eq!(m.len(), 2);
        let a: Vec<u32> = m
            .executed_lines(&scope.root().join("src/a.rs"))
            .unwrap()
            .iter()
            .copied()
            .collect();
        assert_eq!(a, vec![1]);
        // measured, nothing executed
        assert!(m.executed_lines(&scope.root().join("src/b.rs")).unwrap().is_empty());
    }

    #[test]
    fn test_explicit_format_override() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("dump.txt");
        std::fs::write(&dump, "main.go:3.1,4.2 1 1\n").unwrap();
        let scope = TraceScope::new(dir.path(), &[]).unwrap();

        let m = DumpTracer::new(&dump, Some(Format::Gocover))
            .read_measurement(&scope)
            .unwrap();
        let lines: Vec<u32> = m
            .executed_lines(&scope.root().join("main.go"))
            .unwrap()
            .iter()
            .copied()
            .collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn test_stop_without_start_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracer = DumpTracer::new(dir.path().join("x.lcov"), None);
        assert!(tracer.stop().is_err());
    }
}
