//! Persisting per-test artifacts.
//!
//! Artifacts land at `<output_root>/per-test-coverage/<Class>__<test>.json`.
//! Re-running a test overwrites its file. Writes are not atomic.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::CollectorConfig;
use crate::error::Result;
use crate::model::{PerTestArtifact, TestIdentity};

/// Create the per-test directory and the reserved aggregate directory.
pub fn ensure_layout(config: &CollectorConfig) -> Result<()> {
    fs::create_dir_all(config.per_test_dir())?;
    fs::create_dir_all(config.aggregate_dir())?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    per_test_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            per_test_dir: config.per_test_dir(),
        }
    }

    #[must_use]
    pub fn artifact_path(&self, identity: &TestIdentity) -> PathBuf {
        self.per_test_dir.join(identity.artifact_file_name())
    }

    /// Serialize `artifact` as pretty JSON, replacing any earlier file.
    pub fn write(&self, identity: &TestIdentity, artifact: &PerTestArtifact) -> Result<PathBuf> {
        fs::create_dir_all(&self.per_test_dir)?;
        let path = self.artifact_path(identity);

        let mut out = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut out, artifact)?;
        out.write_all(b"\n")?;
        out.flush()?;

        debug!(artifact = %path.display(), files = artifact.len(), "wrote artifact");
        Ok(path)
    }
}

/// Load a persisted artifact.
pub fn read_artifact(path: &Path) -> Result<PerTestArtifact> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::build_file_report;
    use std::collections::BTreeSet;

    fn identity() -> TestIdentity {
        TestIdentity {
            test: "get_users".to_string(),
            class: "UsersAPI".to_string(),
        }
    }

    #[test]
    fn test_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = CollectorConfig::default().with_output_root(dir.path().join("deep/.tia"));
        let writer = ArtifactWriter::new(&config);

        let path = writer.write(&identity(), &PerTestArtifact::new()).unwrap();
        assert_eq!(path, dir.path().join("deep/.tia/per-test-coverage/UsersAPI__get_users.json"));
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[test]
    fn test_write_overwrites_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = CollectorConfig::default().with_output_root(dir.path());
        let writer = ArtifactWriter::new(&config);

        let mut artifact = PerTestArtifact::new();
        artifact.insert(build_file_report(
            &dir.path().join("missing.rs"),
            "src/app.rs",
            &BTreeSet::from([3]),
            "tag",
        ));
        writer.write(&identity(), &PerTestArtifact::new()).unwrap();
        let path = writer.write(&identity(), &artifact).unwrap();

        let files: Vec<_> = fs::read_dir(config.per_test_dir()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(read_artifact(&path).unwrap(), artifact);
    }

    #[test]
    fn test_ensure_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = CollectorConfig::default().with_output_root(dir.path().join(".tia"));
        ensure_layout(&config).unwrap();
        ensure_layout(&config).unwrap();
        assert!(config.per_test_dir().is_dir());
        assert!(config.aggregate_dir().is_dir());
        assert_eq!(fs::read_dir(config.aggregate_dir()).unwrap().count(), 0);
    }
}
