//! Command handler functions for the tiacov CLI.
//!
//! Each `cmd_*` function returns its output rather than printing it, so
//! they can be tested without capturing stdout.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::config::CollectorConfig;
use crate::hooks::{Collector, HookAdapter};
use crate::model::TestDescriptor;
use crate::parsers::Format;
use crate::report;
use crate::tracer::{DumpTracer, DUMP_ENV_VAR};
use crate::writer;

pub fn cmd_init(config: &CollectorConfig) -> Result<String> {
    writer::ensure_layout(config).with_context(|| {
        format!(
            "Failed to create output layout under {}",
            config.output_root.display()
        )
    })?;
    Ok(format!(
        "Initialized {} and {}\n",
        config.per_test_dir().display(),
        config.aggregate_dir().display()
    ))
}

/// Turn a dump that an external run already produced into `test`'s artifact.
pub fn cmd_record(
    config: CollectorConfig,
    test: &TestDescriptor,
    dump: &Path,
    format: Option<Format>,
) -> Result<String> {
    let tracer = DumpTracer::new(dump, format);
    let measurement = tracer
        .read_measurement(&config.trace_scope()?)
        .with_context(|| {
            format!(
                "Failed to read coverage dump {}",
                tracer.dump_path().display()
            )
        })?;

    let collector = Collector::new(config, tracer).context("Failed to set up collector")?;
    let path = collector
        .persist(test, &measurement)
        .context("Failed to write artifact")?;
    Ok(format!("Saved {}\n", path.display()))
}

/// Outcome of running one test command under coverage.
#[derive(Debug)]
pub struct ExecOutcome {
    /// The child's exit code; signals map to 1.
    pub exit_code: i32,
    pub artifact: Option<PathBuf>,
}

/// Run `command` as a single test: configure → setup → run → teardown →
/// finish. The child finds its dump path in `TIA_COVERAGE_DUMP`. The exit
/// code is always the child's; coverage failures are only logged.
pub fn cmd_exec(
    config: CollectorConfig,
    test: &TestDescriptor,
    dump: &Path,
    format: Option<Format>,
    command: &[String],
) -> Result<ExecOutcome> {
    let Some((program, args)) = command.split_first() else {
        bail!("No command given to run");
    };
    let dump = std::path::absolute(dump)
        .with_context(|| format!("Invalid dump path {}", dump.display()))?;

    let mut hooks = HookAdapter::new(config, DumpTracer::new(&dump, format));
    hooks.configure().context("Failed to set up collector")?;

    hooks.on_test_setup(test);
    let status = Command::new(program)
        .args(args)
        .env(DUMP_ENV_VAR, &dump)
        .status();
    let artifact = hooks.on_test_teardown(test, None);

    let status = status.with_context(|| format!("Failed to run {program}"))?;
    let exit_code = status.code().unwrap_or(1);
    hooks.on_session_finish(exit_code);

    Ok(ExecOutcome {
        exit_code,
        artifact,
    })
}

pub fn cmd_summary(artifact: &Path) -> Result<String> {
    let data = writer::read_artifact(artifact)
        .with_context(|| format!("Failed to read artifact {}", artifact.display()))?;
    Ok(report::format_summary(&data))
}
