//! Binding the collector to a host test runner's lifecycle.
//!
//! [`Collector`] owns the session manager and passes each
//! [`CoverageSession`] out of `begin` and back into `finish`.
//! [`HookAdapter`] keeps that session for runners that only fire
//! setup/teardown callbacks, and turns every failure in the teardown chain
//! into a log line so coverage can never change a test's outcome.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::CollectorConfig;
use crate::convert;
use crate::error::Result;
use crate::model::{RawMeasurement, TestDescriptor};
use crate::sanitize;
use crate::session::{CoverageSession, SessionManager};
use crate::tracer::Tracer;
use crate::writer::{self, ArtifactWriter};

pub struct Collector<T: Tracer> {
    config: CollectorConfig,
    sessions: SessionManager<T>,
    writer: ArtifactWriter,
}

impl<T: Tracer> Collector<T> {
    /// Compile the scope and create the output layout. Layout failures
    /// propagate: without an output directory nothing can be collected.
    pub fn new(config: CollectorConfig, tracer: T) -> Result<Self> {
        let scope = config.trace_scope()?;
        writer::ensure_layout(&config)?;
        Ok(Self {
            sessions: SessionManager::new(tracer, scope),
            writer: ArtifactWriter::new(&config),
            config,
        })
    }

    pub fn begin(&mut self, test: &TestDescriptor) -> Result<CoverageSession> {
        self.sessions.start(test)
    }

    /// Stop `session` and persist what it measured under `test`'s name.
    pub fn finish(&mut self, test: &TestDescriptor, session: CoverageSession) -> Result<PathBuf> {
        let measurement = self.sessions.stop(session)?;
        self.persist(test, &measurement)
    }

    /// Convert and write one test's measurement.
    pub fn persist(&self, test: &TestDescriptor, measurement: &RawMeasurement) -> Result<PathBuf> {
        let artifact = convert::convert(measurement, self.sessions.scope(), &self.config);
        let identity = sanitize::identity(test);
        let path = self.writer.write(&identity, &artifact)?;
        info!(artifact = %identity.artifact_file_name(), files = artifact.len(), "saved coverage");
        Ok(path)
    }
}

enum State {
    Idle,
    Measuring(CoverageSession),
}

/// Counters reported when the run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub saved: usize,
    pub failed: usize,
}

pub struct HookAdapter<T: Tracer> {
    /// Taken by the first `configure`.
    pending: Option<(CollectorConfig, T)>,
    collector: Option<Collector<T>>,
    state: State,
    stats: RunStats,
}

impl<T: Tracer> HookAdapter<T> {
    pub fn new(config: CollectorConfig, tracer: T) -> Self {
        Self {
            pending: Some((config, tracer)),
            collector: None,
            state: State::Idle,
            stats: RunStats::default(),
        }
    }

    /// Register the collector. Only the first call does anything; it
    /// returns `true` when it did.
    pub fn configure(&mut self) -> Result<bool> {
        let Some((config, tracer)) = self.pending.take() else {
            debug!("collector already registered");
            return Ok(false);
        };
        self.collector = Some(Collector::new(config, tracer)?);
        info!("starting test suite with coverage collection");
        Ok(true)
    }

    pub fn is_registered(&self) -> bool {
        self.collector.is_some()
    }

    pub fn is_measuring(&self) -> bool {
        matches!(self.state, State::Measuring(_))
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Idle → Measuring. A session left open by a teardown that never
    /// arrived is stopped and discarded first.
    pub fn on_test_setup(&mut self, test: &TestDescriptor) {
        let Some(collector) = self.collector.as_mut() else {
            return;
        };

        if let State::Measuring(stale) = std::mem::replace(&mut self.state, State::Idle) {
            warn!(
                test = %stale.test().name,
                "previous test never tore down, discarding its coverage"
            );
            let stale_test = stale.test().clone();
            if let Err(e) = collector.sessions.stop(stale) {
                warn!(test = %stale_test.name, error = %e, "failed to stop stale session");
            }
        }

        match collector.begin(test) {
            Ok(session) => self.state = State::Measuring(session),
            Err(e) => warn!(test = %test.name, error = %e, "failed to start coverage"),
        }
    }

    /// Measuring → Idle: stop, convert, name, write. Returns the artifact
    /// path on success. Never fails; without a matching setup it is a no-op.
    pub fn on_test_teardown(
        &mut self,
        test: &TestDescriptor,
        next: Option<&TestDescriptor>,
    ) -> Option<PathBuf> {
        let collector = self.collector.as_mut()?;
        let State::Measuring(session) = std::mem::replace(&mut self.state, State::Idle) else {
            debug!(test = %test.name, "teardown without an open session");
            return None;
        };

        if session.test() != test {
            warn!(
                test = %test.name,
                started = %session.test().name,
                "teardown does not match the measured test"
            );
        }
        debug!(test = %test.name, next = ?next.map(|t| &t.name), "tearing down");

        match collector.finish(test, session) {
            Ok(path) => {
                self.stats.saved += 1;
                Some(path)
            }
            Err(e) => {
                self.stats.failed += 1;
                warn!(test = %test.name, error = %e, "failed to save coverage");
                None
            }
        }
    }

    pub fn on_session_finish(&mut self, exit_status: i32) {
        if self.collector.is_none() {
            return;
        }
        info!(
            exit_status,
            saved = self.stats.saved,
            failed = self.stats.failed,
            "test session completed"
        );
    }
}
