//! Coverage sessions: one bounded tracing interval per test.
//!
//! A [`CoverageSession`] is only handed out by [`SessionManager::start`]
//! and is consumed by [`SessionManager::stop`], so a session can neither
//! be stopped twice nor reused for a second test.

use tracing::info;

use crate::config::TraceScope;
use crate::error::Result;
use crate::model::{RawMeasurement, TestDescriptor};
use crate::sanitize::sanitize_test_name;
use crate::tracer::Tracer;

/// An in-flight measurement bound to exactly one test.
#[derive(Debug)]
#[must_use = "a started session must be passed back to SessionManager::stop"]
pub struct CoverageSession {
    test: TestDescriptor,
}

impl CoverageSession {
    pub fn test(&self) -> &TestDescriptor {
        &self.test
    }
}

pub struct SessionManager<T: Tracer> {
    tracer: T,
    scope: TraceScope,
}

impl<T: Tracer> SessionManager<T> {
    pub fn new(tracer: T, scope: TraceScope) -> Self {
        Self { tracer, scope }
    }

    pub fn scope(&self) -> &TraceScope {
        &self.scope
    }

    /// Start tracing for `test`.
    pub fn start(&mut self, test: &TestDescriptor) -> Result<CoverageSession> {
        self.tracer.start(&self.scope)?;
        info!(test = %sanitize_test_name(&test.name), "starting coverage");
        Ok(CoverageSession { test: test.clone() })
    }

    /// Stop tracing and return what ran while `session` was open. The
    /// tracer is stopped even when flushing it fails.
    pub fn stop(&mut self, session: CoverageSession) -> Result<RawMeasurement> {
        let saved = self.tracer.save();
        let measurement = self.tracer.stop()?;
        saved?;
        info!(
            test = %sanitize_test_name(&session.test.name),
            files = measurement.len(),
            "collected coverage"
        );
        Ok(measurement)
    }
}
