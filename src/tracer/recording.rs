//! In-process tracer. Code under test reports the lines it runs through a
//! [`LineRecorder`]; hits only count while a session is open.

use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::Tracer;
use crate::config::TraceScope;
use crate::error::{Result, TiaError};
use crate::model::RawMeasurement;

#[derive(Debug, Default)]
struct RecorderState {
    /// `Some` while tracing.
    scope: Option<TraceScope>,
    hits: RawMeasurement,
}

/// Cheap, cloneable handle handed to instrumented code.
#[derive(Debug, Clone, Default)]
pub struct LineRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl LineRecorder {
    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        // a panicking test must not take the recorder down with it
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record that `line` of `file` executed. Ignored when no session is
    /// active or the file is out of scope.
    pub fn hit(&self, file: impl AsRef<Path>, line: u32) {
        self.hit_lines(file, line..=line);
    }

    pub fn hit_lines(&self, file: impl AsRef<Path>, lines: RangeInclusive<u32>) {
        let mut state = self.lock();
        let Some(scope) = state.scope.as_ref() else {
            return;
        };
        let Some((abs, _)) = scope.resolve(file.as_ref()) else {
            return;
        };
        for line in lines {
            state.hits.record(abs.clone(), line);
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().scope.is_some()
    }
}

#[derive(Debug, Default)]
pub struct RecordingTracer {
    recorder: LineRecorder,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorder(&self) -> LineRecorder {
        self.recorder.clone()
    }
}

impl Tracer for RecordingTracer {
    fn start(&mut self, scope: &TraceScope) -> Result<()> {
        let mut state = self.recorder.lock();
        if state.scope.is_some() {
            return Err(TiaError::Other("tracer is already running".to_string()));
        }
        state.scope = Some(scope.clone());
        state.hits = RawMeasurement::new();
        Ok(())
    }

    fn stop(&mut self) -> Result<RawMeasurement> {
        let mut state = self.recorder.lock();
        if state.scope.take().is_none() {
            return Err(TiaError::Other("tracer is not running".to_string()));
        }
        Ok(std::mem::take(&mut state.hits))
    }
}
