//! The line tracer seam. The collector only ever starts a tracer, stops
//! it, and reads back which lines ran in between.

pub mod dump;
pub mod recording;

pub use dump::{DumpTracer, DUMP_ENV_VAR};
pub use recording::{LineRecorder, RecordingTracer};

use crate::config::TraceScope;
use crate::error::Result;
use crate::model::RawMeasurement;

pub trait Tracer {
    /// Begin recording executed lines for files inside `scope`.
    fn start(&mut self, scope: &TraceScope) -> Result<()>;

    /// Flush buffered data. Called right before [`Tracer::stop`].
    fn save(&mut self) -> Result<()> {
        Ok(())
    }

    /// Stop recording and hand back everything seen since `start`, keyed
    /// by absolute path.
    fn stop(&mut self) -> Result<RawMeasurement>;
}

impl<T: Tracer + ?Sized> Tracer for Box<T> {
    fn start(&mut self, scope: &TraceScope) -> Result<()> {
        (**self).start(scope)
    }

    fn save(&mut self) -> Result<()> {
        (**self).save()
    }

    fn stop(&mut self) -> Result<RawMeasurement> {
        (**self).stop()
    }
}
