use std::path::Path;

use log::warn;

use crate::record::GroupKey;

use super::error::{Inconsistency, SinkError};
use super::stats::WriterState;

/// Destination that durably stores packed artifacts.
///
/// Retries and backoff belong in the implementation; the writer hands each
/// artifact over once and propagates any failure.
pub trait Sink {
    /// Store the artifact at `artifact` under `membership`.
    ///
    /// Returning `Ok` confirms the artifact is durable; the writer removes its
    /// local copy right after.
    fn deliver(&mut self, artifact: &Path, membership: &GroupKey) -> Result<(), SinkError>;

    /// Compare what the sink stored against the writer's counters.
    ///
    /// Called from `close` when consistency checking is enabled.
    fn check_consistency(&self, state: &WriterState) -> Result<(), Inconsistency> {
        warn!(
            "Sink has no consistency check; {} delivered artifact(s) not verified",
            state.artifacts_delivered
        );
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn deliver(&mut self, artifact: &Path, membership: &GroupKey) -> Result<(), SinkError> {
        (**self).deliver(artifact, membership)
    }

    fn check_consistency(&self, state: &WriterState) -> Result<(), Inconsistency> {
        (**self).check_consistency(state)
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn deliver(&mut self, artifact: &Path, membership: &GroupKey) -> Result<(), SinkError> {
        (**self).deliver(artifact, membership)
    }

    fn check_consistency(&self, state: &WriterState) -> Result<(), Inconsistency> {
        (**self).check_consistency(state)
    }
}
