//! Scoped restoration of a fitting engine.

use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::domain::FitSnapshot;
use crate::fit::FitEngine;

/// Captures the engine state on creation and puts it back when dropped,
/// whether the sweep finished or bailed out with an error.
pub struct SweepGuard<'a, E: FitEngine + ?Sized> {
    engine: &'a mut E,
    baseline: FitSnapshot,
}

impl<'a, E: FitEngine + ?Sized> SweepGuard<'a, E> {
    pub fn new(engine: &'a mut E) -> Self {
        let baseline = engine.snapshot();
        Self { engine, baseline }
    }

    pub fn baseline(&self) -> &FitSnapshot {
        &self.baseline
    }

    /// Restore the baseline without ending the scope.
    pub fn reset(&mut self) {
        self.engine.restore(&self.baseline);
    }

    /// Restore the baseline and refresh the engine's derived statistics.
    pub fn finish(mut self) {
        self.reset();
        self.engine.update_info();
    }
}

impl<E: FitEngine + ?Sized> Deref for SweepGuard<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        self.engine
    }
}

impl<E: FitEngine + ?Sized> DerefMut for SweepGuard<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        self.engine
    }
}

impl<E: FitEngine + ?Sized> Drop for SweepGuard<'_, E> {
    fn drop(&mut self) {
        debug!("restoring fit engine baseline");
        self.engine.restore(&self.baseline);
    }
}
