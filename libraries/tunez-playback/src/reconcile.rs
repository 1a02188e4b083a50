//! Volume reconciliation
//!
//! Some engines drop `set_volume` calls made while a source is buffering,
//! or reset their level to zero when the source changes. After every load,
//! readiness change or volume change the controller starts a short run
//! that re-applies the wanted level until the engine reports it (within a
//! tolerance) or the attempt budget is spent.
//!
//! Each run gets a fresh generation. The host drives a run by calling
//! [`VolumeReconciler::step`] with that generation at a fixed interval; a
//! step for any other generation is ignored, so timers left over from a
//! cancelled run are harmless.

use crate::source::AudioEngine;

/// Result of one reconciliation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStep {
    /// Level was (re-)applied; keep ticking
    Applied { attempt: u32 },
    /// Engine reports the wanted level; run finished
    Converged { attempt: u32 },
    /// Budget spent without convergence; run abandoned
    Exhausted,
    /// No run with this generation is active
    Idle,
}

impl ReconcileStep {
    /// Whether the run is still going after this step
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct Run {
    generation: u64,
    attempts: u32,
}

/// Bounded, cancellable re-application of a target volume
#[derive(Debug, Clone)]
pub struct VolumeReconciler {
    max_attempts: u32,
    tolerance: f32,
    next_generation: u64,
    active: Option<Run>,
}

impl VolumeReconciler {
    pub fn new(max_attempts: u32, tolerance: f32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            tolerance: tolerance.abs(),
            next_generation: 0,
            active: None,
        }
    }

    /// Begin a new run, replacing any active one; returns its generation
    pub fn start(&mut self) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.active = Some(Run {
            generation,
            attempts: 0,
        });
        generation
    }

    /// Stop the active run, if any
    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Generation of the active run
    pub fn generation(&self) -> Option<u64> {
        self.active.map(|run| run.generation)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// One attempt of run `generation` toward `target`
    ///
    /// If the engine cannot report a volume yet the target is applied
    /// blindly. A run that reaches its attempt budget is dropped silently.
    pub fn step<E: AudioEngine + ?Sized>(
        &mut self,
        generation: u64,
        engine: &mut E,
        target: f32,
    ) -> ReconcileStep {
        let Some(run) = self.active.as_mut().filter(|run| run.generation == generation) else {
            return ReconcileStep::Idle;
        };

        run.attempts += 1;
        let attempt = run.attempts;

        if let Some(current) = engine.volume() {
            if (current - target).abs() <= self.tolerance {
                self.active = None;
                return ReconcileStep::Converged { attempt };
            }
        }

        engine.set_volume(target);

        if attempt >= self.max_attempts {
            tracing::debug!(generation, target, "Volume reconciliation exhausted");
            self.active = None;
            return ReconcileStep::Exhausted;
        }

        ReconcileStep::Applied { attempt }
    }
}

impl Default for VolumeReconciler {
    fn default() -> Self {
        Self::new(8, 0.02)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::MockEngine;

    #[test]
    fn converges_once_engine_reports_target() {
        let mut engine = MockEngine::new();
        engine.volume = Some(0.0);
        let mut reconciler = VolumeReconciler::default();
        let run = reconciler.start();

        assert_eq!(
            reconciler.step(run, &mut engine, 0.6),
            ReconcileStep::Applied { attempt: 1 }
        );
        assert_eq!(
            reconciler.step(run, &mut engine, 0.6),
            ReconcileStep::Converged { attempt: 2 }
        );
        assert_eq!(reconciler.generation(), None);
        assert_eq!(engine.volume_calls, vec![0.6]);
    }

    #[test]
    fn within_tolerance_counts_as_applied() {
        let mut engine = MockEngine::new();
        engine.volume = Some(0.61);
        let mut reconciler = VolumeReconciler::default();
        let run = reconciler.start();

        assert_eq!(
            reconciler.step(run, &mut engine, 0.6),
            ReconcileStep::Converged { attempt: 1 }
        );
        assert!(engine.volume_calls.is_empty());
    }

    #[test]
    fn unreported_volume_is_applied_blindly() {
        let mut engine = MockEngine::new();
        engine.volume = None;
        engine.drop_volume_until_ready = true;
        let mut reconciler = VolumeReconciler::new(3, 0.02);
        let run = reconciler.start();

        assert!(reconciler.step(run, &mut engine, 0.5).is_active());
        assert!(reconciler.step(run, &mut engine, 0.5).is_active());
        assert_eq!(reconciler.step(run, &mut engine, 0.5), ReconcileStep::Exhausted);
        assert_eq!(engine.volume_calls.len(), 3);
        assert_eq!(reconciler.step(run, &mut engine, 0.5), ReconcileStep::Idle);
    }

    #[test]
    fn stale_generation_is_ignored() {
        let mut engine = MockEngine::new();
        let mut reconciler = VolumeReconciler::default();
        let old = reconciler.start();
        let new = reconciler.start();
        assert_ne!(old, new);

        assert_eq!(reconciler.step(old, &mut engine, 0.3), ReconcileStep::Idle);
        assert!(engine.volume_calls.is_empty());

        reconciler.cancel();
        assert_eq!(reconciler.step(new, &mut engine, 0.3), ReconcileStep::Idle);
    }
}
