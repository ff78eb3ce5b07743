use super::{Backend, StepEngine};
use crate::{GridState, Result};
use std::time::{Duration, Instant};

/// Accumulated wall-clock timings of individual steps.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepProfile {
    pub steps: u64,
    pub total: Duration,
    pub min: Option<Duration>,
    pub max: Option<Duration>,
}

impl StepProfile {
    fn record(&mut self, steps: u64, elapsed: Duration) {
        let per_step = elapsed.div_f64(steps.max(1) as f64);
        self.steps += steps;
        self.total += elapsed;
        self.min = Some(self.min.map_or(per_step, |m| m.min(per_step)));
        self.max = Some(self.max.map_or(per_step, |m| m.max(per_step)));
    }

    pub fn mean(&self) -> Option<Duration> {
        (self.steps > 0).then(|| self.total.div_f64(self.steps as f64))
    }
}

/// Wraps an engine and times every call after the engine has synchronized.
///
/// Batched `advance` calls count as `steps` steps of equal length.
pub struct ProfiledEngine<E> {
    inner: E,
    profile: StepProfile,
}

impl<E: StepEngine> ProfiledEngine<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            profile: StepProfile::default(),
        }
    }

    pub fn profile(&self) -> StepProfile {
        self.profile
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: StepEngine> StepEngine for ProfiledEngine<E> {
    fn backend(&self) -> Backend {
        self.inner.backend()
    }

    fn dimensions(&self) -> (usize, usize) {
        self.inner.dimensions()
    }

    fn step_into(&mut self, src: &GridState, dst: &mut GridState) -> Result<()> {
        let _span = tracing::trace_span!("step", backend = %self.inner.backend()).entered();
        let timer = Instant::now();
        self.inner.step_into(src, dst)?;
        self.inner.synchronize()?;
        self.profile.record(1, timer.elapsed());
        Ok(())
    }

    fn advance(&mut self, grid: GridState, steps: usize) -> Result<GridState> {
        let _span =
            tracing::trace_span!("advance", backend = %self.inner.backend(), steps).entered();
        let timer = Instant::now();
        let result = self.inner.advance(grid, steps)?;
        self.inner.synchronize()?;
        if steps > 0 {
            self.profile.record(steps as u64, timer.elapsed());
        }
        Ok(result)
    }

    fn synchronize(&mut self) -> Result<()> {
        self.inner.synchronize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ScalarEngine;

    #[test]
    fn test_profile_counts_steps() {
        let mut engine = ProfiledEngine::new(ScalarEngine::new(8, 8).unwrap());
        let grid = GridState::create(8, 8, 0.5, Some(7)).unwrap();
        let next = engine.step(&grid).unwrap();
        let _ = engine.advance(next, 4).unwrap();
        let _ = engine.advance(grid, 0).unwrap();

        let profile = engine.profile();
        assert_eq!(profile.steps, 5);
        assert!(profile.min.unwrap() <= profile.max.unwrap());
        assert!(profile.mean().is_some());
        assert_eq!(engine.backend(), Backend::Scalar);
    }

    #[test]
    fn test_step_counts_beyond_u32() {
        let mut profile = StepProfile::default();
        profile.record(1 << 32, Duration::from_secs(1 << 32));
        assert_eq!(profile.min, Some(Duration::from_secs(1)));

        let mut profile = StepProfile::default();
        profile.record((1 << 32) + 1, Duration::from_secs(1 << 20));
        let mean = profile.mean().unwrap();
        assert!(mean < Duration::from_micros(250), "{:?}", mean);
        assert!(mean > Duration::from_micros(240), "{:?}", mean);
    }

    #[test]
    fn test_profiled_results_match_inner() {
        let grid = GridState::create(16, 12, 0.4, Some(3)).unwrap();
        let mut plain = ScalarEngine::new(16, 12).unwrap();
        let mut profiled = ProfiledEngine::new(ScalarEngine::new(16, 12).unwrap());
        assert_eq!(
            plain.advance(grid.clone(), 3).unwrap(),
            profiled.advance(grid, 3).unwrap()
        );
    }
}
