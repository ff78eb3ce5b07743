use crate::{engine, Backend, GridState, Result, StepEngine};

/// Policy knobs of [`SimulationDriver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriverConfig {
    /// Fields with more cells than this are simulated without recording history.
    pub history_cell_limit: usize,
}

impl DriverConfig {
    /// 100 x 100 cells.
    pub const DEFAULT_HISTORY_CELL_LIMIT: usize = 100 * 100;
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            history_cell_limit: Self::DEFAULT_HISTORY_CELL_LIMIT,
        }
    }
}

/// Result of [`SimulationDriver::run`].
#[derive(Clone, Debug)]
pub struct SimulationOutput {
    pub final_grid: GridState,
    /// Pre-step frames in chronological order: `history[0]` is the initial field and
    /// `history.len() == steps`. Empty unless recording was requested and allowed.
    pub history: Vec<GridState>,
}

/// Per-cell count of how many pre-step frames had the cell alive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliveCounts {
    width: usize,
    height: usize,
    counts: Vec<u32>,
}

impl AliveCounts {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            counts: vec![0; width * height],
        }
    }

    fn accumulate(&mut self, grid: &GridState) {
        for (count, &cell) in self.counts.iter_mut().zip(grid.cells()) {
            *count += cell as u32;
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.counts[x + y * self.width]
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Advances fields with one bound engine.
pub struct SimulationDriver<E = Box<dyn StepEngine>> {
    engine: E,
    config: DriverConfig,
}

impl SimulationDriver {
    /// Builds the engine for `backend` sized for `width x height` fields.
    pub fn for_backend(
        backend: Backend,
        width: usize,
        height: usize,
        config: DriverConfig,
    ) -> Result<Self> {
        Ok(Self::new(engine::create(backend, width, height)?, config))
    }
}

impl<E: StepEngine> SimulationDriver<E> {
    pub fn new(engine: E, config: DriverConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    pub fn config(&self) -> DriverConfig {
        self.config
    }

    /// Applies the engine `steps` times.
    ///
    /// With `record_history`, a snapshot is taken before each step. Recording is
    /// silently skipped (empty history) for fields above `history_cell_limit`.
    pub fn run(
        &mut self,
        grid: GridState,
        steps: usize,
        record_history: bool,
    ) -> Result<SimulationOutput> {
        let (w, h) = grid.dimensions();
        let record = record_history && self.history_allowed(&grid);
        if !record {
            let final_grid = self.engine.advance(grid, steps)?;
            return Ok(SimulationOutput {
                final_grid,
                history: Vec::new(),
            });
        }

        let mut history = Vec::with_capacity(steps);
        let mut curr = grid;
        let mut next = GridState::blank(w, h)?;
        for _ in 0..steps {
            history.push(curr.snapshot());
            self.engine.step_into(&curr, &mut next)?;
            std::mem::swap(&mut curr, &mut next);
        }
        Ok(SimulationOutput {
            final_grid: curr,
            history,
        })
    }

    /// Like `run` without history, also counting alive frames per cell.
    pub fn run_with_counts(
        &mut self,
        grid: GridState,
        steps: usize,
    ) -> Result<(GridState, AliveCounts)> {
        let (w, h) = grid.dimensions();
        let mut counts = AliveCounts::new(w, h);
        let mut curr = grid;
        let mut next = GridState::blank(w, h)?;
        for _ in 0..steps {
            counts.accumulate(&curr);
            self.engine.step_into(&curr, &mut next)?;
            std::mem::swap(&mut curr, &mut next);
        }
        Ok((curr, counts))
    }

    /// Waits for the engine's queued work; call before reading a clock.
    pub fn synchronize(&mut self) -> Result<()> {
        self.engine.synchronize()
    }

    fn history_allowed(&self, grid: &GridState) -> bool {
        let cells = grid.cells().len();
        if cells > self.config.history_cell_limit {
            tracing::warn!(
                cells,
                limit = self.config.history_cell_limit,
                "field too large, history will not be recorded"
            );
            return false;
        }
        true
    }
}
