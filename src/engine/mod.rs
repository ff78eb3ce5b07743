mod accelerated;
mod profiled;
mod scalar;
mod vectorized;

pub use accelerated::{adapter_name, AcceleratedEngine};
pub use profiled::{ProfiledEngine, StepProfile};
pub use scalar::ScalarEngine;
pub use vectorized::VectorizedEngine;

use crate::{GridState, LifeError, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Interchangeable strategies for computing one generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Per-cell loops with explicit wraparound; the reference implementation.
    Scalar,
    /// Sum of eight toroidally rolled copies of the field.
    Vectorized,
    /// Same stencil as `Vectorized`, run as a wgpu compute shader.
    Accelerated,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Scalar, Backend::Vectorized, Backend::Accelerated];

    /// Name that is used in benchmark records
    pub fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Vectorized => "vectorized",
            Backend::Accelerated => "accelerated",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = LifeError;

    fn from_str(s: &str) -> Result<Self> {
        Backend::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LifeError::Configuration(format!("unknown backend `{}`", s)))
    }
}

/// Offsets `(dy, dx)` of the eight neighbours.
pub(crate) const NEIGHBOUR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Conway's rule: birth on 3, survival on 2 or 3.
#[inline]
pub(crate) fn next_state(alive: u8, neighbours: u8) -> u8 {
    (neighbours == 3 || (alive == 1 && neighbours == 2)) as u8
}

/// Computes generation transitions for fields of one fixed size.
///
/// Engines hold no simulation data, only backend resources (scratch buffers, a
/// device context) sized for `dimensions()` and released on drop.
pub trait StepEngine {
    fn backend(&self) -> Backend;

    /// `(width, height)` of the fields this engine accepts.
    fn dimensions(&self) -> (usize, usize);

    /// Writes the generation following `src` into `dst`.
    ///
    /// Both grids must match `dimensions()`. `dst` never aliases `src`.
    fn step_into(&mut self, src: &GridState, dst: &mut GridState) -> Result<()>;

    /// Returns the generation following `grid` as a new field.
    fn step(&mut self, grid: &GridState) -> Result<GridState> {
        let (w, h) = grid.dimensions();
        let mut dst = GridState::blank(w, h)?;
        self.step_into(grid, &mut dst)?;
        Ok(dst)
    }

    /// Applies `steps` generations. Results are ready to read on return.
    fn advance(&mut self, grid: GridState, steps: usize) -> Result<GridState> {
        let (w, h) = grid.dimensions();
        let mut curr = grid;
        if steps == 0 {
            return Ok(curr);
        }
        let mut next = GridState::blank(w, h)?;
        for _ in 0..steps {
            self.step_into(&curr, &mut next)?;
            std::mem::swap(&mut curr, &mut next);
        }
        Ok(curr)
    }

    /// Blocks until all submitted work has completed.
    fn synchronize(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<E: StepEngine + ?Sized> StepEngine for Box<E> {
    fn backend(&self) -> Backend {
        (**self).backend()
    }

    fn dimensions(&self) -> (usize, usize) {
        (**self).dimensions()
    }

    fn step_into(&mut self, src: &GridState, dst: &mut GridState) -> Result<()> {
        (**self).step_into(src, dst)
    }

    fn step(&mut self, grid: &GridState) -> Result<GridState> {
        (**self).step(grid)
    }

    fn advance(&mut self, grid: GridState, steps: usize) -> Result<GridState> {
        (**self).advance(grid, steps)
    }

    fn synchronize(&mut self) -> Result<()> {
        (**self).synchronize()
    }
}

/// Constructs the engine for `backend`, sized for `width x height` fields.
pub fn create(backend: Backend, width: usize, height: usize) -> Result<Box<dyn StepEngine>> {
    Ok(match backend {
        Backend::Scalar => Box::new(ScalarEngine::new(width, height)?),
        Backend::Vectorized => Box::new(VectorizedEngine::new(width, height)?),
        Backend::Accelerated => Box::new(AcceleratedEngine::new(width, height)?),
    })
}

pub(crate) fn check_engine_dimensions(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(LifeError::Configuration(format!(
            "engine dimensions must be positive, got {}x{}",
            width, height
        )));
    }
    Ok(())
}

/// Verifies that `src` and `dst` both have the engine's dimensions.
pub(crate) fn check_step_shapes(
    expected: (usize, usize),
    src: &GridState,
    dst: &GridState,
) -> Result<()> {
    for (role, grid) in [("input", src), ("output", dst)] {
        if grid.dimensions() != expected {
            return Err(LifeError::Shape(format!(
                "{} grid is {}x{}, engine buffers are {}x{}",
                role,
                grid.width(),
                grid.height(),
                expected.0,
                expected.1
            )));
        }
    }
    Ok(())
}
