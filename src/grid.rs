use crate::{LifeError, Result};
use std::fmt;

/// Dense row-major toroidal field of `0`/`1` cells.
///
/// A grid is never mutated by an engine: each step produces a new grid (or fills a
/// caller-supplied one), so any clone handed out earlier stays intact.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GridState {
    cells: Vec<u8>,
    width: usize,
    height: usize,
    generation: u64,
}

impl GridState {
    /// Creates a field filled with dead cells.
    pub fn blank(width: usize, height: usize) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            cells: vec![0; width * height],
            width,
            height,
            generation: 0,
        })
    }

    /// Creates a field where every cell is alive with probability `fill_probability`.
    ///
    /// `seed` - random seed (if `None`, then random seed is generated)
    pub fn create(
        width: usize,
        height: usize,
        fill_probability: f64,
        seed: Option<u64>,
    ) -> Result<Self> {
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha8Rng;

        if !(0.0..=1.0).contains(&fill_probability) {
            return Err(LifeError::Configuration(format!(
                "fill probability must lie in [0, 1], got {}",
                fill_probability
            )));
        }
        let mut result = Self::blank(width, height)?;
        let mut rng = if let Some(x) = seed {
            ChaCha8Rng::seed_from_u64(x)
        } else {
            ChaCha8Rng::from_entropy()
        };
        for cell in result.cells.iter_mut() {
            *cell = rng.gen_bool(fill_probability) as u8;
        }
        Ok(result)
    }

    /// Builds a field from literal rows, e.g. `[[0, 1, 0], [0, 1, 0]]`.
    pub fn from_pattern<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().len());
        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(LifeError::Shape(format!(
                    "pattern row {} has {} cells, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }
            cells.extend_from_slice(row);
        }
        Self::from_cells(width, height, cells)
    }

    /// Wraps an existing row-major buffer.
    pub fn from_cells(width: usize, height: usize, cells: Vec<u8>) -> Result<Self> {
        check_dimensions(width, height)?;
        if cells.len() != width * height {
            return Err(LifeError::Shape(format!(
                "buffer of {} cells does not fit a {}x{} grid",
                cells.len(),
                width,
                height
            )));
        }
        if let Some(i) = cells.iter().position(|&c| c > 1) {
            return Err(LifeError::Configuration(format!(
                "cell ({}, {}) holds {}, only 0 and 1 are allowed",
                i % width,
                i / width,
                cells[i]
            )));
        }
        Ok(Self {
            cells,
            width,
            height,
            generation: 0,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)` of the field
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Number of generations applied since the initial state.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Cell value with toroidal wrap; negative coordinates count from the far edge.
    pub fn at(&self, x: isize, y: isize) -> u8 {
        let x = x.rem_euclid(self.width as isize) as usize;
        let y = y.rem_euclid(self.height as isize) as usize;
        self.cells[x + y * self.width]
    }

    /// Cell value at in-range coordinates.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[x + y * self.width]
    }

    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        self.cells[x + y * self.width] = alive as u8;
    }

    /// Total number of alive cells in the field.
    pub fn population(&self) -> usize {
        self.cells.iter().map(|&c| c as usize).sum()
    }

    /// Deep copy for history recording; later steps never touch it.
    pub fn snapshot(&self) -> GridState {
        self.clone()
    }

    /// Same cells and dimensions, generation counter ignored.
    pub fn same_cells(&self, other: &GridState) -> bool {
        self.dimensions() == other.dimensions() && self.cells == other.cells
    }
}

impl fmt::Display for GridState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks_exact(self.width) {
            for &c in row {
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn check_dimensions(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(LifeError::Configuration(format!(
            "grid dimensions must be positive, got {}x{}",
            width, height
        )));
    }
    Ok(())
}
