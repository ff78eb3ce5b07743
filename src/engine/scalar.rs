use super::{check_engine_dimensions, check_step_shapes, next_state, Backend, StepEngine};
use crate::{GridState, Result};

/// Reference engine: counts the eight neighbours of every cell one by one.
pub struct ScalarEngine {
    width: usize,
    height: usize,
}

impl ScalarEngine {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        check_engine_dimensions(width, height)?;
        Ok(Self { width, height })
    }

    fn count_neibs(&self, cells: &[u8], x: usize, y: usize) -> u8 {
        let x1 = if x == 0 { self.width - 1 } else { x - 1 };
        let x2 = if x == self.width - 1 { 0 } else { x + 1 };
        let y1 = if y == 0 { self.height - 1 } else { y - 1 };
        let y2 = if y == self.height - 1 { 0 } else { y + 1 };
        let get = |x: usize, y: usize| cells[x + y * self.width];
        get(x1, y1)
            + get(x, y1)
            + get(x2, y1)
            + get(x1, y)
            + get(x2, y)
            + get(x1, y2)
            + get(x, y2)
            + get(x2, y2)
    }
}

impl StepEngine for ScalarEngine {
    fn backend(&self) -> Backend {
        Backend::Scalar
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn step_into(&mut self, src: &GridState, dst: &mut GridState) -> Result<()> {
        check_step_shapes(self.dimensions(), src, dst)?;
        let cells_curr = src.cells();
        let cells_next = dst.cells_mut();
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = x + y * self.width;
                let neibs = self.count_neibs(cells_curr, x, y);
                cells_next[idx] = next_state(cells_curr[idx], neibs);
            }
        }
        dst.set_generation(src.generation() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbours_on_tiny_fields() {
        // on a 1x1 torus every neighbour is the cell itself
        let engine = ScalarEngine::new(1, 1).unwrap();
        assert_eq!(engine.count_neibs(&[1], 0, 0), 8);

        let engine = ScalarEngine::new(2, 1).unwrap();
        assert_eq!(engine.count_neibs(&[0, 1], 0, 0), 6);
        assert_eq!(engine.count_neibs(&[0, 1], 1, 0), 2);
    }

    #[test]
    fn test_step_advances_generation() {
        let mut engine = ScalarEngine::new(4, 4).unwrap();
        let grid = GridState::blank(4, 4).unwrap();
        let next = engine.step(&grid).unwrap();
        assert_eq!(next.generation(), 1);
        assert_eq!(next.population(), 0);
        assert_eq!(grid.generation(), 0);
    }
}
