use super::{
    check_engine_dimensions, check_step_shapes, next_state, Backend, StepEngine,
    NEIGHBOUR_OFFSETS,
};
use crate::{GridState, Result};

/// Counts neighbours by adding eight rolled copies of the field into a scratch plane.
///
/// Every roll is a pair of contiguous slice additions per row, which the compiler
/// turns into wide vector adds.
pub struct VectorizedEngine {
    width: usize,
    height: usize,
    neighbours: Vec<u8>,
}

impl VectorizedEngine {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        check_engine_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            neighbours: vec![0; width * height],
        })
    }

    /// `neighbours += roll(cells, dy, dx)`, with `roll` wrapping both axes:
    /// `out[y][x] = cells[(y - dy) mod h][(x - dx) mod w]`.
    fn add_rolled(&mut self, cells: &[u8], dy: isize, dx: isize) {
        let (w, h) = (self.width, self.height);
        let dx = dx.rem_euclid(w as isize) as usize;
        for (y, dst) in self.neighbours.chunks_exact_mut(w).enumerate() {
            let y_src = (y as isize - dy).rem_euclid(h as isize) as usize;
            let src = &cells[y_src * w..(y_src + 1) * w];
            let (dst_head, dst_tail) = dst.split_at_mut(dx);
            for (d, s) in dst_tail.iter_mut().zip(&src[..w - dx]) {
                *d += s;
            }
            for (d, s) in dst_head.iter_mut().zip(&src[w - dx..]) {
                *d += s;
            }
        }
    }
}

impl StepEngine for VectorizedEngine {
    fn backend(&self) -> Backend {
        Backend::Vectorized
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn step_into(&mut self, src: &GridState, dst: &mut GridState) -> Result<()> {
        check_step_shapes(self.dimensions(), src, dst)?;
        self.neighbours.fill(0);
        for (dy, dx) in NEIGHBOUR_OFFSETS {
            self.add_rolled(src.cells(), dy, dx);
        }
        for ((next, &curr), &n) in dst
            .cells_mut()
            .iter_mut()
            .zip(src.cells())
            .zip(&self.neighbours)
        {
            *next = next_state(curr, n);
        }
        dst.set_generation(src.generation() + 1);
        Ok(())
    }
}
