//! 2D FFT/IFFT adapter over `rustfft`.
//!
//! The transform works row-wise, transposes, works column-wise and
//! transposes back. Plans and the transpose scratch buffer are cached per
//! shape; `set_shape` is a no-op when the shape is unchanged, so the owner
//! can call it on every frame. The inverse pass carries the `1/(H·W)`
//! normalization, making `inverse(forward(x))` round-trip to `x`.

use std::sync::Arc;

use ndarray::{ArrayView2, ArrayViewMut2};
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

struct Plans {
    height: usize,
    width: usize,
    row_forward: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

/// Forward and inverse 2D Fourier transform with cached plans.
pub struct Fft2d {
    planner: FftPlanner<f64>,
    plans: Option<Plans>,
    transposed: Vec<Complex64>,
}

impl Fft2d {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            plans: None,
            transposed: Vec::new(),
        }
    }

    /// Currently configured shape, `(0, 0)` before the first `set_shape`.
    pub fn shape(&self) -> (usize, usize) {
        self.plans
            .as_ref()
            .map_or((0, 0), |p| (p.height, p.width))
    }

    /// (Re)plans for the given shape. Cache hit when the shape is unchanged.
    pub fn set_shape(&mut self, height: usize, width: usize) {
        if self.shape() == (height, width) {
            return;
        }
        self.plans = Some(Plans {
            height,
            width,
            row_forward: self.planner.plan_fft_forward(width),
            col_forward: self.planner.plan_fft_forward(height),
            row_inverse: self.planner.plan_fft_inverse(width),
            col_inverse: self.planner.plan_fft_inverse(height),
        });
        self.transposed.resize(height * width, Complex64::default());
    }

    /// Forward transform of `src` into `dst`.
    pub fn forward(&mut self, src: ArrayView2<'_, Complex64>, dst: ArrayViewMut2<'_, Complex64>) {
        self.run(src, dst, false);
    }

    /// Inverse transform of `src` into `dst`, normalized by `1/(H·W)`.
    pub fn inverse(&mut self, src: ArrayView2<'_, Complex64>, dst: ArrayViewMut2<'_, Complex64>) {
        self.run(src, dst, true);
    }

    fn run(
        &mut self,
        src: ArrayView2<'_, Complex64>,
        mut dst: ArrayViewMut2<'_, Complex64>,
        inverse: bool,
    ) {
        let plans = self.plans.as_ref().expect("set_shape called before use");
        let (height, width) = (plans.height, plans.width);
        assert_eq!(src.dim(), (height, width), "input does not match plan shape");
        assert_eq!(dst.dim(), (height, width), "output does not match plan shape");

        dst.assign(&src);
        let data = dst
            .as_slice_mut()
            .expect("transform output must be contiguous");

        let (row_plan, col_plan) = if inverse {
            (&plans.row_inverse, &plans.col_inverse)
        } else {
            (&plans.row_forward, &plans.col_forward)
        };

        for row in data.chunks_exact_mut(width) {
            row_plan.process(row);
        }

        for y in 0..height {
            for x in 0..width {
                self.transposed[x * height + y] = data[y * width + x];
            }
        }
        for col in self.transposed.chunks_exact_mut(height) {
            col_plan.process(col);
        }

        let scale = if inverse {
            1.0 / (height * width) as f64
        } else {
            1.0
        };
        for y in 0..height {
            for x in 0..width {
                data[y * width + x] = self.transposed[x * height + y] * scale;
            }
        }
    }
}

impl Default for Fft2d {
    fn default() -> Self {
        Self::new()
    }
}
