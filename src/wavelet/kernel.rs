//! Single Gabor wavelet in frequency domain, stored sparsely.
//!
//! The analytic kernel function is evaluated on every discrete frequency
//! bin of the target resolution; bins whose magnitude stays below the
//! sparsification threshold are dropped. Surviving bins are stored in
//! FFT-shifted (wrapped) coordinates, so applying the kernel is a sparse
//! elementwise multiply over the support instead of a full-image pass.

use std::f64::consts::PI;

use nalgebra::Vector2;
use ndarray::{Array2, ArrayView2, ArrayViewMut2};
use rustfft::num_complex::Complex64;

use crate::error::{shape_mismatch, Result};

/// Default magnitude below which a frequency bin is considered zero.
pub const DEFAULT_KERNEL_EPSILON: f64 = 1e-10;

/// Per-weight tolerance used by kernel equality.
const WEIGHT_TOLERANCE: f64 = 1e-8;

/// Sparse frequency-domain Gabor wavelet for one fixed resolution.
///
/// Immutable after construction; the support is kept as parallel coordinate
/// and weight arrays in deterministic generation order.
#[derive(Clone, Debug)]
pub struct GaborKernel {
    height: usize,
    width: usize,
    coords: Vec<(usize, usize)>,
    weights: Vec<f64>,
}

impl GaborKernel {
    /// Generates the kernel for `resolution = (height, width)` centered at
    /// the frequency vector `k` (`k.x` horizontal, `k.y` vertical).
    ///
    /// The kernel value at frequency `ω` is
    /// `exp(-σ²·|ω-k|²/(2|k|²)) · |k|^pow_of_k`, with an additional
    /// `-exp(-σ²·(|ω|²+|k|²)/(2|k|²))` term when `dc_free` suppresses the
    /// zero-frequency response. Bins with `|value| > epsilon` survive and
    /// are stored at the wrapped coordinate `((y+H)%H, (x+W)%W)`.
    pub fn new(
        resolution: (usize, usize),
        k: Vector2<f64>,
        sigma: f64,
        pow_of_k: f64,
        dc_free: bool,
        epsilon: f64,
    ) -> Self {
        let (height, width) = resolution;
        let mut coords = Vec::new();
        let mut weights = Vec::new();

        let start_y = -(height as i64) / 2;
        let end_y = height as i64 / 2 + height as i64 % 2;
        let start_x = -(width as i64) / 2;
        let end_x = width as i64 / 2 + width as i64 % 2;

        let k_y_factor = 2.0 * PI / height as f64;
        let k_x_factor = 2.0 * PI / width as f64;

        let sigma_square = sigma * sigma;
        let k_square = k.x * k.x + k.y * k.y;

        for y in start_y..end_y {
            let omega_y = y as f64 * k_y_factor;
            for x in start_x..end_x {
                let omega_x = x as f64 * k_x_factor;

                let omega_minus_k_squared =
                    (omega_x - k.x).powi(2) + (omega_y - k.y).powi(2);
                let mut value =
                    (-sigma_square * omega_minus_k_squared / (2.0 * k_square)).exp();
                value *= k_square.powf(pow_of_k / 2.0);

                if dc_free {
                    let omega_square = omega_x * omega_x + omega_y * omega_y;
                    value -=
                        (-sigma_square * (omega_square + k_square) / (2.0 * k_square)).exp();
                }

                if value.abs() > epsilon {
                    coords.push((
                        ((y + height as i64) % height as i64) as usize,
                        ((x + width as i64) % width as i64) as usize,
                    ));
                    weights.push(value);
                }
            }
        }

        Self {
            height,
            width,
            coords,
            weights,
        }
    }

    /// Target resolution `(height, width)` the kernel was generated for.
    pub fn resolution(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Number of frequency bins in the sparse support.
    pub fn support_len(&self) -> usize {
        self.coords.len()
    }

    /// Applies the kernel to a frequency-domain image.
    ///
    /// Zero-fills `out`, then writes `freq[c] * weight` for every support
    /// bin; `O(support)` rather than `O(H·W)`.
    pub fn transform(
        &self,
        frequency_image: ArrayView2<'_, Complex64>,
        mut out: ArrayViewMut2<'_, Complex64>,
    ) -> Result<()> {
        if frequency_image.dim() != (self.height, self.width) {
            return Err(shape_mismatch(
                &[self.height, self.width],
                &[frequency_image.dim().0, frequency_image.dim().1],
            ));
        }
        if out.dim() != frequency_image.dim() {
            return Err(shape_mismatch(
                &[frequency_image.dim().0, frequency_image.dim().1],
                &[out.dim().0, out.dim().1],
            ));
        }

        out.fill(Complex64::default());
        for (&(y, x), &weight) in self.coords.iter().zip(&self.weights) {
            out[(y, x)] = frequency_image[(y, x)] * weight;
        }
        Ok(())
    }

    /// Dense image of the kernel, for inspection and testing.
    pub fn kernel_image(&self) -> Array2<f64> {
        let mut image = Array2::zeros((self.height, self.width));
        for (&(y, x), &weight) in self.coords.iter().zip(&self.weights) {
            image[(y, x)] = weight;
        }
        image
    }
}

impl PartialEq for GaborKernel {
    fn eq(&self, other: &Self) -> bool {
        if self.height != other.height
            || self.width != other.width
            || self.coords.len() != other.coords.len()
        {
            return false;
        }
        self.coords == other.coords
            && self
                .weights
                .iter()
                .zip(&other.weights)
                .all(|(a, b)| (a - b).abs() <= WEIGHT_TOLERANCE)
    }
}
