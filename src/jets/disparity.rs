//! Disparity estimation from the phase differences of two Gabor jets.
//!
//! The estimator solves the 2×2 system `Γ·d = Φ` built from per-kernel
//! phase differences weighted by confidence (the product of the two jets'
//! magnitudes) and by the kernel frequency vector. Scales are folded in
//! from the lowest frequency upwards; after each scale the system is
//! re-solved and the refined estimate unwraps the phase cycles of the next,
//! higher-frequency scale.

use nalgebra::Vector2;
use ndarray::ArrayView2;

use crate::error::{shape_mismatch, Result};
use crate::phase::{cycles_off, wrap_phase};
use crate::wavelet::{GaborWaveletTransform, GwtParams};

use std::f64::consts::PI;

/// Determinant magnitude below which the system is treated as singular and
/// the estimate from the previous scales is kept.
const MIN_DETERMINANT: f64 = 1e-12;

/// Iterative phase-unwrapping disparity estimator.
///
/// Holds a copy of the owning transform's kernel-frequency table; the table
/// must match the jets' kernel ordering exactly.
#[derive(Clone, Debug)]
pub struct DisparityEstimator {
    params: GwtParams,
    frequencies: Vec<Vector2<f64>>,
    confidences: Vec<f64>,
    phase_differences: Vec<f64>,
    disparity: Vector2<f64>,
}

impl DisparityEstimator {
    pub fn new(gwt: &GaborWaveletTransform) -> Self {
        let count = gwt.number_of_kernels();
        Self {
            params: gwt.params().clone(),
            frequencies: gwt.kernel_frequencies().to_vec(),
            confidences: vec![0.0; count],
            phase_differences: vec![0.0; count],
            disparity: Vector2::zeros(),
        }
    }

    /// Parameters of the wavelet family the frequency table derives from.
    pub fn params(&self) -> &GwtParams {
        &self.params
    }

    pub fn number_of_kernels(&self) -> usize {
        self.frequencies.len()
    }

    /// Kernel frequencies the estimator was built for.
    pub fn frequencies(&self) -> &[Vector2<f64>] {
        &self.frequencies
    }

    /// The displacement computed by the last `estimate` call.
    pub fn disparity(&self) -> Vector2<f64> {
        self.disparity
    }

    pub(crate) fn confidences(&self) -> &[f64] {
        &self.confidences
    }

    pub(crate) fn phase_differences(&self) -> &[f64] {
        &self.phase_differences
    }

    pub(crate) fn check_jet(&self, jet: ArrayView2<'_, f64>) -> Result<()> {
        let expected = [2, self.frequencies.len()];
        if jet.shape() != expected {
            return Err(shape_mismatch(&expected, jet.shape()));
        }
        Ok(())
    }

    /// Estimates the spatial displacement of `jet` relative to `reference`.
    pub fn estimate(
        &mut self,
        jet: ArrayView2<'_, f64>,
        reference: ArrayView2<'_, f64>,
    ) -> Result<Vector2<f64>> {
        self.check_jet(jet)?;
        self.check_jet(reference)?;

        for j in 0..self.frequencies.len() {
            self.confidences[j] = jet[(0, j)] * reference[(0, j)];
            self.phase_differences[j] = wrap_phase(jet[(1, j)] - reference[(1, j)]);
        }
        self.solve();
        Ok(self.disparity)
    }

    fn solve(&mut self) {
        let mut gamma_xx = 0.0;
        let mut gamma_xy = 0.0;
        let mut gamma_yy = 0.0;
        let mut phi_x = 0.0;
        let mut phi_y = 0.0;

        self.disparity = Vector2::zeros();

        // lowest-frequency scale first; its estimate unwraps the next scale
        let mut j = self.frequencies.len();
        for _scale in 0..self.params.scales {
            for _direction in 0..self.params.directions {
                j -= 1;
                let k = self.frequencies[j];
                let conf = self.confidences[j];
                let diff = self.phase_differences[j];

                gamma_xx += k.x * k.x * conf;
                gamma_xy += k.x * k.y * conf;
                gamma_yy += k.y * k.y * conf;

                let shift = self.disparity.x * k.x + self.disparity.y * k.y;
                let corrected = diff - cycles_off(diff, shift) * 2.0 * PI;
                phi_x += corrected * conf * k.x;
                phi_y += corrected * conf * k.y;
            }

            let det = gamma_xx * gamma_yy - gamma_xy * gamma_xy;
            if det.abs() > MIN_DETERMINANT {
                self.disparity.x = (gamma_yy * phi_x - gamma_xy * phi_y) / det;
                self.disparity.y = (gamma_xx * phi_y - gamma_xy * phi_x) / det;
            }
        }
    }
}
