//! Gabor jets: per-pixel response vectors and their comparison.
//!
//! A jet without phases is a 1D vector of kernel magnitudes; a jet with
//! phases is a `(2, kernels)` array whose row 0 holds magnitudes and row 1
//! holds phases. Jet images stack such jets over all pixels.

pub mod disparity;
pub mod similarity;

pub use disparity::DisparityEstimator;
pub use similarity::GaborJetSimilarity;

use ndarray::{ArrayViewMut1, ArrayViewMut2};

/// Norm floor protecting normalization of all-zero jets.
pub const MIN_JET_NORM: f64 = 1e-12;

/// Normalizes a magnitude-only jet to unit Euclidean length.
pub fn normalize_abs_jet(mut jet: ArrayViewMut1<'_, f64>) {
    let norm = jet.iter().map(|v| v * v).sum::<f64>().sqrt();
    let scale = 1.0 / norm.max(MIN_JET_NORM);
    jet.mapv_inplace(|v| v * scale);
}

/// Normalizes the magnitude row of a `(2, kernels)` jet; phases untouched.
pub fn normalize_jet(mut jet: ArrayViewMut2<'_, f64>) {
    normalize_abs_jet(jet.row_mut(0));
}
