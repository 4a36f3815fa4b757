//! Similarity functions on Gabor jets.
//!
//! A closed set of variants; the disparity-based ones carry a
//! `DisparityEstimator` and therefore take `&mut self`. All variants
//! return 1 for identical normalized jets.

use std::fs;
use std::path::Path;

use log::debug;
use nalgebra::Vector2;
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{shape_mismatch, GaborError, Result};
use crate::phase::wrap_phase;
use crate::wavelet::{GaborWaveletTransform, GwtParams};

use super::disparity::DisparityEstimator;

/// Denominator floor for the Canberra term; a coefficient whose magnitudes
/// both vanish contributes the limit value 1.
const CANBERRA_EPSILON: f64 = 1e-12;

/// Similarity function over Gabor jets.
///
/// `ScalarProduct` and `Canberra` operate on magnitudes alone; the other
/// variants need phases and a kernel-frequency table taken from the
/// transform the jets were extracted with.
#[derive(Clone, Debug)]
pub enum GaborJetSimilarity {
    ScalarProduct,
    Canberra,
    Disparity(DisparityEstimator),
    PhaseDiff(DisparityEstimator),
    PhaseDiffPlusCanberra(DisparityEstimator),
}

impl GaborJetSimilarity {
    pub fn scalar_product() -> Self {
        Self::ScalarProduct
    }

    pub fn canberra() -> Self {
        Self::Canberra
    }

    pub fn disparity(gwt: &GaborWaveletTransform) -> Self {
        Self::Disparity(DisparityEstimator::new(gwt))
    }

    pub fn phase_diff(gwt: &GaborWaveletTransform) -> Self {
        Self::PhaseDiff(DisparityEstimator::new(gwt))
    }

    pub fn phase_diff_plus_canberra(gwt: &GaborWaveletTransform) -> Self {
        Self::PhaseDiffPlusCanberra(DisparityEstimator::new(gwt))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ScalarProduct => "ScalarProduct",
            Self::Canberra => "Canberra",
            Self::Disparity(_) => "Disparity",
            Self::PhaseDiff(_) => "PhaseDiff",
            Self::PhaseDiffPlusCanberra(_) => "PhaseDiffPlusCanberra",
        }
    }

    /// Similarity of two magnitude-only jets.
    ///
    /// Disparity-based variants fail with `PhasesRequired`.
    pub fn similarity_abs(
        &self,
        jet1: ArrayView1<'_, f64>,
        jet2: ArrayView1<'_, f64>,
    ) -> Result<f64> {
        if jet1.len() != jet2.len() {
            return Err(shape_mismatch(&[jet1.len()], &[jet2.len()]));
        }
        match self {
            Self::ScalarProduct => Ok(jet1.dot(&jet2)),
            Self::Canberra => Ok(canberra(jet1, jet2)),
            _ => Err(GaborError::PhasesRequired),
        }
    }

    /// Similarity of two `(2, kernels)` jets with phases.
    pub fn similarity(
        &mut self,
        jet1: ArrayView2<'_, f64>,
        jet2: ArrayView2<'_, f64>,
    ) -> Result<f64> {
        if jet1.shape() != jet2.shape() {
            return Err(shape_mismatch(jet1.shape(), jet2.shape()));
        }
        match self {
            Self::ScalarProduct | Self::Canberra => {
                self.similarity_abs(jet1.row(0), jet2.row(0))
            }
            Self::Disparity(estimator) => {
                estimator.estimate(jet1, jet2)?;
                let d = estimator.disparity();
                let mut sum = 0.0;
                for (j, k) in estimator.frequencies().iter().enumerate() {
                    let shifted = estimator.phase_differences()[j] - d.x * k.x - d.y * k.y;
                    sum += estimator.confidences()[j] * shifted.cos();
                }
                Ok(sum)
            }
            Self::PhaseDiff(estimator) => {
                estimator.estimate(jet1, jet2)?;
                let d = estimator.disparity();
                let mut sum = 0.0;
                for (j, k) in estimator.frequencies().iter().enumerate() {
                    let shifted = estimator.phase_differences()[j] - d.x * k.x - d.y * k.y;
                    sum += shifted.cos();
                }
                Ok(sum / estimator.number_of_kernels() as f64)
            }
            Self::PhaseDiffPlusCanberra(estimator) => {
                estimator.estimate(jet1, jet2)?;
                let d = estimator.disparity();
                let mut sum = 0.0;
                for (j, k) in estimator.frequencies().iter().enumerate() {
                    let shifted = estimator.phase_differences()[j] - d.x * k.x - d.y * k.y;
                    sum += shifted.cos();
                    sum += canberra_term(jet1[(0, j)], jet2[(0, j)]);
                }
                Ok(sum / (2.0 * estimator.number_of_kernels() as f64))
            }
        }
    }

    /// Displacement computed by the most recent disparity-based call.
    pub fn last_disparity(&self) -> Option<Vector2<f64>> {
        match self {
            Self::Disparity(e) | Self::PhaseDiff(e) | Self::PhaseDiffPlusCanberra(e) => {
                Some(e.disparity())
            }
            _ => None,
        }
    }

    /// Shifts the phases of `jet` towards `reference` by the estimated
    /// disparity; magnitudes are copied unchanged.
    pub fn shift_phase(
        &mut self,
        jet: ArrayView2<'_, f64>,
        reference: ArrayView2<'_, f64>,
        shifted: &mut Array2<f64>,
    ) -> Result<()> {
        let estimator = match self {
            Self::Disparity(e) | Self::PhaseDiff(e) | Self::PhaseDiffPlusCanberra(e) => e,
            _ => {
                return Err(GaborError::InvalidConfiguration(
                    "phase shifting requires a disparity-based similarity".into(),
                ))
            }
        };
        if shifted.shape() != jet.shape() {
            return Err(shape_mismatch(jet.shape(), shifted.shape()));
        }
        estimator.estimate(jet, reference)?;
        let d = estimator.disparity();

        shifted.assign(&jet);
        for (j, k) in estimator.frequencies().iter().enumerate() {
            shifted[(1, j)] = wrap_phase(jet[(1, j)] - d.x * k.x - d.y * k.y);
        }
        Ok(())
    }

    /// Persists the variant tag and, for disparity-based variants, the
    /// wavelet-family parameters the frequency table derives from.
    pub fn save(&self, path: &Path) -> Result<()> {
        debug!("similarity: saving {} to {}", self.name(), path.display());
        let file = SimilarityFile {
            kind: self.name().to_string(),
            transform: match self {
                Self::Disparity(e) | Self::PhaseDiff(e) | Self::PhaseDiffPlusCanberra(e) => {
                    Some(e.params().clone())
                }
                _ => None,
            },
        };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file: SimilarityFile = serde_json::from_str(&fs::read_to_string(path)?)?;
        match file.kind.as_str() {
            "ScalarProduct" => Ok(Self::ScalarProduct),
            "Canberra" => Ok(Self::Canberra),
            kind @ ("Disparity" | "PhaseDiff" | "PhaseDiffPlusCanberra") => {
                let params = file.transform.ok_or_else(|| {
                    GaborError::InvalidConfiguration(format!(
                        "{kind} similarity needs a GaborWaveletTransform section"
                    ))
                })?;
                let gwt = GaborWaveletTransform::new(params)?;
                Ok(match kind {
                    "Disparity" => Self::disparity(&gwt),
                    "PhaseDiff" => Self::phase_diff(&gwt),
                    _ => Self::phase_diff_plus_canberra(&gwt),
                })
            }
            other => Err(GaborError::InvalidConfiguration(format!(
                "unknown similarity type {other:?}"
            ))),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SimilarityFile {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(
        rename = "GaborWaveletTransform",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    transform: Option<GwtParams>,
}

fn canberra_term(a: f64, b: f64) -> f64 {
    let denom = a + b;
    if denom > CANBERRA_EPSILON {
        1.0 - (a - b).abs() / denom
    } else {
        1.0
    }
}

fn canberra(jet1: ArrayView1<'_, f64>, jet2: ArrayView1<'_, f64>) -> f64 {
    let sum: f64 = jet1
        .iter()
        .zip(jet2.iter())
        .map(|(&a, &b)| canberra_term(a, b))
        .sum();
    sum / jet1.len() as f64
}
