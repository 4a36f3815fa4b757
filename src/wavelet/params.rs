//! Configuration of the Gabor wavelet family.
//!
//! The seven scalars below fully determine the wavelet family: kernel
//! frequencies and kernels are recomputed from them deterministically, so
//! persistence stores nothing else. The key names are part of the on-disk
//! format and must not change.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GaborError, Result};

/// Tolerance for comparing the floating-point parameters.
const PARAM_TOLERANCE: f64 = 1e-8;

/// Parameters of a Gabor wavelet family.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GwtParams {
    /// Width (standard deviation) of the Gaussian envelope.
    #[serde(rename = "Sigma")]
    pub sigma: f64,
    /// Power of `|k|` used as prefactor of the wavelet.
    #[serde(rename = "PowOfK")]
    pub pow_of_k: f64,
    /// Highest frequency to generate (at most π).
    #[serde(rename = "KMax")]
    pub k_max: f64,
    /// Logarithmic factor between two scales; below one.
    #[serde(rename = "KFac")]
    pub k_fac: f64,
    /// Suppress the zero-frequency response of each wavelet.
    #[serde(rename = "DCfree")]
    pub dc_free: bool,
    /// Number of scales (frequency levels).
    #[serde(rename = "NumberOfScales")]
    pub scales: u32,
    /// Number of directions (orientations) per scale.
    #[serde(rename = "NumberOfDirections")]
    pub directions: u32,
}

impl Default for GwtParams {
    fn default() -> Self {
        Self {
            sigma: 2.0 * PI,
            pow_of_k: 0.0,
            k_max: FRAC_PI_2,
            k_fac: FRAC_1_SQRT_2,
            dc_free: true,
            scales: 5,
            directions: 8,
        }
    }
}

impl GwtParams {
    /// Total number of kernels in the family.
    pub fn number_of_kernels(&self) -> usize {
        self.scales as usize * self.directions as usize
    }

    /// Rejects parameter sets that cannot produce a usable family.
    pub fn validate(&self) -> Result<()> {
        if self.scales == 0 || self.directions == 0 {
            return Err(GaborError::InvalidConfiguration(format!(
                "wavelet family is empty ({} scales, {} directions)",
                self.scales, self.directions
            )));
        }
        if self.sigma <= 0.0 {
            return Err(GaborError::InvalidConfiguration(format!(
                "sigma must be positive, got {}",
                self.sigma
            )));
        }
        if self.k_max <= 0.0 || self.k_fac <= 0.0 {
            return Err(GaborError::InvalidConfiguration(format!(
                "frequencies must be positive (k_max={}, k_fac={})",
                self.k_max, self.k_fac
            )));
        }
        Ok(())
    }

    /// Reads parameters from a JSON document.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let params: GwtParams = serde_json::from_str(&contents)?;
        params.validate()?;
        Ok(params)
    }

    /// Writes parameters as a JSON document.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl PartialEq for GwtParams {
    fn eq(&self, other: &Self) -> bool {
        (self.sigma - other.sigma).abs() <= PARAM_TOLERANCE
            && (self.pow_of_k - other.pow_of_k).abs() <= PARAM_TOLERANCE
            && (self.k_max - other.k_max).abs() <= PARAM_TOLERANCE
            && (self.k_fac - other.k_fac).abs() <= PARAM_TOLERANCE
            && self.dc_free == other.dc_free
            && self.scales == other.scales
            && self.directions == other.directions
    }
}
