//! Error taxonomy shared by the transform, similarity and graph modules.
//!
//! All failures are synchronous and reported to the caller; no operation
//! retries or writes partial output after a failed precondition check.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GaborError {
    /// An output array does not match the shape derived from the inputs.
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// A parameter set that cannot produce a usable wavelet family.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A node position outside the image bounds.
    #[error("position ({y},{x}) is out of the bounds {height}x{width}")]
    IndexOutOfRange {
        y: i64,
        x: i64,
        height: usize,
        width: usize,
    },

    /// A kernel index outside the generated bank.
    #[error("kernel index {index} is out of bounds ({count} kernels)")]
    KernelIndexOutOfRange { index: usize, count: usize },

    #[error("similarity requires Gabor jets including phases")]
    PhasesRequired,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GaborError>;

/// Builds a `ShapeMismatch` from raw shape slices.
pub(crate) fn shape_mismatch(expected: &[usize], found: &[usize]) -> GaborError {
    GaborError::ShapeMismatch {
        expected: expected.to_vec(),
        found: found.to_vec(),
    }
}
