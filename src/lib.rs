//! Gabor wavelet transform, Gabor jets and elastic-graph comparison.
//!
//! The crate implements the feature-extraction core of a face-biometrics
//! pipeline: a family of frequency-domain Gabor wavelets is applied to an
//! image via FFT/sparse multiply/IFFT, producing a jet image: one vector
//! of filter responses (magnitudes, optionally phases) per pixel. Jets are
//! sampled at graph node positions and compared with one of several
//! similarity functions, including a disparity estimator that recovers the
//! sub-pixel displacement between two jets from their phase differences.
//!
//! ```no_run
//! use gabor_graph::prelude::*;
//! use ndarray::{Array3, Array4};
//!
//! # fn main() -> gabor_graph::Result<()> {
//! let gray = vec![0u8; 128 * 128];
//! let image = gabor_graph::image::gray_to_complex(&gray, 128, 128)?;
//!
//! let mut gwt = GaborWaveletTransform::default();
//! let mut jets = Array4::zeros((128, 128, 2, gwt.number_of_kernels()));
//! gwt.compute_jet_image(image.view(), &mut jets, true)?;
//!
//! let machine = GaborGraphMachine::with_grid([8, 8], [120, 120], [8, 8])?;
//! let mut graph = Array3::zeros((machine.number_of_nodes(), 2, gwt.number_of_kernels()));
//! machine.extract(jets.view(), &mut graph)?;
//!
//! let mut sim = GaborJetSimilarity::disparity(&gwt);
//! let score = machine.similarity(graph.view(), graph.view(), &mut sim)?;
//! println!("self similarity: {score:.3}");
//! # Ok(())
//! # }
//! ```

// Public modules (stable-ish surface)
pub mod error;
pub mod graph;
pub mod image;
pub mod jets;
pub mod wavelet;

// Lower-level building blocks, public for tools and tests.
pub mod fft;
pub mod phase;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{GaborError, Result};
pub use crate::graph::GaborGraphMachine;
pub use crate::jets::{DisparityEstimator, GaborJetSimilarity};
pub use crate::wavelet::{GaborKernel, GaborWaveletTransform, GwtParams};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
pub mod prelude {
    pub use crate::graph::GaborGraphMachine;
    pub use crate::jets::GaborJetSimilarity;
    pub use crate::wavelet::{GaborWaveletTransform, GwtParams};
}
