//! Frequency-domain Gabor wavelets and the wavelet transform.

pub mod kernel;
pub mod params;
pub mod transform;

pub use kernel::{GaborKernel, DEFAULT_KERNEL_EPSILON};
pub use params::GwtParams;
pub use transform::GaborWaveletTransform;
