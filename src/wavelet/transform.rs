//! The Gabor wavelet transform: kernel bank, scratch planes and the
//! transform passes producing trafo images and jet images.
//!
//! The kernel bank is keyed by the resolution of the last image seen;
//! `generate_kernels` regenerates the bank and resizes the FFT plans and
//! scratch planes only on a resolution change. The scratch planes make the
//! transform single-owner: concurrent use requires one instance per thread
//! or external serialization.

use std::f64::consts::PI;
use std::path::Path;

use log::debug;
use nalgebra::Vector2;
use ndarray::{s, Array2, Array3, Array4, ArrayView2, Axis, Zip};
use rustfft::num_complex::Complex64;

use crate::error::{shape_mismatch, GaborError, Result};
use crate::fft::Fft2d;
use crate::jets::{normalize_abs_jet, normalize_jet};

use super::kernel::{GaborKernel, DEFAULT_KERNEL_EPSILON};
use super::params::GwtParams;

/// Gabor wavelet transform for a fixed family of wavelets.
pub struct GaborWaveletTransform {
    params: GwtParams,
    frequencies: Vec<Vector2<f64>>,
    kernels: Vec<GaborKernel>,
    fft: Fft2d,
    frequency_image: Array2<Complex64>,
    filtered: Array2<Complex64>,
    response: Array2<Complex64>,
}

impl GaborWaveletTransform {
    /// Creates the transform for the given family parameters.
    ///
    /// The kernel frequencies are derived here; kernels themselves are
    /// generated lazily for the resolution of the first image transformed.
    pub fn new(params: GwtParams) -> Result<Self> {
        params.validate()?;
        let frequencies = kernel_frequencies(&params);
        Ok(Self {
            params,
            frequencies,
            kernels: Vec::new(),
            fft: Fft2d::new(),
            frequency_image: Array2::zeros((0, 0)),
            filtered: Array2::zeros((0, 0)),
            response: Array2::zeros((0, 0)),
        })
    }

    pub fn params(&self) -> &GwtParams {
        &self.params
    }

    pub fn number_of_kernels(&self) -> usize {
        self.frequencies.len()
    }

    pub fn number_of_scales(&self) -> u32 {
        self.params.scales
    }

    pub fn number_of_directions(&self) -> u32 {
        self.params.directions
    }

    /// Central frequencies of the family, scale-major/direction-minor.
    ///
    /// Similarity functions index kernels positionally, so this ordering is
    /// part of the data contract and survives save/load unchanged.
    pub fn kernel_frequencies(&self) -> &[Vector2<f64>] {
        &self.frequencies
    }

    /// Kernel at `index`; the bank must have been generated.
    pub fn kernel(&self, index: usize) -> Result<&GaborKernel> {
        self.kernels
            .get(index)
            .ok_or(GaborError::KernelIndexOutOfRange {
                index,
                count: self.kernels.len(),
            })
    }

    /// Regenerates the kernel bank for `resolution = (height, width)`.
    ///
    /// No-op when the resolution matches the cached one. Called implicitly
    /// by every transform pass.
    pub fn generate_kernels(&mut self, resolution: (usize, usize)) {
        if self.fft.shape() == resolution {
            return;
        }
        debug!(
            "GWT: generating {} kernels for resolution {}x{}",
            self.frequencies.len(),
            resolution.0,
            resolution.1
        );
        self.kernels.clear();
        self.kernels.reserve(self.frequencies.len());
        for k in &self.frequencies {
            self.kernels.push(GaborKernel::new(
                resolution,
                *k,
                self.params.sigma,
                self.params.pow_of_k,
                self.params.dc_free,
                DEFAULT_KERNEL_EPSILON,
            ));
        }
        self.fft.set_shape(resolution.0, resolution.1);
        self.frequency_image = Array2::zeros(resolution);
        self.filtered = Array2::zeros(resolution);
        self.response = Array2::zeros(resolution);
    }

    /// Dense images of the whole kernel bank, one layer per kernel.
    pub fn kernel_images(&self) -> Array3<f64> {
        let (height, width) = self.fft.shape();
        let mut out = Array3::zeros((self.kernels.len(), height, width));
        for (j, kernel) in self.kernels.iter().enumerate() {
            out.index_axis_mut(Axis(0), j).assign(&kernel.kernel_image());
        }
        out
    }

    /// Full wavelet transform: one complex response layer per kernel.
    ///
    /// `trafo_image` must be shaped `(kernels, height, width)`.
    pub fn perform_gwt(
        &mut self,
        image: ArrayView2<'_, Complex64>,
        trafo_image: &mut Array3<Complex64>,
    ) -> Result<()> {
        let (height, width) = image.dim();
        self.generate_kernels((height, width));

        let expected = [self.frequencies.len(), height, width];
        if trafo_image.shape() != expected {
            return Err(shape_mismatch(&expected, trafo_image.shape()));
        }

        self.fft.forward(image, self.frequency_image.view_mut());
        for (j, kernel) in self.kernels.iter().enumerate() {
            kernel.transform(self.frequency_image.view(), self.filtered.view_mut())?;
            self.fft
                .inverse(self.filtered.view(), trafo_image.index_axis_mut(Axis(0), j));
        }
        Ok(())
    }

    /// Jet image with magnitudes and phases.
    ///
    /// `jet_image` must be shaped `(height, width, 2, kernels)`; index 0 of
    /// the third axis holds magnitudes, index 1 phases. With `do_normalize`
    /// every per-pixel jet is unit-normalized on its magnitude part after
    /// all kernels are computed.
    pub fn compute_jet_image(
        &mut self,
        image: ArrayView2<'_, Complex64>,
        jet_image: &mut Array4<f64>,
        do_normalize: bool,
    ) -> Result<()> {
        let (height, width) = image.dim();
        self.generate_kernels((height, width));

        let expected = [height, width, 2, self.frequencies.len()];
        if jet_image.shape() != expected {
            return Err(shape_mismatch(&expected, jet_image.shape()));
        }

        self.fft.forward(image, self.frequency_image.view_mut());
        for (j, kernel) in self.kernels.iter().enumerate() {
            kernel.transform(self.frequency_image.view(), self.filtered.view_mut())?;
            self.fft.inverse(self.filtered.view(), self.response.view_mut());

            Zip::from(jet_image.slice_mut(s![.., .., 0, j]))
                .and(&self.response)
                .for_each(|a, r| *a = r.norm());
            Zip::from(jet_image.slice_mut(s![.., .., 1, j]))
                .and(&self.response)
                .for_each(|p, r| *p = r.arg());
        }

        if do_normalize {
            for y in 0..height {
                for x in 0..width {
                    normalize_jet(jet_image.slice_mut(s![y, x, .., ..]));
                }
            }
        }
        Ok(())
    }

    /// Jet image with magnitudes only; `jet_image` is
    /// `(height, width, kernels)`.
    pub fn compute_abs_jet_image(
        &mut self,
        image: ArrayView2<'_, Complex64>,
        jet_image: &mut Array3<f64>,
        do_normalize: bool,
    ) -> Result<()> {
        let (height, width) = image.dim();
        self.generate_kernels((height, width));

        let expected = [height, width, self.frequencies.len()];
        if jet_image.shape() != expected {
            return Err(shape_mismatch(&expected, jet_image.shape()));
        }

        self.fft.forward(image, self.frequency_image.view_mut());
        for (j, kernel) in self.kernels.iter().enumerate() {
            kernel.transform(self.frequency_image.view(), self.filtered.view_mut())?;
            self.fft.inverse(self.filtered.view(), self.response.view_mut());

            Zip::from(jet_image.slice_mut(s![.., .., j]))
                .and(&self.response)
                .for_each(|a, r| *a = r.norm());
        }

        if do_normalize {
            for y in 0..height {
                for x in 0..width {
                    normalize_abs_jet(jet_image.slice_mut(s![y, x, ..]));
                }
            }
        }
        Ok(())
    }

    /// Persists the family parameters; kernels are never written out since
    /// they are regenerated deterministically on load.
    pub fn save(&self, path: &Path) -> Result<()> {
        debug!("GWT: saving parameters to {}", path.display());
        self.params.to_file(path)
    }

    /// Restores a transform from persisted parameters.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("GWT: loading parameters from {}", path.display());
        Self::new(GwtParams::from_file(path)?)
    }
}

impl Default for GaborWaveletTransform {
    fn default() -> Self {
        Self::new(GwtParams::default()).expect("default parameters are valid")
    }
}

impl Clone for GaborWaveletTransform {
    /// Clones the configuration; the kernel bank and scratch planes are
    /// regenerated lazily on the next transform call.
    fn clone(&self) -> Self {
        Self::new(self.params.clone()).expect("parameters were validated at construction")
    }
}

impl std::fmt::Debug for GaborWaveletTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaborWaveletTransform")
            .field("params", &self.params)
            .field("resolution", &self.fft.shape())
            .field("kernels", &self.kernels.len())
            .finish()
    }
}

impl PartialEq for GaborWaveletTransform {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params
    }
}

/// Frequency of scale `s`, direction `d` is `k_abs(s)·(cos θ_d, sin θ_d)`
/// with `θ_d = π·d/directions` and `k_abs` decaying by `k_fac` per scale.
fn kernel_frequencies(params: &GwtParams) -> Vec<Vector2<f64>> {
    let mut frequencies = Vec::with_capacity(params.number_of_kernels());
    let mut k_abs = params.k_max;
    for _scale in 0..params.scales {
        for direction in 0..params.directions {
            let angle = PI * direction as f64 / params.directions as f64;
            frequencies.push(Vector2::new(k_abs * angle.cos(), k_abs * angle.sin()));
        }
        k_abs *= params.k_fac;
    }
    frequencies
}
