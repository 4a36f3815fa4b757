//! Conversion of plain grayscale buffers into the complex planes consumed by
//! the wavelet transform.
//!
//! The transform operates on complex-valued images; callers usually hold
//! 8-bit grayscale or real-valued data, so the conversions live here at the
//! library boundary.

use ndarray::{Array2, ArrayView2};
use rustfft::num_complex::Complex64;

use crate::error::{shape_mismatch, Result};

/// Converts a row-major 8-bit grayscale buffer into a complex image plane.
///
/// Fails with `ShapeMismatch` when the buffer length does not equal
/// `height * width`.
pub fn gray_to_complex(data: &[u8], height: usize, width: usize) -> Result<Array2<Complex64>> {
    if data.len() != height * width {
        return Err(shape_mismatch(&[height * width], &[data.len()]));
    }
    let mut out = Array2::zeros((height, width));
    for y in 0..height {
        let row = &data[y * width..(y + 1) * width];
        for (x, &px) in row.iter().enumerate() {
            out[(y, x)] = Complex64::new(px as f64, 0.0);
        }
    }
    Ok(out)
}

/// Embeds a real-valued plane into the complex domain.
pub fn real_to_complex(plane: ArrayView2<'_, f64>) -> Array2<Complex64> {
    plane.mapv(|v| Complex64::new(v, 0.0))
}
