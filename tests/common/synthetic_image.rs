use ndarray::Array2;
use rustfft::num_complex::Complex64;

/// Generates a simple high-contrast checkerboard image.
pub fn checkerboard_u8(width: usize, height: usize, cell: usize) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(cell > 0, "cell size must be positive");

    let mut img = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let cx = (x / cell) as i32;
            let cy = (y / cell) as i32;
            let sum = cx + cy;
            let val = if sum & 1 == 0 { 32u8 } else { 220u8 };
            img[y * width + x] = val;
        }
    }
    img
}

/// Smoothly textured complex image with non-degenerate Gabor responses at
/// every pixel.
pub fn textured_complex(height: usize, width: usize) -> Array2<Complex64> {
    Array2::from_shape_fn((height, width), |(y, x)| {
        let v = 128.0
            + 60.0 * (0.35 * x as f64).sin()
            + 40.0 * (0.2 * y as f64).cos()
            + 20.0 * (0.1 * (x + 2 * y) as f64).sin();
        Complex64::new(v, 0.0)
    })
}
