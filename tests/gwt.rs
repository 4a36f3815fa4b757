mod common;

use common::synthetic_image::textured_complex;
use gabor_graph::fft::Fft2d;
use gabor_graph::{GaborWaveletTransform, GwtParams};
use ndarray::{s, Array2, Array3, Array4};
use rustfft::num_complex::Complex64;

const EPSILON: f64 = 1e-4;

#[test]
fn kernel_bank_has_expected_symmetries() {
    // Mirror relations between direction pairs; requires 8 directions and a
    // square resolution.
    let res = 64usize;
    let mut gwt = GaborWaveletTransform::default();
    assert_eq!(gwt.number_of_directions(), 8);
    gwt.generate_kernels((res, res));

    let kernels = gwt.kernel_images();
    let directions = gwt.number_of_directions() as usize;

    let horizontal_pairs = [(1usize, 7usize), (2, 6), (3, 5)];
    let diagonal_pairs = [(0usize, 4usize), (1, 3)];

    for scale in 0..gwt.number_of_scales() as usize {
        let offset = scale * directions;
        for &(a, b) in &horizontal_pairs {
            let k1 = kernels.slice(s![offset + a, .., ..]);
            let k2 = kernels.slice(s![offset + b, .., ..]);
            for y in 0..res {
                // the zero'th column is unique, skip it
                for x in 1..res {
                    assert!(
                        (k1[(y, x)] - k2[(y, res - x)]).abs() < EPSILON,
                        "horizontal pair ({a},{b}) differs at ({y},{x})"
                    );
                }
            }
        }
        for &(a, b) in &diagonal_pairs {
            let k1 = kernels.slice(s![offset + a, .., ..]);
            let k2 = kernels.slice(s![offset + b, .., ..]);
            for y in 1..res {
                for x in 1..res {
                    assert!(
                        (k1[(y, x)] - k2[(x, y)]).abs() < EPSILON,
                        "diagonal pair ({a},{b}) differs at ({y},{x})"
                    );
                }
            }
        }
    }
}

#[test]
fn save_load_round_trip_restores_family() {
    let gwt = GaborWaveletTransform::default();
    let path = std::env::temp_dir().join(format!("gwt_params_{}.json", std::process::id()));
    gwt.save(&path).unwrap();

    // start from a different parameterization, then load
    let other = GaborWaveletTransform::new(GwtParams {
        scales: 1,
        directions: 2,
        sigma: 3.1,
        ..Default::default()
    })
    .unwrap();
    assert_ne!(gwt, other);

    let restored = GaborWaveletTransform::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(gwt, restored);
    assert_eq!(
        gwt.kernel_frequencies().len(),
        restored.kernel_frequencies().len()
    );
    for (a, b) in gwt
        .kernel_frequencies()
        .iter()
        .zip(restored.kernel_frequencies())
    {
        assert!((a.x - b.x).abs() < 1e-12);
        assert!((a.y - b.y).abs() < 1e-12);
    }
}

#[test]
fn single_kernel_family_matches_manual_convolution() {
    let params = GwtParams {
        scales: 1,
        directions: 1,
        ..Default::default()
    };
    let mut gwt = GaborWaveletTransform::new(params).unwrap();

    let image = textured_complex(32, 32);
    let mut trafo = Array3::zeros((1, 32, 32));
    gwt.perform_gwt(image.view(), &mut trafo).unwrap();

    // manually: forward FFT, sparse multiply, inverse FFT
    let mut fft = Fft2d::new();
    fft.set_shape(32, 32);
    let mut spectrum = Array2::zeros((32, 32));
    fft.forward(image.view(), spectrum.view_mut());

    let mut filtered: Array2<Complex64> = Array2::zeros((32, 32));
    gwt.kernel(0)
        .unwrap()
        .transform(spectrum.view(), filtered.view_mut())
        .unwrap();
    let mut manual = Array2::zeros((32, 32));
    fft.inverse(filtered.view(), manual.view_mut());

    for (a, b) in trafo.index_axis(ndarray::Axis(0), 0).iter().zip(manual.iter()) {
        assert!((a - b).norm() < 1e-10);
    }
}

#[test]
fn trafo_image_shape_is_checked() {
    let mut gwt = GaborWaveletTransform::default();
    let image = textured_complex(16, 16);
    let mut wrong = Array3::zeros((39, 16, 16));
    assert!(gwt.perform_gwt(image.view(), &mut wrong).is_err());
}

#[test]
fn jet_image_shape_is_checked() {
    let mut gwt = GaborWaveletTransform::default();
    let image = textured_complex(16, 16);
    let mut wrong = Array4::zeros((16, 16, 1, 40));
    assert!(gwt.compute_jet_image(image.view(), &mut wrong, false).is_err());
}

#[test]
fn normalized_jet_image_has_unit_magnitude_vectors() {
    let mut gwt = GaborWaveletTransform::default();
    let image = textured_complex(24, 20);

    let mut jets = Array4::zeros((24, 20, 2, gwt.number_of_kernels()));
    gwt.compute_jet_image(image.view(), &mut jets, true).unwrap();

    for y in 0..24 {
        for x in 0..20 {
            let norm: f64 = jets
                .slice(s![y, x, 0, ..])
                .iter()
                .map(|v| v * v)
                .sum::<f64>()
                .sqrt();
            assert!((norm - 1.0).abs() < 1e-8, "jet at ({y},{x}) has norm {norm}");
            for &phase in jets.slice(s![y, x, 1, ..]).iter() {
                assert!(phase.is_finite());
                assert!(phase.abs() <= std::f64::consts::PI + 1e-12);
            }
        }
    }
}

#[test]
fn abs_jet_image_matches_jet_image_magnitudes() {
    let mut gwt = GaborWaveletTransform::default();
    let image = textured_complex(18, 18);
    let kernels = gwt.number_of_kernels();

    let mut with_phases = Array4::zeros((18, 18, 2, kernels));
    gwt.compute_jet_image(image.view(), &mut with_phases, false)
        .unwrap();

    let mut abs_only = Array3::zeros((18, 18, kernels));
    gwt.compute_abs_jet_image(image.view(), &mut abs_only, false)
        .unwrap();

    for ((y, x, j), &a) in abs_only.indexed_iter() {
        assert!((a - with_phases[(y, x, 0, j)]).abs() < 1e-12);
    }
}

#[test]
fn degenerate_resolution_transforms_without_panic() {
    let mut gwt = GaborWaveletTransform::default();
    let image: Array2<Complex64> = Array2::from_elem((1, 1), Complex64::new(1.0, 0.0));
    let mut trafo = Array3::zeros((gwt.number_of_kernels(), 1, 1));
    gwt.perform_gwt(image.view(), &mut trafo).unwrap();
    assert!(gwt.kernel(0).unwrap().support_len() <= 1);
}

#[test]
fn resolution_change_regenerates_kernels() {
    let mut gwt = GaborWaveletTransform::default();
    let small = textured_complex(16, 16);
    let large = textured_complex(20, 24);

    let mut trafo_small = Array3::zeros((40, 16, 16));
    gwt.perform_gwt(small.view(), &mut trafo_small).unwrap();
    assert_eq!(gwt.kernel(0).unwrap().resolution(), (16, 16));

    let mut trafo_large = Array3::zeros((40, 20, 24));
    gwt.perform_gwt(large.view(), &mut trafo_large).unwrap();
    assert_eq!(gwt.kernel(0).unwrap().resolution(), (20, 24));
}
