mod common;

use std::f64::consts::PI;

use common::synthetic_image::{checkerboard_u8, textured_complex};
use gabor_graph::image::gray_to_complex;
use gabor_graph::{GaborGraphMachine, GaborJetSimilarity, GaborWaveletTransform};
use ndarray::{s, Array2, Array3, Array4, Axis};

const EPSILON: f64 = 1e-8;

fn extracted_graph(
    machine: &GaborGraphMachine,
    gwt: &mut GaborWaveletTransform,
    image: ndarray::ArrayView2<'_, rustfft::num_complex::Complex64>,
) -> Array3<f64> {
    let (height, width) = image.dim();
    let mut jets = Array4::zeros((height, width, 2, gwt.number_of_kernels()));
    gwt.compute_jet_image(image, &mut jets, true).unwrap();

    let mut graph = Array3::zeros((machine.number_of_nodes(), 2, gwt.number_of_kernels()));
    machine.extract(jets.view(), &mut graph).unwrap();
    graph
}

#[test]
fn regular_grid_positions_follow_step_lattice() {
    let machine = GaborGraphMachine::with_grid([10, 10], [90, 90], [10, 10]).unwrap();
    assert_eq!(machine.number_of_nodes(), 81);
    for (i, &[y, x]) in machine.nodes().iter().enumerate() {
        assert_eq!(y, 10 + 10 * (i / 9) as i32);
        assert_eq!(x, 10 + 10 * (i % 9) as i32);
    }
}

#[test]
fn self_similarity_is_unity_for_every_variant() {
    let mut gwt = GaborWaveletTransform::default();
    let image = textured_complex(100, 100);
    let machine = GaborGraphMachine::with_grid([10, 10], [90, 90], [10, 10]).unwrap();
    let graph = extracted_graph(&machine, &mut gwt, image.view());

    let mut functions = [
        GaborJetSimilarity::scalar_product(),
        GaborJetSimilarity::canberra(),
        GaborJetSimilarity::disparity(&gwt),
        GaborJetSimilarity::phase_diff(&gwt),
        GaborJetSimilarity::phase_diff_plus_canberra(&gwt),
    ];

    for function in &mut functions {
        let name = function.name();
        let score = machine
            .similarity(graph.view(), graph.view(), function)
            .unwrap();
        assert!(
            (score - 1.0).abs() < EPSILON,
            "{name} self-similarity is {score}"
        );
    }
}

#[test]
fn graph_extraction_from_checkerboard_image() {
    let (width, height) = (64usize, 48usize);
    let buffer = checkerboard_u8(width, height, 8);
    let image = gray_to_complex(&buffer, height, width).unwrap();

    let mut gwt = GaborWaveletTransform::default();
    let machine = GaborGraphMachine::with_grid([8, 8], [40, 56], [8, 8]).unwrap();
    let graph = extracted_graph(&machine, &mut gwt, image.view());

    // normalized jets: every node has a unit magnitude vector
    for i in 0..machine.number_of_nodes() {
        let norm: f64 = graph
            .slice(s![i, 0, ..])
            .iter()
            .map(|v| v * v)
            .sum::<f64>()
            .sqrt();
        assert!((norm - 1.0).abs() < EPSILON);
    }
}

#[test]
fn extraction_rejects_out_of_bounds_nodes() {
    let mut gwt = GaborWaveletTransform::default();
    let image = textured_complex(32, 32);
    let mut jets = Array4::zeros((32, 32, 2, gwt.number_of_kernels()));
    gwt.compute_jet_image(image.view(), &mut jets, true).unwrap();

    let machine = GaborGraphMachine::with_grid([8, 8], [40, 40], [8, 8]).unwrap();
    let mut graph = Array3::zeros((machine.number_of_nodes(), 2, gwt.number_of_kernels()));
    assert!(machine.extract(jets.view(), &mut graph).is_err());
}

#[test]
fn averaging_a_single_graph_is_identity() {
    let mut gwt = GaborWaveletTransform::default();
    let image = textured_complex(64, 64);
    let machine = GaborGraphMachine::with_grid([8, 8], [56, 56], [8, 8]).unwrap();
    let graph = extracted_graph(&machine, &mut gwt, image.view());

    let mut many = Array4::zeros((
        1,
        machine.number_of_nodes(),
        2,
        gwt.number_of_kernels(),
    ));
    many.index_axis_mut(Axis(0), 0).assign(&graph);

    let mut averaged = Array3::zeros(graph.raw_dim());
    machine.average(many.view(), &mut averaged).unwrap();

    for (a, b) in averaged.iter().zip(graph.iter()) {
        assert!((a - b).abs() < EPSILON);
    }
}

#[test]
fn averaging_duplicates_preserves_the_graph() {
    let mut gwt = GaborWaveletTransform::default();
    let image = textured_complex(48, 48);
    let machine = GaborGraphMachine::with_grid([8, 8], [40, 40], [8, 8]).unwrap();
    let graph = extracted_graph(&machine, &mut gwt, image.view());

    let mut many = Array4::zeros((
        2,
        machine.number_of_nodes(),
        2,
        gwt.number_of_kernels(),
    ));
    many.index_axis_mut(Axis(0), 0).assign(&graph);
    many.index_axis_mut(Axis(0), 1).assign(&graph);

    let mut averaged = Array3::zeros(graph.raw_dim());
    machine.average(many.view(), &mut averaged).unwrap();

    for (a, b) in averaged.iter().zip(graph.iter()) {
        assert!((a - b).abs() < EPSILON);
    }
}

#[test]
fn disparity_recovers_known_displacement() {
    let gwt = GaborWaveletTransform::default();
    let kernels = gwt.number_of_kernels();

    // magnitude 1 at every 4th kernel, uniform phase
    let mut test_jet = Array2::zeros((2, kernels));
    for j in (0..kernels).step_by(4) {
        test_jet[(0, j)] = 1.0;
    }
    test_jet.row_mut(1).fill(PI / 4.0);

    // phase shifts of a displacement by exactly one pixel in x: the
    // direction-0 kernel of scale s has |k| = k_max * k_fac^s
    let mut shifted_jet = test_jet.clone();
    shifted_jet[(1, 0)] += PI / 2.0;
    shifted_jet[(1, 8)] += PI / (2.0 * 2f64.sqrt());
    shifted_jet[(1, 16)] += PI / 4.0;
    shifted_jet[(1, 24)] += PI / (4.0 * 2f64.sqrt());
    shifted_jet[(1, 32)] += PI / 8.0;

    let mut sim = GaborJetSimilarity::disparity(&gwt);
    let mut normalized = Array2::zeros((2, kernels));
    sim.shift_phase(shifted_jet.view(), test_jet.view(), &mut normalized)
        .unwrap();

    let disparity = sim.last_disparity().unwrap();
    assert!(disparity.y.abs() < 1e-6, "dy = {}", disparity.y);
    assert!((disparity.x - 1.0).abs() < 1e-6, "dx = {}", disparity.x);

    // the touched directions are shifted back onto the reference phases
    for j in (0..kernels).step_by(4) {
        assert!(
            (normalized[(1, j)] - test_jet[(1, j)]).abs() < 1e-6,
            "phase {j} not restored"
        );
    }
}

#[test]
fn gallery_similarity_prefers_the_matching_model() {
    let mut gwt = GaborWaveletTransform::default();
    let machine = GaborGraphMachine::with_grid([8, 8], [40, 40], [8, 8]).unwrap();

    let image_a = textured_complex(48, 48);
    // same size, different texture orientation
    let image_b = image_a.t().to_owned();
    let graph_a = extracted_graph(&machine, &mut gwt, image_a.view());
    let graph_b = extracted_graph(&machine, &mut gwt, image_b.view());

    let (nodes, _, kernels) = graph_a.dim();
    let mut gallery = Array4::zeros((2, nodes, 2, kernels));
    gallery.index_axis_mut(Axis(0), 0).assign(&graph_b);
    gallery.index_axis_mut(Axis(0), 1).assign(&graph_a);

    let mut sim = GaborJetSimilarity::scalar_product();
    let score = machine
        .gallery_similarity(gallery.view(), graph_a.view(), &mut sim)
        .unwrap();
    assert!(
        (score - 1.0).abs() < EPSILON,
        "gallery containing the probe should score 1, got {score}"
    );
}

#[test]
fn similarity_round_trips_through_persistence() {
    let gwt = GaborWaveletTransform::default();
    let sim = GaborJetSimilarity::phase_diff(&gwt);
    let path = std::env::temp_dir().join(format!(
        "gabor_similarity_{}.json",
        std::process::id()
    ));
    sim.save(&path).unwrap();
    let restored = GaborJetSimilarity::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(restored.name(), "PhaseDiff");
    match restored {
        GaborJetSimilarity::PhaseDiff(estimator) => {
            assert_eq!(estimator.number_of_kernels(), gwt.number_of_kernels());
            for (a, b) in estimator.frequencies().iter().zip(gwt.kernel_frequencies()) {
                assert!((a.x - b.x).abs() < 1e-12);
                assert!((a.y - b.y).abs() < 1e-12);
            }
        }
        other => panic!("unexpected variant {}", other.name()),
    }
}
