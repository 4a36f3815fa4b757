//! Gabor graphs: fixed sets of node positions labeled with jets.
//!
//! The machine owns only the node positions; graph jets live in external
//! arrays addressed by node index. Grids are generated either anchored to a
//! pair of eye positions or as an explicit regular lattice, both in
//! row-major (y-major) node order.

use std::fs;
use std::path::Path;

use log::debug;
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, ArrayView4, Axis};
use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{shape_mismatch, GaborError, Result};
use crate::jets::{normalize_jet, GaborJetSimilarity};

/// Samples jet images on a fixed grid of node positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GaborGraphMachine {
    nodes: Vec<[i32; 2]>,
}

impl GaborGraphMachine {
    /// Grid anchored to the two eye positions (`[y, x]` each).
    ///
    /// `between` nodes are placed between the eyes (excluding the eye nodes
    /// themselves), `along` nodes outside each eye on the eye axis, `above`
    /// and `below` rows perpendicular to it. The node spacing is the
    /// inter-eye vector divided by `between + 1`; rows are offset by the
    /// 90°-rotated spacing vector. Both eye positions are nodes of the
    /// resulting grid.
    pub fn with_eye_positions(
        lefteye: [i32; 2],
        righteye: [i32; 2],
        between: u32,
        along: u32,
        above: u32,
        below: u32,
    ) -> Self {
        let (ley, lex) = (lefteye[0] as f64, lefteye[1] as f64);
        let (rey, rex) = (righteye[0] as f64, righteye[1] as f64);

        let step_x = (lex - rex) / (between + 1) as f64;
        let step_y = (ley - rey) / (between + 1) as f64;
        let x_start = rex - along as f64 * step_x + above as f64 * step_y;
        let y_start = rey - along as f64 * step_y - above as f64 * step_x;

        let x_count = between as usize + 2 * (along as usize + 1);
        let y_count = (above + below + 1) as usize;

        let mut nodes = Vec::with_capacity(x_count * y_count);
        for y in 0..y_count {
            for x in 0..x_count {
                nodes.push([
                    (y_start + y as f64 * step_x + x as f64 * step_y).round() as i32,
                    (x_start + x as f64 * step_x - y as f64 * step_y).round() as i32,
                ]);
            }
        }
        Self { nodes }
    }

    /// Regular grid from `first` (top-left) towards `last` (bottom-right)
    /// with the given per-axis step; `last` itself is only reached when the
    /// step divides the extent evenly.
    pub fn with_grid(first: [i32; 2], last: [i32; 2], step: [i32; 2]) -> Result<Self> {
        if step[0] <= 0 || step[1] <= 0 {
            return Err(GaborError::InvalidConfiguration(format!(
                "grid step must be positive, got ({}, {})",
                step[0], step[1]
            )));
        }
        if last[0] < first[0] || last[1] < first[1] {
            return Err(GaborError::InvalidConfiguration(format!(
                "grid end ({}, {}) lies before start ({}, {})",
                last[0], last[1], first[0], first[1]
            )));
        }

        let y_count = ((last[0] - first[0]) / step[0] + 1) as usize;
        let x_count = ((last[1] - first[1]) / step[1] + 1) as usize;

        let mut nodes = Vec::with_capacity(x_count * y_count);
        for y in 0..y_count {
            for x in 0..x_count {
                nodes.push([
                    first[0] + y as i32 * step[0],
                    first[1] + x as i32 * step[1],
                ]);
            }
        }
        Ok(Self { nodes })
    }

    /// Node positions as `[y, x]` pairs, row-major.
    pub fn nodes(&self) -> &[[i32; 2]] {
        &self.nodes
    }

    pub fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Verifies that every node lies inside a `height`×`width` image.
    pub fn check_positions(&self, height: usize, width: usize) -> Result<()> {
        for &[y, x] in &self.nodes {
            if y < 0 || y as usize >= height || x < 0 || x as usize >= width {
                return Err(GaborError::IndexOutOfRange {
                    y: y as i64,
                    x: x as i64,
                    height,
                    width,
                });
            }
        }
        Ok(())
    }

    /// Copies the jets (with phases) at the node positions out of a
    /// `(height, width, 2, kernels)` jet image into
    /// `graph_jets: (nodes, 2, kernels)`.
    pub fn extract(
        &self,
        jet_image: ArrayView4<'_, f64>,
        graph_jets: &mut Array3<f64>,
    ) -> Result<()> {
        let (height, width, planes, kernels) = jet_image.dim();
        if planes != 2 {
            return Err(shape_mismatch(&[height, width, 2, kernels], jet_image.shape()));
        }
        self.check_positions(height, width)?;

        let expected = [self.nodes.len(), 2, kernels];
        if graph_jets.shape() != expected {
            return Err(shape_mismatch(&expected, graph_jets.shape()));
        }

        for (i, &[y, x]) in self.nodes.iter().enumerate() {
            graph_jets
                .index_axis_mut(Axis(0), i)
                .assign(&jet_image.slice(s![y as usize, x as usize, .., ..]));
        }
        Ok(())
    }

    /// Magnitude-only variant of [`extract`](Self::extract):
    /// `(height, width, kernels)` → `(nodes, kernels)`.
    pub fn extract_abs(
        &self,
        jet_image: ArrayView3<'_, f64>,
        graph_jets: &mut Array2<f64>,
    ) -> Result<()> {
        let (height, width, kernels) = jet_image.dim();
        self.check_positions(height, width)?;

        let expected = [self.nodes.len(), kernels];
        if graph_jets.shape() != expected {
            return Err(shape_mismatch(&expected, graph_jets.shape()));
        }

        for (i, &[y, x]) in self.nodes.iter().enumerate() {
            graph_jets
                .index_axis_mut(Axis(0), i)
                .assign(&jet_image.slice(s![y as usize, x as usize, ..]));
        }
        Ok(())
    }

    /// Averages a set of graphs `(graphs, nodes, 2, kernels)` into one
    /// `(nodes, 2, kernels)` graph.
    ///
    /// Jet entries are summed as complex numbers `polar(abs, phase)`, so the
    /// averaged phase is the magnitude-weighted circular mean, never a naive
    /// mean of angles. Averaged jets are unit-normalized.
    pub fn average(
        &self,
        many_graph_jets: ArrayView4<'_, f64>,
        averaged: &mut Array3<f64>,
    ) -> Result<()> {
        let (graphs, nodes, planes, kernels) = many_graph_jets.dim();
        if planes != 2 || graphs == 0 {
            return Err(shape_mismatch(
                &[1, nodes, 2, kernels],
                many_graph_jets.shape(),
            ));
        }
        let expected = [nodes, 2, kernels];
        if averaged.shape() != expected {
            return Err(shape_mismatch(&expected, averaged.shape()));
        }

        let mut sums = vec![Complex64::default(); kernels];
        for i in 0..nodes {
            sums.fill(Complex64::default());
            for p in 0..graphs {
                for (j, sum) in sums.iter_mut().enumerate() {
                    *sum += Complex64::from_polar(
                        many_graph_jets[(p, i, 0, j)],
                        many_graph_jets[(p, i, 1, j)],
                    );
                }
            }
            for (j, sum) in sums.iter().enumerate() {
                averaged[(i, 0, j)] = sum.norm();
                averaged[(i, 1, j)] = sum.arg();
            }
            normalize_jet(averaged.slice_mut(s![i, .., ..]));
        }
        Ok(())
    }

    /// Mean per-node similarity of two graphs with phases,
    /// `(nodes, 2, kernels)` each.
    pub fn similarity(
        &self,
        model_graph_jets: ArrayView3<'_, f64>,
        probe_graph_jets: ArrayView3<'_, f64>,
        similarity: &mut GaborJetSimilarity,
    ) -> Result<f64> {
        if model_graph_jets.shape() != probe_graph_jets.shape() {
            return Err(shape_mismatch(
                model_graph_jets.shape(),
                probe_graph_jets.shape(),
            ));
        }
        let nodes = nonzero_nodes(model_graph_jets.dim().0)?;

        let mut sum = 0.0;
        for i in 0..nodes {
            sum += similarity.similarity(
                model_graph_jets.index_axis(Axis(0), i),
                probe_graph_jets.index_axis(Axis(0), i),
            )?;
        }
        Ok(sum / nodes as f64)
    }

    /// Mean per-node similarity of two magnitude-only graphs,
    /// `(nodes, kernels)` each.
    pub fn similarity_abs(
        &self,
        model_graph_jets: ArrayView2<'_, f64>,
        probe_graph_jets: ArrayView2<'_, f64>,
        similarity: &GaborJetSimilarity,
    ) -> Result<f64> {
        if model_graph_jets.shape() != probe_graph_jets.shape() {
            return Err(shape_mismatch(
                model_graph_jets.shape(),
                probe_graph_jets.shape(),
            ));
        }
        let nodes = nonzero_nodes(model_graph_jets.dim().0)?;

        let mut sum = 0.0;
        for i in 0..nodes {
            sum += similarity.similarity_abs(
                model_graph_jets.row(i),
                probe_graph_jets.row(i),
            )?;
        }
        Ok(sum / nodes as f64)
    }

    /// Similarity of a gallery of model graphs `(models, nodes, 2, kernels)`
    /// to a probe graph: per node the best model similarity, averaged over
    /// nodes.
    pub fn gallery_similarity(
        &self,
        many_model_graph_jets: ArrayView4<'_, f64>,
        probe_graph_jets: ArrayView3<'_, f64>,
        similarity: &mut GaborJetSimilarity,
    ) -> Result<f64> {
        let (models, nodes, planes, kernels) = many_model_graph_jets.dim();
        if models == 0 || probe_graph_jets.shape() != [nodes, planes, kernels] {
            return Err(shape_mismatch(
                &[nodes, planes, kernels],
                probe_graph_jets.shape(),
            ));
        }
        let nodes = nonzero_nodes(nodes)?;

        let mut sum = 0.0;
        for i in 0..nodes {
            let probe = probe_graph_jets.index_axis(Axis(0), i);
            let mut best = 0.0f64;
            for p in 0..models {
                let model = many_model_graph_jets.slice(s![p, i, .., ..]);
                best = best.max(similarity.similarity(model, probe)?);
            }
            sum += best;
        }
        Ok(sum / nodes as f64)
    }

    /// Magnitude-only gallery similarity: `(models, nodes, kernels)` vs
    /// `(nodes, kernels)`.
    pub fn gallery_similarity_abs(
        &self,
        many_model_graph_jets: ArrayView3<'_, f64>,
        probe_graph_jets: ArrayView2<'_, f64>,
        similarity: &GaborJetSimilarity,
    ) -> Result<f64> {
        let (models, nodes, kernels) = many_model_graph_jets.dim();
        if models == 0 || probe_graph_jets.shape() != [nodes, kernels] {
            return Err(shape_mismatch(&[nodes, kernels], probe_graph_jets.shape()));
        }
        let nodes = nonzero_nodes(nodes)?;

        let mut sum = 0.0;
        for i in 0..nodes {
            let probe = probe_graph_jets.row(i);
            let mut best = 0.0f64;
            for p in 0..models {
                let model = many_model_graph_jets.slice(s![p, i, ..]);
                best = best.max(similarity.similarity_abs(model, probe)?);
            }
            sum += best;
        }
        Ok(sum / nodes as f64)
    }

    /// Persists the node positions; graph jets are never stored.
    pub fn save(&self, path: &Path) -> Result<()> {
        debug!(
            "graph: saving {} node positions to {}",
            self.nodes.len(),
            path.display()
        );
        let file = GraphFile {
            node_positions: self.nodes.clone(),
        };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file: GraphFile = serde_json::from_str(&fs::read_to_string(path)?)?;
        Ok(Self {
            nodes: file.node_positions,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct GraphFile {
    #[serde(rename = "NodePositions")]
    node_positions: Vec<[i32; 2]>,
}

fn nonzero_nodes(nodes: usize) -> Result<usize> {
    if nodes == 0 {
        return Err(GaborError::InvalidConfiguration(
            "graph has no nodes".into(),
        ));
    }
    Ok(nodes)
}
