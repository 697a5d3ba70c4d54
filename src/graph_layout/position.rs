//! Coordinate assignment in rank space.
//!
//! `x` runs along a layer and `y` along the rank axis; the caller maps both
//! onto the configured rank direction afterwards.

use super::order::LayeredGraph;

const SWEEPS: usize = 12;
const MIN_WEIGHT: f64 = 0.01;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Spacing {
    pub(crate) node_sep: f64,
    pub(crate) edge_sep: f64,
}

impl Spacing {
    fn between(&self, a_virtual: bool, b_virtual: bool) -> f64 {
        match (a_virtual, b_virtual) {
            (false, false) => self.node_sep,
            (true, true) => self.edge_sep,
            _ => (self.node_sep + self.edge_sep) / 2.0,
        }
    }
}

/// Straightening weight of a segment. Long edges pull hardest so that their
/// virtual chains come out as straight lines.
fn segment_weight(graph: &LayeredGraph, a: usize, b: usize) -> f64 {
    match (graph.is_virtual[a], graph.is_virtual[b]) {
        (false, false) => 1.0,
        (true, true) => 8.0,
        _ => 2.0,
    }
}

/// Place nodes along their layers.
///
/// Each pass moves one layer at a time toward the weighted mean of its
/// neighbours in both adjacent layers, solving the layer as a weighted
/// isotonic regression so that the minimum separations always hold.
pub(crate) fn assign_x(graph: &LayeredGraph, widths: &[f64], spacing: Spacing) -> Vec<f64> {
    let mut x = vec![0.0; graph.node_count()];
    let gaps: Vec<Vec<f64>> = graph
        .layers
        .iter()
        .map(|layer| {
            layer
                .windows(2)
                .map(|pair| {
                    let (a, b) = (pair[0], pair[1]);
                    (widths[a] + widths[b]) / 2.0
                        + spacing.between(graph.is_virtual[a], graph.is_virtual[b])
                })
                .collect()
        })
        .collect();

    for (layer, gaps) in graph.layers.iter().zip(&gaps) {
        let mut cursor = 0.0;
        for (i, &v) in layer.iter().enumerate() {
            if i > 0 {
                cursor += gaps[i - 1];
            }
            x[v] = cursor;
        }
    }

    for sweep in 0..SWEEPS {
        let order: Vec<usize> = if sweep % 2 == 0 {
            (0..graph.layers.len()).collect()
        } else {
            (0..graph.layers.len()).rev().collect()
        };
        for r in order {
            place_layer(graph, &graph.layers[r], &gaps[r], &mut x);
        }
    }
    x
}

fn place_layer(graph: &LayeredGraph, layer: &[usize], gaps: &[f64], x: &mut [f64]) {
    if layer.is_empty() {
        return;
    }
    let mut offsets = Vec::with_capacity(layer.len());
    let mut offset = 0.0;
    for i in 0..layer.len() {
        if i > 0 {
            offset += gaps[i - 1];
        }
        offsets.push(offset);
    }

    let mut targets = Vec::with_capacity(layer.len());
    let mut weights = Vec::with_capacity(layer.len());
    for (&v, &offset) in layer.iter().zip(&offsets) {
        let mut sum = 0.0;
        let mut total = 0.0;
        for &w in graph.up[v].iter().chain(&graph.down[v]) {
            let weight = segment_weight(graph, v, w);
            sum += weight * x[w];
            total += weight;
        }
        if total > 0.0 {
            targets.push(sum / total - offset);
            weights.push(total);
        } else {
            targets.push(x[v] - offset);
            weights.push(MIN_WEIGHT);
        }
    }

    let fitted = isotonic_fit(&targets, &weights);
    for ((&v, &offset), y) in layer.iter().zip(&offsets).zip(fitted) {
        x[v] = y + offset;
    }
}

/// Pool-adjacent-violators: the non-decreasing sequence closest to `targets`
/// in weighted least squares.
fn isotonic_fit(targets: &[f64], weights: &[f64]) -> Vec<f64> {
    // (value, weight, members)
    let mut blocks: Vec<(f64, f64, usize)> = Vec::with_capacity(targets.len());
    for (&t, &w) in targets.iter().zip(weights) {
        blocks.push((t, w, 1));
        while blocks.len() >= 2 {
            let (v2, w2, n2) = blocks[blocks.len() - 1];
            let (v1, w1, n1) = blocks[blocks.len() - 2];
            if v1 <= v2 {
                break;
            }
            blocks.pop();
            let merged = w1 + w2;
            if let Some(last) = blocks.last_mut() {
                *last = ((v1 * w1 + v2 * w2) / merged, merged, n1 + n2);
            }
        }
    }
    blocks
        .into_iter()
        .flat_map(|(value, _, members)| std::iter::repeat_n(value, members))
        .collect()
}

/// Centre of every node along the rank axis. Ranks are as deep as their
/// deepest node and `rank_sep` apart.
pub(crate) fn assign_y(graph: &LayeredGraph, heights: &[f64], rank_sep: f64) -> Vec<f64> {
    let mut depth = vec![0.0f64; graph.layers.len()];
    for v in 0..graph.node_count() {
        let r = graph.rank[v];
        depth[r] = depth[r].max(heights[v]);
    }

    let mut centres = Vec::with_capacity(depth.len());
    let mut top = 0.0;
    for d in depth {
        centres.push(top + d / 2.0);
        top += d + rank_sep;
    }
    (0..graph.node_count())
        .map(|v| centres[graph.rank[v]])
        .collect()
}
