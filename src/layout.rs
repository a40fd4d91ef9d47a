//! Seeded force-directed (Fruchterman-Reingold) node placement.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::graph::CooccurrenceGraph;

const MIN_DISTANCE: f64 = 0.01;
const CONVERGENCE: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    /// Optimal distance between nodes. Larger values spread the graph out.
    pub k: f64,
    pub iterations: usize,
    pub seed: u64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            k: 0.8,
            iterations: 50,
            seed: 42,
        }
    }
}

/// Compute positions in `[-1, 1]²` for every node, in
/// [`CooccurrenceGraph::nodes`] order. Same graph and params give the same
/// positions.
pub fn spring_layout(graph: &CooccurrenceGraph, params: &LayoutParams) -> Vec<(f64, f64)> {
    let n = graph.node_count();
    match n {
        0 => return Vec::new(),
        1 => return vec![(0.0, 0.0)],
        _ => {}
    }

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let mut pos: Vec<[f64; 2]> = (0..n)
        .map(|_| [rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)])
        .collect();

    let mut neighbors: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for ((s, t), (_, _, w)) in graph.edge_endpoints().zip(graph.edges()) {
        neighbors[s].push((t, f64::from(w)));
        neighbors[t].push((s, f64::from(w)));
    }

    let k = params.k;
    let mut temperature = 0.1 * spread(&pos);
    let cooling = temperature / (params.iterations as f64 + 1.0);

    for _ in 0..params.iterations {
        let mut displacement = vec![[0.0_f64; 2]; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let delta = [pos[i][0] - pos[j][0], pos[i][1] - pos[j][1]];
                let distance = norm(delta).max(MIN_DISTANCE);
                let repulsion = k * k / (distance * distance);
                displacement[i][0] += delta[0] * repulsion;
                displacement[i][1] += delta[1] * repulsion;
            }
            for &(j, weight) in &neighbors[i] {
                let delta = [pos[i][0] - pos[j][0], pos[i][1] - pos[j][1]];
                let attraction = weight * norm(delta).max(MIN_DISTANCE) / k;
                displacement[i][0] -= delta[0] * attraction;
                displacement[i][1] -= delta[1] * attraction;
            }
        }

        let mut total_move = 0.0;
        for (p, d) in pos.iter_mut().zip(&displacement) {
            let length = norm(*d).max(MIN_DISTANCE);
            let step = [d[0] * temperature / length, d[1] * temperature / length];
            p[0] += step[0];
            p[1] += step[1];
            total_move += norm(step);
        }
        temperature -= cooling;
        if total_move / (n as f64) < CONVERGENCE {
            break;
        }
    }

    rescale(&mut pos);
    pos.into_iter().map(|[x, y]| (x, y)).collect()
}

fn norm(v: [f64; 2]) -> f64 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

fn spread(pos: &[[f64; 2]]) -> f64 {
    (0..2)
        .map(|axis| {
            let (lo, hi) = pos.iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| {
                (lo.min(p[axis]), hi.max(p[axis]))
            });
            hi - lo
        })
        .fold(0.0, f64::max)
}

/// Center on the origin and scale so the largest coordinate is 1.
fn rescale(pos: &mut [[f64; 2]]) {
    let n = pos.len() as f64;
    let mean = [
        pos.iter().map(|p| p[0]).sum::<f64>() / n,
        pos.iter().map(|p| p[1]).sum::<f64>() / n,
    ];
    let mut extent = 0.0_f64;
    for p in pos.iter_mut() {
        p[0] -= mean[0];
        p[1] -= mean[1];
        extent = extent.max(p[0].abs()).max(p[1].abs());
    }
    if extent > 0.0 {
        for p in pos.iter_mut() {
            p[0] /= extent;
            p[1] /= extent;
        }
    }
}
