//! Layer assignment.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// An acyclic edge `(upper, lower, minimum rank span)`.
pub(crate) type RankEdge = (usize, usize, usize);

/// Longest-path ranking followed by pulling every source down next to its
/// nearest successor. Isolated nodes stay at rank 0.
///
/// `edges` must be acyclic and free of self-loops.
pub(crate) fn assign_ranks(node_count: usize, edges: &[RankEdge]) -> Vec<usize> {
    let mut out_edges: Vec<Vec<(usize, usize)>> = vec![Vec::new(); node_count];
    let mut in_degree = vec![0usize; node_count];
    for &(u, v, minlen) in edges {
        out_edges[u].push((v, minlen));
        in_degree[v] += 1;
    }

    // Kahn's algorithm, lowest index first so ties follow declaration order.
    let mut rank = vec![0usize; node_count];
    let mut pending = in_degree.clone();
    let mut ready: BinaryHeap<Reverse<usize>> = (0..node_count)
        .filter(|&v| pending[v] == 0)
        .map(Reverse)
        .collect();
    while let Some(Reverse(v)) = ready.pop() {
        for &(w, minlen) in &out_edges[v] {
            rank[w] = rank[w].max(rank[v].saturating_add(minlen));
            pending[w] -= 1;
            if pending[w] == 0 {
                ready.push(Reverse(w));
            }
        }
    }

    // Sources are not successors of anything, so moving them cannot break
    // another node's constraint.
    for v in 0..node_count {
        if in_degree[v] != 0 {
            continue;
        }
        if let Some(tightest) = out_edges[v]
            .iter()
            .map(|&(w, minlen)| rank[w].saturating_sub(minlen))
            .min()
        {
            rank[v] = tightest;
        }
    }

    if let Some(&lowest) = rank.iter().min() {
        for r in &mut rank {
            *r -= lowest;
        }
    }
    rank
}
