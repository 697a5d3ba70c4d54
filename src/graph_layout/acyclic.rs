//! Cycle removal.
//!
//! Greedy feedback-arc-set heuristic (Eades, Lin & Smyth): peel sinks to the
//! right end of a vertex sequence and sources to the left end; when neither
//! exists, move the vertex with the largest out-degree minus in-degree to the
//! left. Edges that point backwards in the final sequence are reversed.

use std::cmp::Reverse;

struct Peeler {
    out_edges: Vec<Vec<usize>>,
    in_edges: Vec<Vec<usize>>,
    out_degree: Vec<i64>,
    in_degree: Vec<i64>,
    removed: Vec<bool>,
    remaining: usize,
}

impl Peeler {
    fn new(node_count: usize, edges: &[(usize, usize)]) -> Self {
        let mut peeler = Self {
            out_edges: vec![Vec::new(); node_count],
            in_edges: vec![Vec::new(); node_count],
            out_degree: vec![0; node_count],
            in_degree: vec![0; node_count],
            removed: vec![false; node_count],
            remaining: node_count,
        };
        for &(u, v) in edges {
            if u == v {
                continue;
            }
            peeler.out_edges[u].push(v);
            peeler.in_edges[v].push(u);
            peeler.out_degree[u] += 1;
            peeler.in_degree[v] += 1;
        }
        peeler
    }

    fn remove(&mut self, v: usize) {
        self.removed[v] = true;
        self.remaining -= 1;
        for &w in &self.out_edges[v] {
            self.in_degree[w] -= 1;
        }
        for &u in &self.in_edges[v] {
            self.out_degree[u] -= 1;
        }
    }

    fn is_sink(&self, v: usize) -> bool {
        !self.removed[v] && self.out_degree[v] == 0
    }

    fn is_source(&self, v: usize) -> bool {
        !self.removed[v] && self.in_degree[v] == 0
    }
}

/// Per edge, whether it has to be reversed to make the graph acyclic.
/// Self-loops are never reversed.
pub(crate) fn feedback_edges(node_count: usize, edges: &[(usize, usize)]) -> Vec<bool> {
    let mut peeler = Peeler::new(node_count, edges);
    let mut left: Vec<usize> = Vec::new();
    let mut right: Vec<usize> = Vec::new();

    while peeler.remaining > 0 {
        let mut progressed = true;
        while progressed {
            progressed = false;
            for v in 0..node_count {
                if peeler.is_sink(v) {
                    peeler.remove(v);
                    right.push(v);
                    progressed = true;
                }
            }
            for v in 0..node_count {
                if peeler.is_source(v) {
                    peeler.remove(v);
                    left.push(v);
                    progressed = true;
                }
            }
        }

        let pick = (0..node_count)
            .filter(|&v| !peeler.removed[v])
            .max_by_key(|&v| (peeler.out_degree[v] - peeler.in_degree[v], Reverse(v)));
        if let Some(v) = pick {
            peeler.remove(v);
            left.push(v);
        }
    }

    let mut position = vec![0usize; node_count];
    for (i, &v) in left.iter().chain(right.iter().rev()).enumerate() {
        position[v] = i;
    }

    edges
        .iter()
        .map(|&(u, v)| u != v && position[u] > position[v])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dag_keeps_every_edge() {
        let edges = [(0, 1), (1, 2), (0, 2)];
        assert_eq!(feedback_edges(3, &edges), vec![false, false, false]);
    }

    #[test]
    fn two_cycle_reverses_one_edge() {
        let edges = [(0, 1), (1, 0)];
        assert_eq!(feedback_edges(2, &edges), vec![false, true]);
    }

    #[test]
    fn triangle_reverses_closing_edge() {
        let edges = [(0, 1), (1, 2), (2, 0)];
        assert_eq!(feedback_edges(3, &edges), vec![false, false, true]);
    }

    #[test]
    fn self_loops_are_ignored() {
        let edges = [(0, 0), (0, 1)];
        assert_eq!(feedback_edges(2, &edges), vec![false, false]);
    }

    #[test]
    fn result_is_acyclic() {
        let edges = [(0, 1), (1, 2), (2, 3), (3, 1), (3, 0), (2, 0)];
        let reversed = feedback_edges(4, &edges);
        let oriented: Vec<(usize, usize)> = edges
            .iter()
            .zip(&reversed)
            .map(|(&(u, v), &r)| if r { (v, u) } else { (u, v) })
            .collect();
        // a topological order exists iff repeated source removal empties the graph
        let mut alive = vec![true; 4];
        for _ in 0..4 {
            let source = (0..4)
                .find(|&v| alive[v] && !oriented.iter().any(|&(a, b)| b == v && alive[a]));
            alive[source.expect("acyclic graph has a source")] = false;
        }
    }
}
