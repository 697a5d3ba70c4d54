//! Virtual-node insertion and crossing minimisation.
//!
//! Layers are plain index lists. Real nodes keep their model index; virtual
//! nodes are appended after them, one per intermediate rank of a long edge.

/// Sweeps without improvement before giving up.
const PATIENCE: usize = 4;
const MAX_SWEEPS: usize = 24;

#[derive(Debug, Clone)]
pub(crate) struct LayeredGraph {
    pub(crate) rank: Vec<usize>,
    pub(crate) is_virtual: Vec<bool>,
    pub(crate) layers: Vec<Vec<usize>>,
    /// Neighbours one rank above, one entry per edge segment.
    pub(crate) up: Vec<Vec<usize>>,
    /// Neighbours one rank below, one entry per edge segment.
    pub(crate) down: Vec<Vec<usize>>,
    /// Per model edge, the nodes from its upper to its lower end;
    /// `None` for self-loops.
    pub(crate) chains: Vec<Option<Vec<usize>>>,
}

impl LayeredGraph {
    /// `oriented` holds each model edge as `(upper, lower)`, or `None` for a
    /// self-loop. Every pair must satisfy `rank[upper] < rank[lower]`.
    pub(crate) fn new(ranks: &[usize], oriented: &[Option<(usize, usize)>]) -> Self {
        let mut graph = Self {
            rank: ranks.to_vec(),
            is_virtual: vec![false; ranks.len()],
            layers: Vec::new(),
            up: vec![Vec::new(); ranks.len()],
            down: vec![Vec::new(); ranks.len()],
            chains: Vec::with_capacity(oriented.len()),
        };

        for edge in oriented {
            let Some((upper, lower)) = *edge else {
                graph.chains.push(None);
                continue;
            };
            let mut chain = vec![upper];
            let mut prev = upper;
            for r in graph.rank[upper] + 1..graph.rank[lower] {
                let dummy = graph.push_virtual(r);
                graph.link(prev, dummy);
                chain.push(dummy);
                prev = dummy;
            }
            graph.link(prev, lower);
            chain.push(lower);
            graph.chains.push(Some(chain));
        }

        let layer_count = graph.rank.iter().max().map_or(0, |&r| r + 1);
        graph.layers = vec![Vec::new(); layer_count];
        graph.initial_order();
        graph
    }

    pub(crate) fn node_count(&self) -> usize {
        self.rank.len()
    }

    fn push_virtual(&mut self, rank: usize) -> usize {
        self.rank.push(rank);
        self.is_virtual.push(true);
        self.up.push(Vec::new());
        self.down.push(Vec::new());
        self.rank.len() - 1
    }

    fn link(&mut self, upper: usize, lower: usize) {
        self.down[upper].push(lower);
        self.up[lower].push(upper);
    }

    /// Depth-first order from the top rank down, visiting nodes in index order.
    fn initial_order(&mut self) {
        let mut visited = vec![false; self.node_count()];
        let mut starts: Vec<usize> = (0..self.node_count()).collect();
        starts.sort_by_key(|&v| self.rank[v]);

        for start in starts {
            let mut stack = vec![start];
            while let Some(v) = stack.pop() {
                if visited[v] {
                    continue;
                }
                visited[v] = true;
                self.layers[self.rank[v]].push(v);
                for &w in self.down[v].iter().rev() {
                    if !visited[w] {
                        stack.push(w);
                    }
                }
            }
        }
    }

    /// Index of every node within its layer.
    pub(crate) fn positions(&self) -> Vec<usize> {
        let mut pos = vec![0; self.node_count()];
        for layer in &self.layers {
            for (i, &v) in layer.iter().enumerate() {
                pos[v] = i;
            }
        }
        pos
    }

    pub(crate) fn total_crossings(&self) -> usize {
        let pos = self.positions();
        self.layers
            .windows(2)
            .map(|pair| self.crossings_between(&pair[0], pair[1].len(), &pos))
            .sum()
    }

    /// Count crossing segment pairs between a layer and the one below it by
    /// counting inversions with a Fenwick tree.
    fn crossings_between(&self, upper: &[usize], lower_len: usize, pos: &[usize]) -> usize {
        let mut segments: Vec<(usize, usize)> = upper
            .iter()
            .flat_map(|&u| self.down[u].iter().map(move |&v| (pos[u], pos[v])))
            .collect();
        segments.sort_unstable();

        let mut tree = vec![0usize; lower_len + 1];
        let mut inserted = 0;
        let mut crossings = 0;
        for (_, p) in segments {
            let mut i = p + 1;
            let mut at_or_before = 0;
            while i > 0 {
                at_or_before += tree[i];
                i &= i - 1;
            }
            crossings += inserted - at_or_before;

            let mut i = p + 1;
            while i <= lower_len {
                tree[i] += 1;
                i += i & i.wrapping_neg();
            }
            inserted += 1;
        }
        crossings
    }

    /// Reorder layers with the weighted median heuristic, alternating sweep
    /// direction, and keep the best ordering seen. Returns its crossing count.
    pub(crate) fn minimize_crossings(&mut self) -> usize {
        let mut best_layers = self.layers.clone();
        let mut best = self.total_crossings();
        let mut stale = 0;
        let mut sweep = 0;

        while best > 0 && stale < PATIENCE && sweep < MAX_SWEEPS {
            let downward = sweep % 2 == 0;
            self.median_sweep(downward);
            self.transpose();
            let crossings = self.total_crossings();
            tracing::trace!(sweep, downward, crossings, "crossing minimisation sweep");

            if crossings < best {
                best = crossings;
                best_layers = self.layers.clone();
                stale = 0;
            } else {
                stale += 1;
            }
            sweep += 1;
        }

        self.layers = best_layers;
        best
    }

    fn median_sweep(&mut self, downward: bool) {
        let layer_count = self.layers.len();
        if layer_count < 2 {
            return;
        }
        let ranks: Vec<usize> = if downward {
            (1..layer_count).collect()
        } else {
            (0..layer_count - 1).rev().collect()
        };

        for r in ranks {
            let pos = self.positions();
            let medians: Vec<Option<f64>> = self.layers[r]
                .iter()
                .map(|&v| {
                    let neighbours = if downward { &self.up[v] } else { &self.down[v] };
                    let mut ps: Vec<usize> = neighbours.iter().map(|&w| pos[w]).collect();
                    ps.sort_unstable();
                    median_value(&ps)
                })
                .collect();
            reorder(&mut self.layers[r], &medians);
        }
    }

    /// Swap adjacent nodes while that strictly lowers the crossings with
    /// both neighbouring layers.
    fn transpose(&mut self) {
        let mut improved = true;
        while improved {
            improved = false;
            for r in 0..self.layers.len() {
                for i in 1..self.layers[r].len() {
                    let pos = self.positions();
                    let v = self.layers[r][i - 1];
                    let w = self.layers[r][i];
                    let current = self.pair_crossings(v, w, &pos);
                    let swapped = self.pair_crossings(w, v, &pos);
                    if swapped < current {
                        self.layers[r].swap(i - 1, i);
                        improved = true;
                    }
                }
            }
        }
    }

    /// Crossings among the segments of `left` and `right` when `left` sits
    /// immediately before `right`.
    fn pair_crossings(&self, left: usize, right: usize, pos: &[usize]) -> usize {
        let count = |a: &[usize], b: &[usize]| {
            a.iter()
                .map(|&x| b.iter().filter(|&&y| pos[x] > pos[y]).count())
                .sum::<usize>()
        };
        count(&self.up[left], &self.up[right]) + count(&self.down[left], &self.down[right])
    }
}

/// Weighted median of sorted neighbour positions.
fn median_value(ps: &[usize]) -> Option<f64> {
    let len = ps.len();
    if len == 0 {
        return None;
    }
    let m = len / 2;
    if len % 2 == 1 {
        return Some(ps[m] as f64);
    }
    if len == 2 {
        return Some((ps[0] + ps[1]) as f64 / 2.0);
    }
    let left = (ps[m - 1] - ps[0]) as f64;
    let right = (ps[len - 1] - ps[m]) as f64;
    if left + right == 0.0 {
        return Some((ps[m - 1] + ps[m]) as f64 / 2.0);
    }
    Some((ps[m - 1] as f64 * right + ps[m] as f64 * left) / (left + right))
}

/// Stable sort of the nodes that have a median; the others keep their slot.
fn reorder(layer: &mut [usize], medians: &[Option<f64>]) {
    let mut movable: Vec<(f64, usize, usize)> = layer
        .iter()
        .enumerate()
        .filter_map(|(i, &v)| medians[i].map(|m| (m, i, v)))
        .collect();
    movable.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut sorted = movable.into_iter().map(|(_, _, v)| v);
    for (i, slot) in layer.iter_mut().enumerate() {
        if medians[i].is_some()
            && let Some(v) = sorted.next()
        {
            *slot = v;
        }
    }
}
