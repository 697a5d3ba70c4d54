//! Layered (Sugiyama) layout.
//!
//! Stages run in order over index arrays: cycle removal, ranking, virtual
//! nodes and crossing minimisation, coordinate assignment, then edge routing
//! in final coordinates.

mod acyclic;
mod order;
mod position;
mod rank;
mod route;

use std::collections::HashMap;

use tracing::debug;

use crate::config::{LayoutConfig, RankDir};
use crate::error::LayoutError;
use crate::graph_model::{Attributes, GraphModel, NodeShape};

use order::LayeredGraph;
use position::Spacing;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }
}

/// Axis-aligned rectangle given by its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Interiors intersect; touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    fn include(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    fn include_rect(&mut self, r: &Rect) {
        self.include(Point::new(r.x, r.y));
        self.include(Point::new(r.right(), r.bottom()));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub rect: Rect,
    pub rank: usize,
    /// Position within the rank after crossing minimisation.
    pub order: usize,
    pub label_lines: Vec<String>,
    pub shape: NodeShape,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Arrowhead {
    pub position: Point,
    /// Degrees, clockwise from +x in screen coordinates.
    pub angle: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabelLayout {
    pub lines: Vec<String>,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLayout {
    pub source: String,
    pub target: String,
    /// Route from the source outline to the target outline.
    pub points: Vec<Point>,
    pub arrowhead: Arrowhead,
    pub label: Option<EdgeLabelLayout>,
    /// The edge was turned around to break a cycle while ranking.
    pub reversed: bool,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub bounding_box: BoundingBox,
    pub rank_dir: RankDir,
    /// Edge crossings left after ordering, counted between adjacent ranks.
    pub crossings: usize,
    pub directed: bool,
}

impl LayoutResult {
    fn empty(model: &GraphModel, config: &LayoutConfig) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            bounding_box: BoundingBox::default(),
            rank_dir: config.rank_dir,
            crossings: 0,
            directed: model.directed,
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn width(&self) -> f64 {
        self.bounding_box.width()
    }

    pub fn height(&self) -> f64 {
        self.bounding_box.height()
    }
}

/// Lay out `model`. `sizer` gives the outer width and height of each node
/// from its id and label lines.
pub fn layout<F>(
    model: &GraphModel,
    config: &LayoutConfig,
    sizer: F,
) -> Result<LayoutResult, LayoutError>
where
    F: Fn(&str, &[String]) -> (f64, f64),
{
    model.validate()?;
    if model.is_empty() {
        return Ok(LayoutResult::empty(model, config));
    }

    let n = model.node_count();
    let horizontal = config.rank_dir.is_horizontal();
    let index: HashMap<&str, usize> = model
        .nodes
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let lookup = |id: &str| {
        index
            .get(id)
            .copied()
            .ok_or_else(|| LayoutError::UnknownNode(id.to_string()))
    };

    let labels: Vec<Vec<String>> = model.nodes.iter().map(|id| model.label_lines(id)).collect();
    let mut sizes = Vec::with_capacity(n);
    for (id, lines) in model.nodes.iter().zip(&labels) {
        let (w, h) = sizer(id, lines);
        if !(w.is_finite() && h.is_finite() && w >= 0.0 && h >= 0.0) {
            return Err(LayoutError::InvalidNodeSize { id: id.clone() });
        }
        sizes.push((w, h));
    }

    let pairs = model
        .edges
        .iter()
        .map(|e| Ok((lookup(&e.source)?, lookup(&e.target)?)))
        .collect::<Result<Vec<_>, LayoutError>>()?;

    let reversed = acyclic::feedback_edges(n, &pairs);
    let oriented: Vec<Option<(usize, usize)>> = pairs
        .iter()
        .zip(&reversed)
        .map(|(&(u, v), &flip)| match (u == v, flip) {
            (true, _) => None,
            (false, true) => Some((v, u)),
            (false, false) => Some((u, v)),
        })
        .collect();
    let rank_edges: Vec<rank::RankEdge> = oriented
        .iter()
        .zip(&model.edges)
        .filter_map(|(pair, edge)| pair.map(|(u, v)| (u, v, min_len(edge.attr("minlen")))))
        .collect();
    let ranks = rank::assign_ranks(n, &rank_edges);

    let mut layered = LayeredGraph::new(&ranks, &oriented);
    let crossings = layered.minimize_crossings();
    debug!(
        nodes = n,
        virtual_nodes = layered.node_count() - n,
        ranks = layered.layers.len(),
        crossings,
        "ordered layers"
    );

    // Rank space: breadth runs along a layer, depth along the rank axis.
    let (breadths, depths): (Vec<f64>, Vec<f64>) = (0..layered.node_count())
        .map(|v| match sizes.get(v) {
            Some(&(w, h)) if horizontal => (h, w),
            Some(&(w, h)) => (w, h),
            None => (0.0, 0.0),
        })
        .unzip();
    let spacing = Spacing {
        node_sep: config.node_sep,
        edge_sep: config.edge_sep,
    };
    let xs = position::assign_x(&layered, &breadths, spacing);
    let ys = position::assign_y(&layered, &depths, config.rank_sep);
    let place = |v: usize| to_screen(config.rank_dir, xs[v], ys[v]);

    let order = layered.positions();
    let mut nodes: Vec<NodeLayout> = model
        .nodes
        .iter()
        .enumerate()
        .map(|(v, id)| NodeLayout {
            id: id.clone(),
            rect: Rect::centered(place(v), sizes[v].0, sizes[v].1),
            rank: ranks[v],
            order: order[v],
            label_lines: labels[v].clone(),
            shape: model.node_shape(id),
            attributes: model.node_attributes.get(id).cloned().unwrap_or_default(),
        })
        .collect();

    let parallel = parallel_offsets(&layered, &oriented, config.edge_sep);
    let mut loops_seen = vec![0usize; n];
    let mut edges = Vec::with_capacity(model.edge_count());
    for (i, edge) in model.edges.iter().enumerate() {
        let (u, v) = pairs[i];
        let source = &nodes[u];
        let target = &nodes[v];

        let points = match &layered.chains[i] {
            None => {
                let nth = loops_seen[u];
                loops_seen[u] += 1;
                route::self_loop(&source.rect, config.rank_dir, nth)
            }
            Some(chain) => {
                let mut centres: Vec<(f64, f64)> = chain.iter().map(|&w| (xs[w], ys[w])).collect();
                if parallel[i] != 0.0 && centres.len() == 2 {
                    let (a, b) = (centres[0], centres[1]);
                    centres.insert(1, ((a.0 + b.0) / 2.0 + parallel[i], (a.1 + b.1) / 2.0));
                }
                if reversed[i] {
                    centres.reverse();
                }
                let mut points: Vec<Point> = centres
                    .into_iter()
                    .map(|(x, y)| to_screen(config.rank_dir, x, y))
                    .collect();
                route::clip_ends(
                    &mut points,
                    (&source.rect, source.shape),
                    (&target.rect, target.shape),
                );
                points
            }
        };

        let label = model.edge_label_lines(edge).map(|lines| {
            let (w, h) = config.text.text_size(&lines);
            let rect = Rect::centered(
                route::midpoint(&points),
                w + config.text.padding_x,
                h + config.text.padding_y,
            );
            EdgeLabelLayout { lines, rect }
        });

        edges.push(EdgeLayout {
            source: edge.source.clone(),
            target: edge.target.clone(),
            arrowhead: route::arrowhead(&points),
            points,
            label,
            reversed: reversed[i],
            attributes: edge.attributes.clone(),
        });
    }

    let bounding_box = normalize(&mut nodes, &mut edges, config.margin);
    debug!(
        edges = edges.len(),
        width = bounding_box.width(),
        height = bounding_box.height(),
        "layout complete"
    );

    Ok(LayoutResult {
        nodes,
        edges,
        bounding_box,
        rank_dir: config.rank_dir,
        crossings,
        directed: model.directed,
    })
}

/// Largest rank span an edge may demand; each extra rank costs a virtual node.
const MAX_MINLEN: usize = 100;

fn min_len(value: Option<&str>) -> usize {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_MINLEN)
}

fn to_screen(rank_dir: RankDir, x: f64, y: f64) -> Point {
    match rank_dir {
        RankDir::TopBottom => Point::new(x, y),
        RankDir::BottomTop => Point::new(x, -y),
        RankDir::LeftRight => Point::new(y, x),
        RankDir::RightLeft => Point::new(-y, x),
    }
}

/// Perpendicular offset per edge for edges that share both endpoints and
/// join adjacent ranks, spread symmetrically `edge_sep` apart.
fn parallel_offsets(
    layered: &LayeredGraph,
    oriented: &[Option<(usize, usize)>],
    edge_sep: f64,
) -> Vec<f64> {
    let short = |i: usize| layered.chains[i].as_ref().is_some_and(|c| c.len() == 2);
    let mut groups: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (i, pair) in oriented.iter().enumerate() {
        if let Some(pair) = *pair
            && short(i)
        {
            groups.entry(pair).or_default().push(i);
        }
    }

    let mut offsets = vec![0.0; oriented.len()];
    for members in groups.values() {
        let centre = (members.len() - 1) as f64 / 2.0;
        for (k, &i) in members.iter().enumerate() {
            offsets[i] = (k as f64 - centre) * edge_sep;
        }
    }
    offsets
}

/// Shift everything so the drawing starts at `margin` and return the
/// bounding box, which spans from the origin.
fn normalize(nodes: &mut [NodeLayout], edges: &mut [EdgeLayout], margin: f64) -> BoundingBox {
    let mut bounds = BoundingBox {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };
    for node in nodes.iter() {
        bounds.include_rect(&node.rect);
    }
    for edge in edges.iter() {
        for &p in &edge.points {
            bounds.include(p);
        }
        if let Some(label) = &edge.label {
            bounds.include_rect(&label.rect);
        }
    }

    let dx = margin - bounds.min_x;
    let dy = margin - bounds.min_y;
    for node in nodes.iter_mut() {
        node.rect.translate(dx, dy);
    }
    for edge in edges.iter_mut() {
        for p in &mut edge.points {
            p.translate(dx, dy);
        }
        edge.arrowhead.position.translate(dx, dy);
        if let Some(label) = &mut edge.label {
            label.rect.translate(dx, dy);
        }
    }

    BoundingBox {
        min_x: 0.0,
        min_y: 0.0,
        max_x: bounds.width() + 2.0 * margin,
        max_y: bounds.height() + 2.0 * margin,
    }
}
