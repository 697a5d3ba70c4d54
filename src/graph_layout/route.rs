//! Edge geometry in final coordinates: boundary clipping, self-loops,
//! arrowheads and label anchors.

use super::{Arrowhead, Point, Rect};
use crate::config::RankDir;
use crate::graph_model::NodeShape;

/// How far a self-loop reaches out of its node.
pub(crate) const LOOP_EXTENT: f64 = 20.0;

/// Where the segment from the centre of `rect` toward `toward` leaves the
/// node outline.
pub(crate) fn clip(rect: &Rect, shape: NodeShape, toward: Point) -> Point {
    let c = rect.center();
    let dx = toward.x - c.x;
    let dy = toward.y - c.y;
    if dx == 0.0 && dy == 0.0 {
        return c;
    }
    let hw = rect.width / 2.0;
    let hh = rect.height / 2.0;

    match shape {
        NodeShape::Box | NodeShape::Plain => {
            let (sx, sy) = if dy.abs() * hw > dx.abs() * hh {
                let h = if dy < 0.0 { -hh } else { hh };
                (h * dx / dy, h)
            } else {
                let w = if dx < 0.0 { -hw } else { hw };
                (w, w * dy / dx)
            };
            Point::new(c.x + sx, c.y + sy)
        }
        NodeShape::Ellipse | NodeShape::Circle => {
            let (rx, ry) = if shape == NodeShape::Circle {
                let r = hw.min(hh);
                (r, r)
            } else {
                (hw, hh)
            };
            if rx == 0.0 || ry == 0.0 {
                return c;
            }
            let t = 1.0 / ((dx / rx).powi(2) + (dy / ry).powi(2)).sqrt();
            Point::new(c.x + t * dx, c.y + t * dy)
        }
        NodeShape::Diamond => {
            if hw == 0.0 || hh == 0.0 {
                return c;
            }
            let t = 1.0 / (dx.abs() / hw + dy.abs() / hh);
            Point::new(c.x + t * dx, c.y + t * dy)
        }
    }
}

/// Replace the two ends of a centre-to-centre polyline with the points where
/// it crosses the source and target outlines.
pub(crate) fn clip_ends(
    points: &mut [Point],
    source: (&Rect, NodeShape),
    target: (&Rect, NodeShape),
) {
    let n = points.len();
    if n < 2 {
        return;
    }
    points[0] = clip(source.0, source.1, points[1]);
    points[n - 1] = clip(target.0, target.1, points[n - 2]);
}

/// A loop leaving and re-entering the same node. TB/BT loops hang off the
/// right side, LR/RL loops off the bottom; `nth` stacks repeated loops.
pub(crate) fn self_loop(rect: &Rect, rank_dir: RankDir, nth: usize) -> Vec<Point> {
    let c = rect.center();
    let reach = LOOP_EXTENT * (nth + 1) as f64;
    if rank_dir.is_horizontal() {
        let q = rect.width / 4.0;
        let bottom = rect.bottom();
        vec![
            Point::new(c.x - q, bottom),
            Point::new(c.x - q, bottom + reach),
            Point::new(c.x + q, bottom + reach),
            Point::new(c.x + q, bottom),
        ]
    } else {
        let q = rect.height / 4.0;
        let right = rect.right();
        vec![
            Point::new(right, c.y - q),
            Point::new(right + reach, c.y - q),
            Point::new(right + reach, c.y + q),
            Point::new(right, c.y + q),
        ]
    }
}

/// Arrowhead at the end of the route, pointing along its last
/// non-degenerate segment. The angle is in degrees, clockwise from +x.
pub(crate) fn arrowhead(points: &[Point]) -> Arrowhead {
    let Some(&tip) = points.last() else {
        return Arrowhead::default();
    };
    let angle = points
        .iter()
        .rev()
        .skip(1)
        .find(|p| p.x != tip.x || p.y != tip.y)
        .map_or(0.0, |p| (tip.y - p.y).atan2(tip.x - p.x).to_degrees());
    Arrowhead {
        position: tip,
        angle,
    }
}

/// Point halfway along the polyline by arc length.
pub(crate) fn midpoint(points: &[Point]) -> Point {
    let lengths: Vec<f64> = points.windows(2).map(|s| s[0].distance(s[1])).collect();
    let total: f64 = lengths.iter().sum();
    if total == 0.0 {
        return points.first().copied().unwrap_or_default();
    }

    let mut remaining = total / 2.0;
    for (segment, &len) in points.windows(2).zip(&lengths) {
        if remaining <= len && len > 0.0 {
            let t = remaining / len;
            let (a, b) = (segment[0], segment[1]);
            return Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y));
        }
        remaining -= len;
    }
    points.last().copied().unwrap_or_default()
}
