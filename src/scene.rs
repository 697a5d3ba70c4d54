//! Drawable primitives and their SVG serialisation.

use std::fmt::Write as _;

use crate::graph_layout::{BoundingBox, Point};

pub const DEFAULT_ANCHOR: &str = "graph-container";
const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";

#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub dash: Option<String>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: "none".to_string(),
            stroke: "#333".to_string(),
            stroke_width: 1.5,
            dash: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Filled triangle.
    Normal,
    /// Open chevron.
    Vee,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: String,
    pub kind: MarkerKind,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Group {
        id: Option<String>,
        class: String,
        children: Vec<Element>,
    },
    Rect {
        rect: crate::graph_layout::Rect,
        corner_radius: f64,
        style: Style,
    },
    Ellipse {
        center: Point,
        rx: f64,
        ry: f64,
        style: Style,
    },
    Polygon {
        points: Vec<Point>,
        style: Style,
    },
    Path {
        points: Vec<Point>,
        style: Style,
        marker_end: Option<String>,
    },
    /// Lines centred on `center`, one `tspan` each.
    Text {
        center: Point,
        lines: Vec<String>,
        font_size: f64,
        line_height: f64,
        color: String,
    },
}

impl Element {
    pub fn group(class: &str, id: Option<String>, children: Vec<Element>) -> Self {
        Element::Group {
            id,
            class: class.to_string(),
            children,
        }
    }

    /// Number of elements in this subtree, this one included.
    pub fn count(&self) -> usize {
        match self {
            Element::Group { children, .. } => 1 + children.iter().map(Element::count).sum::<usize>(),
            _ => 1,
        }
    }

    fn write_svg(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match self {
            Element::Group {
                id,
                class,
                children,
            } => {
                let _ = write!(out, "{indent}<g class=\"{}\"", escape(class));
                if let Some(id) = id {
                    let _ = write!(out, " id=\"{}\"", escape(id));
                }
                if children.is_empty() {
                    out.push_str("/>\n");
                    return;
                }
                out.push_str(">\n");
                for child in children {
                    child.write_svg(out, depth + 1);
                }
                let _ = writeln!(out, "{indent}</g>");
            }
            Element::Rect {
                rect,
                corner_radius,
                style,
            } => {
                let _ = write!(
                    out,
                    "{indent}<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"",
                    num(rect.x),
                    num(rect.y),
                    num(rect.width),
                    num(rect.height)
                );
                if *corner_radius > 0.0 {
                    let r = num(*corner_radius);
                    let _ = write!(out, " rx=\"{r}\" ry=\"{r}\"");
                }
                let _ = writeln!(out, "{}/>", style_attrs(style));
            }
            Element::Ellipse {
                center,
                rx,
                ry,
                style,
            } => {
                let _ = writeln!(
                    out,
                    "{indent}<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\"{}/>",
                    num(center.x),
                    num(center.y),
                    num(*rx),
                    num(*ry),
                    style_attrs(style)
                );
            }
            Element::Polygon { points, style } => {
                let _ = writeln!(
                    out,
                    "{indent}<polygon points=\"{}\"{}/>",
                    point_list(points),
                    style_attrs(style)
                );
            }
            Element::Path {
                points,
                style,
                marker_end,
            } => {
                let _ = write!(
                    out,
                    "{indent}<path d=\"{}\"{}",
                    path_data(points),
                    style_attrs(style)
                );
                if let Some(marker) = marker_end {
                    let _ = write!(out, " marker-end=\"url(#{})\"", escape(marker));
                }
                out.push_str("/>\n");
            }
            Element::Text {
                center,
                lines,
                font_size,
                line_height,
                color,
            } => {
                let _ = write!(
                    out,
                    "{indent}<text text-anchor=\"middle\" dominant-baseline=\"central\" \
                     font-family=\"{FONT_FAMILY}\" font-size=\"{}\" fill=\"{}\">",
                    num(*font_size),
                    escape(color)
                );
                let first = center.y - (lines.len().saturating_sub(1)) as f64 * line_height / 2.0;
                for (i, line) in lines.iter().enumerate() {
                    let _ = write!(
                        out,
                        "<tspan x=\"{}\" y=\"{}\">{}</tspan>",
                        num(center.x),
                        num(first + i as f64 * line_height),
                        escape(line)
                    );
                }
                out.push_str("</text>\n");
            }
        }
    }
}

/// A complete drawing: canvas size, arrowhead markers and one root group.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorScene {
    pub anchor: String,
    pub width: f64,
    pub height: f64,
    pub view_box: BoundingBox,
    pub markers: Vec<Marker>,
    pub root: Element,
}

impl VectorScene {
    pub fn new(view_box: BoundingBox) -> Self {
        Self {
            anchor: DEFAULT_ANCHOR.to_string(),
            width: view_box.width(),
            height: view_box.height(),
            view_box,
            markers: Vec::new(),
            root: Element::group("output", None, Vec::new()),
        }
    }

    pub fn element_count(&self) -> usize {
        self.root.count()
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" id=\"{}\" width=\"{}\" height=\"{}\" viewBox=\"{} {} {} {}\">",
            escape(&self.anchor),
            num(self.width),
            num(self.height),
            num(self.view_box.min_x),
            num(self.view_box.min_y),
            num(self.view_box.width()),
            num(self.view_box.height())
        );
        out.push_str("  <defs>\n");
        for marker in &self.markers {
            write_marker(&mut out, marker);
        }
        out.push_str("  </defs>\n");
        self.root.write_svg(&mut out, 1);
        out.push_str("</svg>\n");
        out
    }
}

fn write_marker(out: &mut String, marker: &Marker) {
    let _ = write!(
        out,
        "    <marker id=\"{}\" viewBox=\"0 0 10 10\" refX=\"9\" refY=\"5\" \
         markerUnits=\"strokeWidth\" markerWidth=\"8\" markerHeight=\"6\" orient=\"auto\">",
        escape(&marker.id)
    );
    let color = escape(&marker.color);
    match marker.kind {
        MarkerKind::Normal => {
            let _ = write!(
                out,
                "<path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{color}\" stroke=\"none\"/>"
            );
        }
        MarkerKind::Vee => {
            let _ = write!(
                out,
                "<path d=\"M 0 0 L 10 5 L 0 10\" fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\"/>"
            );
        }
    }
    out.push_str("</marker>\n");
}

/// The mount target. Holds at most one scene; mounting replaces it.
#[derive(Debug, Default)]
pub struct SceneContainer {
    scene: Option<VectorScene>,
}

impl SceneContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `scene`, handing back the one it replaces.
    pub fn mount(&mut self, scene: VectorScene) -> Option<VectorScene> {
        self.scene.replace(scene)
    }

    pub fn clear(&mut self) -> Option<VectorScene> {
        self.scene.take()
    }

    pub fn scene(&self) -> Option<&VectorScene> {
        self.scene.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.scene.is_none()
    }
}

fn style_attrs(style: &Style) -> String {
    let mut attrs = format!(
        " fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"",
        escape(&style.fill),
        escape(&style.stroke),
        num(style.stroke_width)
    );
    if let Some(dash) = &style.dash {
        let _ = write!(attrs, " stroke-dasharray=\"{}\"", escape(dash));
    }
    attrs
}

fn point_list(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", num(p.x), num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn path_data(points: &[Point]) -> String {
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        if i > 0 {
            d.push(' ');
        }
        let _ = write!(d, "{cmd}{},{}", num(p.x), num(p.y));
    }
    d
}

/// Coordinates with at most two decimals and no trailing zeros.
pub(crate) fn num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{rounded:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub(crate) fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
