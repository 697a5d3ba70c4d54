use crate::config::TextMetrics;
use crate::graph_layout::{EdgeLayout, LayoutResult, NodeLayout, Point};
use crate::graph_model::{Attributes, NodeShape};
use crate::scene::{Element, Marker, MarkerKind, SceneContainer, Style, VectorScene};

const NODE_FILL: &str = "#fff";
const FILLED_DEFAULT: &str = "lightgrey";
const LINE_COLOR: &str = "#333";
const TEXT_COLOR: &str = "#000";
const ROUNDED_RADIUS: f64 = 5.0;

pub fn render(layout: &LayoutResult) -> VectorScene {
    render_with_metrics(layout, &TextMetrics::default())
}

/// Build the scene: edge paths first, then edge labels, then nodes on top.
pub fn render_with_metrics(layout: &LayoutResult, metrics: &TextMetrics) -> VectorScene {
    let mut scene = VectorScene::new(layout.bounding_box);

    let mut paths = Vec::with_capacity(layout.edges.len());
    let mut labels = Vec::new();
    for edge in &layout.edges {
        let visual = Visual::from_attributes(&edge.attributes);
        if visual.invisible {
            continue;
        }
        let marker = marker_kind(edge).map(|kind| marker_id(&mut scene.markers, kind, &visual.stroke));
        paths.push(Element::Path {
            points: edge.points.clone(),
            style: visual.line_style(),
            marker_end: marker,
        });
        if let Some(label) = &edge.label {
            labels.push(text(label.rect.center(), &label.lines, metrics, &visual.font_color));
        }
    }

    let nodes = layout
        .nodes
        .iter()
        .filter_map(|node| draw_node(node, metrics))
        .collect();

    scene.root = Element::group(
        "output",
        None,
        vec![
            Element::group("edgePaths", None, paths),
            Element::group("edgeLabels", None, labels),
            Element::group("nodes", None, nodes),
        ],
    );
    scene
}

/// Render into `container`, replacing whatever it held. Returns the old scene.
pub fn render_into(container: &mut SceneContainer, layout: &LayoutResult) -> Option<VectorScene> {
    render_into_with_metrics(container, layout, &TextMetrics::default())
}

pub fn render_into_with_metrics(
    container: &mut SceneContainer,
    layout: &LayoutResult,
    metrics: &TextMetrics,
) -> Option<VectorScene> {
    container.mount(render_with_metrics(layout, metrics))
}

fn draw_node(node: &NodeLayout, metrics: &TextMetrics) -> Option<Element> {
    let visual = Visual::from_attributes(&node.attributes);
    if visual.invisible {
        return None;
    }
    let style = visual.shape_style();
    let rect = node.rect;
    let center = rect.center();

    let mut children = Vec::with_capacity(2);
    match node.shape {
        NodeShape::Box => children.push(Element::Rect {
            rect,
            corner_radius: if visual.rounded { ROUNDED_RADIUS } else { 0.0 },
            style,
        }),
        NodeShape::Ellipse => children.push(Element::Ellipse {
            center,
            rx: rect.width / 2.0,
            ry: rect.height / 2.0,
            style,
        }),
        NodeShape::Circle => {
            let r = rect.width.min(rect.height) / 2.0;
            children.push(Element::Ellipse {
                center,
                rx: r,
                ry: r,
                style,
            });
        }
        NodeShape::Diamond => children.push(Element::Polygon {
            points: vec![
                Point::new(center.x, rect.y),
                Point::new(rect.right(), center.y),
                Point::new(center.x, rect.bottom()),
                Point::new(rect.x, center.y),
            ],
            style,
        }),
        NodeShape::Plain => {}
    }
    children.push(text(center, &node.label_lines, metrics, &visual.font_color));

    Some(Element::group("node", Some(format!("node-{}", node.id)), children))
}

fn text(center: Point, lines: &[String], metrics: &TextMetrics, color: &str) -> Element {
    Element::Text {
        center,
        lines: lines.to_vec(),
        font_size: metrics.font_size,
        line_height: metrics.line_height,
        color: color.to_string(),
    }
}

fn marker_kind(edge: &EdgeLayout) -> Option<MarkerKind> {
    if edge.attributes.get("dir").is_some_and(|d| d == "none") {
        return None;
    }
    match edge.attributes.get("arrowhead").map(String::as_str) {
        Some("none" | "undirected") => None,
        Some("vee") => Some(MarkerKind::Vee),
        _ => Some(MarkerKind::Normal),
    }
}

/// Id of the marker for `kind` in `color`, defining it on first use.
fn marker_id(markers: &mut Vec<Marker>, kind: MarkerKind, color: &str) -> String {
    if let Some(existing) = markers.iter().find(|m| m.kind == kind && m.color == color) {
        return existing.id.clone();
    }
    let name = match kind {
        MarkerKind::Normal => "normal",
        MarkerKind::Vee => "vee",
    };
    let id = format!("arrowhead-{name}-{}", markers.len());
    markers.push(Marker {
        id: id.clone(),
        kind,
        color: color.to_string(),
    });
    id
}

/// Styling read from `color`, `fillcolor`, `fontcolor`, `penwidth` and `style`.
struct Visual {
    stroke: String,
    fill: String,
    font_color: String,
    stroke_width: f64,
    dash: Option<String>,
    rounded: bool,
    invisible: bool,
}

impl Visual {
    fn from_attributes(attrs: &Attributes) -> Self {
        let get = |key: &str| attrs.get(key).map(String::as_str).filter(|v| !v.is_empty());
        let styles: Vec<&str> = get("style")
            .map(|s| s.split(',').map(str::trim).collect())
            .unwrap_or_default();
        let has = |name: &str| styles.iter().any(|s| s.eq_ignore_ascii_case(name));

        let stroke = get("color").unwrap_or(LINE_COLOR).to_string();
        let fill = if has("filled") {
            get("fillcolor").or(get("color")).unwrap_or(FILLED_DEFAULT)
        } else {
            get("fillcolor").unwrap_or(NODE_FILL)
        };
        let mut stroke_width = get("penwidth")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|w| w.is_finite() && *w >= 0.0)
            .unwrap_or(1.5);
        if has("bold") {
            stroke_width *= 2.0;
        }
        let dash = if has("dashed") {
            Some("5,2".to_string())
        } else if has("dotted") {
            Some("1,3".to_string())
        } else {
            None
        };

        Self {
            stroke,
            fill: fill.to_string(),
            font_color: get("fontcolor").unwrap_or(TEXT_COLOR).to_string(),
            stroke_width,
            dash,
            rounded: has("rounded"),
            invisible: has("invis"),
        }
    }

    fn shape_style(&self) -> Style {
        Style {
            fill: self.fill.clone(),
            stroke: self.stroke.clone(),
            stroke_width: self.stroke_width,
            dash: self.dash.clone(),
        }
    }

    fn line_style(&self) -> Style {
        Style {
            fill: "none".to_string(),
            ..self.shape_style()
        }
    }
}
