//! Layout spacing and text metrics.
//!
//! Precedence is command line, then graph attributes, then the defaults below.

use std::f64::consts::SQRT_2;
use std::str::FromStr;

use tracing::warn;

use crate::display_width::multiline_width;
use crate::graph_model::{GraphModel, NodeShape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankDir {
    #[default]
    TopBottom,
    BottomTop,
    LeftRight,
    RightLeft,
}

impl RankDir {
    pub fn is_horizontal(self) -> bool {
        matches!(self, RankDir::LeftRight | RankDir::RightLeft)
    }
}

impl FromStr for RankDir {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TB" | "TD" => Ok(RankDir::TopBottom),
            "BT" => Ok(RankDir::BottomTop),
            "LR" => Ok(RankDir::LeftRight),
            "RL" => Ok(RankDir::RightLeft),
            other => Err(format!("unknown rank direction '{other}'; use TB, BT, LR or RL")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub rank_dir: RankDir,
    /// Gap between neighbouring nodes within a rank.
    pub node_sep: f64,
    /// Gap between consecutive ranks.
    pub rank_sep: f64,
    /// Gap between neighbouring edge bends within a rank.
    pub edge_sep: f64,
    /// Padding added around the bounding box.
    pub margin: f64,
    /// Metrics used to size edge labels.
    pub text: TextMetrics,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_dir: RankDir::TopBottom,
            node_sep: 50.0,
            rank_sep: 50.0,
            edge_sep: 20.0,
            margin: 20.0,
            text: TextMetrics::default(),
        }
    }
}

impl LayoutConfig {
    pub fn from_graph(model: &GraphModel) -> Self {
        let mut config = Self::default();
        config.apply_graph_attributes(model);
        config
    }

    /// Overlay `rankdir`, `nodesep`, `ranksep`, `edgesep` and `margin`.
    /// Unknown directions and negative or unparsable numbers are ignored.
    pub fn apply_graph_attributes(&mut self, model: &GraphModel) {
        if let Some(dir) = model.graph_attr("rankdir").and_then(|v| v.parse().ok()) {
            self.rank_dir = dir;
        }
        for (key, slot) in [
            ("nodesep", &mut self.node_sep),
            ("ranksep", &mut self.rank_sep),
            ("edgesep", &mut self.edge_sep),
            ("margin", &mut self.margin),
        ] {
            if let Some(value) = model.graph_attr(key).and_then(parse_length) {
                *slot = value;
            }
        }
    }
}

/// Settings supplied from outside the graph text, such as command-line
/// flags. They win over graph attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub rank_dir: Option<RankDir>,
    pub node_sep: Option<f64>,
    pub rank_sep: Option<f64>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut LayoutConfig) {
        if let Some(dir) = self.rank_dir {
            config.rank_dir = dir;
        }
        for (setting, value, slot) in [
            ("nodesep", self.node_sep, &mut config.node_sep),
            ("ranksep", self.rank_sep, &mut config.rank_sep),
        ] {
            match value {
                Some(sep) if is_length(sep) => *slot = sep,
                Some(sep) => warn!(setting, value = sep, "ignoring invalid separation override"),
                None => {}
            }
        }
    }

    /// Defaults, then the graph's own attributes, then these overrides.
    pub fn resolve(&self, model: &GraphModel) -> LayoutConfig {
        let mut config = LayoutConfig::from_graph(model);
        self.apply(&mut config);
        config
    }
}

fn parse_length(value: &str) -> Option<f64> {
    // graphviz allows "0.5 equally" for ranksep; only the number matters here
    let number = value.split_whitespace().next()?;
    number
        .parse::<f64>()
        .ok()
        .filter(|v| is_length(*v))
}

fn is_length(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextMetrics {
    pub font_size: f64,
    /// Advance of one display column.
    pub char_width: f64,
    pub line_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            char_width: 8.0,
            line_height: 18.0,
            padding_x: 10.0,
            padding_y: 10.0,
        }
    }
}

impl TextMetrics {
    pub fn text_size(&self, lines: &[String]) -> (f64, f64) {
        let width = multiline_width(lines) as f64 * self.char_width;
        let height = lines.len().max(1) as f64 * self.line_height;
        (width, height)
    }

    /// Outer size of a node drawn with `shape` around `lines`.
    pub fn node_size(&self, lines: &[String], shape: NodeShape) -> (f64, f64) {
        let (text_w, text_h) = self.text_size(lines);
        let w = text_w + 2.0 * self.padding_x;
        let h = text_h + 2.0 * self.padding_y;
        match shape {
            NodeShape::Box | NodeShape::Ellipse | NodeShape::Plain => (w, h),
            NodeShape::Circle => {
                let d = w.max(h);
                (d, d)
            }
            NodeShape::Diamond => (w * SQRT_2, h * SQRT_2),
        }
    }
}
