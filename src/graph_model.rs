use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use crate::display_width::split_label;
use crate::error::LayoutError;

pub type Attributes = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub attributes: Attributes,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Parsed graph: nodes in first-reference order, edges in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphModel {
    pub directed: bool,
    pub strict: bool,
    pub name: Option<String>,
    pub nodes: Vec<String>,
    pub edges: Vec<Edge>,
    pub node_attributes: HashMap<String, Attributes>,
    pub graph_attributes: Attributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeShape {
    #[default]
    Box,
    Ellipse,
    Circle,
    Diamond,
    Plain,
}

impl NodeShape {
    pub fn from_attr(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "ellipse" | "oval" => NodeShape::Ellipse,
            "circle" | "doublecircle" | "point" => NodeShape::Circle,
            "diamond" => NodeShape::Diamond,
            "plaintext" | "plain" | "none" => NodeShape::Plain,
            _ => NodeShape::Box,
        }
    }
}

impl GraphModel {
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            ..Self::default()
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n == id)
    }

    /// Returns `true` if the node was newly added.
    pub fn add_node(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains_node(&id) {
            return false;
        }
        self.nodes.push(id);
        true
    }

    /// Merge attributes into a node, creating it if needed.
    pub fn set_node_attributes(&mut self, id: &str, attributes: Attributes) {
        self.add_node(id);
        if attributes.is_empty() {
            return;
        }
        self.node_attributes
            .entry(id.to_string())
            .or_default()
            .extend(attributes);
    }

    /// Append an edge, implicitly creating both endpoints.
    pub fn add_edge(&mut self, edge: Edge) {
        self.add_node(edge.source.as_str());
        self.add_node(edge.target.as_str());
        self.edges.push(edge);
    }

    pub fn node_attr(&self, id: &str, key: &str) -> Option<&str> {
        self.node_attributes
            .get(id)
            .and_then(|attrs| attrs.get(key))
            .map(String::as_str)
    }

    pub fn graph_attr(&self, key: &str) -> Option<&str> {
        self.graph_attributes.get(key).map(String::as_str)
    }

    pub fn node_shape(&self, id: &str) -> NodeShape {
        self.node_attr(id, "shape")
            .map(NodeShape::from_attr)
            .unwrap_or_default()
    }

    /// Node label with `\N` and `\G` expanded; defaults to the node id.
    pub fn label(&self, id: &str) -> String {
        match self.node_attr(id, "label") {
            Some(label) => label
                .replace("\\N", id)
                .replace("\\G", self.name.as_deref().unwrap_or("")),
            None => id.to_string(),
        }
    }

    pub fn label_lines(&self, id: &str) -> Vec<String> {
        split_label(&self.label(id))
    }

    pub fn edge_label_lines(&self, edge: &Edge) -> Option<Vec<String>> {
        edge.attr("label")
            .filter(|l| !l.is_empty())
            .map(split_label)
    }

    /// Check that every edge endpoint is a known node.
    pub fn validate(&self) -> Result<(), LayoutError> {
        for edge in &self.edges {
            for id in [&edge.source, &edge.target] {
                if !self.contains_node(id) {
                    return Err(LayoutError::UnknownNode(id.clone()));
                }
            }
        }
        Ok(())
    }

    /// Canonical DOT text: graph attributes, then every node with its
    /// attributes, then every edge, all IDs quoted.
    ///
    /// An ID whose quoted spelling would be misread (a lone backslash before
    /// a quote, a line break or the end) is written in `<...>` form instead.
    /// If its angle brackets are also unbalanced it has no DOT spelling and
    /// does not survive a reparse.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        if self.strict {
            out.push_str("strict ");
        }
        out.push_str(if self.directed { "digraph" } else { "graph" });
        if let Some(name) = &self.name {
            let _ = write!(out, " {}", quote(name));
        }
        out.push_str(" {\n");

        for (key, value) in &self.graph_attributes {
            let _ = writeln!(out, "  {}={};", quote(key), quote(value));
        }

        for id in &self.nodes {
            match self.node_attributes.get(id) {
                Some(attrs) if !attrs.is_empty() => {
                    let _ = writeln!(out, "  {} {};", quote(id), attr_list(attrs));
                }
                _ => {
                    let _ = writeln!(out, "  {};", quote(id));
                }
            }
        }

        let op = if self.directed { "->" } else { "--" };
        for edge in &self.edges {
            let _ = write!(out, "  {} {op} {}", quote(&edge.source), quote(&edge.target));
            if !edge.attributes.is_empty() {
                let _ = write!(out, " {}", attr_list(&edge.attributes));
            }
            out.push_str(";\n");
        }

        out.push_str("}\n");
        out
    }
}

/// Quoted when the quoted spelling reads back unchanged, otherwise the
/// `<...>` form.
fn quote(id: &str) -> String {
    if !quotable(id) && balanced_angles(id) {
        return format!("<{id}>");
    }
    format!("\"{}\"", id.replace('"', "\\\""))
}

/// Inside DOT quotes a backslash swallows the next character, so an odd run
/// of backslashes must not meet a quote, a line break or the closing quote.
fn quotable(value: &str) -> bool {
    let mut run = 0usize;
    for c in value.chars() {
        match c {
            '\\' => run += 1,
            '"' | '\n' | '\r' if run % 2 == 1 => return false,
            _ => run = 0,
        }
    }
    run % 2 == 0
}

fn balanced_angles(value: &str) -> bool {
    let mut depth = 0usize;
    for c in value.chars() {
        match c {
            '<' => depth += 1,
            '>' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

fn attr_list(attrs: &Attributes) -> String {
    let items: Vec<String> = attrs
        .iter()
        .map(|(k, v)| format!("{}={}", quote(k), quote(v)))
        .collect();
    format!("[{}]", items.join(", "))
}
