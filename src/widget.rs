//! Dashboard widget adapter.
//!
//! Pulls the DOT text out of the first data row, runs the pipeline and keeps
//! the resulting scene mounted in its host element. Every failure ends in the
//! same placeholder; nothing propagates to the caller.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::ConfigOverrides;
use crate::error::{ConfigurationError, Error};
use crate::run_pipeline;
use crate::scene::{self, DEFAULT_ANCHOR, SceneContainer, VectorScene};

pub const PLACEHOLDER_MESSAGE: &str = "Invalid spec for graph";

/// Widget configuration as stored by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDisplay {
    #[serde(default)]
    pub dot_column: Option<String>,
}

/// One row of tabular data, column name to value.
pub type DataRow = Map<String, Value>;

/// The DOT text for one render cycle and the column it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub dot: String,
    pub column: String,
}

/// Read the DOT text from `rows[0][dot_column]`. Later rows are ignored.
pub fn display_to_graph(
    display: &GraphDisplay,
    rows: &[DataRow],
) -> Result<RenderRequest, ConfigurationError> {
    let column = display
        .dot_column
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or(ConfigurationError::MissingColumn)?;
    let row = rows.first().ok_or(ConfigurationError::NoRows)?;
    let value = row
        .get(column)
        .ok_or_else(|| ConfigurationError::MissingValue(column.to_string()))?;
    let dot = value
        .as_str()
        .ok_or_else(|| ConfigurationError::NotText(column.to_string()))?;
    if dot.trim().is_empty() {
        return Err(ConfigurationError::EmptyDot);
    }
    Ok(RenderRequest {
        dot: dot.to_string(),
        column: column.to_string(),
    })
}

/// Space the responsive container reports as available.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

/// The element the widget draws into.
#[derive(Debug)]
pub struct HostElement {
    pub anchor: String,
    pub available: ContainerSize,
    /// Natural size of the current diagram; zero while showing the placeholder.
    pub width: f64,
    pub height: f64,
    pub container: SceneContainer,
}

impl HostElement {
    pub fn new(anchor: impl Into<String>, available: ContainerSize) -> Self {
        Self {
            anchor: anchor.into(),
            available,
            width: 0.0,
            height: 0.0,
            container: SceneContainer::new(),
        }
    }
}

impl Default for HostElement {
    fn default() -> Self {
        Self::new(DEFAULT_ANCHOR, ContainerSize::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidgetOutput {
    Graph { width: f64, height: f64 },
    Placeholder,
}

impl WidgetOutput {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, WidgetOutput::Placeholder)
    }

    /// Markup for the host: the diagram at its natural size inside a
    /// scrolling wrapper of the available size, or the placeholder text.
    pub fn to_html(&self, host: &HostElement) -> String {
        let (WidgetOutput::Graph { width, height }, Some(drawing)) = (self, host.container.scene())
        else {
            return placeholder_html();
        };

        let mut html = String::new();
        let _ = write!(
            html,
            "<div class=\"graph-widget\" style=\"width: {}px; height: {}px; overflow: auto;\">",
            scene::num(host.available.width),
            scene::num(host.available.height)
        );
        let _ = write!(
            html,
            "<div class=\"graph-content\" style=\"width: {}px; height: {}px;\">",
            scene::num(*width),
            scene::num(*height)
        );
        html.push_str(&drawing.to_svg());
        html.push_str("</div></div>");
        html
    }
}

fn placeholder_html() -> String {
    format!("<div class=\"graph-widget-placeholder\">{PLACEHOLDER_MESSAGE}</div>")
}

pub struct GraphWidget {
    display: GraphDisplay,
    overrides: ConfigOverrides,
    host: HostElement,
    output: WidgetOutput,
}

impl GraphWidget {
    pub fn new(display: GraphDisplay, host: HostElement) -> Self {
        Self {
            display,
            overrides: ConfigOverrides::default(),
            host,
            output: WidgetOutput::Placeholder,
        }
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Create the widget and render the initial rows.
    pub fn mount(display: GraphDisplay, host: HostElement, rows: &[DataRow]) -> Self {
        let mut widget = Self::new(display, host);
        widget.update(rows);
        widget
    }

    /// Run the whole pipeline for `rows` and replace whatever was shown.
    pub fn update(&mut self, rows: &[DataRow]) -> WidgetOutput {
        self.output = match self.render(rows) {
            Ok(scene) => {
                let (width, height) = (scene.width, scene.height);
                self.host.width = width;
                self.host.height = height;
                self.host.container.mount(scene);
                debug!(width, height, anchor = %self.host.anchor, "mounted graph");
                WidgetOutput::Graph { width, height }
            }
            Err(e) => {
                warn!(error = %e, "showing graph placeholder");
                self.host.container.clear();
                self.host.width = 0.0;
                self.host.height = 0.0;
                WidgetOutput::Placeholder
            }
        };
        self.output
    }

    /// Replace the widget configuration and re-render.
    pub fn set_display(&mut self, display: GraphDisplay, rows: &[DataRow]) -> WidgetOutput {
        self.display = display;
        self.update(rows)
    }

    /// Record the space the container now offers. The diagram keeps its
    /// natural size.
    pub fn resize(&mut self, available: ContainerSize) {
        self.host.available = available;
    }

    /// Drop the mounted scene.
    pub fn unmount(&mut self) -> Option<VectorScene> {
        self.output = WidgetOutput::Placeholder;
        self.host.width = 0.0;
        self.host.height = 0.0;
        self.host.container.clear()
    }

    pub fn output(&self) -> WidgetOutput {
        self.output
    }

    pub fn host(&self) -> &HostElement {
        &self.host
    }

    pub fn to_html(&self) -> String {
        self.output.to_html(&self.host)
    }

    fn render(&self, rows: &[DataRow]) -> Result<VectorScene, Error> {
        let request = display_to_graph(&self.display, rows)?;
        debug!(column = %request.column, bytes = request.dot.len(), "render request");
        let mut scene = run_pipeline(&request.dot, &self.overrides)?.scene;
        scene.anchor = self.host.anchor.clone();
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rows(value: Value) -> Vec<DataRow> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| v.as_object().cloned())
                .collect(),
            _ => Vec::new(),
        }
    }

    fn display(column: &str) -> GraphDisplay {
        GraphDisplay {
            dot_column: Some(column.to_string()),
        }
    }

    #[test]
    fn display_deserialises_camel_case() {
        let parsed: GraphDisplay = serde_json::from_str(r#"{"dotColumn": "g"}"#).unwrap();
        assert_eq!(parsed, display("g"));
        let empty: GraphDisplay = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.dot_column, None);
    }

    #[test]
    fn reads_only_the_first_row() {
        let data = rows(json!([{"g": "digraph{a}"}, {"g": "digraph{b}"}]));
        let request = display_to_graph(&display("g"), &data).unwrap();
        assert_eq!(
            request,
            RenderRequest {
                dot: "digraph{a}".into(),
                column: "g".into()
            }
        );
    }

    #[test]
    fn configuration_errors() {
        let data = rows(json!([{"g": 3, "blank": "  "}]));
        assert_eq!(
            display_to_graph(&GraphDisplay::default(), &data),
            Err(ConfigurationError::MissingColumn)
        );
        assert_eq!(
            display_to_graph(&display("g"), &[]),
            Err(ConfigurationError::NoRows)
        );
        assert_eq!(
            display_to_graph(&display("h"), &data),
            Err(ConfigurationError::MissingValue("h".into()))
        );
        assert_eq!(
            display_to_graph(&display("g"), &data),
            Err(ConfigurationError::NotText("g".into()))
        );
        assert_eq!(
            display_to_graph(&display("blank"), &data),
            Err(ConfigurationError::EmptyDot)
        );
    }

    #[test]
    fn mount_sizes_host_to_diagram() {
        let data = rows(json!([{"g": "digraph{a->b;b->c;a->c;}"}]));
        let widget = GraphWidget::mount(display("g"), HostElement::new("chart-1", ContainerSize::default()), &data);
        let WidgetOutput::Graph { width, height } = widget.output() else {
            panic!("expected a graph");
        };
        let scene = widget.host().container.scene().unwrap();
        assert_eq!(scene.anchor, "chart-1");
        assert_eq!((widget.host().width, widget.host().height), (width, height));
        assert_eq!((scene.width, scene.height), (width, height));
    }

    #[test]
    fn parse_failure_shows_placeholder() {
        let data = rows(json!([{"g": "digraph{a->;}"}]));
        let widget = GraphWidget::mount(display("g"), HostElement::default(), &data);
        assert!(widget.output().is_placeholder());
        assert!(widget.host().container.is_empty());
        assert_eq!(
            widget.to_html(),
            "<div class=\"graph-widget-placeholder\">Invalid spec for graph</div>"
        );
    }

    #[test]
    fn update_replaces_previous_scene() {
        let mut widget = GraphWidget::new(display("g"), HostElement::default());
        widget.update(&rows(json!([{"g": "digraph{a->b}"}])));
        let first = widget.host().container.scene().unwrap().element_count();
        widget.update(&rows(json!([{"g": "digraph{x}"}])));
        let second = widget.host().container.scene().unwrap().element_count();
        assert!(second < first);

        widget.update(&[]);
        assert!(widget.output().is_placeholder());
        assert!(widget.host().container.is_empty());
    }

    #[test]
    fn resize_keeps_diagram_size() {
        let data = rows(json!([{"g": "digraph{a->b}"}]));
        let mut widget = GraphWidget::mount(display("g"), HostElement::default(), &data);
        let before = widget.output();
        widget.resize(ContainerSize {
            width: 120.0,
            height: 80.0,
        });
        assert_eq!(widget.output(), before);
        let html = widget.to_html();
        assert!(html.starts_with(
            "<div class=\"graph-widget\" style=\"width: 120px; height: 80px; overflow: auto;\">"
        ));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn unmount_drops_scene() {
        let data = rows(json!([{"g": "digraph{a}"}]));
        let mut widget = GraphWidget::mount(display("g"), HostElement::default(), &data);
        assert!(widget.unmount().is_some());
        assert!(widget.host().container.is_empty());
        assert!(widget.output().is_placeholder());
    }
}
