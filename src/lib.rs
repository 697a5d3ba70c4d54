pub mod config;
pub mod display_width;
pub mod dot_parser;
pub mod error;
pub mod graph_layout;
pub mod graph_model;
pub mod graph_renderer;
pub mod scene;
pub mod widget;

use tracing::debug;

use crate::config::{ConfigOverrides, LayoutConfig, TextMetrics};
use crate::graph_layout::LayoutResult;
use crate::graph_model::GraphModel;
use crate::scene::VectorScene;

pub use crate::error::Error;

/// Everything one pass of parse → layout → render produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    pub model: GraphModel,
    pub config: LayoutConfig,
    pub layout: LayoutResult,
    pub scene: VectorScene,
}

pub fn render_dot(dot: &str) -> Result<VectorScene, Error> {
    Ok(run_pipeline(dot, &ConfigOverrides::default())?.scene)
}

/// Render with a fixed configuration; graph attributes such as `rankdir`
/// are not consulted.
pub fn render_dot_with_config(dot: &str, config: &LayoutConfig) -> Result<VectorScene, Error> {
    let model = dot_parser::parse_dot(dot)?;
    let layout = graph_layout::layout(&model, config, node_sizer(&model, &config.text))?;
    Ok(graph_renderer::render_with_metrics(&layout, &config.text))
}

pub fn run_pipeline(dot: &str, overrides: &ConfigOverrides) -> Result<Diagram, Error> {
    let model = dot_parser::parse_dot(dot)?;
    let config = overrides.resolve(&model);
    let layout = graph_layout::layout(&model, &config, node_sizer(&model, &config.text))?;
    let scene = graph_renderer::render_with_metrics(&layout, &config.text);
    debug!(
        nodes = layout.nodes.len(),
        edges = layout.edges.len(),
        elements = scene.element_count(),
        "rendered diagram"
    );
    Ok(Diagram {
        model,
        config,
        layout,
        scene,
    })
}

/// Size nodes from their label text and `shape` attribute.
pub fn node_sizer<'a>(
    model: &'a GraphModel,
    metrics: &'a TextMetrics,
) -> impl Fn(&str, &[String]) -> (f64, f64) + 'a {
    move |id, lines| metrics.node_size(lines, model.node_shape(id))
}
