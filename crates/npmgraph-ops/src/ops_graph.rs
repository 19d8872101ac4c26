//! Operation: render the dependency graph.

use std::path::PathBuf;

use serde::Serialize;

use npmgraph_core::config::Config;
use npmgraph_resolver::annotate::{annotate, NodeAnnotation};
use npmgraph_resolver::dot::{render_dot, DotOptions};
use npmgraph_resolver::graph::ModuleGraph;
use npmgraph_resolver::{LookupFailure, Resolution};
use npmgraph_util::errors::GraphError;

use crate::ops_resolve::{emit, resolve_graph};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Graphviz DOT document.
    #[default]
    Dot,
    /// Indented text tree from each root.
    Tree,
    /// Nodes, edges and failures as JSON.
    Json,
}

/// Options for `npmgraph graph`.
#[derive(Debug, Default)]
pub struct GraphOptions {
    /// Root identifiers; the configured roots are used when empty.
    pub roots: Vec<String>,
    pub format: OutputFormat,
    /// Output file; stdout when absent.
    pub output: Option<PathBuf>,
    /// Turn off node styling and tooltips in DOT output.
    pub no_annotate: bool,
    /// Maximum depth for tree output.
    pub depth: Option<usize>,
}

/// JSON rendering of a resolution.
#[derive(Debug, Serialize)]
pub struct GraphDocument<'a> {
    pub roots: Vec<&'a str>,
    pub nodes: Vec<NodeAnnotation>,
    pub edges: &'a [(String, String)],
    pub failures: &'a [LookupFailure],
}

impl<'a> GraphDocument<'a> {
    pub fn new(resolution: &'a Resolution) -> Self {
        Self {
            roots: resolution.roots.iter().map(|m| m.key()).collect(),
            nodes: annotate(resolution),
            edges: &resolution.edges,
            failures: &resolution.failures,
        }
    }
}

/// Resolve and render the graph.
pub async fn graph(config: &Config, opts: &GraphOptions) -> miette::Result<()> {
    let resolution = resolve_graph(config, &opts.roots).await?;
    let rendered = render(config, opts, &resolution)?;
    emit(&rendered, opts.output.as_deref())
}

/// Render a resolution in the requested format.
pub fn render(
    config: &Config,
    opts: &GraphOptions,
    resolution: &Resolution,
) -> miette::Result<String> {
    match opts.format {
        OutputFormat::Dot => {
            let mut dot_opts = DotOptions::from_config(&config.graph, resolution);
            if opts.no_annotate {
                dot_opts.annotate = false;
            }
            Ok(render_dot(resolution, &dot_opts))
        }
        OutputFormat::Tree => Ok(ModuleGraph::from_resolution(resolution).print_tree(opts.depth)),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&GraphDocument::new(resolution))
                .map_err(|e| GraphError::Generic {
                    message: format!("Failed to serialize graph: {e}"),
                })?;
            json.push('\n');
            Ok(json)
        }
    }
}
