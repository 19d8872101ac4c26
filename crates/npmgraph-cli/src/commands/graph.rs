//! Handler for `npmgraph graph`.

use std::path::PathBuf;

use miette::Result;

use npmgraph_core::config::Config;
use npmgraph_ops::ops_graph::{self, GraphOptions, OutputFormat};

use crate::cli::Format;

pub async fn exec(
    config: &Config,
    roots: Vec<String>,
    output: Option<PathBuf>,
    format: Format,
    depth: Option<usize>,
    no_annotate: bool,
) -> Result<()> {
    let opts = GraphOptions {
        roots,
        format: match format {
            Format::Dot => OutputFormat::Dot,
            Format::Tree => OutputFormat::Tree,
            Format::Json => OutputFormat::Json,
        },
        output,
        no_annotate,
        depth,
    };
    ops_graph::graph(config, &opts).await
}
