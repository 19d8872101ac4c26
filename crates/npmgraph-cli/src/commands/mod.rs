//! Command dispatch and handler modules.

mod cache;
mod graph;
mod why;

use miette::Result;

use npmgraph_core::config::Config;
use npmgraph_ops::ops_resolve::{self, RegistryOverrides};
use npmgraph_util::errors::GraphError;

use crate::cli::{Cli, Command, RegistryArgs};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().map_err(GraphError::Io)?;
    tracing::debug!("Working directory: {}", cwd.display());
    let config = ops_resolve::load_config(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Command::Graph {
            roots,
            output,
            format,
            depth,
            no_annotate,
            registry,
        } => {
            let config = with_overrides(config, &registry);
            graph::exec(&config, roots, output, format, depth, no_annotate).await
        }
        Command::Why {
            target,
            roots,
            registry,
        } => {
            let config = with_overrides(config, &registry);
            why::exec(&config, &target, &roots).await
        }
        Command::Cache { action } => cache::exec(&config, action),
    }
}

fn with_overrides(mut config: Config, args: &RegistryArgs) -> Config {
    RegistryOverrides {
        registry_url: args.registry.clone(),
        snapshot: args.snapshot.clone(),
        offline: args.offline,
    }
    .apply(&mut config);
    config
}
