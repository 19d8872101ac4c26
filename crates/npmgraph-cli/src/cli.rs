//! CLI argument definitions for npmgraph.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "npmgraph",
    version,
    about = "Visualize the dependency graph of npm packages",
    long_about = "npmgraph resolves the full dependency closure of one or more npm packages \
                  (runtime, dev and peer dependencies), marks versions that are not the \
                  latest, and renders the result as a Graphviz document, a text tree or JSON."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: nearest npmgraph.toml)
    #[arg(short = 'C', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve packages and render their dependency graph
    Graph {
        /// Root packages as `name` or `name@version` (default: configured roots)
        roots: Vec<String>,
        /// Write the graph to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Dot)]
        format: Format,
        /// Maximum depth for tree output
        #[arg(long)]
        depth: Option<usize>,
        /// Plain nodes without staleness styling or tooltips
        #[arg(long)]
        no_annotate: bool,
        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Show how a package is reached from the roots
    Why {
        /// Package name or `name@version` key to explain
        target: String,
        /// Root packages (default: configured roots)
        roots: Vec<String>,
        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Manage the packument cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Registry selection shared by resolving commands.
#[derive(Args, Debug, Default)]
pub struct RegistryArgs {
    /// Registry base URL
    #[arg(long, value_name = "URL", env = "NPMGRAPH_REGISTRY")]
    pub registry: Option<String>,
    /// Resolve against a JSON registry snapshot instead of the network
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,
    /// Use only cached packuments
    #[arg(long)]
    pub offline: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Dot,
    Tree,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache location and size
    Info,
    /// Remove all cached packuments
    Clean,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn graph_arguments() {
        let cli = Cli::try_parse_from([
            "npmgraph", "-v", "graph", "express", "@types/node@20", "--format", "json",
            "--snapshot", "snap.json", "--offline",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Command::Graph {
            roots,
            format,
            registry,
            ..
        } = cli.command
        else {
            panic!("expected graph command");
        };
        assert_eq!(roots, vec!["express", "@types/node@20"]);
        assert_eq!(format, Format::Json);
        assert_eq!(registry.snapshot, Some(PathBuf::from("snap.json")));
        assert!(registry.offline);
    }
}
