//! Operation: explain why a package is in the graph.

use npmgraph_core::config::Config;
use npmgraph_resolver::graph::ModuleGraph;

use crate::ops_resolve::resolve_graph;

/// Print the dependency path from a root to `target` (a key or a package
/// name), followed by everything that depends on it.
pub async fn why(config: &Config, target: &str, roots: &[String]) -> miette::Result<()> {
    let resolution = resolve_graph(config, roots).await?;
    let graph = ModuleGraph::from_resolution(&resolution);
    print!("{}", explain(&graph, target));
    Ok(())
}

pub fn explain(graph: &ModuleGraph, target: &str) -> String {
    let Some(path) = graph.find_path(target) else {
        return match graph.resolve_target(target) {
            Some(idx) => format!(
                "{} is only in the graph as a latest version; \
                 no pinned dependency leads to it.\n",
                graph.node(idx)
            ),
            None => format!("Package '{target}' not found in the graph.\n"),
        };
    };

    let mut out = format!("Path to {target}:\n");
    for (i, module) in path.iter().enumerate() {
        let indent = "  ".repeat(i);
        out.push_str(&format!("{indent}{module}\n"));
    }

    let inverted = graph.print_inverted_tree(target);
    if inverted.lines().count() > 1 {
        out.push_str("\nDependents:\n");
        out.push_str(&inverted);
    }
    out
}
