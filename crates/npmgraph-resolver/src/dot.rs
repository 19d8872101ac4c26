//! Graphviz DOT rendering of a resolution.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use npmgraph_core::config::GraphConfig;

use crate::annotate::{annotate, NodeAnnotation};
use crate::resolver::Resolution;

/// Outline colour for modules only reached through an outdated pin.
const STALE_COLOR: &str = "#d9534f";

#[derive(Debug, Clone)]
pub struct DotOptions {
    pub title: String,
    pub font: String,
    /// Style nodes by stub and staleness state and attach tooltips.
    pub annotate: bool,
}

impl DotOptions {
    /// Options from `[graph]`; without a configured title the root names are used.
    pub fn from_config(config: &GraphConfig, resolution: &Resolution) -> Self {
        Self {
            title: config
                .title
                .clone()
                .unwrap_or_else(|| default_title(resolution)),
            font: config.font.clone(),
            annotate: config.annotate,
        }
    }
}

/// `"<root names> dependencies"`.
pub fn default_title(resolution: &Resolution) -> String {
    let mut names: Vec<&str> = resolution.roots.iter().map(|m| m.name()).collect();
    names.dedup();
    format!("{} dependencies", names.join(", "))
}

/// Render nodes and edges as a DOT document.
///
/// Every edge endpoint is also emitted as a node statement, so the document
/// never references an undeclared node.
pub fn render_dot(resolution: &Resolution, options: &DotOptions) -> String {
    let font = quote(&options.font);
    let mut out = String::new();
    out.push_str("digraph {\n");
    out.push_str("rankdir=\"LR\"\n");
    out.push_str("labelloc=\"t\"\n");
    let _ = writeln!(out, "label={}", quote(&options.title));
    out.push_str("// Default styles\n");
    let _ = writeln!(out, "graph [fontsize=16 fontname={font}]");
    let _ = writeln!(
        out,
        "node [shape=box style=rounded fontname={font} fontsize=11 height=0 width=0 margin=.04]"
    );
    let _ = writeln!(out, "edge [fontsize=10 fontname={font} splines=\"polyline\"]");
    out.push('\n');

    let notes: HashMap<String, NodeAnnotation> = if options.annotate {
        annotate(resolution)
            .into_iter()
            .map(|n| (n.key.clone(), n))
            .collect()
    } else {
        HashMap::new()
    };

    let mut declared = HashSet::new();
    for module in &resolution.nodes {
        declared.insert(module.key());
        out.push_str(&quote(module.key()));
        if let Some(note) = notes.get(module.key()) {
            out.push_str(&node_attributes(note));
        }
        out.push('\n');
    }
    for (from, to) in &resolution.edges {
        for key in [from, to] {
            if declared.insert(key.as_str()) {
                let _ = writeln!(out, "{}", quote(key));
            }
        }
    }

    for (from, to) in &resolution.edges {
        let _ = writeln!(out, "{} -> {}", quote(from), quote(to));
    }
    out.push_str("}\n");
    out
}

fn node_attributes(note: &NodeAnnotation) -> String {
    let mut attrs = Vec::new();
    if note.stub {
        attrs.push("style=\"rounded,dashed\"".to_string());
    } else if note.stale {
        attrs.push(format!("color=\"{STALE_COLOR}\" fontcolor=\"{STALE_COLOR}\""));
    }

    let mut tooltip = format!("License: {}", note.license);
    if !note.maintainers.is_empty() {
        let _ = write!(tooltip, "\nMaintainers: {}", note.maintainers.join(", "));
    }
    if note.stub {
        tooltip.push_str("\nMetadata unavailable");
    }
    attrs.push(format!("tooltip={}", quote(&tooltip)));

    format!(" [{}]", attrs.join(" "))
}

/// Quote a DOT identifier, escaping backslashes, quotes and newlines.
pub fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => {}
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use npmgraph_core::manifest::PackageManifest;
    use npmgraph_core::module::Module;

    use super::*;

    fn module(name: &str, version: &str) -> Arc<Module> {
        Arc::new(Module::new(name, version, PackageManifest::default()))
    }

    fn options(annotate: bool) -> DotOptions {
        DotOptions {
            title: "demo".to_string(),
            font: "Helvetica".to_string(),
            annotate,
        }
    }

    #[test]
    fn quote_escapes_special_characters() {
        assert_eq!(quote("plain@1.0.0"), "\"plain@1.0.0\"");
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("a\\b"), "\"a\\\\b\"");
        assert_eq!(quote("a\nb"), "\"a\\nb\"");
    }

    #[test]
    fn plain_document_layout() {
        let a = module("a", "1.0.0");
        let b = module("@s/b", "2.0.0");
        let resolution = Resolution {
            roots: vec![a.clone()],
            nodes: vec![a, b],
            edges: vec![("a@1.0.0".to_string(), "@s/b@2.0.0".to_string())],
            ..Resolution::default()
        };

        let dot = render_dot(&resolution, &options(false));
        assert!(dot.starts_with("digraph {\nrankdir=\"LR\"\nlabelloc=\"t\"\nlabel=\"demo\"\n"));
        assert!(dot.contains("node [shape=box style=rounded fontname=\"Helvetica\""));
        assert!(dot.contains("\n\"a@1.0.0\"\n\"@s/b@2.0.0\"\n"));
        assert!(dot.contains("\"a@1.0.0\" -> \"@s/b@2.0.0\"\n"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn annotated_nodes_show_staleness_and_stubs() {
        let old = module("lib", "1.0.0");
        let new = module("lib", "2.0.0");
        let stub = Arc::new(Module::stub("gone", None));
        let mut resolution = Resolution {
            roots: vec![new.clone()],
            nodes: vec![new, old, stub],
            ..Resolution::default()
        };
        resolution.latest.insert("lib@2.0.0".to_string());

        let dot = render_dot(&resolution, &options(true));
        assert!(dot.contains("\"lib@2.0.0\" [tooltip=\"License: Unspecified\"]"));
        assert!(dot.contains(&format!("\"lib@1.0.0\" [color=\"{STALE_COLOR}\"")));
        assert!(dot.contains(
            "\"gone@0.0.0\" [style=\"rounded,dashed\" tooltip=\"License: Unspecified\\nMetadata unavailable\"]"
        ));
    }

    #[test]
    fn default_title_names_roots() {
        let resolution = Resolution {
            roots: vec![module("a", "1.0.0"), module("b", "1.0.0")],
            ..Resolution::default()
        };
        assert_eq!(default_title(&resolution), "a, b dependencies");
        let opts = DotOptions::from_config(&GraphConfig::default(), &resolution);
        assert_eq!(opts.title, "a, b dependencies");
        assert!(opts.annotate);
    }
}
