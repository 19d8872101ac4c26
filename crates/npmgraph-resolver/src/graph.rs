//! Queryable view of a resolution backed by petgraph: tree printing, path
//! search and reverse dependencies.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use npmgraph_core::module::Module;

use crate::resolver::Resolution;

/// A resolved dependency graph.
pub struct ModuleGraph {
    graph: DiGraph<Arc<Module>, ()>,
    /// Lookup from module key to node index.
    index: HashMap<String, NodeIndex>,
    roots: Vec<NodeIndex>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            roots: Vec::new(),
        }
    }

    /// Build the graph of a resolution. Roots that were scoped out are not
    /// part of the graph and are skipped.
    pub fn from_resolution(resolution: &Resolution) -> Self {
        let mut graph = Self::new();
        for module in &resolution.nodes {
            graph.add_node(module.clone());
        }
        for (from, to) in &resolution.edges {
            if let (Some(a), Some(b)) = (graph.find(from), graph.find(to)) {
                graph.add_edge(a, b);
            }
        }
        for root in &resolution.roots {
            if let Some(idx) = graph.find(root.key()) {
                graph.add_root(idx);
            }
        }
        graph
    }

    /// Add or retrieve a node. If the key already exists, returns the existing index.
    pub fn add_node(&mut self, module: Arc<Module>) -> NodeIndex {
        if let Some(&idx) = self.index.get(module.key()) {
            return idx;
        }
        let key = module.key().to_string();
        let idx = self.graph.add_node(module);
        self.index.insert(key, idx);
        idx
    }

    pub fn add_root(&mut self, idx: NodeIndex) {
        if !self.roots.contains(&idx) {
            self.roots.push(idx);
        }
    }

    /// Add a dependency edge from `from` to `to`, once per pair.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Look up a node by `name@version` key.
    pub fn find(&self, key: &str) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &Module {
        &self.graph[idx]
    }

    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Direct dependencies of a node, sorted by key.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.sorted(
            self.graph
                .edges_directed(idx, Direction::Outgoing)
                .map(|e| e.target())
                .collect(),
        )
    }

    /// Reverse dependencies (who depends on this node), sorted by key.
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.sorted(
            self.graph
                .edges_directed(idx, Direction::Incoming)
                .map(|e| e.source())
                .collect(),
        )
    }

    fn sorted(&self, mut nodes: Vec<NodeIndex>) -> Vec<NodeIndex> {
        nodes.sort_by(|a, b| self.graph[*a].key().cmp(self.graph[*b].key()));
        nodes
    }

    /// Print the dependency tree below every root. A module already on the
    /// current path is printed with a `(cycle)` marker and not descended into.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        for &root in &self.roots {
            output.push_str(&format!("{}\n", self.graph[root]));
            let mut visited = HashSet::new();
            visited.insert(root);
            let deps = self.dependencies_of(root);
            let count = deps.len();
            for (i, child) in deps.into_iter().enumerate() {
                let is_last = i == count - 1;
                self.print_subtree(&mut output, child, "", is_last, 1, max_depth, &mut visited);
            }
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];

        if !visited.insert(idx) {
            output.push_str(&format!("{prefix}{connector}{node} (cycle)\n"));
            return;
        }
        output.push_str(&format!("{prefix}{connector}{node}\n"));

        if max_depth.map_or(true, |max| depth < max) {
            let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
            let deps = self.dependencies_of(idx);
            let count = deps.len();
            for (i, child) in deps.into_iter().enumerate() {
                let is_last = i == count - 1;
                self.print_subtree(
                    output,
                    child,
                    &child_prefix,
                    is_last,
                    depth + 1,
                    max_depth,
                    visited,
                );
            }
        }

        visited.remove(&idx);
    }

    /// Find a path from a root to a module.
    ///
    /// Accepts either a `name@version` key or just a package name. For a
    /// name, every version in the graph is tried in key order and the first
    /// one reachable from a root wins.
    pub fn find_path(&self, target: &str) -> Option<Vec<&Module>> {
        self.candidates(target)
            .into_iter()
            .find_map(|idx| self.path_to(idx))
    }

    /// Resolve a user-provided key or name to a node index, preferring a
    /// version that some root reaches.
    pub fn resolve_target(&self, target: &str) -> Option<NodeIndex> {
        let candidates = self.candidates(target);
        candidates
            .iter()
            .copied()
            .find(|&idx| self.path_to(idx).is_some())
            .or_else(|| candidates.first().copied())
    }

    fn candidates(&self, target: &str) -> Vec<NodeIndex> {
        if let Some(&idx) = self.index.get(target) {
            return vec![idx];
        }
        self.sorted(
            self.graph
                .node_indices()
                .filter(|&idx| self.graph[idx].name() == target)
                .collect(),
        )
    }

    fn path_to(&self, target: NodeIndex) -> Option<Vec<&Module>> {
        for &root in &self.roots {
            let mut path = Vec::new();
            let mut visited = HashSet::new();
            if self.dfs_path(root, target, &mut path, &mut visited) {
                return Some(path.iter().map(|&idx| &*self.graph[idx]).collect());
            }
        }
        None
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for next in self.dependencies_of(current) {
            if self.dfs_path(next, target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Print everything that depends on `target`, transitively.
    pub fn print_inverted_tree(&self, target: &str) -> String {
        let mut output = String::new();
        let Some(idx) = self.resolve_target(target) else {
            return output;
        };

        output.push_str(&format!("{}\n", self.graph[idx]));
        let mut visited = HashSet::new();
        visited.insert(idx);

        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, dep) in dependents.into_iter().enumerate() {
            let is_last = i == count - 1;
            self.print_inverted_subtree(&mut output, dep, "", is_last, &mut visited);
        }
        output
    }

    fn print_inverted_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node}\n"));

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, dep) in dependents.into_iter().enumerate() {
            let is_last = i == count - 1;
            self.print_inverted_subtree(output, dep, &child_prefix, is_last, visited);
        }

        visited.remove(&idx);
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for ModuleGraph {
    fn default() -> Self {
        Self::new()
    }
}
