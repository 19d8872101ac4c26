//! Scope policy: which discovered modules appear in the graph, and which
//! packages the graph starts from.

use globset::{Glob, GlobSet, GlobSetBuilder};

use npmgraph_util::errors::GraphError;

use crate::config::ScopeConfig;
use crate::module::Module;

/// Decides graph membership and supplies the root identifiers.
pub trait ScopeFilter {
    /// Whether `module` belongs in the visible graph.
    fn is_in_scope(&self, module: &Module) -> bool;

    /// Root identifiers in `name` or `name@version` form.
    fn starting_roots(&self) -> Vec<String>;
}

/// Scope filter driven by `[scope]` configuration.
///
/// With no `scopes` and no `include` patterns every package is admitted;
/// `exclude` patterns always win.
#[derive(Debug, Clone)]
pub struct PackageScope {
    roots: Vec<String>,
    scope_prefixes: Vec<String>,
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl PackageScope {
    pub fn from_config(config: &ScopeConfig) -> miette::Result<Self> {
        let scope_prefixes = config
            .scopes
            .iter()
            .map(|s| s.trim().trim_start_matches('@').trim_end_matches('/'))
            .filter(|s| !s.is_empty())
            .map(|s| format!("@{s}/"))
            .collect();
        let mut scope = Self {
            roots: Vec::new(),
            scope_prefixes,
            include: build_globs(&config.include)?,
            exclude: build_globs(&config.exclude)?,
        };
        scope.add_roots(config.roots.iter().cloned());
        Ok(scope)
    }

    /// A filter that admits every package.
    pub fn all(roots: impl IntoIterator<Item = String>) -> Self {
        let mut scope = Self {
            roots: Vec::new(),
            scope_prefixes: Vec::new(),
            include: None,
            exclude: None,
        };
        scope.add_roots(roots);
        scope
    }

    /// Add root identifiers; the root list stays sorted and deduplicated.
    pub fn add_roots(&mut self, roots: impl IntoIterator<Item = String>) {
        self.roots.extend(
            roots
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
        );
        self.roots.sort();
        self.roots.dedup();
    }

    /// Replace configured roots, e.g. with roots given on the command line.
    pub fn set_roots(&mut self, roots: impl IntoIterator<Item = String>) {
        self.roots.clear();
        self.add_roots(roots);
    }

    fn admits_name(&self, name: &str) -> bool {
        if let Some(ref exclude) = self.exclude {
            if exclude.is_match(name) {
                return false;
            }
        }
        if self.scope_prefixes.is_empty() && self.include.is_none() {
            return true;
        }
        self.scope_prefixes.iter().any(|p| name.starts_with(p.as_str()))
            || self.include.as_ref().is_some_and(|g| g.is_match(name))
    }
}

impl ScopeFilter for PackageScope {
    fn is_in_scope(&self, module: &Module) -> bool {
        self.admits_name(module.name())
    }

    fn starting_roots(&self) -> Vec<String> {
        self.roots.clone()
    }
}

fn build_globs(patterns: &[String]) -> miette::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| GraphError::Config {
            message: format!("Invalid scope pattern '{pattern}': {e}"),
        })?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|e| GraphError::Config {
        message: format!("Invalid scope patterns: {e}"),
    })?;
    Ok(Some(set))
}
