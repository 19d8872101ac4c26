//! Dependency graph resolution: memoized concurrent expansion of every
//! module reachable from a set of roots.
//!
//! Each in-scope module is expanded once. For every declared dependency two
//! lookups run side by side: the pinned one (the declared range) records an
//! edge, the unpinned one pulls in the current latest version so outdated
//! pins can be told apart from current ones. All branches of one module are
//! joined before its expansion completes.
//!
//! The traversal runs as a single logical task. Shared state lives in a
//! [`RefCell`] that is never held across an `.await`, so the `seen` insert
//! doubles as the test-and-set guarding against double expansion.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use futures_util::future::{join, join_all, FutureExt, LocalBoxFuture};
use serde::Serialize;

use npmgraph_core::module::{parse_key, Module};
use npmgraph_core::scope::ScopeFilter;
use npmgraph_registry::Registry;
use npmgraph_util::errors::GraphError;

/// A registry lookup that failed during traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupFailure {
    /// Key of the module declaring the dependency; `None` for roots.
    pub dependant: Option<String>,
    pub name: String,
    pub range: Option<String>,
    pub message: String,
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(ref range) = self.range {
            write!(f, "@{range}")?;
        }
        if let Some(ref dependant) = self.dependant {
            write!(f, " (required by {dependant})")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// The output of a graph build.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// The resolved root modules, in request order.
    pub roots: Vec<Arc<Module>>,
    /// Every reachable in-scope module, once each, in discovery order.
    pub nodes: Vec<Arc<Module>>,
    /// Pinned dependency edges `(dependant key, dependency key)`, once each.
    pub edges: Vec<(String, String)>,
    /// Keys reached through an unconstrained lookup, roots included.
    pub latest: BTreeSet<String>,
    pub failures: Vec<LookupFailure>,
}

impl Resolution {
    pub fn node(&self, key: &str) -> Option<&Arc<Module>> {
        self.nodes.iter().find(|m| m.key() == key)
    }

    pub fn is_latest(&self, key: &str) -> bool {
        self.latest.contains(key)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges.iter().any(|(f, t)| f == from && t == to)
    }
}

#[derive(Default)]
struct TraversalState {
    seen: HashSet<String>,
    latest: BTreeSet<String>,
    nodes: Vec<Arc<Module>>,
    edges: Vec<(String, String)>,
    edge_set: HashSet<(String, String)>,
    failures: Vec<LookupFailure>,
}

impl TraversalState {
    fn add_edge(&mut self, from: &str, to: &str) {
        let edge = (from.to_string(), to.to_string());
        if self.edge_set.insert(edge.clone()) {
            self.edges.push(edge);
        }
    }
}

/// Expands modules against a registry under a scope policy.
pub struct GraphResolver<'a, R: ?Sized, F: ?Sized> {
    registry: &'a R,
    scope: &'a F,
    state: RefCell<TraversalState>,
}

impl<'a, R, F> GraphResolver<'a, R, F>
where
    R: Registry + ?Sized,
    F: ScopeFilter + ?Sized,
{
    pub fn new(registry: &'a R, scope: &'a F) -> Self {
        Self {
            registry,
            scope,
            state: RefCell::new(TraversalState::default()),
        }
    }

    /// Resolve the scope's starting roots, then expand them.
    ///
    /// Roots are looked up concurrently. Roots that fail to resolve are
    /// reported in [`Resolution::failures`]; the build only fails when none
    /// of them resolves.
    pub async fn resolve_roots(self) -> miette::Result<Resolution> {
        let identifiers = self.scope.starting_roots();
        if identifiers.is_empty() {
            return Err(GraphError::Resolution {
                message: "No root packages to graph".to_string(),
            }
            .into());
        }

        let registry = self.registry;
        let lookups = identifiers.iter().map(|id| async move {
            let Some((name, version)) = parse_key(id) else {
                return Err(LookupFailure {
                    dependant: None,
                    name: id.clone(),
                    range: None,
                    message: "not a package name".to_string(),
                });
            };
            registry
                .resolve(name, version)
                .await
                .map_err(|e| LookupFailure {
                    dependant: None,
                    name: name.to_string(),
                    range: version.map(str::to_string),
                    message: e.to_string(),
                })
        });

        let mut roots = Vec::new();
        for result in join_all(lookups).await {
            match result {
                Ok(module) => roots.push(module),
                Err(failure) => {
                    tracing::warn!("Failed to resolve root {failure}");
                    self.state.borrow_mut().failures.push(failure);
                }
            }
        }

        if roots.is_empty() {
            let reason = self
                .state
                .borrow()
                .failures
                .first()
                .map(ToString::to_string)
                .unwrap_or_default();
            return Err(GraphError::Resolution {
                message: format!("None of the root packages could be resolved: {reason}"),
            }
            .into());
        }
        self.resolve(roots).await
    }

    /// Expand the full closure of already-resolved roots.
    pub async fn resolve(self, roots: Vec<Arc<Module>>) -> miette::Result<Resolution> {
        if roots.is_empty() {
            return Err(GraphError::Resolution {
                message: "No root packages to graph".to_string(),
            }
            .into());
        }

        {
            let mut state = self.state.borrow_mut();
            for root in &roots {
                state.latest.insert(root.key().to_string());
            }
        }
        join_all(roots.iter().cloned().map(|root| self.expand(root))).await;

        let state = self.state.into_inner();
        tracing::debug!(
            "Resolved {} modules, {} edges, {} failures",
            state.nodes.len(),
            state.edges.len(),
            state.failures.len()
        );
        Ok(Resolution {
            roots,
            nodes: state.nodes,
            edges: state.edges,
            latest: state.latest,
            failures: state.failures,
        })
    }

    fn expand(&self, module: Arc<Module>) -> LocalBoxFuture<'_, ()> {
        async move {
            {
                let mut state = self.state.borrow_mut();
                if !state.seen.insert(module.key().to_string()) {
                    return;
                }
                if !self.scope.is_in_scope(&module) {
                    tracing::debug!("{module} is out of scope");
                    return;
                }
                tracing::debug!("Expanding {module}");
                state.nodes.push(module.clone());
            }

            let deps = module.manifest.all_dependencies();
            let branches = deps.iter().map(|(name, range)| {
                join(
                    self.follow_pinned(&module, name, range),
                    self.follow_latest(&module, name),
                )
            });
            join_all(branches).await;
        }
        .boxed_local()
    }

    async fn follow_pinned(&self, from: &Module, name: &str, range: &str) {
        match self.registry.resolve(name, Some(range)).await {
            Ok(dst) => {
                if !self.scope.is_in_scope(&dst) {
                    return;
                }
                self.state.borrow_mut().add_edge(from.key(), dst.key());
                self.expand(dst).await;
            }
            Err(e) => self.record_failure(from, name, Some(range), &e),
        }
    }

    async fn follow_latest(&self, from: &Module, name: &str) {
        match self.registry.resolve(name, None).await {
            Ok(dst) => {
                // An unpublished package is already drawn by its pinned stub.
                if dst.is_stub() || !self.scope.is_in_scope(&dst) {
                    return;
                }
                self.state
                    .borrow_mut()
                    .latest
                    .insert(dst.key().to_string());
                self.expand(dst).await;
            }
            Err(e) => self.record_failure(from, name, None, &e),
        }
    }

    fn record_failure(
        &self,
        from: &Module,
        name: &str,
        range: Option<&str>,
        err: &miette::Report,
    ) {
        let failure = LookupFailure {
            dependant: Some(from.key().to_string()),
            name: name.to_string(),
            range: range.map(str::to_string),
            message: err.to_string(),
        };
        tracing::warn!("Lookup failed for {failure}");
        self.state.borrow_mut().failures.push(failure);
    }
}

/// Resolve the scope's starting roots and expand their closure.
pub async fn resolve<R, F>(registry: &R, scope: &F) -> miette::Result<Resolution>
where
    R: Registry + ?Sized,
    F: ScopeFilter + ?Sized,
{
    GraphResolver::new(registry, scope).resolve_roots().await
}
