use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use npmgraph_core::config::ScopeConfig;
use npmgraph_core::module::Module;
use npmgraph_core::scope::PackageScope;
use npmgraph_registry::{Registry, RegistryClient, SnapshotSource};
use npmgraph_resolver::dot::{render_dot, DotOptions};
use npmgraph_resolver::graph::ModuleGraph;
use npmgraph_resolver::{resolve, GraphResolver, Resolution};
use npmgraph_util::errors::GraphError;

const SNAPSHOT: &str = r#"{
    "a": { "dist-tags": { "latest": "1.0.0" }, "versions": {
        "1.0.0": { "dependencies": { "b": "^1.0.0", "c": "^1.0.0" } } } },
    "b": { "dist-tags": { "latest": "1.0.0" }, "versions": {
        "1.0.0": { "dependencies": { "d": "^1.0.0" } } } },
    "c": { "dist-tags": { "latest": "1.0.0" }, "versions": {
        "1.0.0": { "devDependencies": { "d": "~1.0.0" } } } },
    "d": { "dist-tags": { "latest": "1.0.0" }, "versions": {
        "1.0.0": { "dependencies": { "e": "*" } } } },
    "e": { "dist-tags": { "latest": "1.0.0" }, "versions": { "1.0.0": {} } },

    "x": { "dist-tags": { "latest": "1.0.0" }, "versions": {
        "1.0.0": { "peerDependencies": { "y": "^1.0.0" } } } },
    "y": { "dist-tags": { "latest": "1.0.0" }, "versions": {
        "1.0.0": { "devDependencies": { "x": "^1.0.0" } } } },

    "app": { "dist-tags": { "latest": "1.0.0" }, "versions": {
        "1.0.0": { "dependencies": { "lib": "^1.0.0", "broken": "^9.0.0" } } } },
    "lib": { "dist-tags": { "latest": "2.0.0" }, "versions": {
        "1.0.0": {}, "1.2.0": {}, "2.0.0": {} } },
    "broken": { "dist-tags": { "latest": "1.0.0" }, "versions": { "1.0.0": {} } },

    "host": { "dist-tags": { "latest": "1.0.0" }, "versions": {
        "1.0.0": { "dependencies": { "phantom": "^1.0.0" } } } }
}"#;

fn client() -> RegistryClient<SnapshotSource> {
    RegistryClient::new(SnapshotSource::from_json(SNAPSHOT).unwrap(), 8)
}

/// Counts lookups per package name.
struct Recording<R> {
    inner: R,
    calls: RefCell<HashMap<String, usize>>,
}

impl<R> Recording<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            calls: RefCell::new(HashMap::new()),
        }
    }

    fn calls(&self, name: &str) -> usize {
        self.calls.borrow().get(name).copied().unwrap_or(0)
    }
}

#[async_trait(?Send)]
impl<R: Registry> Registry for Recording<R> {
    async fn resolve(&self, name: &str, range: Option<&str>) -> miette::Result<Arc<Module>> {
        *self.calls.borrow_mut().entry(name.to_string()).or_default() += 1;
        self.inner.resolve(name, range).await
    }
}

/// Fails every lookup for one package name.
struct Unreachable<R> {
    inner: R,
    name: &'static str,
}

#[async_trait(?Send)]
impl<R: Registry> Registry for Unreachable<R> {
    async fn resolve(&self, name: &str, range: Option<&str>) -> miette::Result<Arc<Module>> {
        if name == self.name {
            return Err(GraphError::Network {
                message: format!("connection refused fetching {name}"),
            }
            .into());
        }
        self.inner.resolve(name, range).await
    }
}

/// Delays every lookup by a few milliseconds derived from its arguments, so
/// sibling lookups complete in a different order than they were issued.
struct Jittered<R> {
    inner: Recording<R>,
}

#[async_trait(?Send)]
impl<R: Registry> Registry for Jittered<R> {
    async fn resolve(&self, name: &str, range: Option<&str>) -> miette::Result<Arc<Module>> {
        let mut hasher = DefaultHasher::new();
        (name, range).hash(&mut hasher);
        let delay = hasher.finish() % 7;
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.inner.resolve(name, range).await
    }
}

fn keys(resolution: &Resolution) -> Vec<&str> {
    resolution.nodes.iter().map(|m| m.key()).collect()
}

fn sorted_keys(resolution: &Resolution) -> BTreeSet<String> {
    resolution.nodes.iter().map(|m| m.key().to_string()).collect()
}

fn edge_set(resolution: &Resolution) -> BTreeSet<(String, String)> {
    resolution.edges.iter().cloned().collect()
}

async fn root(registry: &impl Registry, name: &str) -> Arc<Module> {
    registry.resolve(name, None).await.unwrap()
}

#[tokio::test]
async fn diamond_is_deduplicated() {
    let registry = Recording::new(client());
    let scope = PackageScope::all(Vec::new());
    let roots = vec![root(&registry, "a").await];

    let resolution = GraphResolver::new(&registry, &scope)
        .resolve(roots)
        .await
        .unwrap();

    assert_eq!(
        sorted_keys(&resolution),
        BTreeSet::from(["a@1.0.0", "b@1.0.0", "c@1.0.0", "d@1.0.0", "e@1.0.0"].map(String::from))
    );
    assert_eq!(resolution.nodes.len(), 5);
    assert_eq!(resolution.edges.len(), 5);
    assert!(resolution.has_edge("b@1.0.0", "d@1.0.0"));
    assert!(resolution.has_edge("c@1.0.0", "d@1.0.0"));
    // d is expanded once: one pinned and one latest lookup of e.
    assert_eq!(registry.calls("e"), 2);
    assert!(resolution.failures.is_empty());
}

#[tokio::test]
async fn cycles_terminate_with_both_edges() {
    let registry = client();
    let scope = PackageScope::all(Vec::new());
    let roots = vec![root(&registry, "x").await];

    let resolution = GraphResolver::new(&registry, &scope)
        .resolve(roots)
        .await
        .unwrap();

    assert_eq!(keys(&resolution), vec!["x@1.0.0", "y@1.0.0"]);
    assert!(resolution.has_edge("x@1.0.0", "y@1.0.0"));
    assert!(resolution.has_edge("y@1.0.0", "x@1.0.0"));
    assert_eq!(resolution.edges.len(), 2);
}

#[tokio::test]
async fn excluded_modules_are_dead_ends() {
    let registry = Recording::new(client());
    let scope = PackageScope::from_config(&ScopeConfig {
        exclude: vec!["c".to_string()],
        ..ScopeConfig::default()
    })
    .unwrap();
    let roots = vec![root(&registry, "a").await];

    let resolution = GraphResolver::new(&registry, &scope)
        .resolve(roots)
        .await
        .unwrap();

    assert!(resolution.node("c@1.0.0").is_none());
    assert!(!resolution.edges.iter().any(|(f, t)| f == "c@1.0.0" || t == "c@1.0.0"));
    // The sibling branch through b still reaches d and e.
    assert!(resolution.node("d@1.0.0").is_some());
    assert!(resolution.node("e@1.0.0").is_some());
}

#[tokio::test]
async fn latest_version_is_tracked_next_to_pinned() {
    let registry = client();
    let scope = PackageScope::all(Vec::new());
    let roots = vec![root(&registry, "app").await];

    let resolution = GraphResolver::new(&registry, &scope)
        .resolve(roots)
        .await
        .unwrap();

    assert!(resolution.node("lib@1.2.0").is_some());
    assert!(resolution.node("lib@2.0.0").is_some());
    assert!(resolution.has_edge("app@1.0.0", "lib@1.2.0"));
    assert!(!resolution.has_edge("app@1.0.0", "lib@2.0.0"));
    assert!(resolution.is_latest("lib@2.0.0"));
    assert!(!resolution.is_latest("lib@1.2.0"));
    assert!(resolution.is_latest("app@1.0.0"));
}

#[tokio::test]
async fn failed_lookups_do_not_stop_siblings() {
    let registry = client();
    let scope = PackageScope::all(Vec::new());
    let roots = vec![root(&registry, "app").await];

    let resolution = GraphResolver::new(&registry, &scope)
        .resolve(roots)
        .await
        .unwrap();

    assert_eq!(resolution.failures.len(), 1);
    let failure = &resolution.failures[0];
    assert_eq!(failure.dependant.as_deref(), Some("app@1.0.0"));
    assert_eq!(failure.name, "broken");
    assert_eq!(failure.range.as_deref(), Some("^9.0.0"));
    assert!(failure.to_string().contains("required by app@1.0.0"));

    // The unpinned branch of the same dependency still succeeds.
    assert!(resolution.node("broken@1.0.0").is_some());
    assert!(resolution.node("lib@1.2.0").is_some());
}

#[tokio::test]
async fn unreachable_package_fails_both_branches() {
    let registry = Unreachable {
        inner: client(),
        name: "d",
    };
    let scope = PackageScope::all(vec!["a".to_string()]);

    let resolution = resolve(&registry, &scope).await.unwrap();

    assert_eq!(resolution.nodes.len(), 3);
    // b and c each try d pinned and unpinned.
    assert_eq!(resolution.failures.len(), 4);
    assert!(resolution
        .failures
        .iter()
        .all(|f| f.message.contains("connection refused")));
}

#[tokio::test]
async fn repeated_builds_agree() {
    let registry = client();
    let scope = PackageScope::all(vec!["a".to_string(), "app".to_string()]);

    let first = resolve(&registry, &scope).await.unwrap();
    let second = resolve(&registry, &scope).await.unwrap();

    assert_eq!(sorted_keys(&first), sorted_keys(&second));
    assert_eq!(edge_set(&first), edge_set(&second));
    assert_eq!(first.latest, second.latest);
}

#[tokio::test]
async fn roots_accept_versions_and_report_failures() {
    let registry = client();
    let scope = PackageScope::all(vec!["lib@1.0.0".to_string(), "lib@^7".to_string()]);

    let resolution = resolve(&registry, &scope).await.unwrap();

    assert_eq!(resolution.roots.len(), 1);
    assert_eq!(resolution.roots[0].key(), "lib@1.0.0");
    assert!(resolution.is_latest("lib@1.0.0"));
    assert_eq!(resolution.failures.len(), 1);
    assert!(resolution.failures[0].dependant.is_none());
}

#[tokio::test]
async fn out_of_order_completions_expand_each_module_once() {
    let registry = Jittered {
        inner: Recording::new(client()),
    };
    let scope = PackageScope::all(Vec::new());
    let roots = vec![root(&registry, "a").await, root(&registry, "x").await];

    let resolution = GraphResolver::new(&registry, &scope)
        .resolve(roots)
        .await
        .unwrap();

    let unique = sorted_keys(&resolution);
    assert_eq!(unique.len(), resolution.nodes.len());
    assert_eq!(
        unique,
        BTreeSet::from(
            ["a@1.0.0", "b@1.0.0", "c@1.0.0", "d@1.0.0", "e@1.0.0", "x@1.0.0", "y@1.0.0"]
                .map(String::from)
        )
    );
    // d is expanded once: one pinned and one latest lookup of e.
    assert_eq!(registry.inner.calls("e"), 2);
    assert!(resolution.has_edge("x@1.0.0", "y@1.0.0"));
    assert!(resolution.has_edge("y@1.0.0", "x@1.0.0"));
    assert!(resolution.failures.is_empty());
}

#[tokio::test]
async fn unpublished_dependency_is_a_single_stub() {
    let registry = client();
    let scope = PackageScope::all(vec!["host".to_string()]);

    let resolution = resolve(&registry, &scope).await.unwrap();
    assert_eq!(
        sorted_keys(&resolution),
        BTreeSet::from(["host@1.0.0", "phantom@^1.0.0"].map(String::from))
    );
    assert!(resolution.has_edge("host@1.0.0", "phantom@^1.0.0"));
    assert!(!resolution.is_latest("phantom@^1.0.0"));
    assert!(resolution.failures.is_empty());
}

#[tokio::test]
async fn no_resolvable_roots_is_an_error() {
    let registry = client();

    let empty = PackageScope::all(Vec::new());
    let err = resolve(&registry, &empty).await.unwrap_err();
    assert!(err.to_string().contains("No root packages"));

    let bad = PackageScope::all(vec!["lib@^7".to_string()]);
    let err = resolve(&registry, &bad).await.unwrap_err();
    assert!(err.to_string().contains("None of the root packages could be resolved"));
}

#[tokio::test]
async fn missing_packages_become_stub_leaves() {
    let registry = client();
    let scope = PackageScope::all(vec!["not-published".to_string()]);

    let resolution = resolve(&registry, &scope).await.unwrap();
    assert_eq!(keys(&resolution), vec!["not-published@0.0.0"]);
    assert!(resolution.nodes[0].is_stub());
    assert!(resolution.edges.is_empty());
}

#[tokio::test]
async fn dot_document_declares_every_edge_endpoint() {
    let registry = client();
    let scope = PackageScope::all(vec!["a".to_string(), "app".to_string(), "x".to_string()]);
    let resolution = resolve(&registry, &scope).await.unwrap();

    let options = DotOptions {
        title: "test".to_string(),
        font: "Roboto".to_string(),
        annotate: true,
    };
    let dot = render_dot(&resolution, &options);
    let declared: Vec<&str> = dot
        .lines()
        .filter(|l| l.starts_with('"') && !l.contains(" -> "))
        .collect();
    for (from, to) in &resolution.edges {
        for key in [from, to] {
            let statement = format!("\"{key}\"");
            assert!(
                declared.iter().any(|l| l.starts_with(&statement)),
                "{key} has no node statement"
            );
        }
    }
    assert_eq!(
        dot.lines().filter(|l| l.contains(" -> ")).count(),
        resolution.edges.len()
    );
}

#[tokio::test]
async fn module_graph_answers_why_queries() {
    let registry = client();
    let scope = PackageScope::all(vec!["a".to_string()]);
    let resolution = resolve(&registry, &scope).await.unwrap();

    let graph = ModuleGraph::from_resolution(&resolution);
    assert_eq!(graph.len(), resolution.nodes.len());
    let path: Vec<&str> = graph.find_path("e").unwrap().iter().map(|m| m.key()).collect();
    assert_eq!(path, vec!["a@1.0.0", "b@1.0.0", "d@1.0.0", "e@1.0.0"]);
}
