//! Operation: load configuration and resolve the dependency graph.

use std::path::{Path, PathBuf};

use npmgraph_core::config::Config;
use npmgraph_core::scope::PackageScope;
use npmgraph_registry::{HttpSource, PackumentSource, RegistryClient, SnapshotSource};
use npmgraph_resolver::Resolution;
use npmgraph_util::errors::GraphError;
use npmgraph_util::progress::{counted, spinner, status, status_warn};

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Default, Clone)]
pub struct RegistryOverrides {
    pub registry_url: Option<String>,
    pub snapshot: Option<PathBuf>,
    pub offline: bool,
}

impl RegistryOverrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref url) = self.registry_url {
            config.registry.url = url.clone();
        }
        if let Some(ref snapshot) = self.snapshot {
            config.registry.snapshot = Some(snapshot.clone());
        }
        if self.offline {
            config.registry.offline = true;
        }
    }
}

/// Load `path` if given, otherwise discover `npmgraph.toml` from `cwd` upward.
pub fn load_config(path: Option<&Path>, cwd: &Path) -> miette::Result<Config> {
    match path {
        Some(path) => Config::from_path(path),
        None => Config::discover(cwd),
    }
}

/// The packument source selected by configuration: a snapshot file when one
/// is configured, the HTTP registry otherwise.
pub fn packument_source(config: &Config) -> miette::Result<Box<dyn PackumentSource>> {
    if let Some(ref path) = config.registry.snapshot {
        tracing::debug!("Using registry snapshot {}", path.display());
        return Ok(Box::new(SnapshotSource::from_path(path)?));
    }
    Ok(Box::new(HttpSource::new(&config.registry)?))
}

/// Resolve the graph for `roots`, or for the configured roots when `roots`
/// is empty. Lookup failures are printed as warnings.
pub async fn resolve_graph(config: &Config, roots: &[String]) -> miette::Result<Resolution> {
    let mut scope = PackageScope::from_config(&config.scope)?;
    if !roots.is_empty() {
        scope.set_roots(roots.iter().cloned());
    }

    let client = RegistryClient::new(
        packument_source(config)?,
        config.registry.max_concurrent_fetches,
    );

    let sp = spinner("Resolving dependencies...");
    let result = npmgraph_resolver::resolve(&client, &scope).await;
    sp.finish_and_clear();
    let resolution = result?;

    for failure in &resolution.failures {
        status_warn("Warning", &failure.to_string());
    }
    status(
        "Resolved",
        &format!(
            "{}, {} ({})",
            counted(resolution.nodes.len(), "package"),
            counted(resolution.edges.len(), "dependency edge"),
            counted(client.fetch_count(), "registry request")
        ),
    );
    Ok(resolution)
}

/// Write `contents` to `output`, or to stdout when no file is given.
pub fn emit(contents: &str, output: Option<&Path>) -> miette::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                npmgraph_util::fs::ensure_dir(parent).map_err(GraphError::Io)?;
            }
            std::fs::write(path, contents).map_err(|e| GraphError::Generic {
                message: format!("Failed to write {}: {e}", path.display()),
            })?;
            status("Wrote", &path.display().to_string());
        }
        None => print!("{contents}"),
    }
    Ok(())
}
