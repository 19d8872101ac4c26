use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use npmgraph_util::errors::GraphError;

/// Public npm registry.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Default font for graph labels.
pub const DEFAULT_FONT: &str = "Roboto Condensed, sans-serif";

/// Configuration loaded from `npmgraph.toml` (project) or
/// `~/.npmgraph/config.toml` (global).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub scope: ScopeConfig,

    #[serde(default)]
    pub graph: GraphConfig,
}

/// Registry settings from `[registry]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub url: String,
    /// Bearer token sent with every registry request.
    #[serde(default)]
    pub token: Option<String>,
    /// Name of an environment variable holding the bearer token.
    #[serde(default, rename = "token-env")]
    pub token_env: Option<String>,
    #[serde(default = "default_timeout_secs", rename = "timeout-secs")]
    pub timeout_secs: u64,
    #[serde(
        default = "default_max_concurrent_fetches",
        rename = "max-concurrent-fetches"
    )]
    pub max_concurrent_fetches: usize,
    #[serde(default = "default_cache_dir", rename = "cache-dir")]
    pub cache_dir: String,
    #[serde(default = "default_cache_ttl_secs", rename = "cache-ttl-secs")]
    pub cache_ttl_secs: u64,
    /// Only read packuments from the on-disk cache.
    #[serde(default)]
    pub offline: bool,
    /// JSON file of `{ name: packument }` used instead of the network.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            token: None,
            token_env: None,
            timeout_secs: default_timeout_secs(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            cache_dir: default_cache_dir(),
            cache_ttl_secs: default_cache_ttl_secs(),
            offline: false,
            snapshot: None,
        }
    }
}

impl RegistryConfig {
    /// The effective bearer token: `token`, else the variable named by `token-env`.
    pub fn auth_token(&self) -> Option<String> {
        if let Some(ref token) = self.token {
            return Some(token.clone());
        }
        let var = self.token_env.as_deref()?;
        std::env::var(var).ok().filter(|t| !t.is_empty())
    }

    /// Expanded cache directory path.
    pub fn cache_path(&self) -> PathBuf {
        npmgraph_util::expand_home(&self.cache_dir)
    }
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_cache_dir() -> String {
    "~/.npmgraph/cache".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

/// Scope settings from `[scope]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Packages graphed when none are given on the command line.
    #[serde(default)]
    pub roots: Vec<String>,
    /// npm scopes admitted to the graph, with or without the leading `@`.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Glob patterns over package names admitted in addition to `scopes`.
    #[serde(default)]
    pub include: Vec<String>,
    /// Glob patterns over package names always left out.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Output settings from `[graph]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_font")]
    pub font: String,
    /// Style nodes by staleness/stub state and attach license tooltips.
    #[serde(default = "default_annotate")]
    pub annotate: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            title: None,
            font: default_font(),
            annotate: default_annotate(),
        }
    }
}

fn default_font() -> String {
    DEFAULT_FONT.to_string()
}

fn default_annotate() -> bool {
    true
}

impl Config {
    /// Project-level configuration file name.
    pub const FILE_NAME: &'static str = "npmgraph.toml";

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            GraphError::Config {
                message: format!("Failed to parse config: {e}"),
            }
            .into()
        })
    }

    /// Load configuration from a file. A relative `registry.snapshot` is
    /// taken relative to the file's directory.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GraphError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        let mut config = Self::parse_toml(&content)?;
        if let (Some(snapshot), Some(dir)) = (config.registry.snapshot.as_ref(), path.parent()) {
            if snapshot.is_relative() {
                config.registry.snapshot = Some(dir.join(snapshot));
            }
        }
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Find the nearest `npmgraph.toml` at or above `start`, falling back to
    /// the global config, then to defaults.
    pub fn discover(start: &Path) -> miette::Result<Self> {
        if let Some(dir) = npmgraph_util::fs::find_ancestor_with(start, Self::FILE_NAME) {
            return Self::from_path(&dir.join(Self::FILE_NAME));
        }
        let global = Self::global_path();
        if global.is_file() {
            Self::from_path(&global)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the path to the global config file.
    pub fn global_path() -> PathBuf {
        npmgraph_util::dirs_path().join("config.toml")
    }
}
