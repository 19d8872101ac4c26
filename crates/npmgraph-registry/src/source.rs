//! Where packuments come from: the network (with a disk cache) or a
//! pre-recorded snapshot file.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use npmgraph_core::config::RegistryConfig;
use npmgraph_util::errors::GraphError;

use crate::cache::PackumentCache;
use crate::download;
use crate::endpoint::RegistryEndpoint;
use crate::packument::Packument;

/// Fetches the packument for a package name.
#[async_trait]
pub trait PackumentSource: Send + Sync {
    /// `Ok(None)` means the package does not exist (or, offline, was never
    /// cached).
    async fn fetch(&self, name: &str) -> miette::Result<Option<Packument>>;
}

#[async_trait]
impl<T: PackumentSource + ?Sized> PackumentSource for Box<T> {
    async fn fetch(&self, name: &str) -> miette::Result<Option<Packument>> {
        (**self).fetch(name).await
    }
}

/// Packuments from an npm registry over HTTP, cached on disk.
pub struct HttpSource {
    client: Client,
    endpoint: RegistryEndpoint,
    cache: Option<PackumentCache>,
    ttl: Duration,
    offline: bool,
}

impl HttpSource {
    pub fn new(config: &RegistryConfig) -> miette::Result<Self> {
        let client = download::build_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            client,
            endpoint: RegistryEndpoint::from_config(config),
            cache: Some(PackumentCache::new(&config.cache_path())),
            ttl: Duration::from_secs(config.cache_ttl_secs),
            offline: config.offline,
        })
    }

    fn cached(&self, name: &str, max_age: Option<Duration>) -> Option<String> {
        self.cache.as_ref()?.get(name, max_age)
    }
}

#[async_trait]
impl PackumentSource for HttpSource {
    async fn fetch(&self, name: &str) -> miette::Result<Option<Packument>> {
        if self.offline {
            return match self.cached(name, None) {
                Some(json) => Packument::from_json(&json).map(Some),
                None => {
                    tracing::debug!("{name} is not cached and the registry is offline");
                    Ok(None)
                }
            };
        }

        if let Some(json) = self.cached(name, Some(self.ttl)) {
            tracing::debug!("Packument cache hit for {name}");
            return Packument::from_json(&json).map(Some);
        }

        let url = self.endpoint.packument_url(name);
        tracing::debug!("Fetching {url}");
        let json = match download::download_text(&self.client, &self.endpoint, &url).await {
            Ok(Some(json)) => json,
            Ok(None) => return Ok(None),
            Err(e) => match self.cached(name, None) {
                Some(stale) => {
                    tracing::warn!("Using stale cached packument for {name}: {e}");
                    stale
                }
                None => return Err(e),
            },
        };

        let packument = Packument::from_json(&json)?;
        if let Some(ref cache) = self.cache {
            if let Err(e) = cache.put(name, &json) {
                tracing::warn!("Failed to cache packument for {name}: {e}");
            }
        }
        Ok(Some(packument))
    }
}

/// Packuments from an in-memory map, typically loaded from a JSON file of
/// the form `{ "<name>": <packument>, ... }`.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    packuments: BTreeMap<String, Packument>,
}

impl SnapshotSource {
    pub fn new(packuments: impl IntoIterator<Item = Packument>) -> Self {
        Self {
            packuments: packuments
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
        }
    }

    /// Parse a snapshot document. A packument without a `name` takes its map key.
    pub fn from_json(json: &str) -> miette::Result<Self> {
        let raw: BTreeMap<String, Packument> =
            serde_json::from_str(json).map_err(|e| GraphError::Registry {
                message: format!("Failed to parse registry snapshot: {e}"),
            })?;
        Ok(Self {
            packuments: raw
                .into_iter()
                .map(|(name, mut p)| {
                    if p.name.is_empty() {
                        p.name = name.clone();
                    }
                    (name, p)
                })
                .collect(),
        })
    }

    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| GraphError::Registry {
            message: format!("Failed to read registry snapshot {}: {e}", path.display()),
        })?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.packuments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packuments.is_empty()
    }
}

#[async_trait]
impl PackumentSource for SnapshotSource {
    async fn fetch(&self, name: &str) -> miette::Result<Option<Packument>> {
        Ok(self.packuments.get(name).cloned())
    }
}
