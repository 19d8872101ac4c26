//! Memoizing registry client over a [`PackumentSource`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell, Semaphore};

use npmgraph_core::module::{parse_key, Module};
use npmgraph_util::errors::GraphError;

use crate::packument::Packument;
use crate::range::select_version;
use crate::source::PackumentSource;
use crate::Registry;

type Memo<K, V> = Mutex<HashMap<K, Arc<OnceCell<V>>>>;

/// Resolves `(name, range)` pairs to modules.
///
/// Packuments are fetched at most once per name and resolved modules are
/// remembered per `(name, range)`. Concurrent identical requests wait on the
/// same in-flight lookup. Failed lookups are not remembered, so a later
/// request tries again. At most `max_concurrent` source fetches run at once.
pub struct RegistryClient<S> {
    source: S,
    permits: Semaphore,
    packuments: Memo<String, Option<Arc<Packument>>>,
    modules: Memo<(String, Option<String>), Arc<Module>>,
    fetches: AtomicUsize,
}

impl<S: PackumentSource> RegistryClient<S> {
    pub fn new(source: S, max_concurrent: usize) -> Self {
        Self {
            source,
            permits: Semaphore::new(max_concurrent.max(1)),
            packuments: Mutex::new(HashMap::new()),
            modules: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of packument fetches issued to the source so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// The packument for `name`, or `None` if the source does not know it.
    pub async fn packument(&self, name: &str) -> miette::Result<Option<Arc<Packument>>> {
        let cell = {
            let mut memo = self.packuments.lock().await;
            memo.entry(name.to_string()).or_default().clone()
        };
        let packument = cell.get_or_try_init(|| self.fetch(name)).await?;
        Ok(packument.clone())
    }

    async fn fetch(&self, name: &str) -> miette::Result<Option<Arc<Packument>>> {
        let _permit = self.permits.acquire().await.map_err(|e| GraphError::Generic {
            message: format!("Registry client shut down: {e}"),
        })?;
        self.fetches.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Fetching packument for {name}");
        Ok(self.source.fetch(name).await?.map(Arc::new))
    }

    async fn load(&self, name: &str, range: Option<&str>) -> miette::Result<Arc<Module>> {
        let Some(packument) = self.packument(name).await? else {
            tracing::warn!("Package {name} not found, using a placeholder");
            return Ok(Arc::new(Module::stub(name, range)));
        };

        let version = select_version(&packument, range)?;
        let manifest = packument.manifest(&version).ok_or_else(|| GraphError::Registry {
            message: format!("{name}@{version} has no manifest"),
        })?;
        Ok(Arc::new(Module::new(name, &version, manifest)))
    }
}

#[async_trait(?Send)]
impl<S: PackumentSource> Registry for RegistryClient<S> {
    async fn resolve(&self, name: &str, range: Option<&str>) -> miette::Result<Arc<Module>> {
        let range = range.map(str::trim).filter(|r| !r.is_empty());

        // `npm:<target>[@<range>]` installs another package under this name.
        if let Some(target) = range.and_then(|r| r.strip_prefix("npm:")) {
            let (target_name, target_range) =
                parse_key(target).ok_or_else(|| GraphError::Registry {
                    message: format!("Invalid npm alias '{target}' for {name}"),
                })?;
            return self.resolve(target_name, target_range).await;
        }

        let cell = {
            let mut memo = self.modules.lock().await;
            memo.entry((name.to_string(), range.map(str::to_string)))
                .or_default()
                .clone()
        };
        let module = cell.get_or_try_init(|| self.load(name, range)).await?;
        Ok(module.clone())
    }
}
