//! npm registry access: packument download, local cache, version range
//! selection, and a memoizing client that turns `(name, range)` pairs into
//! resolved modules.

use std::sync::Arc;

use async_trait::async_trait;

use npmgraph_core::module::Module;

pub mod auth;
pub mod cache;
pub mod client;
pub mod download;
pub mod endpoint;
pub mod packument;
pub mod range;
pub mod source;

pub use client::RegistryClient;
pub use source::{HttpSource, PackumentSource, SnapshotSource};

/// Resolves a package name and an optional version range to a module.
///
/// `None` asks for the latest published version. Implementations must be
/// safe to call concurrently and should memoize identical requests.
#[async_trait(?Send)]
pub trait Registry {
    async fn resolve(&self, name: &str, range: Option<&str>) -> miette::Result<Arc<Module>>;
}

#[async_trait(?Send)]
impl<R: Registry + ?Sized> Registry for Arc<R> {
    async fn resolve(&self, name: &str, range: Option<&str>) -> miette::Result<Arc<Module>> {
        (**self).resolve(name, range).await
    }
}
