//! Per-node presentation data: license, maintainers, stub and staleness.

use serde::Serialize;

use npmgraph_core::module::parse_key;

use crate::resolver::Resolution;

/// License shown for modules that do not declare one.
pub const UNSPECIFIED_LICENSE: &str = "Unspecified";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeAnnotation {
    pub key: String,
    pub name: String,
    pub version: String,
    pub license: String,
    pub maintainers: Vec<String>,
    pub stub: bool,
    /// Reached only through a pinned range, never as a latest version.
    pub stale: bool,
}

/// Annotate every node of a resolution, in node order.
///
/// Nodes whose key cannot be split back into name and version are logged
/// and left out.
pub fn annotate(resolution: &Resolution) -> Vec<NodeAnnotation> {
    resolution
        .nodes
        .iter()
        .filter_map(|module| {
            let Some((name, Some(version))) = parse_key(module.key()) else {
                tracing::warn!("Cannot derive a package name from '{}'", module.key());
                return None;
            };
            let manifest = &module.manifest;
            Some(NodeAnnotation {
                key: module.key().to_string(),
                name: name.to_string(),
                version: version.to_string(),
                license: manifest
                    .license_string()
                    .unwrap_or_else(|| UNSPECIFIED_LICENSE.to_string()),
                maintainers: manifest
                    .maintainer_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                stub: module.is_stub(),
                stale: !resolution.is_latest(module.key()),
            })
        })
        .collect()
}
