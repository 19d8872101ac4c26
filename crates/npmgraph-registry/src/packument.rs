//! Packument parsing: the registry document listing every published version
//! of a package along with its dist-tags.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use npmgraph_core::manifest::PackageManifest;
use npmgraph_util::errors::GraphError;

/// A package document as served by `GET <registry>/<name>`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Packument {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "dist-tags", deserialize_with = "lenient_tags")]
    pub dist_tags: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_versions")]
    pub versions: BTreeMap<String, PackageManifest>,
}

impl Packument {
    /// Parse a packument from registry JSON.
    pub fn from_json(json: &str) -> miette::Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            GraphError::Registry {
                message: format!("Failed to parse packument: {e}"),
            }
            .into()
        })
    }

    /// The version the `latest` dist-tag points at, if it is published.
    pub fn latest_tag(&self) -> Option<&str> {
        self.dist_tags
            .get("latest")
            .map(String::as_str)
            .filter(|v| self.versions.contains_key(*v))
    }

    /// The manifest of one published version, with `name` and `version`
    /// filled from the packument when the entry omits them.
    pub fn manifest(&self, version: &str) -> Option<PackageManifest> {
        let mut manifest = self.versions.get(version)?.clone();
        if manifest.name.is_empty() {
            manifest.name = self.name.clone();
        }
        manifest.version = version.to_string();
        Some(manifest)
    }
}

fn lenient_tags<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(tag, v)| v.as_str().map(|v| (tag, v.to_string())))
            .collect(),
        _ => BTreeMap::new(),
    })
}

fn lenient_versions<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<BTreeMap<String, PackageManifest>, D::Error> {
    let Value::Object(map) = Value::deserialize(d)? else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(version, entry)| match serde_json::from_value(entry) {
            Ok(manifest) => Some((version, manifest)),
            Err(e) => {
                tracing::debug!("Skipping unreadable version entry {version}: {e}");
                None
            }
        })
        .collect())
}
