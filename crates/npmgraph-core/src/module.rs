//! Module identity: a package name pinned to one resolved version.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::manifest::PackageManifest;

/// Version recorded for a stub module when no version hint was available.
pub const STUB_VERSION: &str = "0.0.0";

/// A uniquely-versioned package, identified by its `name@version` key.
///
/// Two modules with the same key are the same graph node; equality and
/// hashing only look at the key.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    version: String,
    key: String,
    pub manifest: PackageManifest,
}

impl Module {
    pub fn new(name: &str, version: &str, manifest: PackageManifest) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            key: format!("{name}@{version}"),
            manifest,
        }
    }

    /// Build a module from a registry manifest, taking name and version from it.
    pub fn from_manifest(manifest: PackageManifest) -> Self {
        let name = manifest.name.clone();
        let version = manifest.version.clone();
        Self::new(&name, &version, manifest)
    }

    /// Placeholder for a package whose metadata could not be fetched.
    ///
    /// The stub has no dependencies, so it is a leaf in the graph.
    pub fn stub(name: &str, version: Option<&str>) -> Self {
        let version = version.unwrap_or(STUB_VERSION);
        let manifest = PackageManifest {
            name: name.to_string(),
            version: version.to_string(),
            stub: true,
            ..PackageManifest::default()
        };
        Self::new(name, version, manifest)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Stable identity, `name@version`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_stub(&self) -> bool {
        self.manifest.stub
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Module {}

impl Hash for Module {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Split a package identifier into name and optional version.
///
/// Accepts `name`, `name@version`, `@scope/name` and `@scope/name@version`.
/// The version part may be a range when the identifier is user input
/// (`express@^4`). Returns `None` for an empty name, a scope without a
/// package (`@scope`), or a trailing `@`.
pub fn parse_key(key: &str) -> Option<(&str, Option<&str>)> {
    let key = key.trim();
    // A leading `@` belongs to the npm scope, not the version separator.
    let search_from = usize::from(key.starts_with('@'));
    let (name, version) = match key[search_from..].rfind('@') {
        Some(idx) => {
            let split = search_from + idx;
            (&key[..split], Some(&key[split + 1..]))
        }
        None => (key, None),
    };
    if name.is_empty() || (name.starts_with('@') && !name.contains('/')) || version == Some("") {
        return None;
    }
    Some((name, version))
}
