//! On-disk packument cache mirroring registry names.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use npmgraph_util::errors::GraphError;

/// Packument cache at `<cache-dir>/registry/`.
///
/// `express` is stored as `registry/express.json`, `@types/node` as
/// `registry/@types/node.json`.
#[derive(Debug, Clone)]
pub struct PackumentCache {
    root: PathBuf,
}

impl PackumentCache {
    /// Create a cache rooted at `cache_dir/registry/`.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            root: cache_dir.join("registry"),
        }
    }

    /// The root directory of this cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path within the cache for a package, or `None` for names that would
    /// escape the cache directory.
    pub fn packument_path(&self, name: &str) -> Option<PathBuf> {
        let valid = !name.is_empty()
            && !name.starts_with('/')
            && !name.contains('\\')
            && !name.split('/').any(|part| part.is_empty() || part == "." || part == "..");
        valid.then(|| self.root.join(format!("{name}.json")))
    }

    /// Read a cached packument. With `max_age`, entries older than that are
    /// treated as missing.
    pub fn get(&self, name: &str, max_age: Option<Duration>) -> Option<String> {
        let path = self.packument_path(name)?;
        let meta = fs::metadata(&path).ok()?;
        if !meta.is_file() {
            return None;
        }
        if let Some(max_age) = max_age {
            let modified = meta.modified().ok()?;
            let age = SystemTime::now()
                .duration_since(modified)
                .unwrap_or(Duration::ZERO);
            if age > max_age {
                tracing::debug!("Cached packument for {name} is stale ({}s)", age.as_secs());
                return None;
            }
        }
        fs::read_to_string(&path).ok()
    }

    /// Store packument JSON, creating directories as needed.
    pub fn put(&self, name: &str, json: &str) -> miette::Result<PathBuf> {
        let path = self.packument_path(name).ok_or_else(|| GraphError::Registry {
            message: format!("Refusing to cache invalid package name '{name}'"),
        })?;
        npmgraph_util::fs::write_atomic(&path, json.as_bytes()).map_err(GraphError::Io)?;
        Ok(path)
    }

    /// Number of cached packuments.
    pub fn entry_count(&self) -> usize {
        count_json_files(&self.root)
    }

    /// Total size of the cache directory in bytes.
    pub fn size(&self) -> u64 {
        npmgraph_util::fs::dir_size(&self.root)
    }

    /// Remove every cached packument. Returns the number of bytes freed.
    pub fn clear(&self) -> miette::Result<u64> {
        if !self.root.is_dir() {
            return Ok(0);
        }
        let freed = self.size();
        fs::remove_dir_all(&self.root).map_err(GraphError::Io)?;
        Ok(freed)
    }
}

fn count_json_files(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_json_files(&path)
            } else {
                usize::from(path.extension().is_some_and(|e| e == "json"))
            }
        })
        .sum()
}
