//! npm registry endpoint: base URL, packument URL layout, credentials.

use npmgraph_core::config::RegistryConfig;

/// A configured npm registry with an optional bearer token.
#[derive(Debug, Clone)]
pub struct RegistryEndpoint {
    pub url: String,
    pub token: Option<String>,
}

impl RegistryEndpoint {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Build an endpoint from `[registry]` configuration.
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self {
            token: config.auth_token(),
            ..Self::new(&config.url)
        }
    }

    /// URL of the full packument (all versions) for a package.
    ///
    /// Scoped names keep their `@` and encode the separator:
    /// `@types/node` becomes `<url>/@types%2fnode`.
    pub fn packument_url(&self, name: &str) -> String {
        format!("{}/{}", self.url, name.replace('/', "%2f"))
    }

    /// Whether this registry has authentication configured.
    pub fn has_auth(&self) -> bool {
        self.token.is_some()
    }
}
