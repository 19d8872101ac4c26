//! Registry authentication.
//!
//! Tokens come from `[registry] token` or the environment variable named by
//! `[registry] token-env`:
//!
//! ```toml
//! [registry]
//! url = "https://npm.example.com"
//! token-env = "NPM_TOKEN"
//! ```

use reqwest::RequestBuilder;

use crate::endpoint::RegistryEndpoint;

/// Apply authentication to a request if the registry has a token.
pub fn apply_auth(request: RequestBuilder, registry: &RegistryEndpoint) -> RequestBuilder {
    match registry.token {
        Some(ref token) => request.bearer_auth(token),
        None => request,
    }
}
