//! Packument downloading from npm registries.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Client;

use npmgraph_util::errors::GraphError;

use crate::auth;
use crate::endpoint::RegistryEndpoint;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Build a shared reqwest client for registry requests.
pub fn build_client(timeout: Duration) -> miette::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("npmgraph/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            GraphError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            }
            .into()
        })
}

/// Download raw bytes from a URL, with authentication and retries.
///
/// Returns `Ok(None)` for 404 (package not in this registry).
/// Server errors, timeouts and connection failures are retried.
pub async fn download_bytes(
    client: &Client,
    registry: &RegistryEndpoint,
    url: &str,
) -> miette::Result<Option<Vec<u8>>> {
    let mut last_err = String::new();

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            tokio::time::sleep(RETRY_DELAY * attempt).await;
            tracing::debug!("Retrying {url} (attempt {})", attempt + 1);
        }

        let req = auth::apply_auth(client.get(url).header(ACCEPT, "application/json"), registry);

        match req.send().await {
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if status.is_server_error() {
                    last_err = format!("HTTP {status} from {url}");
                    continue;
                }
                if !status.is_success() {
                    return Err(GraphError::Network {
                        message: format!("HTTP {status} fetching {url}"),
                    }
                    .into());
                }

                let bytes = resp.bytes().await.map_err(|e| GraphError::Network {
                    message: format!("Failed to read response from {url}: {e}"),
                })?;
                return Ok(Some(bytes.to_vec()));
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                last_err = format!("{e}");
                continue;
            }
            Err(e) => {
                return Err(GraphError::Network {
                    message: format!("Request to {url} failed: {e}"),
                }
                .into());
            }
        }
    }

    Err(GraphError::Network {
        message: format!("Failed after {MAX_RETRIES} retries for {url}: {last_err}"),
    }
    .into())
}

/// Download a text document (packument JSON).
pub async fn download_text(
    client: &Client,
    registry: &RegistryEndpoint,
    url: &str,
) -> miette::Result<Option<String>> {
    match download_bytes(client, registry, url).await? {
        Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).to_string())),
        None => Ok(None),
    }
}
