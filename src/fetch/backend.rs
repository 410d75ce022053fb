//! Client for the browser rendering service
//!
//! Pages on the target site are built by client-side scripts, so plain HTTP
//! GETs do not see the document body. Rendering is delegated to an external
//! browser-automation service consumed as a black box: given a URL it returns
//! either the rendered HTML or an error message. Retry behavior is the
//! service's own concern; this client surfaces each outcome exactly once.

use crate::config::FetchConfig;
use crate::{CorpusError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// User-Agent string for requests to the rendering service
const USER_AGENT: &str = concat!("ccr-corpus/", env!("CARGO_PKG_VERSION"));

/// Wire request accepted by the rendering service
#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    url: &'a str,
    timeout_ms: u64,
    cache_bypass: bool,
    wait_for_network_idle: bool,
}

/// Wire response produced by the rendering service
#[derive(Debug, Deserialize)]
struct RenderResponse {
    success: bool,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the rendering service
pub struct RenderClient {
    client: Client,
    endpoint: String,
    timeout_ms: u64,
    cache_bypass: bool,
    wait_for_network_idle: bool,
}

impl RenderClient {
    /// Builds a client from the fetch configuration
    ///
    /// The HTTP-level timeout is the render timeout plus a margin, so the
    /// service's own page timeout fires first; the fetch gate enforces the
    /// hard deadline on top.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(config.timeout_ms + 5_000))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.render_endpoint.clone(),
            timeout_ms: config.timeout_ms,
            cache_bypass: config.cache_bypass,
            wait_for_network_idle: config.wait_for_network_idle,
        })
    }

    /// Renders one URL through the service
    ///
    /// Every failure mode (transport error, non-2xx status, malformed body,
    /// service-reported failure) maps to [`CorpusError::Render`] so callers
    /// can contain it at the single-URL boundary.
    pub async fn render(&self, url: &str) -> Result<String> {
        let request = RenderRequest {
            url,
            timeout_ms: self.timeout_ms,
            cache_bypass: self.cache_bypass,
            wait_for_network_idle: self.wait_for_network_idle,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| CorpusError::Render {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CorpusError::Render {
                url: url.to_string(),
                message: format!("rendering service returned HTTP {}", status.as_u16()),
            });
        }

        let body: RenderResponse = response.json().await.map_err(|e| CorpusError::Render {
            url: url.to_string(),
            message: format!("malformed service response: {}", e),
        })?;

        if body.success {
            body.html.ok_or_else(|| CorpusError::Render {
                url: url.to_string(),
                message: "service reported success without html".to_string(),
            })
        } else {
            Err(CorpusError::Render {
                url: url.to_string(),
                message: body
                    .error
                    .unwrap_or_else(|| "unspecified render error".to_string()),
            })
        }
    }
}
