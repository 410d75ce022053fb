//! Admission-controlled wrapper around the rendering backend
//!
//! The gate enforces the crawl's resource bounds in one place: a fixed
//! politeness delay before each request, a counting limit on concurrently
//! in-flight renders (independent of whatever batch size the drivers use),
//! and a per-request deadline. It performs no retries; each call resolves to
//! exactly one outcome.

use crate::config::FetchConfig;
use crate::fetch::backend::RenderClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Result of one gated fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// The rendering service produced HTML
    Rendered { html: String },

    /// The fetch failed; the reason is recorded, never raised
    Failed { reason: String },
}

/// Counting admission control in front of the rendering backend
pub struct FetchGate {
    backend: RenderClient,
    semaphore: Arc<Semaphore>,
    delay: Duration,
    timeout: Duration,
}

impl FetchGate {
    /// Creates a gate over the given backend
    pub fn new(backend: RenderClient, config: &FetchConfig) -> Self {
        Self {
            backend,
            semaphore: Arc::new(Semaphore::new(config.max_in_flight as usize)),
            delay: Duration::from_millis(config.delay_ms),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Fetches one URL: wait for admission, apply the politeness delay,
    /// render with a deadline
    ///
    /// A deadline overrun resolves to `Failed` with a timeout reason, like
    /// any other failure; callers never see an error type from this method.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return FetchOutcome::Failed {
                    reason: "fetch gate closed".to_string(),
                }
            }
        };

        tokio::time::sleep(self.delay).await;

        tracing::debug!(%url, "rendering");

        match tokio::time::timeout(self.timeout, self.backend.render(url)).await {
            Ok(Ok(html)) => FetchOutcome::Rendered { html },
            Ok(Err(e)) => FetchOutcome::Failed {
                reason: e.to_string(),
            },
            Err(_) => FetchOutcome::Failed {
                reason: format!("timeout after {}ms", self.timeout.as_millis()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gate_config(endpoint: String, delay_ms: u64, timeout_ms: u64) -> FetchConfig {
        FetchConfig {
            render_endpoint: endpoint,
            delay_ms,
            max_in_flight: 2,
            timeout_ms,
            cache_bypass: true,
            wait_for_network_idle: true,
        }
    }

    fn success_body() -> serde_json::Value {
        serde_json::json!({ "success": true, "html": "<html></html>" })
    }

    #[tokio::test]
    async fn test_fetch_returns_html() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let config = gate_config(format!("{}/render", server.uri()), 0, 5_000);
        let gate = FetchGate::new(RenderClient::new(&config).unwrap(), &config);

        match gate.fetch("https://example.com/a").await {
            FetchOutcome::Rendered { html } => assert!(html.contains("html")),
            FetchOutcome::Failed { reason } => panic!("unexpected failure: {}", reason),
        }
    }

    #[tokio::test]
    async fn test_fetch_applies_delay() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let config = gate_config(format!("{}/render", server.uri()), 200, 5_000);
        let gate = FetchGate::new(RenderClient::new(&config).unwrap(), &config);

        let started = Instant::now();
        gate.fetch("https://example.com/a").await;
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_fetch_timeout_resolves_to_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(success_body())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let config = gate_config(format!("{}/render", server.uri()), 0, 100);
        let gate = FetchGate::new(RenderClient::new(&config).unwrap(), &config);

        match gate.fetch("https://example.com/slow").await {
            FetchOutcome::Failed { reason } => assert!(reason.contains("timeout")),
            FetchOutcome::Rendered { .. } => panic!("expected timeout"),
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_surfaces_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": "navigation aborted"
            })))
            .mount(&server)
            .await;

        let config = gate_config(format!("{}/render", server.uri()), 0, 5_000);
        let gate = FetchGate::new(RenderClient::new(&config).unwrap(), &config);

        match gate.fetch("https://example.com/bad").await {
            FetchOutcome::Failed { reason } => assert!(reason.contains("navigation aborted")),
            FetchOutcome::Rendered { .. } => panic!("expected failure"),
        }
    }
}
