use crate::source::SourceError;
use anyhow::{Context, Result};
use kickoff_model::FetchConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use std::time::Duration;

/// HTTP client for schedule pages.
///
/// Sends a browser-like header set, waits `request_delay` before every
/// request, and reports bot-block pages as failures instead of content.
pub struct PageFetcher {
    client: reqwest::Client,
    request_delay: Duration,
    block_markers: Vec<String>,
}

impl PageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name '{name}'"))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header '{name}'"))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            request_delay: Duration::from_millis(config.request_delay_ms),
            block_markers: config.block_markers.clone(),
        })
    }

    /// Fetch a page body.
    pub async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        tracing::info!(url = %url, "Fetching page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SourceError::Network { url: url.to_string(), source })?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(SourceError::Blocked {
                url: url.to_string(),
                marker: "HTTP 403".to_string(),
            });
        }
        if !status.is_success() {
            return Err(SourceError::Status { url: url.to_string(), status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| SourceError::Network { url: url.to_string(), source })?;
        tracing::debug!(url = %url, bytes = body.len(), "Received HTML");

        if let Some(marker) = find_block_marker(&body, &self.block_markers) {
            return Err(SourceError::Blocked {
                url: url.to_string(),
                marker: marker.to_string(),
            });
        }

        Ok(body)
    }
}

/// First configured marker phrase present in `body`, case-insensitively.
pub fn find_block_marker<'a>(body: &str, markers: &'a [String]) -> Option<&'a str> {
    let lower = body.to_lowercase();
    markers
        .iter()
        .find(|m| lower.contains(&m.to_lowercase()))
        .map(String::as_str)
}
