//! Weather API client for `OpenMeteo`
//!
//! Performs the GET for one collection job and hands back the decoded JSON.
//! Failed requests are not retried; the next scheduler tick tries again.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::WeatherConfig;
use crate::{CollectorError, Result};

/// Network adapter used by the worker pool
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and decode the body as JSON
    async fn get(&self, url: &str) -> Result<Value>;
}

/// `reqwest` backed fetcher for the `OpenMeteo` forecast endpoint
pub struct OpenMeteoClient {
    client: Client,
}

impl OpenMeteoClient {
    /// Create a new client with the configured timeout and user agent
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| CollectorError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for OpenMeteoClient {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, url: &str) -> Result<Value> {
        let start_time = Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                CollectorError::api(format!("Request timed out: {e}"))
            } else {
                CollectorError::api(format!("Network error: {e}"))
            }
        })?;

        let status = response.status();
        debug!(
            "HTTP response received: {} in {:.3}s",
            status,
            start_time.elapsed().as_secs_f64()
        );

        if !status.is_success() {
            return Err(status_error(status));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| CollectorError::api(format!("Failed to decode response body: {e}")))?;

        let total_duration = start_time.elapsed();
        if total_duration.as_secs() > 5 {
            warn!(
                "Slow API response detected: {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        Ok(body)
    }
}

fn status_error(status: StatusCode) -> CollectorError {
    match status.as_u16() {
        400 => CollectorError::api("Weather API rejected the request (HTTP 400)"),
        404 => CollectorError::api("Weather API endpoint not found (HTTP 404)"),
        429 => CollectorError::api("Weather API rate limit exceeded (HTTP 429)"),
        _ => CollectorError::api(format!(
            "API request failed with status: {} - {}",
            status,
            status.canonical_reason().unwrap_or("Unknown error")
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_messages() {
        assert!(
            status_error(StatusCode::TOO_MANY_REQUESTS)
                .to_string()
                .contains("rate limit")
        );
        assert!(
            status_error(StatusCode::BAD_GATEWAY)
                .to_string()
                .contains("502")
        );
    }

    #[test]
    fn test_client_builds_from_default_config() {
        assert!(OpenMeteoClient::new(&WeatherConfig::default()).is_ok());
    }
}
