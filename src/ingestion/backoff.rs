use metrics::counter;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::app::ports::{HttpClientPort, HttpRequest};
use crate::config::ApiKey;
use crate::constants::API_KEY_HEADER;
use crate::error::FetchError;
use crate::observability::{HTTP_REQUESTS_TOTAL, RATE_LIMITED_TOTAL};

/// Bounds for one logical call against a rate-limited endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound on requests issued for a single call. Zero behaves as one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Wait after the `retry`-th rate-limited response: `base_delay * 2^retry`.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// Authenticated GET with exponential backoff on HTTP 429.
///
/// Only rate limiting is retried. Any other non-2xx status, a transport
/// failure or an undecodable body ends the call at once, so a caller working
/// through a batch can skip the entity and move on.
pub struct BackoffFetcher {
    http: Arc<dyn HttpClientPort>,
    api_key: ApiKey,
}

impl BackoffFetcher {
    pub fn new(http: Arc<dyn HttpClientPort>, api_key: ApiKey) -> Self {
        Self { http, api_key }
    }

    #[instrument(skip(self, params, policy))]
    pub async fn fetch_one(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        policy: &RetryPolicy,
    ) -> Result<Value, FetchError> {
        let mut request =
            HttpRequest::get(endpoint).header(API_KEY_HEADER, self.api_key.expose());
        for (key, value) in params {
            request = request.query(key, value);
        }

        let mut retries = 0u32;
        loop {
            counter!(HTTP_REQUESTS_TOTAL).increment(1);
            let response = self
                .http
                .get(&request)
                .await
                .map_err(FetchError::Transport)?;

            if response.is_success() {
                debug!("{} answered {} bytes", endpoint, response.bytes.len());
                return Ok(serde_json::from_slice(&response.bytes)?);
            }

            if response.status != StatusCode::TOO_MANY_REQUESTS.as_u16() {
                warn!("Error: {} - {}", response.status, response.text());
                return Err(FetchError::Upstream {
                    status: response.status,
                    body: response.text(),
                });
            }

            counter!(RATE_LIMITED_TOTAL).increment(1);
            retries += 1;
            if retries >= policy.max_attempts() {
                warn!("Max retries reached for {}", endpoint);
                return Err(FetchError::RetriesExhausted { attempts: retries });
            }

            let wait = policy.backoff_delay(retries);
            warn!("Rate limit reached. Retrying in {:?}...", wait);
            tokio::time::sleep(wait).await;
        }
    }
}
