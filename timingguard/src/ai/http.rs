//! Shared POST-with-retry used by the HTTP backends.

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;

use crate::ai::provider::BackendError;

const MAX_RETRIES: u32 = 2;
const INITIAL_RETRY_DELAY_MS: u64 = 500;
const MAX_RETRY_AFTER_SECS: u64 = 5;
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Sampling settings shared by every HTTP backend.
pub(crate) const TEMPERATURE: f32 = 0.2;
pub(crate) const MAX_TOKENS: u32 = 1200;

/// Fails when the TLS backend cannot be initialised.
pub(crate) fn build_client() -> Result<Client, BackendError> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

/// POST `body` as JSON with bearer auth. Rate limits and connection errors
/// are retried with backoff; any other non-2xx status is returned as is.
pub(crate) async fn post_json<B: Serialize + ?Sized>(
    client: &Client,
    backend: &str,
    url: &str,
    api_key: &str,
    body: &B,
) -> Result<reqwest::Response, BackendError> {
    let mut retry_count = 0;
    let mut delay_ms = INITIAL_RETRY_DELAY_MS;

    loop {
        let response = client
            .post(url)
            .bearer_auth(api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => return Ok(resp),
            Ok(resp) if resp.status().as_u16() == 429 && retry_count < MAX_RETRIES => {
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(|s| s.min(MAX_RETRY_AFTER_SECS) * 1000)
                    .unwrap_or(delay_ms);
                retry_count += 1;
                tracing::warn!(
                    "{} rate limited. Retrying after {}ms (attempt {}/{})",
                    backend,
                    retry_after,
                    retry_count,
                    MAX_RETRIES
                );
                sleep(Duration::from_millis(retry_after)).await;
                delay_ms *= 2;
            }
            Ok(resp) => {
                let status = resp.status().as_u16();
                let text = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(BackendError::ApiError {
                    status,
                    message: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
                });
            }
            Err(e) if (e.is_connect() || e.is_request()) && retry_count < MAX_RETRIES => {
                retry_count += 1;
                tracing::warn!(
                    "{} request failed: {}. Retrying in {}ms (attempt {}/{})",
                    backend,
                    e,
                    delay_ms,
                    retry_count,
                    MAX_RETRIES
                );
                sleep(Duration::from_millis(delay_ms)).await;
                delay_ms *= 2;
            }
            Err(e) => return Err(BackendError::RequestFailed(e)),
        }
    }
}
