//! Cohere v1 `/chat` backend.
//!
//! System instructions travel as the `preamble`; the reply text is in the
//! top-level `text` field.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ai::http;
use crate::ai::provider::{BackendError, BackendRequest, ModelInfo, ReasoningBackend};
use crate::config::BackendConfig;

pub struct CohereClient {
    client: Client,
    config: BackendConfig,
}

#[derive(Debug, Serialize)]
struct CohereRequest<'a> {
    model: &'a str,
    message: &'a str,
    preamble: &'a str,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CohereResponse {
    #[serde(default)]
    text: String,
}

impl CohereClient {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: http::build_client()?,
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ReasoningBackend for CohereClient {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn is_available(&self) -> bool {
        self.config.resolve_api_key().is_some()
    }

    async fn complete(&self, request: &BackendRequest) -> Result<String, BackendError> {
        let api_key = self
            .config
            .resolve_api_key()
            .ok_or_else(|| BackendError::MissingApiKey(self.config.name.clone()))?;

        let body = CohereRequest {
            model: &self.config.model,
            message: &request.user,
            preamble: &request.system,
            temperature: http::TEMPERATURE,
            max_tokens: http::MAX_TOKENS,
        };

        tracing::debug!("POST {} (model {})", self.endpoint(), self.config.model);
        let resp = http::post_json(&self.client, &self.config.name, &self.endpoint(), &api_key, &body).await?;
        let parsed: CohereResponse = resp
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse JSON: {}", e)))?;

        let text = parsed.text.trim();
        if text.is_empty() {
            return Err(BackendError::InvalidResponse("Empty text in response".to_string()));
        }
        Ok(text.to_string())
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: self.config.name.clone(),
            model_name: self.config.model.clone(),
            supports_json: false,
        }
    }
}
