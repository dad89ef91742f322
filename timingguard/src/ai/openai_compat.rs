//! OpenAI-compatible chat completions (Groq, Cerebras, local servers).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ai::http;
use crate::ai::provider::{BackendError, BackendRequest, ModelInfo, ReasoningBackend};
use crate::config::BackendConfig;

pub struct OpenAiCompatClient {
    client: Client,
    config: BackendConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatClient {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: http::build_client()?,
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ReasoningBackend for OpenAiCompatClient {
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

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: http::TEMPERATURE,
            max_tokens: http::MAX_TOKENS,
            response_format: ResponseFormat { kind: "json_object" },
        };

        tracing::debug!("POST {} (model {})", self.endpoint(), self.config.model);
        let resp = http::post_json(&self.client, &self.config.name, &self.endpoint(), &api_key, &body).await?;
        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse JSON: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| BackendError::InvalidResponse("Empty choices in response".to_string()))
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: self.config.name.clone(),
            model_name: self.config.model.clone(),
            supports_json: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_cleanly() {
        let mut config = BackendConfig::groq();
        config.base_url = "http://localhost:8080/v1/".to_string();
        let client = OpenAiCompatClient::new(config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let mut config = BackendConfig::groq();
        config.api_key_env = Some("TIMINGGUARD_TEST_UNSET_KEY".to_string());
        let client = OpenAiCompatClient::new(config).unwrap();
        assert!(!client.is_available().await);
        let request = BackendRequest {
            system: "s".to_string(),
            user: "u".to_string(),
        };
        assert!(matches!(
            client.complete(&request).await,
            Err(BackendError::MissingApiKey(_))
        ));
    }
}
