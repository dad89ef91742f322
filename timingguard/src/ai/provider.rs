//! Reasoning backend trait
//!
//! Common interface for the remote services the orchestrator can consult.
//! Implementations only move text: schema validation happens in the router.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport-level failures. Every variant means "unavailable" to the
/// orchestrator and triggers failover without a repair attempt.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("API request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Missing API key for backend '{0}'")]
    MissingApiKey(String),
    #[error("Backend call timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// One chat exchange: system instructions plus the user payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendRequest {
    pub system: String,
    pub user: String,
}

/// Information about a backend model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Backend name (e.g. "groq", "cohere")
    pub provider: String,

    pub model_name: String,

    /// Whether the backend reliably honours JSON-only instructions
    pub supports_json: bool,
}

#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Checked before every call; a backend that was unreachable earlier
    /// is tried again.
    async fn is_available(&self) -> bool;

    /// Send one request and return the raw text of the reply.
    async fn complete(&self, request: &BackendRequest) -> Result<String, BackendError>;

    fn model_info(&self) -> ModelInfo;

    /// `name/model`, as recorded in provenance.
    fn label(&self) -> String {
        format!("{}/{}", self.name(), self.model_info().model_name)
    }
}
