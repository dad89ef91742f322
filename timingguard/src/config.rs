//! Configuration for thresholds and reasoning backends.
//!
//! Everything here is read-only once the orchestrator is built. Credentials
//! are resolved when a backend is constructed and re-checked on each call.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::TimingGuardError;

pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Cutoffs used to derive hints and severity tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicThresholds {
    pub deep_logic_levels: u32,
    pub high_routing_pct: f64,
    pub high_fanout: u32,
    /// Skew counts as large at this fraction of the path requirement
    pub large_skew_fraction: f64,
    pub severe_slack_ns: f64,
    pub moderate_slack_ns: f64,
}

impl Default for HeuristicThresholds {
    fn default() -> Self {
        Self {
            deep_logic_levels: 8,
            high_routing_pct: 60.0,
            high_fanout: 32,
            large_skew_fraction: 0.5,
            severe_slack_ns: -2.0,
            moderate_slack_ns: -0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// `/chat/completions` endpoints (Groq, Cerebras)
    OpenaiCompatible,
    /// Cohere v1 `/chat`
    Cohere,
}

/// One reasoning backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub provider: ProviderKind,
    pub name: String,
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Inline key; takes precedence over `api_key_env`
    #[serde(default)]
    pub api_key: Option<String>,
}

impl BackendConfig {
    pub fn groq() -> Self {
        Self {
            provider: ProviderKind::OpenaiCompatible,
            name: "groq".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key_env: Some("GROQ_API_KEY".to_string()),
            api_key: None,
        }
    }

    pub fn cerebras() -> Self {
        Self {
            provider: ProviderKind::OpenaiCompatible,
            name: "cerebras".to_string(),
            base_url: "https://api.cerebras.ai/v1".to_string(),
            model: "qwen-3-235b-a22b-instruct-2507".to_string(),
            api_key_env: Some("CEREBRAS_API_KEY".to_string()),
            api_key: None,
        }
    }

    pub fn cohere() -> Self {
        Self {
            provider: ProviderKind::Cohere,
            name: "cohere".to_string(),
            base_url: "https://api.cohere.ai/v1".to_string(),
            model: "command-r-plus".to_string(),
            api_key_env: Some("COHERE_API_KEY".to_string()),
            api_key: None,
        }
    }

    /// Inline key, else the named environment variable. Empty counts as unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| {
                self.api_key_env
                    .as_deref()
                    .and_then(|var| std::env::var(var).ok())
            })
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingGuardConfig {
    pub thresholds: HeuristicThresholds,
    pub primary: Option<BackendConfig>,
    pub secondary: Option<BackendConfig>,
    pub call_timeout_secs: u64,
    pub max_concurrency: usize,
}

impl Default for TimingGuardConfig {
    fn default() -> Self {
        Self {
            thresholds: HeuristicThresholds::default(),
            primary: None,
            secondary: None,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl TimingGuardConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, TimingGuardError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, TimingGuardError> {
        toml::from_str(text).map_err(|e| TimingGuardError::Config(e.to_string()))
    }

    /// Speed-first ranking over whichever provider keys are set:
    /// Groq, then Cerebras, then Cohere.
    pub fn from_env() -> Self {
        let mut ranked = [
            BackendConfig::groq(),
            BackendConfig::cerebras(),
            BackendConfig::cohere(),
        ]
        .into_iter()
        .filter(|b| b.resolve_api_key().is_some());

        Self {
            primary: ranked.next(),
            secondary: ranked.next(),
            ..Self::default()
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs.max(1))
    }
}
