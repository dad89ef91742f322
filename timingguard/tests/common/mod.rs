//! Deterministic fake backends shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use timingguard::ai::{BackendError, BackendRequest, ModelInfo, ReasoningBackend};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("fixture exists")
}

pub const VALID_PIPELINE_ONLY: &str = r#"{
  "issue_class": "setup",
  "root_causes": ["long carry chain in the accumulator"],
  "fixes": [
    {"type": "retime_or_pipeline", "scope": "core/mac", "detail": "Split the accumulator into two registered halves", "expected_improvement_ns": 2.0}
  ],
  "expected_effect_ns": 2.0,
  "risks": ["one extra cycle of latency"],
  "verification": ["re-run report_timing_summary"]
}"#;

pub const INVALID: &str = r#"{"issue_class": "setup", "fixes": "pipeline it"}"#;

#[derive(Clone, Copy)]
pub enum Reply {
    Text(&'static str),
    Fail,
    Hang,
}

/// Replies in order, repeating the last one once the script runs out.
pub struct ScriptedBackend {
    name: String,
    script: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<BackendRequest>>,
    supports_json: bool,
}

impl ScriptedBackend {
    pub fn new(name: &str, script: Vec<Reply>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            supports_json: true,
        }
    }

    /// Model without a JSON response mode.
    pub fn plain_text(mut self) -> Self {
        self.supports_json = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<BackendRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn complete(&self, request: &BackendRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let reply = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().copied()
            }
        };

        match reply {
            Some(Reply::Text(text)) => Ok(text.to_string()),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
            Some(Reply::Fail) | None => Err(BackendError::ApiError {
                status: 503,
                message: "service unavailable".to_string(),
            }),
        }
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: self.name.clone(),
            model_name: "fake".to_string(),
            supports_json: self.supports_json,
        }
    }
}

/// Configured but without credentials.
pub struct OfflineBackend {
    pub calls: AtomicUsize,
}

impl OfflineBackend {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ReasoningBackend for OfflineBackend {
    fn name(&self) -> &str {
        "offline"
    }

    async fn is_available(&self) -> bool {
        false
    }

    async fn complete(&self, _request: &BackendRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::MissingApiKey("offline".to_string()))
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "offline".to_string(),
            model_name: "none".to_string(),
            supports_json: false,
        }
    }
}
