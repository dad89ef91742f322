//! Reasoning orchestrator
//!
//! Sequential failover across two ranked backends with one schema repair
//! each, ending in the heuristic engine:
//!
//! ```text
//! TryPrimary -> RepairPrimary -> TrySecondary -> RepairSecondary -> Heuristic -> Done
//! ```
//!
//! Schema-invalid replies go to the matching repair state; unavailability
//! (auth, network, timeout) skips straight to the next backend. Success
//! from any backend state goes to `Done`.

use chrono::Utc;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::ai::cohere::CohereClient;
use crate::ai::openai_compat::OpenAiCompatClient;
use crate::ai::prompts::{build_analysis_request, build_repair_request, with_json_reminder};
use crate::ai::provider::{BackendError, BackendRequest, ReasoningBackend};
use crate::ai::schema::validate_response;
use crate::analyzer::prompt::ViolationPrompt;
use crate::analyzer::result::{AnalysisResult, Provenance, Stage};
use crate::analyzer::rules::HeuristicEngine;
use crate::config::{BackendConfig, ProviderKind, TimingGuardConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    TryPrimary,
    RepairPrimary,
    TrySecondary,
    RepairSecondary,
    Heuristic,
    Done,
}

/// Outcome of one backend exchange, as seen by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Success,
    SchemaInvalid,
    Unavailable,
}

impl OrchestratorState {
    pub fn next(self, transition: Transition) -> Self {
        use OrchestratorState::*;
        match (self, transition) {
            (Heuristic | Done, _) => Done,
            (_, Transition::Success) => Done,
            (TryPrimary, Transition::SchemaInvalid) => RepairPrimary,
            (TryPrimary, Transition::Unavailable) | (RepairPrimary, _) => TrySecondary,
            (TrySecondary, Transition::SchemaInvalid) => RepairSecondary,
            (TrySecondary, Transition::Unavailable) | (RepairSecondary, _) => Heuristic,
        }
    }

    /// Provenance stage a success in this state is recorded as.
    pub fn stage(self) -> Stage {
        match self {
            OrchestratorState::TryPrimary => Stage::Primary,
            OrchestratorState::RepairPrimary => Stage::RepairedPrimary,
            OrchestratorState::TrySecondary => Stage::Secondary,
            OrchestratorState::RepairSecondary => Stage::RepairedSecondary,
            OrchestratorState::Heuristic | OrchestratorState::Done => Stage::Heuristic,
        }
    }

    fn is_repair(self) -> bool {
        matches!(self, OrchestratorState::RepairPrimary | OrchestratorState::RepairSecondary)
    }

    fn tier(self) -> &'static str {
        match self {
            OrchestratorState::TryPrimary | OrchestratorState::RepairPrimary => "primary",
            _ => "secondary",
        }
    }
}

enum CallOutcome {
    Success(AnalysisResult),
    SchemaInvalid { payload: String, reason: String },
    Unavailable(String),
}

/// Produces one [`AnalysisResult`] per prompt. Holds no per-violation state.
pub struct ReasoningOrchestrator {
    primary: Option<Arc<dyn ReasoningBackend>>,
    secondary: Option<Arc<dyn ReasoningBackend>>,
    engine: Arc<HeuristicEngine>,
    call_timeout: Duration,
}

impl ReasoningOrchestrator {
    pub fn new(engine: Arc<HeuristicEngine>, call_timeout: Duration) -> Self {
        Self {
            primary: None,
            secondary: None,
            engine,
            call_timeout,
        }
    }

    /// Build the configured HTTP backends.
    pub fn from_config(config: &TimingGuardConfig, engine: Arc<HeuristicEngine>) -> Self {
        let mut orchestrator = Self::new(engine, config.call_timeout());
        orchestrator.primary = config.primary.as_ref().and_then(|c| build_backend(c, "primary"));
        orchestrator.secondary = config.secondary.as_ref().and_then(|c| build_backend(c, "secondary"));
        orchestrator
    }

    pub fn with_primary(mut self, backend: Arc<dyn ReasoningBackend>) -> Self {
        self.primary = Some(backend);
        self
    }

    pub fn with_secondary(mut self, backend: Arc<dyn ReasoningBackend>) -> Self {
        self.secondary = Some(backend);
        self
    }

    pub fn has_backends(&self) -> bool {
        self.primary.is_some() || self.secondary.is_some()
    }

    pub fn backend_labels(&self) -> Vec<String> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .map(|b| b.label())
            .collect()
    }

    /// Heuristic-only analysis, used when backends are disabled.
    pub fn heuristic(&self, prompt: &ViolationPrompt) -> AnalysisResult {
        self.engine.analyze(prompt)
    }

    /// Run the state machine for one prompt. Never fails.
    pub async fn analyze(&self, prompt: &ViolationPrompt, design_source: Option<&str>) -> AnalysisResult {
        let started = Instant::now();
        let request = build_analysis_request(prompt, design_source);
        let mut state = OrchestratorState::TryPrimary;
        let mut rejected: Option<(String, String)> = None;
        let mut trail: Vec<String> = Vec::new();
        let mut result: Option<AnalysisResult> = None;

        while state != OrchestratorState::Done {
            if state == OrchestratorState::Heuristic {
                result = Some(self.engine.analyze(prompt));
                state = state.next(Transition::Success);
                continue;
            }

            let Some(backend) = self.backend_for(state) else {
                state = state.next(Transition::Unavailable);
                continue;
            };

            let outgoing = match (state.is_repair(), &rejected) {
                (true, Some((payload, reason))) => build_repair_request(payload, reason),
                _ => request.clone(),
            };

            let transition = match self.call(backend.as_ref(), &outgoing, state, &prompt.path_id, started).await {
                CallOutcome::Success(r) => {
                    result = Some(r);
                    Transition::Success
                }
                CallOutcome::SchemaInvalid { payload, reason } => {
                    tracing::warn!(
                        "{}: {} backend '{}' returned a non-conforming result: {}",
                        prompt.path_id,
                        state.tier(),
                        backend.name(),
                        reason
                    );
                    if state.is_repair() {
                        trail.push(format!(
                            "{} backend '{}' still non-conforming after repair: {}",
                            state.tier(),
                            backend.name(),
                            reason
                        ));
                    }
                    rejected = Some((payload, reason));
                    Transition::SchemaInvalid
                }
                CallOutcome::Unavailable(reason) => {
                    tracing::warn!(
                        "{}: {} backend '{}' unavailable, failing over: {}",
                        prompt.path_id,
                        state.tier(),
                        backend.name(),
                        reason
                    );
                    trail.push(format!("{} backend '{}' unavailable: {}", state.tier(), backend.name(), reason));
                    rejected = None;
                    Transition::Unavailable
                }
            };
            state = state.next(transition);
        }

        let mut result = result.unwrap_or_else(|| self.engine.analyze(prompt));
        result.provenance.latency_ms = started.elapsed().as_millis() as u64;
        result.notes.extend(trail);
        tracing::debug!(
            "{}: analysed by {} in {}ms",
            prompt.path_id,
            result.provenance.stage,
            result.provenance.latency_ms
        );
        result
    }

    fn backend_for(&self, state: OrchestratorState) -> Option<&Arc<dyn ReasoningBackend>> {
        match state {
            OrchestratorState::TryPrimary | OrchestratorState::RepairPrimary => self.primary.as_ref(),
            OrchestratorState::TrySecondary | OrchestratorState::RepairSecondary => self.secondary.as_ref(),
            OrchestratorState::Heuristic | OrchestratorState::Done => None,
        }
    }

    async fn call(
        &self,
        backend: &dyn ReasoningBackend,
        request: &BackendRequest,
        state: OrchestratorState,
        path_id: &str,
        started: Instant,
    ) -> CallOutcome {
        if !backend.is_available().await {
            return CallOutcome::Unavailable(BackendError::MissingApiKey(backend.name().to_string()).to_string());
        }

        let request = if backend.model_info().supports_json {
            Cow::Borrowed(request)
        } else {
            Cow::Owned(with_json_reminder(request))
        };

        let reply = match tokio::time::timeout(self.call_timeout, backend.complete(&request)).await {
            Err(_) => {
                return CallOutcome::Unavailable(
                    BackendError::Timeout {
                        seconds: self.call_timeout.as_secs(),
                    }
                    .to_string(),
                )
            }
            Ok(Err(e)) => return CallOutcome::Unavailable(e.to_string()),
            Ok(Ok(text)) => text,
        };

        let provenance = Provenance {
            stage: state.stage(),
            backend: Some(backend.label()),
            latency_ms: started.elapsed().as_millis() as u64,
            analyzed_at: Utc::now(),
        };
        match validate_response(&reply, path_id, provenance) {
            Ok(result) => CallOutcome::Success(result),
            Err(e) => CallOutcome::SchemaInvalid {
                payload: reply,
                reason: e.to_string(),
            },
        }
    }
}

fn backend_from_config(config: &BackendConfig) -> Result<Arc<dyn ReasoningBackend>, BackendError> {
    Ok(match config.provider {
        ProviderKind::OpenaiCompatible => Arc::new(OpenAiCompatClient::new(config.clone())?),
        ProviderKind::Cohere => Arc::new(CohereClient::new(config.clone())?),
    })
}

/// A backend whose client cannot be built is left out with a warning.
fn build_backend(config: &BackendConfig, tier: &str) -> Option<Arc<dyn ReasoningBackend>> {
    match backend_from_config(config) {
        Ok(backend) => {
            let info = backend.model_info();
            tracing::info!(
                "{} reasoning backend: {} ({}, json mode {})",
                tier,
                backend.label(),
                info.provider,
                if info.supports_json { "on" } else { "off" }
            );
            Some(backend)
        }
        Err(e) => {
            tracing::warn!("Skipping {} backend '{}': {}", tier, config.name, e);
            None
        }
    }
}
