use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parser::schema::TimingCheck;

/// Kind of timing problem a result addresses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IssueClass {
    Setup,
    Hold,
    Recovery,
    Removal,
    #[serde(alias = "min_pulse_width")]
    MinimumPulseWidth,
    #[serde(alias = "max_transition")]
    MaximumTransition,
    #[serde(alias = "max_capacitance")]
    MaximumCapacitance,
    #[serde(alias = "uncertain")]
    Unknown,
}

impl From<TimingCheck> for IssueClass {
    fn from(check: TimingCheck) -> Self {
        match check {
            TimingCheck::Setup => IssueClass::Setup,
            TimingCheck::Hold => IssueClass::Hold,
            TimingCheck::Recovery => IssueClass::Recovery,
            TimingCheck::Removal => IssueClass::Removal,
        }
    }
}

/// Closed set of remediation kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FixKind {
    #[serde(alias = "retime", alias = "pipeline")]
    RetimeOrPipeline,
    #[serde(alias = "placement")]
    Floorplan,
    ReplicateDriver,
    #[serde(alias = "constraint_update")]
    ConstraintReview,
    #[serde(alias = "logic_refactor")]
    ResourceRemap,
    #[serde(alias = "clocking_change")]
    ClockSkewAdjust,
    ManualReview,
}

impl FixKind {
    pub const ALL: [FixKind; 7] = [
        FixKind::RetimeOrPipeline,
        FixKind::Floorplan,
        FixKind::ReplicateDriver,
        FixKind::ConstraintReview,
        FixKind::ResourceRemap,
        FixKind::ClockSkewAdjust,
        FixKind::ManualReview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FixKind::RetimeOrPipeline => "retime_or_pipeline",
            FixKind::Floorplan => "floorplan",
            FixKind::ReplicateDriver => "replicate_driver",
            FixKind::ConstraintReview => "constraint_review",
            FixKind::ResourceRemap => "resource_remap",
            FixKind::ClockSkewAdjust => "clock_skew_adjust",
            FixKind::ManualReview => "manual_review",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FixKind::RetimeOrPipeline => "Retime / pipeline",
            FixKind::Floorplan => "Floorplan / placement",
            FixKind::ReplicateDriver => "Replicate driver",
            FixKind::ConstraintReview => "Constraint review",
            FixKind::ResourceRemap => "Resource remapping",
            FixKind::ClockSkewAdjust => "Clock skew adjustment",
            FixKind::ManualReview => "Manual review",
        }
    }
}

impl fmt::Display for FixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who put a fix into the result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FixOrigin {
    #[default]
    Backend,
    Heuristic,
    /// Appended by the guardrail because the backend omitted it
    Guardrail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestedFix {
    #[serde(rename = "type")]
    pub kind: FixKind,
    pub scope: String,
    pub detail: String,
    pub expected_improvement_ns: Option<f64>,
    #[serde(default)]
    pub origin: FixOrigin,
}

impl SuggestedFix {
    pub fn new(kind: FixKind, scope: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            scope: scope.into(),
            detail: detail.into(),
            expected_improvement_ns: None,
            origin: FixOrigin::Heuristic,
        }
    }

    pub fn with_improvement(mut self, ns: f64) -> Self {
        self.expected_improvement_ns = Some(ns);
        self
    }

    pub fn is_heuristic_added(&self) -> bool {
        self.origin == FixOrigin::Guardrail
    }
}

/// Reasoning stage that produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Primary,
    RepairedPrimary,
    Secondary,
    RepairedSecondary,
    Heuristic,
}

impl Stage {
    pub fn is_ai_confirmed(&self) -> bool {
        !matches!(self, Stage::Heuristic)
    }

    pub fn is_repaired(&self) -> bool {
        matches!(self, Stage::RepairedPrimary | Stage::RepairedSecondary)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Primary => "primary",
            Stage::RepairedPrimary => "repaired-primary",
            Stage::Secondary => "secondary",
            Stage::RepairedSecondary => "repaired-secondary",
            Stage::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provenance {
    pub stage: Stage,
    /// Backend name and model, absent for heuristic results
    pub backend: Option<String>,
    pub latency_ms: u64,
    pub analyzed_at: DateTime<Utc>,
}

impl Provenance {
    pub fn heuristic() -> Self {
        Self {
            stage: Stage::Heuristic,
            backend: None,
            latency_ms: 0,
            analyzed_at: Utc::now(),
        }
    }
}

/// Remediation analysis for one violating path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub path_id: String,
    pub issue_class: IssueClass,
    pub root_causes: Vec<String>,
    pub fixes: Vec<SuggestedFix>,
    pub expected_effect_ns: Option<f64>,
    /// Always within [0, 1]
    pub confidence: f64,
    pub risks: Vec<String>,
    pub verification: Vec<String>,
    /// Guardrail findings about the input result
    #[serde(default)]
    pub notes: Vec<String>,
    pub provenance: Provenance,
}

impl AnalysisResult {
    pub fn has_fix(&self, kind: FixKind) -> bool {
        self.fixes.iter().any(|f| f.kind == kind)
    }

    pub fn fix_kinds(&self) -> Vec<FixKind> {
        let mut kinds: Vec<FixKind> = self.fixes.iter().map(|f| f.kind).collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    pub fn set_confidence(&mut self, value: f64) {
        self.confidence = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
    }
}
