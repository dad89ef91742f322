//! Reconciles a reasoning result against the heuristic engine.
//!
//! The guardrail is the last step for every path: it appends fixes the
//! engine requires but the result omitted, attaches the standard risk and
//! verification entries for each fix kind, and scores confidence.
//! Running it again on its own output changes nothing.

use std::sync::Arc;

use crate::analyzer::prompt::ViolationPrompt;
use crate::analyzer::result::{AnalysisResult, FixKind, FixOrigin, IssueClass, Stage};
use crate::analyzer::rules::{manual_review, HeuristicEngine, Severity};
use crate::config::HeuristicThresholds;

/// Upper bound for any heuristic-only result.
pub const HEURISTIC_CONFIDENCE_CAP: f64 = 0.45;
/// Lower bound for any backend-confirmed result.
pub const AI_CONFIDENCE_FLOOR: f64 = 0.5;
const MANUAL_REVIEW_CONFIDENCE: f64 = 0.15;

pub struct Guardrail {
    engine: Arc<HeuristicEngine>,
    thresholds: HeuristicThresholds,
}

impl Guardrail {
    pub fn new(engine: Arc<HeuristicEngine>, thresholds: HeuristicThresholds) -> Self {
        Self { engine, thresholds }
    }

    pub fn finalize(&self, mut result: AnalysisResult, prompt: &ViolationPrompt) -> AnalysisResult {
        let required = self.engine.required_kinds(prompt);

        for kind in &required {
            if result.has_fix(*kind) {
                continue;
            }
            if let Some(mut fix) = self.engine.fix_for(prompt, *kind) {
                fix.origin = FixOrigin::Guardrail;
                result.fixes.push(fix);
                if result.provenance.stage.is_ai_confirmed() {
                    push_unique(
                        &mut result.notes,
                        format!("Backend omitted a required {} fix; added from heuristics.", kind),
                    );
                }
            }
        }

        if result.fixes.is_empty() {
            let mut fix = manual_review(prompt);
            fix.origin = FixOrigin::Guardrail;
            result.fixes.push(fix);
        }

        let severity = Severity::from_slack(prompt.slack_ns, &self.thresholds);
        for kind in result.fix_kinds() {
            push_unique(&mut result.risks, risk_for(kind, prompt));
            push_unique(&mut result.verification, verification_for(kind).to_string());
        }
        if severity == Severity::Critical {
            push_unique(
                &mut result.risks,
                "Critical violation may need several implementation iterations to close.".to_string(),
            );
            push_unique(
                &mut result.verification,
                "Run full timing analysis across all process corners.".to_string(),
            );
        }

        match result.expected_effect_ns {
            Some(effect) if effect <= 0.0 => {
                push_unique(&mut result.notes, "Expected improvement is not positive.".to_string())
            }
            Some(effect) if prompt.slack_ns < 0.0 && effect > prompt.slack_ns.abs() * 2.0 => push_unique(
                &mut result.notes,
                "Expected improvement seems unrealistically high for this slack.".to_string(),
            ),
            None => push_unique(&mut result.notes, "No expected improvement was given.".to_string()),
            _ => {}
        }

        let confidence = score(&result, &required);
        result.set_confidence(confidence);
        result
    }

    pub fn engine(&self) -> &HeuristicEngine {
        &self.engine
    }
}

/// Confidence from completeness, agreement with the engine and provenance.
///
/// Only content the guardrail did not add is scored, so the value is the
/// same on every re-run.
pub fn score(result: &AnalysisResult, required: &[FixKind]) -> f64 {
    let own_fixes: Vec<FixKind> = result
        .fixes
        .iter()
        .filter(|f| f.origin != FixOrigin::Guardrail)
        .map(|f| f.kind)
        .collect();

    let factors = [
        !result.root_causes.is_empty(),
        !own_fixes.is_empty(),
        result.expected_effect_ns.is_some_and(|e| e > 0.0),
        result.issue_class != IssueClass::Unknown,
    ];
    let completeness = factors.iter().filter(|f| **f).count() as f64 / factors.len() as f64;

    let agreement = if required.is_empty() {
        1.0
    } else {
        required.iter().filter(|k| own_fixes.contains(k)).count() as f64 / required.len() as f64
    };

    match result.provenance.stage {
        Stage::Heuristic => {
            if own_fixes.iter().all(|k| *k == FixKind::ManualReview) {
                MANUAL_REVIEW_CONFIDENCE
            } else {
                (0.25 + 0.2 * completeness).min(HEURISTIC_CONFIDENCE_CAP)
            }
        }
        stage => {
            let weight = match stage {
                Stage::Primary => 1.0,
                Stage::Secondary => 0.9,
                Stage::RepairedPrimary => 0.7,
                _ => 0.6,
            };
            AI_CONFIDENCE_FLOOR
                + (1.0 - AI_CONFIDENCE_FLOOR) * (0.4 * completeness + 0.4 * agreement + 0.2 * weight)
        }
    }
}

fn risk_for(kind: FixKind, prompt: &ViolationPrompt) -> String {
    match kind {
        FixKind::RetimeOrPipeline => {
            let stages = (prompt.levels_of_logic.unwrap_or(0) / 4).max(1);
            format!("Adds {stages}-cycle latency; downstream handshakes must absorb it.")
        }
        FixKind::Floorplan => "Tight pblocks can push congestion onto neighbouring paths.".to_string(),
        FixKind::ReplicateDriver => {
            "Replicated registers raise utilization and may be merged back unless kept with DONT_TOUCH.".to_string()
        }
        FixKind::ConstraintReview => {
            "A timing exception on a truly synchronous path hides a real failure.".to_string()
        }
        FixKind::ResourceRemap => {
            "Remapping arithmetic changes resource balance and can alter rounding or latency.".to_string()
        }
        FixKind::ClockSkewAdjust => {
            "Clock buffer or placement changes affect every path in the clock domain.".to_string()
        }
        FixKind::ManualReview => "Root cause not identified automatically.".to_string(),
    }
}

fn verification_for(kind: FixKind) -> &'static str {
    match kind {
        FixKind::RetimeOrPipeline => "Re-check downstream protocol timing and simulate with the new pipeline depth.",
        FixKind::Floorplan => "Check utilization and congestion inside the constrained region.",
        FixKind::ReplicateDriver => "Confirm the replicas survive opt_design and split the loads evenly.",
        FixKind::ConstraintReview => "Run report_cdc and report_exceptions to confirm every crossing is covered.",
        FixKind::ResourceRemap => "Re-run functional simulation on the remapped arithmetic.",
        FixKind::ClockSkewAdjust => "Re-check clock skew on neighbouring paths after the change.",
        FixKind::ManualReview => "Review the full path in the timing report after any change.",
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}
