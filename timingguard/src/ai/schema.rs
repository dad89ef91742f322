//! Strict boundary between backend text and [`AnalysisResult`].
//!
//! Nothing untyped gets past [`validate_response`]: the reply must be a
//! single JSON object with exactly the documented fields.

use serde::Deserialize;
use thiserror::Error;

use crate::analyzer::result::{
    AnalysisResult, FixKind, FixOrigin, IssueClass, Provenance, SuggestedFix,
};

pub const MAX_FIXES: usize = 8;
const MAX_EFFECT_NS: f64 = 1000.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaValidationError {
    #[error("Response is not a JSON object: {0}")]
    NotJson(String),
    #[error("Response does not match the result shape: {0}")]
    Shape(String),
    #[error("Response violates a constraint: {0}")]
    Constraint(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAnalysis {
    issue_class: IssueClass,
    #[serde(alias = "probable_root_cause")]
    root_causes: Vec<String>,
    #[serde(alias = "suggested_fixes")]
    fixes: Vec<RawFix>,
    expected_effect_ns: Option<f64>,
    #[serde(default, alias = "risk_notes")]
    risks: Vec<String>,
    #[serde(default, alias = "verify_steps")]
    verification: Vec<String>,
    // accepted and discarded; the guardrail scores confidence
    #[serde(default, alias = "confidence_score")]
    #[allow(dead_code)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFix {
    #[serde(rename = "type")]
    kind: FixKind,
    scope: String,
    detail: String,
    #[serde(default)]
    expected_improvement_ns: Option<f64>,
}

/// Validate a backend reply into a result carrying `provenance`.
pub fn validate_response(
    text: &str,
    path_id: &str,
    provenance: Provenance,
) -> Result<AnalysisResult, SchemaValidationError> {
    let json_text = extract_json_from_text(text);
    let value: serde_json::Value = serde_json::from_str(&json_text)
        .map_err(|e| SchemaValidationError::NotJson(e.to_string()))?;
    if !value.is_object() {
        return Err(SchemaValidationError::NotJson("top-level value is not an object".to_string()));
    }

    let raw: RawAnalysis =
        serde_json::from_value(value).map_err(|e| SchemaValidationError::Shape(e.to_string()))?;
    check_constraints(&raw)?;

    Ok(AnalysisResult {
        path_id: path_id.to_string(),
        issue_class: raw.issue_class,
        root_causes: clean(raw.root_causes),
        fixes: raw
            .fixes
            .into_iter()
            .map(|f| SuggestedFix {
                kind: f.kind,
                scope: f.scope.trim().to_string(),
                detail: f.detail.trim().to_string(),
                expected_improvement_ns: f.expected_improvement_ns,
                origin: FixOrigin::Backend,
            })
            .collect(),
        expected_effect_ns: raw.expected_effect_ns,
        confidence: 0.0,
        risks: clean(raw.risks),
        verification: clean(raw.verification),
        notes: Vec::new(),
        provenance,
    })
}

fn check_constraints(raw: &RawAnalysis) -> Result<(), SchemaValidationError> {
    if raw.fixes.is_empty() {
        return Err(SchemaValidationError::Constraint("fixes must not be empty".to_string()));
    }
    if raw.fixes.len() > MAX_FIXES {
        return Err(SchemaValidationError::Constraint(format!(
            "at most {MAX_FIXES} fixes allowed, got {}",
            raw.fixes.len()
        )));
    }
    for (i, fix) in raw.fixes.iter().enumerate() {
        if fix.scope.trim().is_empty() || fix.detail.trim().is_empty() {
            return Err(SchemaValidationError::Constraint(format!(
                "fix {i} has an empty scope or detail"
            )));
        }
        if let Some(ns) = fix.expected_improvement_ns {
            if !ns.is_finite() || ns.abs() >= MAX_EFFECT_NS {
                return Err(SchemaValidationError::Constraint(format!(
                    "fix {i} expected_improvement_ns out of range"
                )));
            }
        }
    }
    if let Some(effect) = raw.expected_effect_ns {
        if !effect.is_finite() || effect.abs() >= MAX_EFFECT_NS {
            return Err(SchemaValidationError::Constraint(
                "expected_effect_ns out of range".to_string(),
            ));
        }
    }
    Ok(())
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Pull the JSON object out of a reply that may wrap it in prose or fences.
pub fn extract_json_from_text(text: &str) -> String {
    let text = text.trim();

    // ```json ... ```
    if let Some(start) = text.find("```json") {
        if let Some(end) = text.rfind("```") {
            if end > start + 7 {
                return text[start + 7..end].trim().to_string();
            }
        }
    }

    if let Some(start) = text.find("```") {
        if let Some(end) = text.rfind("```") {
            if end > start + 3 {
                let content = text[start + 3..end].trim();
                if content.starts_with('{') {
                    return content.to_string();
                }
            }
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            return text[start..=end].to_string();
        }
    }

    text.to_string()
}
