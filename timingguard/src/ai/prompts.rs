use crate::ai::provider::BackendRequest;
use crate::analyzer::prompt::ViolationPrompt;

/// Design source kept in the request, in characters.
pub const MAX_DESIGN_CONTEXT_CHARS: usize = 4000;
const MAX_REPAIR_ECHO_CHARS: usize = 1500;

pub const SYSTEM_PROMPT: &str = r#"You are an FPGA/ASIC timing closure engineer.
You are given one failing timing path as JSON. The "hints" list holds signals
derived from the report by fixed threshold rules; treat them as facts. So are
"path_kind" (reg->reg, in->reg, reg->out, in->out), "dominant_delay",
"skew_character" and the one-line "summary". Paths that end at an output port
usually need an IOB/ODDR output register and a set_output_delay review.

Respond ONLY with a single JSON object in exactly this shape (no markdown, no prose):
{
  "issue_class": "setup|hold|recovery|removal|min_pulse_width|max_transition|max_capacitance|unknown",
  "root_causes": ["most likely cause first"],
  "fixes": [
    {
      "type": "retime_or_pipeline|floorplan|replicate_driver|constraint_review|resource_remap|clock_skew_adjust|manual_review",
      "scope": "module or instance the fix applies to",
      "detail": "specific implementation instructions",
      "expected_improvement_ns": 0.8
    }
  ],
  "expected_effect_ns": 1.5,
  "risks": ["implementation risk"],
  "verification": ["verification step"]
}

Rules:
- "fixes" must contain at least one entry, highest impact first.
- Use only the listed "type" values.
- Do not add fields that are not listed."#;

const REPAIR_SYSTEM_PROMPT: &str =
    "You correct JSON so it matches a timing analysis schema. Return ONLY the corrected JSON object.";

/// First request for a path.
pub fn build_analysis_request(prompt: &ViolationPrompt, design_source: Option<&str>) -> BackendRequest {
    // ViolationPrompt serialization cannot fail: plain strings, numbers, and enums
    let payload = serde_json::to_string_pretty(prompt).unwrap_or_default();
    let mut user = format!("Timing violation:\n{payload}");

    if let Some(source) = design_source.filter(|s| !s.trim().is_empty()) {
        user.push_str("\n\nRelevant design source (may be truncated):\n");
        user.push_str(truncate_chars(source, MAX_DESIGN_CONTEXT_CHARS));
    }

    BackendRequest {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Single corrective retry after a non-conforming reply.
pub fn build_repair_request(invalid: &str, error: &str) -> BackendRequest {
    let user = format!(
        r#"The following response does not match the required schema.

Response:
{}

Problem:
{}

Required schema:
{}

Return ONLY the corrected JSON object. No explanations."#,
        truncate_chars(invalid, MAX_REPAIR_ECHO_CHARS),
        error,
        schema_excerpt(),
    );

    BackendRequest {
        system: REPAIR_SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Appended to the system instructions for models without a JSON response mode.
pub const JSON_ONLY_REMINDER: &str =
    "Your entire reply must be one JSON object: no prose before or after it, no markdown code fences.";

/// Copy of `request` with the JSON-only reminder appended to the system text.
pub fn with_json_reminder(request: &BackendRequest) -> BackendRequest {
    BackendRequest {
        system: format!("{}\n\n{}", request.system, JSON_ONLY_REMINDER),
        user: request.user.clone(),
    }
}

fn schema_excerpt() -> &'static str {
    match SYSTEM_PROMPT.find('{') {
        Some(start) => match SYSTEM_PROMPT.rfind('}') {
            Some(end) if end > start => &SYSTEM_PROMPT[start..=end],
            _ => SYSTEM_PROMPT,
        },
        None => SYSTEM_PROMPT,
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
