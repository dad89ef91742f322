//! Projection of a parsed path into a compact analysis request.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::config::HeuristicThresholds;
use crate::parser::schema::{ClockTerms, PathKind, TimingCheck, TimingViolation};

/// Cell/net names kept per prompt.
pub const PROMPT_ARCS: usize = 3;

/// Clock insertion imbalance worth naming, as a fraction of the requirement.
pub const SKEW_NOTICE_FRACTION: f64 = 0.1;

static OUTPUT_BUFFER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bOBUF(?:DS|T|TDS)?\b").expect("static regex"));

static HIGH_FANOUT_SIGNATURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)high[ _-]?fanout|max_fanout").expect("static regex"));

static ARITHMETIC_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:DSP4[78]E?\d?|DSP58|CARRY[48])\b|\bmul(?:t(?:iplier)?)?(?:\d+|_|/|\[|\b)|\badd(?:er)?(?:\d+|_|\b)",
    )
    .expect("static regex")
});

/// Derived signal attached to a prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Hint {
    #[serde(rename = "deep logic")]
    DeepLogic,
    #[serde(rename = "high routing delay")]
    HighRoutingDelay,
    #[serde(rename = "high fanout")]
    HighFanout,
    #[serde(rename = "clock domain crossing")]
    ClockDomainCrossing,
    #[serde(rename = "arithmetic heavy")]
    ArithmeticHeavy,
    #[serde(rename = "large clock skew")]
    LargeClockSkew,
}

impl Hint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hint::DeepLogic => "deep logic",
            Hint::HighRoutingDelay => "high routing delay",
            Hint::HighFanout => "high fanout",
            Hint::ClockDomainCrossing => "clock domain crossing",
            Hint::ArithmeticHeavy => "arithmetic heavy",
            Hint::LargeClockSkew => "large clock skew",
        }
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which share of the data path delay dominates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DominantDelay {
    Logic,
    Routing,
    /// Output buffer plus the route to it
    OutputBuffer,
}

impl DominantDelay {
    pub fn as_str(&self) -> &'static str {
        match self {
            DominantDelay::Logic => "logic",
            DominantDelay::Routing => "routing",
            DominantDelay::OutputBuffer => "OBUF + routing",
        }
    }
}

/// Sign and size of `DCD - SCD` relative to the requirement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkewCharacter {
    /// Source clock path longer than the destination's by half the requirement or more
    NegativeSourceSkewLarge,
    NegativeSourceSkew,
    Balanced,
    NegativeDestinationSkew,
    /// Destination clock path longer than the source's by half the requirement or more
    NegativeDestinationSkewLarge,
}

impl SkewCharacter {
    pub fn is_large(&self) -> bool {
        matches!(
            self,
            SkewCharacter::NegativeSourceSkewLarge | SkewCharacter::NegativeDestinationSkewLarge
        )
    }

    pub fn source_late(&self) -> bool {
        matches!(
            self,
            SkewCharacter::NegativeSourceSkewLarge | SkewCharacter::NegativeSourceSkew
        )
    }
}

/// What the reasoning stages see of a violation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViolationPrompt {
    pub path_id: String,
    pub clock: String,
    pub slack_ns: f64,
    pub startpoint: String,
    pub endpoint: String,
    pub path_kind: PathKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_clock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_clock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<TimingCheck>,
    pub levels_of_logic: Option<u32>,
    pub routing_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_ns: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock_skew_ns: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_delay_ns: Option<f64>,
    #[serde(skip_serializing_if = "ClockTerms::is_empty")]
    pub clock_terms: ClockTerms,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_delay: Option<DominantDelay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skew_character: Option<SkewCharacter>,
    pub worst_cells: Vec<String>,
    pub worst_nets: Vec<String>,
    pub hints: Vec<Hint>,
    /// One-sentence reading of the path, e.g. "Register-to-register path
    /// dominated by routing."
    pub summary: String,
}

impl ViolationPrompt {
    pub fn has_hint(&self, hint: Hint) -> bool {
        self.hints.contains(&hint)
    }
}

/// Pure `TimingViolation -> ViolationPrompt` projection.
#[derive(Debug, Clone, Default)]
pub struct PromptTransformer {
    thresholds: HeuristicThresholds,
}

impl PromptTransformer {
    pub fn new(thresholds: HeuristicThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &HeuristicThresholds {
        &self.thresholds
    }

    pub fn transform(&self, violation: &TimingViolation) -> ViolationPrompt {
        let hints = self.derive_hints(violation);
        let dominant_delay = dominant_delay(violation);
        let skew_character = skew_character(violation);
        let summary = summary(violation.path_kind, dominant_delay, skew_character, &hints);

        ViolationPrompt {
            path_id: violation.path_id.clone(),
            clock: violation.clock.clone(),
            slack_ns: violation.slack_ns,
            startpoint: violation.startpoint.clone(),
            endpoint: violation.endpoint.clone(),
            path_kind: violation.path_kind,
            launch_clock: violation.launch_clock.clone(),
            capture_clock: violation.capture_clock.clone(),
            check: violation.check,
            levels_of_logic: violation.levels_of_logic,
            routing_pct: violation.routing_pct,
            requirement_ns: violation.requirement_ns,
            clock_skew_ns: violation.clock_skew_ns,
            output_delay_ns: violation.output_delay_ns,
            clock_terms: violation.clock_terms,
            dominant_delay,
            skew_character,
            worst_cells: violation
                .worst_cells()
                .take(PROMPT_ARCS)
                .map(|a| match &a.cell_type {
                    Some(t) => format!("{} ({t}, {:.3} ns)", a.name, a.delay_ns),
                    None => format!("{} ({:.3} ns)", a.name, a.delay_ns),
                })
                .collect(),
            worst_nets: violation
                .worst_nets()
                .take(PROMPT_ARCS)
                .map(|a| match a.fanout {
                    Some(fo) => format!("{} (fo={fo}, {:.3} ns)", a.name, a.delay_ns),
                    None => format!("{} ({:.3} ns)", a.name, a.delay_ns),
                })
                .collect(),
            hints,
            summary,
        }
    }

    /// Every matching hint, in a fixed order.
    pub fn derive_hints(&self, v: &TimingViolation) -> Vec<Hint> {
        let t = &self.thresholds;
        let mut hints = Vec::new();

        if v.levels_of_logic.is_some_and(|l| l >= t.deep_logic_levels) {
            hints.push(Hint::DeepLogic);
        }
        if v.routing_pct.is_some_and(|p| p >= t.high_routing_pct) {
            hints.push(Hint::HighRoutingDelay);
        }
        let wide_net = v
            .worst_nets()
            .any(|n| n.fanout.is_some_and(|fo| fo >= t.high_fanout));
        if wide_net || HIGH_FANOUT_SIGNATURE.is_match(&v.raw) {
            hints.push(Hint::HighFanout);
        }
        if let (Some(launch), Some(capture)) = (&v.launch_clock, &v.capture_clock) {
            if launch != capture {
                hints.push(Hint::ClockDomainCrossing);
            }
        }
        if ARITHMETIC_SIGNATURE.is_match(&v.raw) {
            hints.push(Hint::ArithmeticHeavy);
        }
        if let (Some(skew), Some(req)) = (v.clock_skew_ns, v.requirement_ns) {
            if req > 0.0 && skew.abs() >= t.large_skew_fraction * req {
                hints.push(Hint::LargeClockSkew);
            }
        }

        hints
    }
}

/// Output buffer on the path and a shallow or route-bound data path makes
/// the buffer the story; otherwise the larger of logic and routing share.
pub fn dominant_delay(v: &TimingViolation) -> Option<DominantDelay> {
    let split = v.routing_pct.map(|route| (100.0 - route, route));
    let shallow = v.levels_of_logic.is_some_and(|l| l <= 1);
    if OUTPUT_BUFFER.is_match(&v.raw) && (shallow || split.is_some_and(|(logic, route)| route >= logic)) {
        return Some(DominantDelay::OutputBuffer);
    }
    split.map(|(logic, route)| {
        if logic > route {
            DominantDelay::Logic
        } else {
            DominantDelay::Routing
        }
    })
}

/// Classify `DCD - SCD` against the requirement. Needs both clock delays
/// and a positive requirement.
pub fn skew_character(v: &TimingViolation) -> Option<SkewCharacter> {
    let delta = v.clock_terms.insertion_delta_ns()?;
    let req = v.requirement_ns.filter(|r| *r > 0.0)?;
    let large = 0.5 * req;
    let notice = SKEW_NOTICE_FRACTION * req;
    Some(if delta <= -large {
        SkewCharacter::NegativeSourceSkewLarge
    } else if delta <= -notice {
        SkewCharacter::NegativeSourceSkew
    } else if delta >= large {
        SkewCharacter::NegativeDestinationSkewLarge
    } else if delta >= notice {
        SkewCharacter::NegativeDestinationSkew
    } else {
        SkewCharacter::Balanced
    })
}

fn summary(
    kind: PathKind,
    dominant: Option<DominantDelay>,
    skew: Option<SkewCharacter>,
    hints: &[Hint],
) -> String {
    let lead = match kind {
        PathKind::RegToOut => "Register-to-output path to a top-level port",
        PathKind::InToReg => "Input-to-register path from a top-level port",
        PathKind::InToOut => "Combinational input-to-output path",
        PathKind::RegToReg if hints.contains(&Hint::DeepLogic) => {
            "Deep combinational logic on a register-to-register path"
        }
        PathKind::RegToReg => "Register-to-register path",
    };
    let mut dominant = dominant.map(|d| d.as_str()).unwrap_or("data path delay").to_string();
    if hints.contains(&Hint::LargeClockSkew) {
        dominant.push_str(" + skew");
    }
    let note = match skew {
        Some(s) if s.is_large() && s.source_late() => {
            " and large negative source clock skew (source clock path longer than destination)"
        }
        Some(s) if s.is_large() => {
            " and large negative destination clock skew (destination clock path longer than source)"
        }
        _ => "",
    };
    format!("{lead} dominated by {dominant}{note}.")
}
