use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analyzer::prompt::{DominantDelay, Hint, SkewCharacter, ViolationPrompt};
use crate::analyzer::result::{
    AnalysisResult, FixKind, IssueClass, Provenance, SuggestedFix,
};
use crate::config::HeuristicThresholds;

/// Share of |slack| the heuristic path claims as expected improvement.
pub const HEURISTIC_EFFECT_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Moderate,
    Minor,
}

impl Severity {
    pub fn from_slack(slack_ns: f64, thresholds: &HeuristicThresholds) -> Self {
        if slack_ns < thresholds.severe_slack_ns {
            Severity::Critical
        } else if slack_ns < thresholds.moderate_slack_ns {
            Severity::Moderate
        } else {
            Severity::Minor
        }
    }
}

/// One rule's contribution for a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFinding {
    pub rule_id: String,
    pub root_cause: String,
    pub fix: SuggestedFix,
}

pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn check(&self, prompt: &ViolationPrompt) -> Option<RuleFinding>;
}

/// Deterministic fallback analysis and the guardrail's reference.
pub struct HeuristicEngine {
    rules: Vec<Arc<dyn Rule>>,
}

impl HeuristicEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_default_rules() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Arc::new(DeepLogicRule));
        engine.add_rule(Arc::new(HighRoutingRule));
        engine.add_rule(Arc::new(HighFanoutRule));
        engine.add_rule(Arc::new(ClockCrossingRule));
        engine.add_rule(Arc::new(ArithmeticRule));
        engine.add_rule(Arc::new(ClockSkewRule));
        engine.add_rule(Arc::new(IoRegisterRule));
        engine.add_rule(Arc::new(IoConstraintRule));
        engine
    }

    pub fn add_rule(&mut self, rule: Arc<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    /// Union of every matching rule, in registration order.
    pub fn findings(&self, prompt: &ViolationPrompt) -> Vec<RuleFinding> {
        self.rules.iter().filter_map(|r| r.check(prompt)).collect()
    }

    /// Fix kinds any complete result for this prompt has to contain.
    pub fn required_kinds(&self, prompt: &ViolationPrompt) -> Vec<FixKind> {
        let mut kinds = Vec::new();
        for finding in self.findings(prompt) {
            if finding.fix.kind != FixKind::ManualReview && !kinds.contains(&finding.fix.kind) {
                kinds.push(finding.fix.kind);
            }
        }
        kinds
    }

    /// Required fix of a given kind, as the engine would write it.
    pub fn fix_for(&self, prompt: &ViolationPrompt, kind: FixKind) -> Option<SuggestedFix> {
        self.findings(prompt)
            .into_iter()
            .find(|f| f.fix.kind == kind)
            .map(|f| f.fix)
    }

    /// Total: always returns at least one fix.
    ///
    /// When any rule matches, the prompt's one-line summary leads the root
    /// causes.
    pub fn analyze(&self, prompt: &ViolationPrompt) -> AnalysisResult {
        let findings = self.findings(prompt);
        let mut root_causes = Vec::new();
        if !findings.is_empty() && !prompt.summary.is_empty() {
            root_causes.push(prompt.summary.clone());
        }
        let mut fixes: Vec<SuggestedFix> = Vec::new();
        for finding in findings {
            if !root_causes.contains(&finding.root_cause) {
                root_causes.push(finding.root_cause);
            }
            if !fixes.iter().any(|f| f.kind == finding.fix.kind) {
                fixes.push(finding.fix);
            }
        }

        if fixes.is_empty() {
            root_causes.push("No dominant cause recognised from the reported path fields.".to_string());
            fixes.push(manual_review(prompt));
        }

        AnalysisResult {
            path_id: prompt.path_id.clone(),
            issue_class: prompt.check.map(IssueClass::from).unwrap_or(IssueClass::Unknown),
            root_causes,
            fixes,
            expected_effect_ns: Some(prompt.slack_ns.abs() * HEURISTIC_EFFECT_FRACTION),
            confidence: 0.0,
            risks: Vec::new(),
            verification: Vec::new(),
            notes: Vec::new(),
            provenance: Provenance::heuristic(),
        }
    }
}

impl Default for HeuristicEngine {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

pub fn manual_review(prompt: &ViolationPrompt) -> SuggestedFix {
    SuggestedFix::new(
        FixKind::ManualReview,
        common_scope(&prompt.startpoint, &prompt.endpoint),
        format!(
            "Inspect the detailed path from {} to {} in the timing report; no heuristic signature matched.",
            display_point(&prompt.startpoint),
            display_point(&prompt.endpoint),
        ),
    )
}

/// Longest shared hierarchy prefix of two pins, or `top`.
pub fn common_scope(startpoint: &str, endpoint: &str) -> String {
    let common: Vec<&str> = startpoint
        .split('/')
        .zip(endpoint.split('/'))
        .take_while(|(s, e)| s == e && !s.is_empty())
        .map(|(s, _)| s)
        .collect();

    // a shared leaf is the pin itself, not a module
    let depth = startpoint.split('/').count().min(endpoint.split('/').count());
    let common = if common.len() >= depth { &common[..depth.saturating_sub(1)] } else { &common[..] };

    if common.is_empty() {
        "top".to_string()
    } else {
        common.join("/")
    }
}

fn display_point(point: &str) -> &str {
    if point.is_empty() {
        "<unknown>"
    } else {
        point
    }
}

fn finding(rule: &dyn Rule, root_cause: String, fix: SuggestedFix) -> Option<RuleFinding> {
    Some(RuleFinding {
        rule_id: rule.id().to_string(),
        root_cause,
        fix,
    })
}

// ----------------------------------------------------------------------------
// Rules
// ----------------------------------------------------------------------------

pub struct DeepLogicRule;

impl Rule for DeepLogicRule {
    fn id(&self) -> &str {
        "deep_logic"
    }

    fn name(&self) -> &str {
        "Deep Combinational Logic"
    }

    fn description(&self) -> &str {
        "Logic depth at or above the threshold calls for pipelining or retiming"
    }

    fn check(&self, prompt: &ViolationPrompt) -> Option<RuleFinding> {
        if !prompt.has_hint(Hint::DeepLogic) {
            return None;
        }
        let levels = prompt.levels_of_logic.unwrap_or(0);
        let stages = (levels / 4).max(1);
        let mut detail = format!(
            "Insert {stages} pipeline stage(s) to break {levels} logic levels; enable register retiming in synthesis."
        );
        if prompt.has_hint(Hint::ArithmeticHeavy) {
            detail.push_str(" Use the internal DSP/carry pipeline registers (AREG/BREG/MREG/PREG) before adding fabric flops.");
        }
        finding(
            self,
            format!("{levels} levels of combinational logic between launch and capture registers"),
            SuggestedFix::new(
                FixKind::RetimeOrPipeline,
                common_scope(&prompt.startpoint, &prompt.endpoint),
                detail,
            ),
        )
    }
}

pub struct HighRoutingRule;

impl Rule for HighRoutingRule {
    fn id(&self) -> &str {
        "high_routing"
    }

    fn name(&self) -> &str {
        "Routing Dominated Path"
    }

    fn description(&self) -> &str {
        "Interconnect share of the data path delay at or above the threshold"
    }

    fn check(&self, prompt: &ViolationPrompt) -> Option<RuleFinding> {
        if !prompt.has_hint(Hint::HighRoutingDelay) {
            return None;
        }
        let pct = prompt.routing_pct.unwrap_or(0.0);
        let detail = match prompt.worst_nets.first() {
            Some(net) => format!(
                "Add a pblock to co-locate the driver and loads; the worst net is {net}."
            ),
            None => "Add pblock constraints to co-locate the start and end points of the path.".to_string(),
        };
        finding(
            self,
            format!("{pct:.0}% of the data path delay is routing"),
            SuggestedFix::new(FixKind::Floorplan, "placement", detail),
        )
    }
}

pub struct HighFanoutRule;

impl Rule for HighFanoutRule {
    fn id(&self) -> &str {
        "high_fanout"
    }

    fn name(&self) -> &str {
        "High Fanout Net"
    }

    fn description(&self) -> &str {
        "A net on the path drives enough loads to need replication"
    }

    fn check(&self, prompt: &ViolationPrompt) -> Option<RuleFinding> {
        if !prompt.has_hint(Hint::HighFanout) {
            return None;
        }
        finding(
            self,
            "High fanout net loading the data path".to_string(),
            SuggestedFix::new(
                FixKind::ReplicateDriver,
                "high_fanout_signals",
                "Replicate the driving register (MAX_FANOUT or phys_opt_design -fanout_opt) and keep local copies near each load group.",
            ),
        )
    }
}

pub struct ClockCrossingRule;

impl Rule for ClockCrossingRule {
    fn id(&self) -> &str {
        "clock_domain_crossing"
    }

    fn name(&self) -> &str {
        "Clock Domain Crossing"
    }

    fn description(&self) -> &str {
        "Launch and capture clocks differ"
    }

    fn check(&self, prompt: &ViolationPrompt) -> Option<RuleFinding> {
        if !prompt.has_hint(Hint::ClockDomainCrossing) {
            return None;
        }
        let launch = prompt.launch_clock.as_deref().unwrap_or("?");
        let capture = prompt.capture_clock.as_deref().unwrap_or("?");
        finding(
            self,
            format!("Path crosses from {launch} to {capture}"),
            SuggestedFix::new(
                FixKind::ConstraintReview,
                prompt.clock.clone(),
                format!(
                    "Confirm the {launch} -> {capture} crossing is synchronised; if it is, constrain it with set_clock_groups or set_max_delay -datapath_only instead of closing it as a synchronous path."
                ),
            ),
        )
    }
}

pub struct ArithmeticRule;

impl Rule for ArithmeticRule {
    fn id(&self) -> &str {
        "arithmetic_heavy"
    }

    fn name(&self) -> &str {
        "Arithmetic Chain"
    }

    fn description(&self) -> &str {
        "Multiplier or adder chain on the path"
    }

    fn check(&self, prompt: &ViolationPrompt) -> Option<RuleFinding> {
        if !prompt.has_hint(Hint::ArithmeticHeavy) {
            return None;
        }
        finding(
            self,
            "Multiply/add chain mapped onto the critical path".to_string(),
            SuggestedFix::new(
                FixKind::ResourceRemap,
                common_scope(&prompt.startpoint, &prompt.endpoint),
                "Map the multiply/accumulate onto dedicated DSP slices with full internal pipelining, or split wide adders into registered partial sums.",
            ),
        )
    }
}

pub struct ClockSkewRule;

impl Rule for ClockSkewRule {
    fn id(&self) -> &str {
        "large_clock_skew"
    }

    fn name(&self) -> &str {
        "Large Clock Skew"
    }

    fn description(&self) -> &str {
        "Clock path skew consumes a large share of the requirement"
    }

    fn check(&self, prompt: &ViolationPrompt) -> Option<RuleFinding> {
        if !prompt.has_hint(Hint::LargeClockSkew) {
            return None;
        }
        let skew = prompt.clock_skew_ns.unwrap_or(0.0);
        let mut detail = match (prompt.skew_character, prompt.clock_terms.insertion_delta_ns()) {
            (Some(c), Some(delta)) if c.source_late() => format!(
                "The source clock arrives {:.3} ns after the destination clock; place the launching register in the destination's clock region on the same BUFG/BUFH and shorten the source clock insertion delay.",
                delta.abs()
            ),
            (Some(SkewCharacter::NegativeDestinationSkew | SkewCharacter::NegativeDestinationSkewLarge), Some(delta)) => format!(
                "The destination clock arrives {delta:.3} ns after the source clock; keep both registers on one clock region and global buffer, and check the hold paths this skew creates."
            ),
            _ => "Keep launch and capture registers on the same clock region and global buffer; check for clock routed through fabric logic.".to_string(),
        };
        if let Some(u) = prompt.clock_terms.uncertainty_ns.filter(|u| *u > 0.0) {
            detail.push_str(&format!(
                " Clock uncertainty is {u:.3} ns; review set_clock_uncertainty if it adds margin beyond the reported jitter."
            ));
        }
        finding(
            self,
            format!("Clock path skew of {skew:.3} ns"),
            SuggestedFix::new(FixKind::ClockSkewAdjust, prompt.clock.clone(), detail),
        )
    }
}

pub struct IoRegisterRule;

impl Rule for IoRegisterRule {
    fn id(&self) -> &str {
        "io_register"
    }

    fn name(&self) -> &str {
        "Unregistered I/O"
    }

    fn description(&self) -> &str {
        "Path starts or ends at a top-level port without an I/O register"
    }

    fn check(&self, prompt: &ViolationPrompt) -> Option<RuleFinding> {
        let kind = prompt.path_kind;
        if !kind.is_io() {
            return None;
        }
        let (scope, root_cause, detail) = if kind.to_output() {
            let port = display_point(&prompt.endpoint).to_string();
            (
                port.clone(),
                format!("{port} is driven from fabric logic rather than an output register in the IOB"),
                format!(
                    "Pack the register driving {port} into the IOB (set_property IOB TRUE) or drive the port from an ODDR/OSERDES output register; add a pipeline stage in front if logic remains between them."
                ),
            )
        } else {
            let port = display_point(&prompt.startpoint).to_string();
            (
                port.clone(),
                format!("{port} reaches the first register through fabric logic"),
                format!(
                    "Capture {port} in an IOB input register (set_property IOB TRUE) or an IDDR/ISERDES, then pipeline into the fabric."
                ),
            )
        };
        finding(
            self,
            root_cause,
            SuggestedFix::new(FixKind::RetimeOrPipeline, scope, detail),
        )
    }
}

pub struct IoConstraintRule;

impl Rule for IoConstraintRule {
    fn id(&self) -> &str {
        "io_constraint"
    }

    fn name(&self) -> &str {
        "I/O Delay Constraint"
    }

    fn description(&self) -> &str {
        "External delay constraint on a port path needs review"
    }

    fn check(&self, prompt: &ViolationPrompt) -> Option<RuleFinding> {
        let kind = prompt.path_kind;
        if !kind.is_io() {
            return None;
        }
        let (port, command) = if kind.to_output() {
            (display_point(&prompt.endpoint), "set_output_delay")
        } else {
            (display_point(&prompt.startpoint), "set_input_delay")
        };

        let mut detail = match (prompt.output_delay_ns, prompt.requirement_ns) {
            (Some(delay), Some(req)) if kind.to_output() && req > 0.0 => format!(
                "{command} on {port} takes {delay:.3} ns of the {req:.3} ns requirement; check it against the external device and relax it, or the clock, if the interface allows."
            ),
            (Some(delay), _) if kind.to_output() => format!(
                "{command} on {port} is {delay:.3} ns; check it against the external device and relax it if the interface allows."
            ),
            _ => format!(
                "Check the {command} constraint on {port} against the external device timing; an over-tight or missing value misreports the path."
            ),
        };
        if prompt.dominant_delay == Some(DominantDelay::OutputBuffer) {
            detail.push_str(" The output buffer dominates: review the I/O standard and drive (SLEW FAST, DRIVE) or use a differential OBUFDS.");
        }
        finding(
            self,
            format!("External {command} budget on {port}"),
            SuggestedFix::new(FixKind::ConstraintReview, port.to_string(), detail),
        )
    }
}
