use serde::{Deserialize, Serialize};

/// Upper bound on the raw excerpt kept per path.
pub const MAX_RAW_CHARS: usize = 2000;

/// Number of worst cell arcs and worst net arcs kept per path.
pub const MAX_WORST_ARCS: usize = 5;

/// Vendor layout a report was recognised as.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportLayout {
    /// Vivado `report_timing_summary` / `report_timing` output
    Vivado,
    /// Plain `---- Path N` listing with labelled fields
    PathListing,
}

impl ReportLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportLayout::Vivado => "Vivado",
            ReportLayout::PathListing => "Path listing",
        }
    }
}

/// Timing check a path was analysed against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimingCheck {
    Setup,
    Hold,
    Recovery,
    Removal,
}

impl TimingCheck {
    /// Map a `Path Type:` value (e.g. `Setup (Max at Slow Process Corner)`).
    pub fn from_path_type(text: &str) -> Option<Self> {
        let lower = text.trim().to_lowercase();
        if lower.starts_with("setup") || lower.starts_with("max") {
            Some(TimingCheck::Setup)
        } else if lower.starts_with("hold") || lower.starts_with("min") {
            Some(TimingCheck::Hold)
        } else if lower.starts_with("recovery") {
            Some(TimingCheck::Recovery)
        } else if lower.starts_with("removal") {
            Some(TimingCheck::Removal)
        } else {
            None
        }
    }
}

/// Where a path starts and ends: register or top-level port.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PathKind {
    #[default]
    #[serde(rename = "reg->reg")]
    RegToReg,
    #[serde(rename = "in->reg")]
    InToReg,
    #[serde(rename = "reg->out")]
    RegToOut,
    #[serde(rename = "in->out")]
    InToOut,
}

impl PathKind {
    pub fn from_ends(from_input: bool, to_output: bool) -> Self {
        match (from_input, to_output) {
            (false, false) => PathKind::RegToReg,
            (true, false) => PathKind::InToReg,
            (false, true) => PathKind::RegToOut,
            (true, true) => PathKind::InToOut,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PathKind::RegToReg => "reg->reg",
            PathKind::InToReg => "in->reg",
            PathKind::RegToOut => "reg->out",
            PathKind::InToOut => "in->out",
        }
    }

    pub fn from_input(&self) -> bool {
        matches!(self, PathKind::InToReg | PathKind::InToOut)
    }

    pub fn to_output(&self) -> bool {
        matches!(self, PathKind::RegToOut | PathKind::InToOut)
    }

    /// Touches a top-level port at either end.
    pub fn is_io(&self) -> bool {
        *self != PathKind::RegToReg
    }
}

impl std::fmt::Display for PathKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clock skew and uncertainty terms reported under a path header.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClockTerms {
    /// DCD
    pub destination_delay_ns: Option<f64>,
    /// SCD
    pub source_delay_ns: Option<f64>,
    /// CPR
    pub pessimism_removal_ns: Option<f64>,
    pub uncertainty_ns: Option<f64>,
    /// TSJ
    pub system_jitter_ns: Option<f64>,
    /// TIJ
    pub input_jitter_ns: Option<f64>,
    /// DJ
    pub discrete_jitter_ns: Option<f64>,
    /// PE
    pub phase_error_ns: Option<f64>,
}

impl ClockTerms {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// DCD - SCD: negative when the source clock arrives later than the
    /// destination clock.
    pub fn insertion_delta_ns(&self) -> Option<f64> {
        Some(self.destination_delay_ns? - self.source_delay_ns?)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArcKind {
    Cell,
    Net,
}

/// One delay contribution along a data path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DelayArc {
    pub kind: ArcKind,
    pub name: String,              // instance pin or net name
    pub cell_type: Option<String>, // LUT6, DSP48E1, CARRY4 (cells only)
    pub fanout: Option<u32>,       // nets only
    pub delay_ns: f64,
}

/// A single timing path extracted from a report.
///
/// Created once by the parser and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingViolation {
    /// Unique within the report
    pub path_id: String,
    /// Signed slack; negative means the path fails
    pub slack_ns: f64,
    /// Clock domain the path is timed in (capture clock, else path group)
    pub clock: String,
    pub startpoint: String,
    pub endpoint: String,
    #[serde(default)]
    pub path_kind: PathKind,
    pub launch_clock: Option<String>,
    pub capture_clock: Option<String>,
    pub path_group: Option<String>,
    pub check: Option<TimingCheck>,
    pub levels_of_logic: Option<u32>,
    /// Share of data path delay spent in routing, 0-100
    pub routing_pct: Option<f64>,
    pub requirement_ns: Option<f64>,
    pub data_path_delay_ns: Option<f64>,
    pub logic_delay_ns: Option<f64>,
    pub route_delay_ns: Option<f64>,
    pub clock_skew_ns: Option<f64>,
    pub output_delay_ns: Option<f64>,
    pub required_time_ns: Option<f64>,
    pub arrival_time_ns: Option<f64>,
    #[serde(default, skip_serializing_if = "ClockTerms::is_empty")]
    pub clock_terms: ClockTerms,
    /// Worst cell arcs followed by worst net arcs, each sorted by delay
    pub worst_arcs: Vec<DelayArc>,
    /// Report excerpt, capped at [`MAX_RAW_CHARS`]
    pub raw: String,
}

impl TimingViolation {
    pub fn is_violating(&self) -> bool {
        self.slack_ns < 0.0
    }

    pub fn worst_cells(&self) -> impl Iterator<Item = &DelayArc> {
        self.worst_arcs.iter().filter(|a| a.kind == ArcKind::Cell)
    }

    pub fn worst_nets(&self) -> impl Iterator<Item = &DelayArc> {
        self.worst_arcs.iter().filter(|a| a.kind == ArcKind::Net)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClockInfo {
    pub name: String,
    pub period_ns: f64,
    pub frequency_mhz: f64,
}

/// Header tables of a report, when the layout carries them.
///
/// WNS/TNS here are the tool's own figures and can cover endpoints the
/// listed paths do not; [`ReportMetrics`] never reads them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    pub wns_ns: Option<f64>,
    pub tns_ns: Option<f64>,
    pub clocks: Vec<ClockInfo>,
    /// `check_timing` counters, e.g. `no_input_delay -> 3`
    pub checks: Vec<(String, u32)>,
}

impl ReportSummary {
    pub fn check_count(&self, name: &str) -> u32 {
        self.checks
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }
}

/// Report-level figures. Derived, never stored independently of the paths.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReportMetrics {
    pub worst_negative_slack_ns: f64,
    pub total_negative_slack_ns: f64,
    pub violation_count: usize,
}

impl ReportMetrics {
    /// Derive metrics from the path list alone.
    pub fn from_paths(paths: &[TimingViolation]) -> Self {
        let mut wns: f64 = 0.0;
        let mut tns = 0.0;
        let mut count = 0;
        for p in paths.iter().filter(|p| p.is_violating()) {
            wns = wns.min(p.slack_ns);
            tns += p.slack_ns;
            count += 1;
        }
        Self {
            worst_negative_slack_ns: wns,
            total_negative_slack_ns: tns,
            violation_count: count,
        }
    }

    pub fn has_violations(&self) -> bool {
        self.violation_count > 0
    }
}

/// Output of the parser: paths in native report order plus summary data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingReport {
    pub layout: ReportLayout,
    pub summary: ReportSummary,
    pub paths: Vec<TimingViolation>,
}

impl TimingReport {
    pub fn metrics(&self) -> ReportMetrics {
        ReportMetrics::from_paths(&self.paths)
    }

    pub fn violations(&self) -> impl Iterator<Item = &TimingViolation> {
        self.paths.iter().filter(|p| p.is_violating())
    }

    /// Constraint problems flagged by `check_timing` that commonly block closure.
    pub fn constraint_gaps(&self) -> Vec<String> {
        let mut gaps = Vec::new();
        if self.summary.check_count("no_clock") > 0 {
            gaps.push("Registers without a clock; add create_clock for every clock source.".to_string());
        }
        if self.summary.check_count("unconstrained_internal_endpoints") > 0 {
            gaps.push("Unconstrained internal endpoints; review clock definitions and exceptions.".to_string());
        }
        if self.summary.check_count("no_input_delay") > 0 {
            gaps.push("Missing set_input_delay on at least one input; verify the external timing model.".to_string());
        }
        if self.summary.check_count("no_output_delay") > 0 {
            gaps.push("Missing set_output_delay on outputs; confirm external device setup/hold.".to_string());
        }
        if self.summary.check_count("generated_clocks") > 0 {
            gaps.push("Generated clocks absent; add create_generated_clock where appropriate.".to_string());
        }
        gaps
    }
}

/// Truncate on a char boundary.
pub(crate) fn cap_raw(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(MAX_RAW_CHARS) {
        Some((idx, _)) => trimmed[..idx].to_string(),
        None => trimmed.to_string(),
    }
}
