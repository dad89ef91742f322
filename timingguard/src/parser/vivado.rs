//! Vivado `report_timing_summary` / `report_timing` layout.
//!
//! Each path block opens with a `Slack ... : <x>ns` line and runs until the
//! next slack line or section header, whichever comes first. Unconstrained
//! paths (`Slack: inf`) close the previous block and are then dropped.

use regex::Regex;
use std::sync::LazyLock;

use crate::parser::fields::{self, pattern, FLOAT};
use crate::parser::schema::{cap_raw, ClockInfo, ReportSummary, TimingCheck, TimingViolation};
use crate::parser::timing::ReportParseError;

pub(crate) static SLACK_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"^\s*Slack\s*(?:\((?:VIOLATED|MET)\))?\s*:\s*(?:(-?inf)\b|({FLOAT})\s*ns)"
    ))
});

// Headers that end the path block in front of them.
static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^\s*(?:Max Delay Paths|Min Delay Paths|Pulse Width Checks|From Clock:)")
});

static DATA_PATH_DELAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"Data Path Delay:\s*({FLOAT})ns\s*\(logic\s*({FLOAT})ns\s*\(({FLOAT})%\)\s*route\s*({FLOAT})ns\s*\(({FLOAT})%\)\)"
    ))
    .expect("static regex")
});

static SUMMARY_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^\s*({FLOAT})\s+({FLOAT})\s+(\d+)\s+(\d+)\s+({FLOAT})\s+({FLOAT})\s+(\d+)\s+(\d+)"
    ))
    .expect("static regex")
});

static CLOCK_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*([A-Za-z0-9_./\[\]]+)\s+\{{[^}}]*\}}\s+({FLOAT})\s+({FLOAT})"))
        .expect("static regex")
});

static CHECK_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\.\s*checking\s+([A-Za-z0-9_]+)\s*\((\d+)\)").expect("static regex")
});

static SOURCE: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*Source:\s*(.+)$"));
static DESTINATION: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*Destination:\s*(.+)$"));
static SOURCE_LABEL: LazyLock<Regex> = LazyLock::new(|| pattern(r"Source:"));
static DESTINATION_LABEL: LazyLock<Regex> = LazyLock::new(|| pattern(r"Destination:"));
static GROUP_OR_TYPE_LABEL: LazyLock<Regex> = LazyLock::new(|| pattern(r"Path Group:|Path Type:"));

static DESIGN_SUMMARY: LazyLock<Regex> = LazyLock::new(|| pattern(r"Design Timing Summary"));
static CLOCK_SUMMARY: LazyLock<Regex> = LazyLock::new(|| pattern(r"^[\s|]*Clock Summary"));
static CLOCK_SUMMARY_END: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^[\s|]*(?:Intra Clock Table|Inter Clock Table|Timing Details)"));
static CHECK_TIMING: LazyLock<Regex> = LazyLock::new(|| pattern(r"check_timing report"));

pub struct VivadoParser;

impl VivadoParser {
    pub fn has_paths(text: &str) -> bool {
        SLACK_MARKER.is_match(text)
    }

    pub fn parse_summary(text: &str) -> ReportSummary {
        let mut summary = ReportSummary::default();

        if let Some(block) = fields::between(text, &DESIGN_SUMMARY, &CLOCK_SUMMARY) {
            if let Some(row) = SUMMARY_ROW.captures(block) {
                summary.wns_ns = row[1].parse().ok();
                summary.tns_ns = row[2].parse().ok();
            }
        }

        if let Some(block) = fields::between(text, &CLOCK_SUMMARY, &CLOCK_SUMMARY_END) {
            for line in block.lines() {
                if let Some(c) = CLOCK_ROW.captures(line) {
                    if let (Ok(period_ns), Ok(frequency_mhz)) = (c[2].parse(), c[3].parse()) {
                        summary.clocks.push(ClockInfo {
                            name: c[1].to_string(),
                            period_ns,
                            frequency_mhz,
                        });
                    }
                }
            }
        }

        if let Some(block) = fields::between(text, &CHECK_TIMING, &DESIGN_SUMMARY) {
            for c in CHECK_ROW.captures_iter(block) {
                if let Ok(count) = c[2].parse() {
                    summary.checks.push((c[1].to_string(), count));
                }
            }
        }

        summary
    }

    /// Path blocks in report order.
    pub fn parse_paths(text: &str) -> Result<Vec<TimingViolation>, ReportParseError> {
        let markers: Vec<_> = SLACK_MARKER.captures_iter(text).collect();
        let mut cuts: Vec<usize> = SECTION_HEADER
            .find_iter(text)
            .map(|m| m.start())
            .chain(markers.iter().filter_map(|m| m.get(0)).map(|g| g.start()))
            .collect();
        cuts.sort_unstable();

        let mut paths = Vec::with_capacity(markers.len());
        for m in &markers {
            let Some(whole) = m.get(0) else {
                continue;
            };
            let start = whole.start();
            let end = cuts
                .iter()
                .copied()
                .find(|&c| c > start)
                .unwrap_or(text.len());
            let block = &text[start..end];

            let Some(value) = m.get(2) else {
                tracing::debug!("Skipping unconstrained path block: {}", whole.as_str().trim());
                continue;
            };
            let slack = value
                .as_str()
                .parse::<f64>()
                .map_err(|_| ReportParseError::UnreadableSlack {
                    block: whole.as_str().trim().to_string(),
                })?;
            paths.push(Self::parse_block(paths.len() + 1, slack, block));
        }

        Ok(paths)
    }

    fn parse_block(index: usize, slack_ns: f64, block: &str) -> TimingViolation {
        let startpoint = fields::first(&SOURCE, block)
            .map(|s| fields::point_name(&s))
            .unwrap_or_default();
        let endpoint = fields::first(&DESTINATION, block)
            .map(|s| fields::point_name(&s))
            .unwrap_or_default();

        let start_text = fields::between(block, &SOURCE_LABEL, &DESTINATION_LABEL).unwrap_or_default();
        let end_text = fields::between(block, &DESTINATION_LABEL, &GROUP_OR_TYPE_LABEL).unwrap_or_default();
        let launch_clock = fields::clocked_by(start_text);
        let capture_clock = fields::clocked_by(end_text);
        let path_group = fields::first(&fields::PATH_GROUP, block);
        let check = fields::first(&fields::PATH_TYPE, block).and_then(|t| TimingCheck::from_path_type(&t));

        let (data_path_delay_ns, logic_delay_ns, route_delay_ns, routing_pct) =
            match DATA_PATH_DELAY.captures(block) {
                Some(d) => (
                    d[1].parse().ok(),
                    d[2].parse().ok(),
                    d[4].parse().ok(),
                    d[5].parse::<f64>().ok().map(|p| p.clamp(0.0, 100.0)),
                ),
                None => (fields::first_float(&fields::DATA_PATH_TOTAL, block), None, None, None),
            };

        let clock = capture_clock
            .clone()
            .or_else(|| path_group.clone())
            .or_else(|| launch_clock.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let output_delay_ns = fields::first_float(&fields::OUTPUT_DELAY, block);
        let (required_time_ns, arrival_time_ns) = fields::path_times(block);

        TimingViolation {
            path_id: format!("P{index}"),
            slack_ns,
            clock,
            startpoint,
            endpoint,
            path_kind: fields::path_kind(start_text, end_text, block, output_delay_ns),
            launch_clock,
            capture_clock,
            path_group,
            check,
            levels_of_logic: fields::first_u32(&fields::LOGIC_LEVELS, block),
            routing_pct,
            requirement_ns: fields::first_float(&fields::REQUIREMENT, block),
            data_path_delay_ns,
            logic_delay_ns,
            route_delay_ns,
            clock_skew_ns: fields::first_float(&fields::CLOCK_SKEW, block),
            output_delay_ns,
            required_time_ns,
            arrival_time_ns,
            clock_terms: fields::clock_terms(block),
            worst_arcs: fields::worst_arcs(block),
            raw: cap_raw(block),
        }
    }
}
