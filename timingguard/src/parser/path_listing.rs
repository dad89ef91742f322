//! Plain path-listing layout.
//!
//! ```text
//! Worst Negative Slack : -1.20
//! Total Negative Slack : -2.00
//! ------ Path 1 ------
//! Startpoint: a_reg (rising edge-triggered flip-flop clocked by clk)
//! Endpoint: b_reg (rising edge-triggered flip-flop clocked by clk)
//! Slack (VIOLATED) : -1.20
//! Levels of Logic: 9
//! Routing Delay: 2.10 ns (65%)
//! ```

use regex::Regex;
use std::sync::LazyLock;

use crate::parser::fields::{self, pattern, FLOAT};
use crate::parser::schema::{cap_raw, ReportSummary, TimingCheck, TimingViolation};
use crate::parser::timing::ReportParseError;

pub(crate) static PATH_HEADER: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^\s*-{3,}\s*Path\s*(\d+)\b.*$"));

static ROUTING_DELAY: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(r"^\s*Routing\s+Delay\s*:\s*({FLOAT})\s*ns\s*\(({FLOAT})\s*%\)"))
});

static SLACK: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(r"^\s*Slack\s*(?:\((?:VIOLATED|MET)\))?\s*:\s*({FLOAT})"))
});

static WORST_NEGATIVE_SLACK: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"Worst Negative Slack\s*:\s*({FLOAT})")));
static TOTAL_NEGATIVE_SLACK: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"Total Negative Slack\s*:\s*({FLOAT})")));

static STARTPOINT: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*Startpoint:\s*(.+)$"));
static ENDPOINT: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*Endpoint:\s*(.+)$"));
static STARTPOINT_CLOCK: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*Startpoint clock:\s*(\S+)"));
static ENDPOINT_CLOCK: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*Endpoint clock:\s*(\S+)"));
static CLOCK: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*Clock:\s*(\S+)"));
static LOGIC_DELAY: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"^\s*Logic Delay\s*:\s*({FLOAT})")));

pub struct PathListingParser;

impl PathListingParser {
    pub fn has_paths(text: &str) -> bool {
        PATH_HEADER.is_match(text)
    }

    pub fn parse_summary(text: &str) -> ReportSummary {
        ReportSummary {
            wns_ns: fields::first_float(&WORST_NEGATIVE_SLACK, text),
            tns_ns: fields::first_float(&TOTAL_NEGATIVE_SLACK, text),
            ..Default::default()
        }
    }

    /// Path blocks in report order. A block whose slack cannot be read
    /// fails the whole report.
    pub fn parse_paths(text: &str) -> Result<Vec<TimingViolation>, ReportParseError> {
        let headers: Vec<_> = PATH_HEADER.find_iter(text).collect();
        let mut paths = Vec::with_capacity(headers.len());

        for (i, header) in headers.iter().enumerate() {
            let end = headers.get(i + 1).map(|h| h.start()).unwrap_or(text.len());
            let block = &text[header.start()..end];
            let path = Self::parse_block(paths.len() + 1, block).ok_or_else(|| {
                ReportParseError::UnreadableSlack {
                    block: header.as_str().trim().to_string(),
                }
            })?;
            paths.push(path);
        }

        Ok(paths)
    }

    fn parse_block(index: usize, block: &str) -> Option<TimingViolation> {
        let slack_ns = fields::first_float(&SLACK, block)?;

        let start_field = fields::first(&STARTPOINT, block).unwrap_or_default();
        let end_field = fields::first(&ENDPOINT, block).unwrap_or_default();

        let launch_clock = fields::first(&STARTPOINT_CLOCK, block).or_else(|| fields::clocked_by(&start_field));
        let capture_clock = fields::first(&ENDPOINT_CLOCK, block).or_else(|| fields::clocked_by(&end_field));
        let path_group = fields::first(&fields::PATH_GROUP, block);

        let (route_delay_ns, routing_pct) = match ROUTING_DELAY.captures(block) {
            Some(c) => (
                c[1].parse().ok(),
                c[2].parse::<f64>().ok().map(|p| p.clamp(0.0, 100.0)),
            ),
            None => (None, None),
        };

        let clock = fields::first(&CLOCK, block)
            .or_else(|| capture_clock.clone())
            .or_else(|| path_group.clone())
            .or_else(|| launch_clock.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let output_delay_ns = fields::first_float(&fields::OUTPUT_DELAY, block);
        let (required_time_ns, arrival_time_ns) = fields::path_times(block);

        Some(TimingViolation {
            path_id: format!("P{index}"),
            slack_ns,
            clock,
            startpoint: fields::point_name(&start_field),
            endpoint: fields::point_name(&end_field),
            path_kind: fields::path_kind(&start_field, &end_field, block, output_delay_ns),
            launch_clock,
            capture_clock,
            path_group,
            check: fields::first(&fields::PATH_TYPE, block).and_then(|t| TimingCheck::from_path_type(&t)),
            levels_of_logic: fields::first_u32(&fields::LOGIC_LEVELS, block),
            routing_pct,
            requirement_ns: fields::first_float(&fields::REQUIREMENT, block),
            data_path_delay_ns: fields::first_float(&fields::DATA_PATH_TOTAL, block),
            logic_delay_ns: fields::first_float(&LOGIC_DELAY, block),
            route_delay_ns,
            clock_skew_ns: fields::first_float(&fields::CLOCK_SKEW, block),
            output_delay_ns,
            required_time_ns,
            arrival_time_ns,
            clock_terms: fields::clock_terms(block),
            worst_arcs: fields::worst_arcs(block),
            raw: cap_raw(block),
        })
    }
}
