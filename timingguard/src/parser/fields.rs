//! Field extraction helpers shared by the layout parsers.

use regex::Regex;
use std::sync::LazyLock;

use crate::parser::schema::{ArcKind, ClockTerms, DelayArc, PathKind, MAX_WORST_ARCS};

pub(crate) const FLOAT: &str = r"[-+]?(?:\d+\.\d+|\d+)";

/// Compile a fixed pattern in multi-line mode. Only called from statics.
pub(crate) fn pattern(p: &str) -> Regex {
    Regex::new(&format!("(?m){p}")).expect("static regex")
}

static CELL_ARC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\S+\s+([A-Z][A-Z0-9_]*)\s+\((Prop_[^)]*)\)\s+(\d+(?:\.\d+)?)\s+[-+]?\d+(?:\.\d+)?\s+[rf]\s+(\S+)")
        .expect("static regex")
});

// DSP and RAM arcs wrap the delay columns onto the next line.
static CELL_ARC_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\S+\s+([A-Z][A-Z0-9_]*)\s+\((Prop_[^)]*)\)\s*$").expect("static regex")
});

static ARC_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(\d+(?:\.\d+)?)\s+[-+]?\d+(?:\.\d+)?\s+[rf]\s+(\S+)").expect("static regex")
});

static NET_ARC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*net\s*\(fo=(\d+)[^)]*\)\s+(\d+(?:\.\d+)?)\s+[-+]?\d+(?:\.\d+)?\s+(\S+)")
        .expect("static regex")
});

static CLOCKED_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"clocked by\s+([^\s{}()]+)").expect("static regex"));

// Labelled fields common to both layouts. Vivado appends `ns` to the
// number, which the float pattern stops in front of.
pub(crate) static PATH_GROUP: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*Path Group:\s*(\S+)"));
pub(crate) static PATH_TYPE: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*Path Type:\s*(.+)$"));
pub(crate) static LOGIC_LEVELS: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^\s*(?:Levels of Logic|Logic Levels):\s*(\d+)"));
pub(crate) static REQUIREMENT: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"^\s*Requirement:\s*({FLOAT})")));
pub(crate) static DATA_PATH_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"^\s*Data Path Delay:\s*({FLOAT})")));
pub(crate) static CLOCK_SKEW: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"^\s*Clock (?:Path )?Skew:\s*({FLOAT})")));
pub(crate) static OUTPUT_DELAY: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"^\s*Output Delay:\s*({FLOAT})")));
static REQUIRED_TIME: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"^\s*required time\s+({FLOAT})")));
static ARRIVAL_TIME: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"^\s*arrival time\s+({FLOAT})")));

static CLOCK_UNCERTAINTY: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"^\s*Clock Uncertainty:\s*({FLOAT})")));

// `Destination Clock Delay (DCD):    4.640ns = ( 14.640 - 10.000 )`
static CLOCK_TERM: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"^\s*[A-Za-z ]+?\s*\((DCD|SCD|CPR|TSJ|TIJ|DJ|PE)\):\s*({FLOAT})"
    ))
});

static OUTPUT_PORT_PIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S\s+\(OUT\)").expect("static regex"));

/// First capture group of `re`, trimmed.
pub(crate) fn first(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

pub(crate) fn first_float(re: &Regex, text: &str) -> Option<f64> {
    first(re, text).and_then(|s| s.parse().ok())
}

pub(crate) fn first_u32(re: &Regex, text: &str) -> Option<u32> {
    first(re, text).and_then(|s| s.parse().ok())
}

/// Text between the first match of `start` and the next match of `end`.
/// Runs to the end of input when `end` never matches.
pub(crate) fn between<'a>(text: &'a str, start: &Regex, end: &Regex) -> Option<&'a str> {
    let s = start.find(text)?;
    let rest = &text[s.end()..];
    let stop = end.find(rest).map(|m| m.start()).unwrap_or(rest.len());
    Some(&rest[..stop])
}

/// `required time` and `arrival time` footer values.
pub(crate) fn path_times(block: &str) -> (Option<f64>, Option<f64>) {
    (first_float(&REQUIRED_TIME, block), first_float(&ARRIVAL_TIME, block))
}

/// Skew and uncertainty breakdown printed under `Clock Path Skew` and
/// `Clock Uncertainty`.
pub(crate) fn clock_terms(block: &str) -> ClockTerms {
    let mut terms = ClockTerms {
        uncertainty_ns: first_float(&CLOCK_UNCERTAINTY, block),
        ..Default::default()
    };
    for c in CLOCK_TERM.captures_iter(block) {
        let Ok(value) = c[2].parse::<f64>() else {
            continue;
        };
        let slot = match &c[1] {
            "DCD" => &mut terms.destination_delay_ns,
            "SCD" => &mut terms.source_delay_ns,
            "CPR" => &mut terms.pessimism_removal_ns,
            "TSJ" => &mut terms.system_jitter_ns,
            "TIJ" => &mut terms.input_jitter_ns,
            "DJ" => &mut terms.discrete_jitter_ns,
            _ => &mut terms.phase_error_ns,
        };
        slot.get_or_insert(value);
    }
    terms
}

/// Classify a path from its start and end annotations.
///
/// Only an explicit `input port` annotation makes the start an input: the
/// clock pin shows up as `(IN)` in every clock path section.
pub(crate) fn path_kind(start: &str, end: &str, block: &str, output_delay_ns: Option<f64>) -> PathKind {
    let from_input = start.contains("input port");
    let to_output =
        end.contains("output port") || OUTPUT_PORT_PIN.is_match(block) || output_delay_ns.is_some();
    PathKind::from_ends(from_input, to_output)
}

/// Clock named by a `clocked by <clk>` annotation.
pub(crate) fn clocked_by(text: &str) -> Option<String> {
    CLOCKED_BY
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Split `name (annotation)` into the bare name.
pub(crate) fn point_name(field: &str) -> String {
    field
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Collect the worst cell and net arcs from the data path section of a block.
///
/// The source clock network is skipped: arcs start at the launching
/// element's clock-to-out arc when one is present, and stop at the
/// `arrival time` line so the capture clock path is ignored too.
pub(crate) fn worst_arcs(block: &str) -> Vec<DelayArc> {
    let lines: Vec<&str> = block
        .lines()
        .take_while(|l| !l.trim_start().starts_with("arrival time"))
        .collect();

    let data_start = lines
        .iter()
        .position(|l| {
            (CELL_ARC.is_match(l) || CELL_ARC_HEAD.is_match(l)) && is_launch_arc(l)
        })
        .unwrap_or(0);

    let mut cells = Vec::new();
    let mut nets = Vec::new();
    let mut i = data_start;
    while i < lines.len() {
        let line = lines[i];
        if let Some(c) = CELL_ARC.captures(line) {
            if let Ok(delay) = c[3].parse::<f64>() {
                cells.push(DelayArc {
                    kind: ArcKind::Cell,
                    name: instance_of(&c[4]),
                    cell_type: Some(c[1].to_string()),
                    fanout: None,
                    delay_ns: delay,
                });
            }
        } else if let Some(c) = CELL_ARC_HEAD.captures(line) {
            if let Some(tail) = lines.get(i + 1).and_then(|next| ARC_TAIL.captures(next)) {
                if let Ok(delay) = tail[1].parse::<f64>() {
                    cells.push(DelayArc {
                        kind: ArcKind::Cell,
                        name: instance_of(&tail[2]),
                        cell_type: Some(c[1].to_string()),
                        fanout: None,
                        delay_ns: delay,
                    });
                }
                i += 1;
            }
        } else if let Some(c) = NET_ARC.captures(line) {
            if let Ok(delay) = c[2].parse::<f64>() {
                nets.push(DelayArc {
                    kind: ArcKind::Net,
                    name: c[3].to_string(),
                    cell_type: None,
                    fanout: c[1].parse().ok(),
                    delay_ns: delay,
                });
            }
        }
        i += 1;
    }

    keep_worst(&mut cells);
    keep_worst(&mut nets);
    cells.extend(nets);
    cells
}

fn is_launch_arc(line: &str) -> bool {
    line.contains("_C_Q)") || line.contains("_CLK")
}

// `mult0/P[0]` -> `mult0`
fn instance_of(pin: &str) -> String {
    match pin.rfind('/') {
        Some(idx) if idx > 0 => pin[..idx].to_string(),
        _ => pin.to_string(),
    }
}

fn keep_worst(arcs: &mut Vec<DelayArc>) {
    // stable sort keeps report order among equal delays
    arcs.sort_by(|a, b| b.delay_ns.total_cmp(&a.delay_ns));
    arcs.truncate(MAX_WORST_ARCS);
}
