//! Folds violating paths that land on bits of the same bus into one entry.
//!
//! `y[7]`, `y[6]` and `y[4]` on reg->out paths become `y[*]` with bits
//! `7:6,4`, reported once at the worst slack of the group.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::parser::schema::{PathKind, TimingViolation};

// `core/sum_reg[15]/D` -> (`core/sum_reg`, 15); `y[7]` -> (`y`, 7)
static BUS_BIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\[(\d+)\](?:/[^/\[\]]+)?$").expect("static regex"));

/// Violating paths sharing a path kind and endpoint signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalGroup {
    pub path_kind: PathKind,
    /// `base[*]` for buses, the endpoint itself otherwise
    pub signal: String,
    /// Compacted bit list, MSB first, e.g. `7:6,4`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bits: Option<String>,
    pub path_ids: Vec<String>,
    pub worst_path_id: String,
    pub worst_slack_ns: f64,
}

impl SignalGroup {
    /// `y[7:6,4]` for buses, the bare signal otherwise.
    pub fn display_name(&self) -> String {
        match (&self.bits, self.signal.strip_suffix("[*]")) {
            (Some(bits), Some(base)) => format!("{base}[{bits}]"),
            _ => self.signal.clone(),
        }
    }
}

/// Split a bus endpoint into its base name and bit index.
pub fn bus_bit(endpoint: &str) -> Option<(&str, u32)> {
    let c = BUS_BIT.captures(endpoint)?;
    let base = c.get(1)?.as_str();
    let bit = c.get(2)?.as_str().parse().ok()?;
    Some((base, bit))
}

/// `[7, 6, 4]` -> `7:6,4`. Input order does not matter.
pub fn bit_ranges(bits: &[u32]) -> String {
    let mut sorted = bits.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();

    let mut parts = Vec::new();
    let mut iter = sorted.into_iter().peekable();
    while let Some(high) = iter.next() {
        let mut low = high;
        while iter.peek().is_some_and(|&next| next + 1 == low) {
            low -= 1;
            iter.next();
        }
        if high == low {
            parts.push(high.to_string());
        } else {
            parts.push(format!("{high}:{low}"));
        }
    }
    parts.join(",")
}

/// Group violating paths by path kind and endpoint signal, worst group first.
/// Met paths are ignored.
pub fn group_violations<'a>(paths: impl IntoIterator<Item = &'a TimingViolation>) -> Vec<SignalGroup> {
    struct Acc<'a> {
        kind: PathKind,
        signal: String,
        bits: Vec<u32>,
        members: Vec<&'a TimingViolation>,
    }

    let mut groups: Vec<Acc<'a>> = Vec::new();
    for p in paths.into_iter().filter(|p| p.is_violating()) {
        let (signal, bit) = match bus_bit(&p.endpoint) {
            Some((base, bit)) => (format!("{base}[*]"), Some(bit)),
            None => (p.endpoint.clone(), None),
        };
        let idx = match groups.iter().position(|g| g.kind == p.path_kind && g.signal == signal) {
            Some(idx) => idx,
            None => {
                groups.push(Acc {
                    kind: p.path_kind,
                    signal,
                    bits: Vec::new(),
                    members: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        group.bits.extend(bit);
        group.members.push(p);
    }

    let mut out: Vec<SignalGroup> = groups
        .into_iter()
        .filter_map(|g| {
            let worst = g
                .members
                .iter()
                .min_by(|a, b| a.slack_ns.total_cmp(&b.slack_ns))?;
            Some(SignalGroup {
                path_kind: g.kind,
                bits: (!g.bits.is_empty()).then(|| bit_ranges(&g.bits)),
                path_ids: g.members.iter().map(|p| p.path_id.clone()).collect(),
                worst_path_id: worst.path_id.clone(),
                worst_slack_ns: worst.slack_ns,
                signal: g.signal,
            })
        })
        .collect();
    // stable: ties keep report order
    out.sort_by(|a, b| a.worst_slack_ns.total_cmp(&b.worst_slack_ns));
    out
}
