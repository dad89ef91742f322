//! Parser tests against report fixtures

mod common;

use common::{fixture, fixture_path};
use timingguard::analyzer::{group_violations, DominantDelay, Hint, SkewCharacter};
use timingguard::parser::{ArcKind, PathKind, ReportLayout, TimingCheck};
use timingguard::{PromptTransformer, ReportParseError, TimingReportParser};

#[test]
fn test_vivado_paths_in_report_order() {
    let report = TimingReportParser::parse(&fixture("vivado_violations.rpt")).unwrap();

    assert_eq!(report.layout, ReportLayout::Vivado);
    assert_eq!(report.paths.len(), 4, "one record per path block, met paths included");

    let ids: Vec<_> = report.paths.iter().map(|p| p.path_id.as_str()).collect();
    assert_eq!(ids, vec!["P1", "P2", "P3", "P4"]);

    let slacks: Vec<_> = report.paths.iter().map(|p| p.slack_ns).collect();
    assert_eq!(slacks, vec![-2.513, -0.842, -0.120, 0.052]);
}

#[test]
fn test_vivado_path_fields() {
    let report = TimingReportParser::parse(&fixture("vivado_violations.rpt")).unwrap();

    let p1 = &report.paths[0];
    assert_eq!(p1.startpoint, "core/mac/acc_reg[0]/C");
    assert_eq!(p1.endpoint, "core/mac/sum_reg[15]/D");
    assert_eq!(p1.clock, "clk_core");
    assert_eq!(p1.levels_of_logic, Some(12));
    assert_eq!(p1.routing_pct, Some(65.0));
    assert_eq!(p1.data_path_delay_ns, Some(7.421));
    assert_eq!(p1.check, Some(TimingCheck::Setup));
    assert!(p1.raw.chars().count() <= timingguard::parser::MAX_RAW_CHARS);

    let p2 = &report.paths[1];
    assert_eq!(p2.launch_clock.as_deref(), Some("clk_io"));
    assert_eq!(p2.capture_clock.as_deref(), Some("clk_core"));
    assert_eq!(p2.levels_of_logic, Some(0));

    let p3 = &report.paths[2];
    assert_eq!(p3.check, Some(TimingCheck::Hold));
    assert_eq!(p3.clock, "clk_io");
}

#[test]
fn test_vivado_worst_arcs_exclude_clock_tree() {
    let report = TimingReportParser::parse(&fixture("vivado_violations.rpt")).unwrap();
    let p1 = &report.paths[0];

    let cells: Vec<_> = p1.worst_cells().collect();
    let nets: Vec<_> = p1.worst_nets().collect();
    assert!(cells.len() <= 5 && nets.len() <= 5);
    assert!(nets.iter().all(|n| n.fanout != Some(640)), "clock net leaked into data arcs");
    assert!(cells.iter().all(|c| c.cell_type.as_deref() != Some("BUFG")));

    // worst net first
    assert_eq!(nets[0].name, "core/mac/sum[15]_i_4_n_0");
    assert_eq!(nets[0].kind, ArcKind::Net);
    assert!(cells.iter().any(|c| c.cell_type.as_deref() == Some("CARRY4")));

    let p2 = &report.paths[1];
    assert_eq!(p2.worst_nets().next().and_then(|n| n.fanout), Some(48));
}

#[test]
fn test_vivado_summary_and_metrics() {
    let report = TimingReportParser::parse(&fixture("vivado_violations.rpt")).unwrap();

    assert_eq!(report.summary.clocks.len(), 2);
    assert_eq!(report.summary.clocks[0].name, "clk_core");
    assert_eq!(report.summary.clocks[1].period_ns, 8.0);

    let metrics = report.metrics();
    assert_eq!(metrics.violation_count, 3);
    assert_eq!(metrics.worst_negative_slack_ns, -2.513);
    assert!((metrics.total_negative_slack_ns - (-3.475)).abs() < 1e-9);
    assert_eq!(report.summary.tns_ns, Some(-21.374), "tool figure kept apart from derived TNS");

    let gaps = report.constraint_gaps();
    assert_eq!(gaps.len(), 2);
    assert!(gaps[0].contains("set_input_delay"));
    assert!(gaps[1].contains("set_output_delay"));
}

#[test]
fn test_vivado_all_met() {
    let report = TimingReportParser::parse(&fixture("vivado_met.rpt")).unwrap();
    let metrics = report.metrics();

    assert_eq!(report.paths.len(), 3);
    assert_eq!(metrics.violation_count, 0);
    assert!(metrics.worst_negative_slack_ns >= 0.0);
    assert_eq!(metrics.total_negative_slack_ns, 0.0);
    assert!(report.constraint_gaps().is_empty());
}

#[test]
fn test_path_listing_layout() {
    let report = TimingReportParser::parse(&fixture("path_listing.rpt")).unwrap();

    assert_eq!(report.layout, ReportLayout::PathListing);
    assert_eq!(report.paths.len(), 3);
    assert_eq!(report.summary.wns_ns, Some(-1.85));

    let p1 = &report.paths[0];
    assert_eq!(p1.startpoint, "fir/tap_reg[4]");
    assert_eq!(p1.clock, "clk_dsp");
    assert_eq!(p1.levels_of_logic, Some(10));
    assert_eq!(p1.routing_pct, Some(42.0));
    assert_eq!(p1.requirement_ns, Some(4.0));
    assert_eq!(p1.check, Some(TimingCheck::Setup));

    assert_eq!(report.paths[2].clock, "clk_dsp");
    assert!(!report.paths[2].is_violating());
}

#[test]
fn test_listing_metrics_match_header() {
    let report = TimingReportParser::parse(&fixture("path_listing.rpt")).unwrap();
    let metrics = report.metrics();

    assert_eq!(metrics, timingguard::ReportMetrics::from_paths(&report.paths));
    assert_eq!(metrics.violation_count, 2);
    assert_eq!(Some(metrics.worst_negative_slack_ns), report.summary.wns_ns);
    assert!((metrics.total_negative_slack_ns - (-2.42)).abs() < 1e-9);
}

#[test]
fn test_malformed_report() {
    let err = TimingReportParser::parse(&fixture("malformed.rpt")).unwrap_err();
    assert_eq!(err, ReportParseError::NoPathBlocks);
}

#[test]
fn test_parse_report_from_file() {
    let report = timingguard::parse_report(&fixture_path("vivado_met.rpt")).unwrap();
    assert_eq!(report.layout, ReportLayout::Vivado);

    let missing = timingguard::parse_report(&fixture_path("does_not_exist.rpt"));
    assert!(matches!(missing, Err(timingguard::TimingGuardError::Io(_))));
}

#[test]
fn test_unconstrained_blocks_are_skipped() {
    let report = TimingReportParser::parse(&fixture("vivado_unconstrained.rpt")).unwrap();

    let slacks: Vec<_> = report.paths.iter().map(|p| p.slack_ns).collect();
    assert_eq!(slacks, vec![-1.204, -0.318, -0.731, -0.702, -0.655, -0.051, 0.084]);
    assert_eq!(report.paths[2].path_id, "P3", "skipped block takes no id");
    assert_eq!(report.metrics().violation_count, 6);
    assert!(report.paths.iter().all(|p| !p.endpoint.contains("mult1")));
}

#[test]
fn test_blocks_end_at_next_marker_or_section() {
    let report = TimingReportParser::parse(&fixture("vivado_unconstrained.rpt")).unwrap();

    let p2 = &report.paths[1];
    assert!(!p2.raw.contains("inf"));
    assert!(!p2.raw.contains("DSP48E1"));
    assert!(!p2.raw.contains("dbg/tap"));

    let p5 = &report.paths[4];
    assert_eq!(p5.endpoint, "y[4]");
    assert!(!p5.raw.contains("Min Delay Paths"));
    assert_eq!(report.paths[5].check, Some(TimingCheck::Hold));

    let p7 = &report.paths[6];
    assert!(!p7.raw.contains("Pulse Width"));
    assert!(!p7.raw.contains("DSP48E1"));
}

#[test]
fn test_unconstrained_neighbours_keep_their_hints() {
    let report = TimingReportParser::parse(&fixture("vivado_unconstrained.rpt")).unwrap();
    let transformer = PromptTransformer::default();

    let hints = |i: usize| transformer.transform(&report.paths[i]).hints;
    assert_eq!(hints(0), vec![Hint::HighRoutingDelay]);
    assert!(hints(1).is_empty(), "DSP48E1 from the unconstrained block leaked in");
    assert_eq!(hints(2), vec![Hint::LargeClockSkew]);
}

#[test]
fn test_output_path_enrichment() {
    let report = TimingReportParser::parse(&fixture("vivado_unconstrained.rpt")).unwrap();

    let p1 = &report.paths[0];
    assert_eq!(p1.path_kind, PathKind::RegToReg);
    assert_eq!(p1.required_time_ns, Some(14.781));
    assert_eq!(p1.arrival_time_ns, Some(-15.985));
    assert_eq!(p1.clock_terms.pessimism_removal_ns, Some(0.211));
    assert_eq!(p1.clock_terms.system_jitter_ns, Some(0.071));

    let p3 = &report.paths[2];
    assert_eq!(p3.path_kind, PathKind::RegToOut);
    assert_eq!(p3.output_delay_ns, Some(6.0));
    assert_eq!(p3.clock_terms.source_delay_ns, Some(5.12));
    assert_eq!(p3.clock_terms.destination_delay_ns, Some(0.0));

    let prompt = PromptTransformer::default().transform(p3);
    assert_eq!(prompt.dominant_delay, Some(DominantDelay::OutputBuffer));
    assert_eq!(prompt.skew_character, Some(SkewCharacter::NegativeSourceSkewLarge));
    assert!(prompt.summary.starts_with("Register-to-output path"));
}

#[test]
fn test_output_bus_groups() {
    let report = TimingReportParser::parse(&fixture("vivado_unconstrained.rpt")).unwrap();
    let groups = group_violations(&report.paths);

    let bus = groups.iter().find(|g| g.signal == "y[*]").unwrap();
    assert_eq!(bus.path_kind, PathKind::RegToOut);
    assert_eq!(bus.bits.as_deref(), Some("7:6,4"));
    assert_eq!(bus.path_ids, vec!["P3", "P4", "P5"]);
    assert_eq!(bus.worst_path_id, "P3");

    // met hold path is not grouped
    assert!(groups.iter().all(|g| !g.path_ids.contains(&"P7".to_string())));
    assert_eq!(groups[0].worst_path_id, "P1");
}

#[test]
fn test_listing_block_without_slack() {
    let text = "------ Path 1 ------\nStartpoint: a_reg\nEndpoint: b_reg\nSlack (VIOLATED) : -0.30\n------ Path 2 ------\nStartpoint: c_reg\nEndpoint: d_reg\n";
    let err = TimingReportParser::parse(text).unwrap_err();
    assert_eq!(
        err,
        ReportParseError::UnreadableSlack {
            block: "------ Path 2 ------".to_string()
        }
    );
}
