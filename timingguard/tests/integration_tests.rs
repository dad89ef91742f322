//! Integration tests for the TimingGuard pipeline

mod common;

use common::{fixture, Reply, ScriptedBackend};
use std::sync::Arc;
use std::time::Duration;
use timingguard::analyzer::result::FixOrigin;
use timingguard::prelude::*;
use timingguard::{
    Guardrail, HeuristicEngine, Hint, IssueClass, PromptTransformer, ReasoningOrchestrator,
    ReportParseError, TimingReportParser,
};

fn offline() -> AnalysisOptions {
    AnalysisOptions {
        offline_mode: true,
        ..Default::default()
    }
}

#[test]
fn test_deep_routed_path_needs_pipeline_and_floorplan() {
    let text = r#"
------ Path 1 ------
Startpoint: core/a_reg (rising edge-triggered flip-flop clocked by clk)
Endpoint: core/b_reg (rising edge-triggered flip-flop clocked by clk)
Slack (VIOLATED) : -2.5
Levels of Logic: 12
Routing Delay: 3.10 ns (65%)
"#;
    let report = TimingReportParser::parse(text).unwrap();
    let prompt = PromptTransformer::default().transform(&report.paths[0]);
    let result = HeuristicEngine::with_default_rules().analyze(&prompt);

    assert!(result.has_fix(FixKind::RetimeOrPipeline));
    assert!(result.has_fix(FixKind::Floorplan));
    assert_eq!(result.provenance.stage, Stage::Heuristic);
}

#[tokio::test]
async fn test_met_report_makes_no_backend_calls() {
    let engine = Arc::new(HeuristicEngine::with_default_rules());
    let primary = Arc::new(ScriptedBackend::new("primary", vec![Reply::Text(common::VALID_PIPELINE_ONLY)]));
    let secondary = Arc::new(ScriptedBackend::new("secondary", vec![Reply::Text(common::VALID_PIPELINE_ONLY)]));
    let orchestrator = ReasoningOrchestrator::new(engine.clone(), Duration::from_secs(5))
        .with_primary(primary.clone())
        .with_secondary(secondary.clone());
    let core = TimingGuardCore::with_orchestrator(TimingGuardConfig::default(), orchestrator, engine);

    let analysis = core
        .analyze_report(&fixture("vivado_met.rpt"), &AnalysisOptions::default())
        .await
        .unwrap();

    assert!(analysis.metrics.worst_negative_slack_ns >= 0.0);
    assert_eq!(analysis.metrics.total_negative_slack_ns, 0.0);
    assert_eq!(analysis.metrics.violation_count, 0);
    assert!(analysis.results.is_empty());
    assert!(!analysis.has_violations());
    assert_eq!(primary.calls(), 0);
    assert_eq!(secondary.calls(), 0);
}

#[tokio::test]
async fn test_malformed_report_is_a_parse_error() {
    let core = TimingGuardCore::default();
    let err = core
        .analyze_report(&fixture("malformed.rpt"), &offline())
        .await
        .unwrap_err();

    assert!(matches!(err, TimingGuardError::Parse(ReportParseError::NoPathBlocks)));
}

#[test]
fn test_empty_report() {
    assert_eq!(TimingReportParser::parse("  \n\t").unwrap_err(), ReportParseError::Empty);
}

#[tokio::test]
async fn test_offline_vivado_report() {
    let core = TimingGuardCore::default();
    let analysis = core
        .analyze_report(&fixture("vivado_violations.rpt"), &offline())
        .await
        .unwrap();

    assert_eq!(analysis.paths.len(), 4);
    let ids: Vec<_> = analysis.results.iter().map(|r| r.path_id.as_str()).collect();
    assert_eq!(ids, vec!["P1", "P2", "P3"], "met path P4 is not analysed");

    for result in &analysis.results {
        assert!(!result.fixes.is_empty(), "{} has no fixes", result.path_id);
        assert_eq!(result.provenance.stage, Stage::Heuristic);
        assert!(result.confidence <= timingguard::analyzer::guardrail::HEURISTIC_CONFIDENCE_CAP);
    }

    let p1 = analysis.result_for("P1").unwrap();
    assert_eq!(p1.issue_class, IssueClass::Setup);
    assert!(p1.has_fix(FixKind::RetimeOrPipeline));
    assert!(p1.has_fix(FixKind::Floorplan));
    assert!(p1.has_fix(FixKind::ResourceRemap));
    assert!(p1.risks.iter().any(|r| r.contains("3-cycle latency")));

    let p2 = analysis.result_for("P2").unwrap();
    assert!(p2.has_fix(FixKind::ConstraintReview));
    assert!(p2.has_fix(FixKind::ReplicateDriver));
    assert!(p2.fixes.iter().any(|f| f.kind == FixKind::ConstraintReview && f.scope == "clk_core"));

    let p3 = analysis.result_for("P3").unwrap();
    assert_eq!(p3.issue_class, IssueClass::Hold);
    assert_eq!(p3.fix_kinds(), vec![FixKind::ManualReview]);

    assert_eq!(analysis.stats.critical, 1);
    assert_eq!(analysis.stats.moderate, 1);
    assert_eq!(analysis.stats.minor, 1);
    assert_eq!(analysis.stats.heuristic_only, 3);
    assert_eq!(analysis.stats.ai_confirmed, 0);
    assert_eq!(analysis.constraint_gaps.len(), 2);
}

#[tokio::test]
async fn test_offline_path_listing_report() {
    let core = TimingGuardCore::default();
    let analysis = core
        .analyze_report(&fixture("path_listing.rpt"), &offline())
        .await
        .unwrap();

    assert_eq!(analysis.results.len(), 2);
    assert_eq!(analysis.metrics.worst_negative_slack_ns, -1.85);

    let p1 = analysis.result_for("P1").unwrap();
    assert!(p1.has_fix(FixKind::RetimeOrPipeline));
    assert!(p1.has_fix(FixKind::ResourceRemap));

    let p2 = analysis.result_for("P2").unwrap();
    assert!(p2.has_fix(FixKind::Floorplan));
    assert!(p2.has_fix(FixKind::ReplicateDriver));
}

#[tokio::test]
async fn test_every_violation_answered_when_backends_fail() {
    let engine = Arc::new(HeuristicEngine::with_default_rules());
    let orchestrator = ReasoningOrchestrator::new(engine.clone(), Duration::from_secs(5))
        .with_primary(Arc::new(ScriptedBackend::new("primary", vec![Reply::Fail])))
        .with_secondary(Arc::new(ScriptedBackend::new("secondary", vec![Reply::Fail])));
    let core = TimingGuardCore::with_orchestrator(TimingGuardConfig::default(), orchestrator, engine);

    let analysis = core
        .analyze_report(&fixture("vivado_violations.rpt"), &AnalysisOptions::default())
        .await
        .unwrap();

    assert_eq!(analysis.results.len(), 3);
    for result in &analysis.results {
        assert!(!result.fixes.is_empty());
        assert_eq!(result.provenance.stage, Stage::Heuristic);
        assert!(result.notes.iter().any(|n| n.contains("unavailable")));
    }
}

#[test]
fn test_prompt_projection_is_pure() {
    let report = TimingReportParser::parse(&fixture("vivado_violations.rpt")).unwrap();
    let transformer = PromptTransformer::default();

    for path in &report.paths {
        let first = transformer.transform(path);
        let second = transformer.transform(path);
        assert_eq!(first, second);
    }

    let p1 = transformer.transform(&report.paths[0]);
    assert_eq!(p1.hints, vec![Hint::DeepLogic, Hint::HighRoutingDelay, Hint::ArithmeticHeavy]);

    let p2 = transformer.transform(&report.paths[1]);
    assert_eq!(
        p2.hints,
        vec![
            Hint::HighRoutingDelay,
            Hint::HighFanout,
            Hint::ClockDomainCrossing,
            Hint::ArithmeticHeavy
        ]
    );

    assert!(transformer.transform(&report.paths[2]).hints.is_empty());
}

#[tokio::test]
async fn test_guardrail_is_idempotent_over_a_report() {
    let core = TimingGuardCore::default();
    let analysis = core
        .analyze_report(&fixture("vivado_violations.rpt"), &offline())
        .await
        .unwrap();

    let engine = Arc::new(HeuristicEngine::with_default_rules());
    let guardrail = Guardrail::new(engine, core.config().thresholds.clone());
    let transformer = PromptTransformer::default();

    for result in &analysis.results {
        let path = analysis.path(&result.path_id).unwrap();
        let prompt = transformer.transform(path);
        let again = guardrail.finalize(result.clone(), &prompt);
        assert_eq!(&again, result, "second pass changed {}", result.path_id);
    }
}

#[tokio::test]
async fn test_results_serialize_for_front_ends() {
    let core = TimingGuardCore::default();
    let analysis = core
        .analyze_report(&fixture("vivado_violations.rpt"), &offline())
        .await
        .unwrap();

    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["metrics"]["violation_count"], 3);
    assert_eq!(json["results"][0]["path_id"], "P1");
    assert_eq!(json["results"][0]["provenance"]["stage"], "heuristic");
    assert_eq!(json["results"][0]["fixes"][0]["type"], "retime_or_pipeline");
    assert!(json["results"][0]["fixes"]
        .as_array()
        .unwrap()
        .iter()
        .all(|f| f["origin"] == "heuristic"));
    assert!(analysis
        .results
        .iter()
        .flat_map(|r| &r.fixes)
        .all(|f| f.origin != FixOrigin::Guardrail));
}
