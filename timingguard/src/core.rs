//! Report-level pipeline shared by the CLI and any other front end.
//! No I/O beyond the optional file helpers.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::ai::router::ReasoningOrchestrator;
use crate::analyzer::grouping::{group_violations, SignalGroup};
use crate::analyzer::guardrail::Guardrail;
use crate::analyzer::prompt::PromptTransformer;
use crate::analyzer::result::{AnalysisResult, FixOrigin};
use crate::analyzer::rules::{HeuristicEngine, Severity};
use crate::config::TimingGuardConfig;
use crate::parser::schema::{ReportLayout, ReportMetrics, ReportSummary, TimingViolation};
use crate::parser::timing::{ReportParseError, TimingReportParser};

#[derive(Debug, thiserror::Error)]
pub enum TimingGuardError {
    #[error("Parse error: {0}")]
    Parse(#[from] ReportParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(String),
}

/// Options for one analysis run.
#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    /// Skip every backend; heuristic results only
    pub offline_mode: bool,
    /// HDL source passed to backends as context
    pub design_source: Option<String>,
    /// Overrides the configured concurrency when set
    pub max_concurrency: Option<usize>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            offline_mode: false,
            design_source: None,
            max_concurrency: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisStats {
    pub critical: usize,
    pub moderate: usize,
    pub minor: usize,
    pub ai_confirmed: usize,
    pub heuristic_only: usize,
    pub guardrail_fixes: usize,
}

/// Everything produced for one report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportAnalysis {
    pub run_id: Uuid,
    pub layout: ReportLayout,
    pub summary: ReportSummary,
    pub metrics: ReportMetrics,
    /// Every parsed path, met or not, in report order
    pub paths: Vec<TimingViolation>,
    /// One finalized result per violating path, in report order
    pub results: Vec<AnalysisResult>,
    /// Violating paths folded by path kind and bus, worst first
    pub signal_groups: Vec<SignalGroup>,
    pub constraint_gaps: Vec<String>,
    pub stats: AnalysisStats,
}

impl ReportAnalysis {
    pub fn has_violations(&self) -> bool {
        self.metrics.has_violations()
    }

    pub fn result_for(&self, path_id: &str) -> Option<&AnalysisResult> {
        self.results.iter().find(|r| r.path_id == path_id)
    }

    pub fn path(&self, path_id: &str) -> Option<&TimingViolation> {
        self.paths.iter().find(|p| p.path_id == path_id)
    }
}

/// Parser -> transformer -> orchestrator -> guardrail, per violating path.
pub struct TimingGuardCore {
    config: TimingGuardConfig,
    transformer: PromptTransformer,
    orchestrator: ReasoningOrchestrator,
    guardrail: Guardrail,
}

impl TimingGuardCore {
    /// Build with the HTTP backends named in `config`.
    pub fn new(config: TimingGuardConfig) -> Self {
        let engine = Arc::new(HeuristicEngine::with_default_rules());
        let orchestrator = ReasoningOrchestrator::from_config(&config, engine.clone());
        Self::with_orchestrator(config, orchestrator, engine)
    }

    /// Build around a caller-supplied orchestrator (fake backends in tests).
    pub fn with_orchestrator(
        config: TimingGuardConfig,
        orchestrator: ReasoningOrchestrator,
        engine: Arc<HeuristicEngine>,
    ) -> Self {
        Self {
            transformer: PromptTransformer::new(config.thresholds.clone()),
            guardrail: Guardrail::new(engine, config.thresholds.clone()),
            orchestrator,
            config,
        }
    }

    pub fn config(&self) -> &TimingGuardConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &ReasoningOrchestrator {
        &self.orchestrator
    }

    /// Analyse one path end to end.
    pub async fn analyze_violation(
        &self,
        violation: &TimingViolation,
        options: &AnalysisOptions,
    ) -> AnalysisResult {
        let prompt = self.transformer.transform(violation);
        let raw = if options.offline_mode {
            self.orchestrator.heuristic(&prompt)
        } else {
            self.orchestrator
                .analyze(&prompt, options.design_source.as_deref())
                .await
        };
        self.guardrail.finalize(raw, &prompt)
    }

    /// Parse `text` and analyse every violating path.
    ///
    /// Only a parse failure is returned as an error.
    pub async fn analyze_report(
        &self,
        text: &str,
        options: &AnalysisOptions,
    ) -> Result<ReportAnalysis, TimingGuardError> {
        let report = TimingReportParser::parse(text)?;
        let metrics = report.metrics();
        let constraint_gaps = report.constraint_gaps();
        let signal_groups = group_violations(&report.paths);

        let concurrency = options
            .max_concurrency
            .unwrap_or(self.config.max_concurrency)
            .max(1);
        tracing::info!(
            "{} report: {} paths, {} violating (WNS {:.3} ns, TNS {:.3} ns)",
            report.layout.as_str(),
            report.paths.len(),
            metrics.violation_count,
            metrics.worst_negative_slack_ns,
            metrics.total_negative_slack_ns
        );

        // buffered() keeps report order while running up to `concurrency` at once
        let results: Vec<AnalysisResult> = stream::iter(report.violations())
            .map(|v| self.analyze_violation(v, options))
            .buffered(concurrency)
            .collect()
            .await;

        let stats = self.stats(&report.paths, &results);
        Ok(ReportAnalysis {
            run_id: Uuid::new_v4(),
            layout: report.layout,
            summary: report.summary,
            metrics,
            paths: report.paths,
            results,
            signal_groups,
            constraint_gaps,
            stats,
        })
    }

    /// Read a report file and analyse it.
    pub async fn analyze_file(
        &self,
        path: &Path,
        options: &AnalysisOptions,
    ) -> Result<ReportAnalysis, TimingGuardError> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        self.analyze_report(&text, options).await
    }

    fn stats(&self, paths: &[TimingViolation], results: &[AnalysisResult]) -> AnalysisStats {
        let mut stats = AnalysisStats::default();
        for p in paths.iter().filter(|p| p.is_violating()) {
            match Severity::from_slack(p.slack_ns, &self.config.thresholds) {
                Severity::Critical => stats.critical += 1,
                Severity::Moderate => stats.moderate += 1,
                Severity::Minor => stats.minor += 1,
            }
        }
        for r in results {
            if r.provenance.stage.is_ai_confirmed() {
                stats.ai_confirmed += 1;
            } else {
                stats.heuristic_only += 1;
            }
            stats.guardrail_fixes += r
                .fixes
                .iter()
                .filter(|f| f.origin == FixOrigin::Guardrail)
                .count();
        }
        stats
    }
}

impl Default for TimingGuardCore {
    fn default() -> Self {
        Self::new(TimingGuardConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::result::Stage;

    const REPORT: &str = r#"
------ Path 1 ------
Startpoint: core/a_reg (rising edge-triggered flip-flop clocked by clk)
Endpoint: core/b_reg (rising edge-triggered flip-flop clocked by clk)
Slack (VIOLATED) : -2.50
Levels of Logic: 12
Routing Delay: 3.10 ns (65%)
------ Path 2 ------
Startpoint: x_reg
Endpoint: y_reg
Slack (MET) : 0.40
------ Path 3 ------
Startpoint: io/rx_reg
Endpoint: io/q_reg
Slack (VIOLATED) : -0.20
"#;

    #[tokio::test]
    async fn test_offline_report() {
        let core = TimingGuardCore::default();
        let options = AnalysisOptions {
            offline_mode: true,
            ..Default::default()
        };
        let analysis = core.analyze_report(REPORT, &options).await.unwrap();
        assert_eq!(analysis.paths.len(), 3);
        assert_eq!(analysis.metrics.violation_count, 2);
        assert_eq!(analysis.results.len(), 2);
        assert_eq!(analysis.results[0].path_id, "P1");
        assert_eq!(analysis.results[1].path_id, "P3");
        assert!(analysis.results.iter().all(|r| r.provenance.stage == Stage::Heuristic));
        assert!(analysis.results.iter().all(|r| !r.fixes.is_empty()));
        assert_eq!(analysis.stats.critical, 1);
        assert_eq!(analysis.stats.minor, 1);

        // distinct scalar endpoints stay separate, worst first
        let signals: Vec<_> = analysis.signal_groups.iter().map(|g| g.signal.as_str()).collect();
        assert_eq!(signals, vec!["core/b_reg", "io/q_reg"]);
    }

    #[tokio::test]
    async fn test_parse_error_escapes() {
        let core = TimingGuardCore::default();
        let err = core
            .analyze_report("nothing to see", &AnalysisOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TimingGuardError::Parse(ReportParseError::NoPathBlocks)));
    }
}
