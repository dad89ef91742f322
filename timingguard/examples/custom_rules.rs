//! Example: registering an extra heuristic rule next to the defaults.
//! Run with: cargo run --example custom_rules [path/to/report.rpt]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use timingguard::analyzer::rules::RuleFinding;
use timingguard::prelude::*;
use timingguard::{HeuristicEngine, ReasoningOrchestrator, Rule, SuggestedFix, ViolationPrompt};

/// Configuration registers written once after reset rarely need
/// single-cycle timing; flag them for a multicycle or false-path review.
struct QuasiStaticConfigRule;

impl Rule for QuasiStaticConfigRule {
    fn id(&self) -> &str {
        "quasi_static_config"
    }

    fn name(&self) -> &str {
        "Quasi-static Configuration"
    }

    fn description(&self) -> &str {
        "Path starts at a configuration register that changes only outside normal operation"
    }

    fn check(&self, prompt: &ViolationPrompt) -> Option<RuleFinding> {
        if !prompt.startpoint.contains("cfg_reg") && !prompt.startpoint.contains("mode_reg") {
            return None;
        }
        Some(RuleFinding {
            rule_id: self.id().to_string(),
            root_cause: format!("{} is a configuration register", prompt.startpoint),
            fix: SuggestedFix::new(
                FixKind::ConstraintReview,
                prompt.startpoint.clone(),
                "If the register only changes while the datapath is idle, cover the path with set_multicycle_path or set_false_path.",
            ),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), TimingGuardError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/vivado_unconstrained.rpt".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example custom_rules [path/to/report.rpt]");
        std::process::exit(1);
    }

    let mut engine = HeuristicEngine::with_default_rules();
    engine.add_rule(Arc::new(QuasiStaticConfigRule));
    let engine = Arc::new(engine);

    let orchestrator = ReasoningOrchestrator::new(engine.clone(), Duration::from_secs(30));
    let core = TimingGuardCore::with_orchestrator(TimingGuardConfig::default(), orchestrator, engine);
    let options = AnalysisOptions {
        offline_mode: true,
        ..Default::default()
    };

    let analysis = core.analyze_file(path, &options).await?;
    for result in &analysis.results {
        println!("{}:", result.path_id);
        for cause in &result.root_causes {
            println!("  cause: {}", cause);
        }
        for fix in &result.fixes {
            println!("  fix:   {} in {}", fix.kind.title(), fix.scope);
        }
    }
    Ok(())
}
