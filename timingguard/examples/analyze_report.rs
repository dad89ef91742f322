//! Analyse a timing report and print the suggested fixes.
//! Run with: cargo run --example analyze_report [path/to/timing_summary.rpt] [--offline]

use std::path::Path;
use timingguard::prelude::*;

#[tokio::main]
async fn main() -> Result<(), TimingGuardError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let offline = args.iter().any(|a| a == "--offline");
    let path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| "tests/fixtures/vivado_violations.rpt".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example analyze_report [path/to/report.rpt] [--offline]");
        std::process::exit(1);
    }

    let config = TimingGuardConfig::from_env();
    let core = TimingGuardCore::new(config);
    let options = AnalysisOptions {
        offline_mode: offline || !core.orchestrator().has_backends(),
        ..Default::default()
    };

    let analysis = core.analyze_file(path, &options).await?;

    println!("Report: {} ({})", path.display(), analysis.layout.as_str());
    println!(
        "WNS {:.3} ns, TNS {:.3} ns, {} violating paths",
        analysis.metrics.worst_negative_slack_ns,
        analysis.metrics.total_negative_slack_ns,
        analysis.metrics.violation_count
    );
    println!();

    for result in &analysis.results {
        println!(
            "{} [{}] confidence {:.2}",
            result.path_id, result.provenance.stage, result.confidence
        );
        for fix in &result.fixes {
            println!("  - {} ({}): {}", fix.kind.title(), fix.scope, fix.detail);
        }
    }

    if analysis.has_violations() {
        println!("\nTiming not met.");
        std::process::exit(2);
    }

    println!("All paths meet timing.");
    Ok(())
}
