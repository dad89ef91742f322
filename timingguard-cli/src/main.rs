//! TimingGuard CLI - timing report analysis from the command line.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use timingguard::{
    AnalysisOptions, HeuristicEngine, ReportAnalysis, Stage, TimingGuardConfig, TimingGuardCore,
    TimingReport, TimingReportParser,
};
use tracing::Level;

const EXIT_VIOLATIONS: i32 = 2;

#[derive(Parser)]
#[command(name = "timingguard")]
#[command(about = "Timing report analysis and violation remediation tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse every violating path in a timing report
    Analyze {
        /// Path to the timing report (.rpt / .txt)
        #[arg(value_name = "REPORT")]
        report: PathBuf,

        /// HDL source passed to reasoning backends as context
        #[arg(long, value_name = "FILE")]
        design: Option<PathBuf>,

        /// TOML configuration (defaults to backends found in the environment)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Heuristic analysis only; never contact a backend
        #[arg(long)]
        offline: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with code 2 when the report has violations
        #[arg(long)]
        fail_on_violations: bool,

        /// Paths analysed at once
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
    },

    /// Parse a report and print paths and metrics without analysis
    Parse {
        #[arg(value_name = "REPORT")]
        report: PathBuf,

        #[arg(short, long, value_enum, default_value = "human")]
        format: ParseFormat,
    },

    /// List heuristic rules
    Rules {
        /// Show rule descriptions
        #[arg(long)]
        detailed: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
    /// GitHub Actions annotations
    Github,
}

#[derive(Clone, ValueEnum)]
enum ParseFormat {
    Human,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Analyze {
            report,
            design,
            config,
            offline,
            format,
            fail_on_violations,
            concurrency,
        } => {
            handle_analyze(
                &report,
                design.as_deref(),
                config.as_deref(),
                offline,
                format,
                fail_on_violations,
                concurrency,
            )
            .await
        }
        Commands::Parse { report, format } => handle_parse(&report, format),
        Commands::Rules { detailed } => {
            handle_rules(detailed);
            Ok(0)
        }
    };

    let exit_code = match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn handle_analyze(
    report: &Path,
    design: Option<&Path>,
    config: Option<&Path>,
    offline: bool,
    format: OutputFormat,
    fail_on_violations: bool,
    concurrency: Option<usize>,
) -> Result<i32> {
    let config = match config {
        Some(path) => TimingGuardConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TimingGuardConfig::from_env(),
    };
    let design_source = match design {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("reading design source {}", path.display()))?,
        ),
        None => None,
    };

    let core = TimingGuardCore::new(config);
    if !offline && !core.orchestrator().has_backends() {
        tracing::warn!("No reasoning backend configured; results will be heuristic only");
    }

    let options = AnalysisOptions {
        offline_mode: offline,
        design_source,
        max_concurrency: concurrency,
    };
    let analysis = core
        .analyze_file(report, &options)
        .await
        .with_context(|| format!("analysing {}", report.display()))?;

    match format {
        OutputFormat::Human => output_human(report, &analysis),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Github => output_github(report, &analysis),
    }

    if fail_on_violations && analysis.has_violations() {
        return Ok(EXIT_VIOLATIONS);
    }
    Ok(0)
}

fn handle_parse(report: &Path, format: ParseFormat) -> Result<i32> {
    let parsed = timingguard::parse_report(report)
        .with_context(|| format!("parsing {}", report.display()))?;

    match format {
        ParseFormat::Human => output_parsed(report, &parsed),
        ParseFormat::Json => {
            let output = serde_json::json!({
                "layout": parsed.layout,
                "metrics": parsed.metrics(),
                "summary": parsed.summary,
                "paths": parsed.paths,
                "constraint_gaps": parsed.constraint_gaps(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(0)
}

fn output_parsed(report: &Path, parsed: &TimingReport) {
    let metrics = parsed.metrics();
    println!("\nReport: {} ({})", report.display(), parsed.layout.as_str());
    println!("{}", "─".repeat(60));
    println!("  WNS:        {:.3} ns", metrics.worst_negative_slack_ns);
    println!("  TNS:        {:.3} ns", metrics.total_negative_slack_ns);
    println!("  Violations: {}", metrics.violation_count);
    println!("  Paths:      {}", parsed.paths.len());
    if let (Some(wns), Some(tns)) = (parsed.summary.wns_ns, parsed.summary.tns_ns) {
        println!("  Reported:   WNS {:.3} ns, TNS {:.3} ns (all endpoints)", wns, tns);
    }

    for clock in &parsed.summary.clocks {
        println!("  Clock {}: {:.3} ns ({:.1} MHz)", clock.name, clock.period_ns, clock.frequency_mhz);
    }

    println!();
    for path in &parsed.paths {
        println!(
            "  {:<4} {:>8.3} ns  {} -> {}  [{}, {}]",
            path.path_id, path.slack_ns, path.startpoint, path.endpoint, path.clock, path.path_kind
        );
    }
    for gap in parsed.constraint_gaps() {
        println!("  ! {}", gap);
    }
}

fn output_human(report: &Path, analysis: &ReportAnalysis) {
    println!("\nReport: {} ({})", report.display(), analysis.layout.as_str());
    println!("{}", "─".repeat(60));

    if analysis.results.is_empty() {
        println!("  No timing violations ({} paths met)", analysis.paths.len());
    }

    for result in &analysis.results {
        let Some(path) = analysis.path(&result.path_id) else {
            continue;
        };
        let source = match (&result.provenance.stage, &result.provenance.backend) {
            (Stage::Heuristic, _) | (_, None) => result.provenance.stage.to_string(),
            (stage, Some(backend)) => format!("{} via {}", stage, backend),
        };

        println!(
            "\n  {} slack {:.3} ns  {} -> {}  ({})",
            path.path_id, path.slack_ns, path.startpoint, path.endpoint, path.path_kind
        );
        println!(
            "    Class: {:?}   Confidence: {:.2}   Source: {}",
            result.issue_class, result.confidence, source
        );
        if !result.root_causes.is_empty() {
            println!("    Root causes:");
            for cause in &result.root_causes {
                println!("      - {}", cause);
            }
        }
        println!("    Fixes:");
        for fix in &result.fixes {
            let added = if fix.is_heuristic_added() { " [added]" } else { "" };
            println!("      - {} in {}{}", fix.kind.title(), fix.scope, added);
            println!("        {}", fix.detail);
        }
        if !result.risks.is_empty() {
            println!("    Risks:");
            for risk in &result.risks {
                println!("      - {}", risk);
            }
        }
        if !result.verification.is_empty() {
            println!("    Verify:");
            for step in &result.verification {
                println!("      - {}", step);
            }
        }
    }

    // only worth a section when some signal has more than one violating path
    if analysis.signal_groups.iter().any(|g| g.path_ids.len() > 1) {
        println!("\n  Signal groups:");
        for group in &analysis.signal_groups {
            println!(
                "    - {} ({}): {} path(s), worst {} at {:.3} ns",
                group.display_name(),
                group.path_kind,
                group.path_ids.len(),
                group.worst_path_id,
                group.worst_slack_ns
            );
        }
    }

    if !analysis.constraint_gaps.is_empty() {
        println!("\n  Constraint gaps:");
        for gap in &analysis.constraint_gaps {
            println!("    - {}", gap);
        }
    }

    let metrics = &analysis.metrics;
    let stats = &analysis.stats;
    println!("\n  Summary:");
    println!("    WNS:          {:.3} ns", metrics.worst_negative_slack_ns);
    println!("    TNS:          {:.3} ns", metrics.total_negative_slack_ns);
    println!("    Violations:   {}", metrics.violation_count);
    println!("    Critical:     {}", stats.critical);
    println!("    Moderate:     {}", stats.moderate);
    println!("    Minor:        {}", stats.minor);
    println!("    AI-confirmed: {}", stats.ai_confirmed);
    println!("    Heuristic:    {}", stats.heuristic_only);
}

fn output_github(report: &Path, analysis: &ReportAnalysis) {
    for result in &analysis.results {
        let Some(path) = analysis.path(&result.path_id) else {
            continue;
        };
        let fixes = result
            .fixes
            .iter()
            .map(|f| f.kind.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "::error file={}::{} slack {:.3} ns ({} -> {}): {}",
            report.display(),
            path.path_id,
            path.slack_ns,
            path.startpoint,
            path.endpoint,
            fixes
        );
    }
    for gap in &analysis.constraint_gaps {
        println!("::warning file={}::{}", report.display(), gap);
    }
}

fn handle_rules(detailed: bool) {
    println!("Available heuristic rules:\n");

    let engine = HeuristicEngine::with_default_rules();
    for rule in engine.rules() {
        println!("  {}", rule.id());
        println!("    {}", rule.name());
        if detailed {
            println!("    {}", rule.description());
        }
        println!();
    }
}
