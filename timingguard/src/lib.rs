//! TimingGuard - timing report analysis and remediation library
//!
//! This library parses vendor timing reports, derives signals for every
//! failing path, and produces confidence-scored remediation suggestions by
//! combining a deterministic rule engine with optional remote reasoning
//! backends.
//!
//! # Quick Start
//!
//! ```no_run
//! use timingguard::{AnalysisOptions, TimingGuardConfig, TimingGuardCore};
//!
//! # async fn run() -> Result<(), timingguard::TimingGuardError> {
//! let core = TimingGuardCore::new(TimingGuardConfig::from_env());
//! let text = std::fs::read_to_string("timing_summary.rpt")?;
//! let analysis = core.analyze_report(&text, &AnalysisOptions::default()).await?;
//!
//! for result in &analysis.results {
//!     println!("{} ({:.2}): {:?}", result.path_id, result.confidence, result.fix_kinds());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Report parsing**: Vivado timing summaries and plain path listings
//! - **Heuristics**: deep logic, routing, fanout, CDC, arithmetic and skew rules
//! - **Reasoning backends**: OpenAI-compatible and Cohere chat APIs with
//!   schema repair and failover
//! - **Guardrail**: required fixes are never silently dropped

pub mod ai;
pub mod analyzer;
pub mod config;
pub mod core;
pub mod parser;

// Re-export main types
pub use ai::{BackendError, ReasoningBackend, ReasoningOrchestrator, SchemaValidationError};
pub use analyzer::grouping::SignalGroup;
pub use analyzer::guardrail::Guardrail;
pub use analyzer::prompt::{Hint, PromptTransformer, ViolationPrompt};
pub use analyzer::result::{AnalysisResult, FixKind, IssueClass, Provenance, Stage, SuggestedFix};
pub use analyzer::rules::{HeuristicEngine, Rule, Severity};
pub use config::{BackendConfig, HeuristicThresholds, TimingGuardConfig};
pub use core::{AnalysisOptions, AnalysisStats, ReportAnalysis, TimingGuardCore, TimingGuardError};
pub use parser::schema::{ReportMetrics, TimingReport, TimingViolation};
pub use parser::timing::{ReportParseError, TimingReportParser};

/// Parse a report file (convenience wrapper).
pub fn parse_report(path: &std::path::Path) -> Result<TimingReport, TimingGuardError> {
    let bytes = std::fs::read(path)?;
    Ok(TimingReportParser::parse_bytes(&bytes)?)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AnalysisOptions, AnalysisResult, FixKind, ReportAnalysis, Stage, TimingGuardConfig,
        TimingGuardCore, TimingGuardError, TimingViolation,
    };
}
