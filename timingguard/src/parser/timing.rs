use thiserror::Error;

use crate::parser::format_detector::detect_layout;
use crate::parser::path_listing::PathListingParser;
use crate::parser::schema::{ReportLayout, TimingReport};
use crate::parser::vivado::VivadoParser;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReportParseError {
    #[error("Report is empty")]
    Empty,
    #[error("No recognizable timing path blocks in report")]
    NoPathBlocks,
    #[error("Path block '{block}' has no readable slack")]
    UnreadableSlack { block: String },
}

/// Entry point for turning raw report text into a [`TimingReport`].
pub struct TimingReportParser;

impl TimingReportParser {
    /// Parse report text. Paths keep the report's native order.
    ///
    /// Fails when the text holds no recognizable path block or a block's
    /// slack cannot be read; no partial path list is returned in either case.
    pub fn parse(content: &str) -> Result<TimingReport, ReportParseError> {
        if content.trim().is_empty() {
            return Err(ReportParseError::Empty);
        }

        let layout = detect_layout(content).ok_or(ReportParseError::NoPathBlocks)?;
        let (summary, paths) = match layout {
            ReportLayout::Vivado => (
                VivadoParser::parse_summary(content),
                VivadoParser::parse_paths(content)?,
            ),
            ReportLayout::PathListing => (
                PathListingParser::parse_summary(content),
                PathListingParser::parse_paths(content)?,
            ),
        };

        if paths.is_empty() {
            return Err(ReportParseError::NoPathBlocks);
        }

        tracing::debug!(
            "Parsed {} report: {} paths, WNS row {:?}",
            layout.as_str(),
            paths.len(),
            summary.wns_ns
        );

        Ok(TimingReport {
            layout,
            summary,
            paths,
        })
    }

    /// Parse raw bytes, replacing invalid UTF-8.
    pub fn parse_bytes(content: &[u8]) -> Result<TimingReport, ReportParseError> {
        Self::parse(&String::from_utf8_lossy(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(TimingReportParser::parse("   \n").unwrap_err(), ReportParseError::Empty);
    }

    #[test]
    fn test_no_markers() {
        let err = TimingReportParser::parse("Design Timing Summary\nnothing else").unwrap_err();
        assert_eq!(err, ReportParseError::NoPathBlocks);
    }

    #[test]
    fn test_listing_headers_without_slack() {
        let err = TimingReportParser::parse("---- Path 1 ----\nStartpoint: a\n").unwrap_err();
        assert!(matches!(err, ReportParseError::UnreadableSlack { .. }));
    }

    #[test]
    fn test_unconstrained_only_report() {
        let err = TimingReportParser::parse("Slack:    inf\n  Source: a_reg/C\n").unwrap_err();
        assert_eq!(err, ReportParseError::NoPathBlocks);
    }

    #[test]
    fn test_parse_bytes_lossy() {
        let mut bytes = b"Slack (VIOLATED) : -1.000ns\n  Source: a/C\n".to_vec();
        bytes.push(0xff);
        let report = TimingReportParser::parse_bytes(&bytes).unwrap();
        assert_eq!(report.paths.len(), 1);
    }
}
