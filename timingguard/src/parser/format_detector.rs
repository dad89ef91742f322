//! Report Layout Detection
//!
//! Detects which vendor layout a timing report follows and routes parsing to
//! the matching parser.

use crate::parser::path_listing::PathListingParser;
use crate::parser::schema::ReportLayout;
use crate::parser::vivado::VivadoParser;

/// Detect the report layout from its content.
///
/// The path listing is checked first: its blocks also carry `Slack :` lines,
/// so a Vivado match alone does not rule it out.
pub fn detect_layout(content: &str) -> Option<ReportLayout> {
    if PathListingParser::has_paths(content) {
        return Some(ReportLayout::PathListing);
    }
    if VivadoParser::has_paths(content) {
        return Some(ReportLayout::Vivado);
    }
    None
}
