pub(crate) mod fields;
pub mod format_detector;
pub mod path_listing;
pub mod schema;
pub mod timing;
pub mod vivado;

// Re-export for convenience
pub use format_detector::detect_layout;
pub use path_listing::PathListingParser;
pub use schema::*;
pub use timing::{ReportParseError, TimingReportParser};
pub use vivado::VivadoParser;
