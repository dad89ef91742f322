pub mod grouping;
pub mod guardrail;
pub mod prompt;
pub mod result;
pub mod rules;

// Re-export for convenience
pub use grouping::*;
pub use guardrail::*;
pub use prompt::*;
pub use result::*;
pub use rules::*;
