pub mod cohere;
pub(crate) mod http;
pub mod openai_compat;
pub mod prompts;
pub mod provider;
pub mod router;
pub mod schema;

// Re-export for convenience
pub use cohere::CohereClient;
pub use openai_compat::OpenAiCompatClient;
pub use provider::{BackendError, BackendRequest, ModelInfo, ReasoningBackend};
pub use router::{OrchestratorState, ReasoningOrchestrator, Transition};
pub use schema::{extract_json_from_text, validate_response, SchemaValidationError};
