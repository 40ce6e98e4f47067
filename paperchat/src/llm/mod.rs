mod api;
mod generation;
pub mod prompts;
mod provider;

pub use api::LlmApiClient;
pub use generation::GenerationService;
pub use provider::{CompletionOptions, LlmBackend, LlmProvider};
