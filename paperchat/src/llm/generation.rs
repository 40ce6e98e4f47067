use async_trait::async_trait;

use crate::error::Result;
use crate::llm::provider::{CompletionOptions, LlmProvider};

/// Hosted text generation used to answer chat turns.
///
/// Implementations return the generated text or an error; they never
/// substitute a canned answer themselves.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String>;

    fn is_available(&self) -> bool {
        true
    }
}

#[async_trait]
impl GenerationService for LlmProvider {
    async fn generate(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String> {
        let options = CompletionOptions {
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
        };
        self.complete(prompt, Some(&options)).await
    }

    fn is_available(&self) -> bool {
        LlmProvider::is_available(self)
    }
}
