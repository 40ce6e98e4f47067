use std::time::Duration;

use crate::llm::{CompletionOptions, LlmProvider};
use crate::retrieval::{ContentRequirements, RequirementsCache};

const DEFAULT_TIMEOUT_SECS: u64 = 3;
const MIN_QUERY_CHARS: usize = 3;
const MAX_QUERY_CHARS: usize = 1000;

/// Asks the language model which parts of a paper a question needs.
///
/// Every failure path (disabled, unavailable, timeout, malformed JSON) ends in
/// `None`, and callers fall back to the static priority table.
#[derive(Clone)]
pub struct RequirementsAnalyzer {
    llm: LlmProvider,
    cache: Option<RequirementsCache>,
    timeout: Duration,
}

impl RequirementsAnalyzer {
    pub fn new(llm: LlmProvider) -> Self {
        let (cache, timeout) = match llm.config() {
            Some(config) if config.enable_requirements_analysis => (
                Some(RequirementsCache::new(config.requirements_cache_size)),
                Duration::from_secs(config.requirements_timeout_secs),
            ),
            _ => (None, Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        };

        Self {
            llm,
            cache,
            timeout,
        }
    }

    /// An analyzer that never calls the model.
    pub fn disabled() -> Self {
        Self::new(LlmProvider::unavailable("Requirements analysis disabled"))
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some() && self.llm.is_available()
    }

    pub async fn analyze(&self, query: &str) -> Option<ContentRequirements> {
        let cache = self.cache.as_ref()?;
        if !self.llm.is_available() {
            return None;
        }

        let query_len = query.trim().chars().count();
        if !(MIN_QUERY_CHARS..=MAX_QUERY_CHARS).contains(&query_len) {
            return None;
        }

        let cache_key = cache.generate_key(query);
        if let Some(cached) = cache.get(&cache_key) {
            tracing::debug!("Content requirements cache hit");
            return Some(cached);
        }

        let prompt = crate::llm::prompts::content_requirements_prompt(query);
        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(300),
        };
        let llm_call = self
            .llm
            .complete_structured::<ContentRequirements>(&prompt, Some(&options));

        match tokio::time::timeout(self.timeout, llm_call).await {
            Ok(Ok(requirements)) => {
                tracing::debug!(
                    categories = requirements.weights.len(),
                    include_references = requirements.include_references,
                    include_authors = requirements.include_authors,
                    "Content requirements analyzed"
                );
                cache.put(cache_key, requirements.clone());
                Some(requirements)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Content requirements analysis failed, using static weights");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Content requirements analysis timed out, using static weights"
                );
                None
            }
        }
    }
}
