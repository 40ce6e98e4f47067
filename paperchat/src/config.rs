use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: Option<LlmConfig>,
    pub chat: ChatConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    pub local_path: Option<String>,
}

/// LLM configuration for the Generation Service
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    // Ask the LLM which content categories a query needs (opt-in)
    pub enable_requirements_analysis: bool,
    pub requirements_cache_size: usize,
    pub requirements_timeout_secs: u64,
}

/// Chat turn orchestration settings
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Upper bound on a single Generation Service call.
    pub generation_timeout_secs: u64,
    /// Number of prior user/assistant pairs rendered into the prompt.
    pub history_turns: usize,
    /// When false, an explicit but unknown session id fails the turn instead
    /// of starting a new session.
    pub create_missing_sessions: bool,
    pub default_session_title: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            generation_timeout_secs: 90,
            history_turns: 3,
            create_missing_sessions: true,
            default_session_title: "Paper discussion".to_string(),
        }
    }
}

/// Thresholds and budgets for content retrieval.
///
/// None of these values has a derivation behind it; they are kept
/// configurable rather than baked into the engine.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Weight a section category must exceed before its sections are emitted.
    pub section_threshold: f32,
    /// Weight figures, tables, equations and references must exceed.
    pub artifact_threshold: f32,
    pub max_references: usize,
    /// Hard ceiling on the ranked bundle size.
    pub max_chunks_cap: usize,
    pub abstract_preview_chars: usize,
    pub max_table_rows: usize,
    pub max_chunk_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            section_threshold: 0.5,
            artifact_threshold: 0.3,
            max_references: 10,
            max_chunks_cap: 15,
            abstract_preview_chars: 500,
            max_table_rows: 25,
            max_chunk_chars: 4000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let chat_defaults = ChatConfig::default();
        let retrieval_defaults = RetrievalConfig::default();

        Self {
            server: ServerConfig {
                host: env::var("PAPERCHAT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("PAPERCHAT_PORT", 3000),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "file:paperchat.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
            },
            llm: env::var("LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                api_key: env::var("LLM_API_KEY").ok(),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 60),
                max_retries: parse_env_or("LLM_MAX_RETRIES", 2),
                enable_requirements_analysis: parse_env_or("ENABLE_REQUIREMENTS_ANALYSIS", false),
                requirements_cache_size: parse_env_or("REQUIREMENTS_CACHE_SIZE", 1000),
                requirements_timeout_secs: parse_env_or("REQUIREMENTS_TIMEOUT_SECS", 3),
            }),
            chat: ChatConfig {
                generation_timeout_secs: parse_env_or(
                    "GENERATION_TIMEOUT_SECS",
                    chat_defaults.generation_timeout_secs,
                ),
                history_turns: parse_env_or("CHAT_HISTORY_TURNS", chat_defaults.history_turns),
                create_missing_sessions: parse_env_or(
                    "CHAT_CREATE_MISSING_SESSIONS",
                    chat_defaults.create_missing_sessions,
                ),
                default_session_title: env::var("CHAT_DEFAULT_SESSION_TITLE")
                    .unwrap_or(chat_defaults.default_session_title),
            },
            retrieval: RetrievalConfig {
                section_threshold: parse_env_or(
                    "RETRIEVAL_SECTION_THRESHOLD",
                    retrieval_defaults.section_threshold,
                ),
                artifact_threshold: parse_env_or(
                    "RETRIEVAL_ARTIFACT_THRESHOLD",
                    retrieval_defaults.artifact_threshold,
                ),
                max_references: parse_env_or(
                    "RETRIEVAL_MAX_REFERENCES",
                    retrieval_defaults.max_references,
                ),
                max_chunks_cap: parse_env_or(
                    "RETRIEVAL_MAX_CHUNKS_CAP",
                    retrieval_defaults.max_chunks_cap,
                ),
                abstract_preview_chars: parse_env_or(
                    "RETRIEVAL_ABSTRACT_PREVIEW_CHARS",
                    retrieval_defaults.abstract_preview_chars,
                ),
                max_table_rows: parse_env_or(
                    "RETRIEVAL_MAX_TABLE_ROWS",
                    retrieval_defaults.max_table_rows,
                ),
                max_chunk_chars: parse_env_or(
                    "RETRIEVAL_MAX_CHUNK_CHARS",
                    retrieval_defaults.max_chunk_chars,
                ),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}
