#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use paperchat::config::{ChatConfig, DatabaseConfig, RetrievalConfig};
use paperchat::db::{
    Database, DatabaseBackend, LibSqlBackend, MessageStore, PaperStore, SessionStore,
};
use paperchat::error::{PaperChatError, Result};
use paperchat::llm::GenerationService;
use paperchat::models::{
    Author, ChatMessage, ChatSession, Equation, Figure, MessageRole, Paper, PaperExtraction,
    Reference, Section, Table,
};
use paperchat::services::{ChatService, PaperService, RequirementsAnalyzer};

pub const PAPER_ID: &str = "sparse-attention";

fn section(title: &str, section_type: &str, pages: (u32, u32), paragraphs: &[&str]) -> Section {
    Section {
        title: title.to_string(),
        section_type: section_type.to_string(),
        page_start: Some(pages.0),
        page_end: Some(pages.1),
        paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
    }
}

/// A small but complete extraction: every section kind, two figures, two
/// tables, an equation and a bibliography.
pub fn sample_extraction() -> PaperExtraction {
    PaperExtraction {
        title: "Sparse Attention at Scale".to_string(),
        abstract_text: "We present a sparse attention mechanism that keeps accuracy while \
                        cutting memory use in half."
            .to_string(),
        sections: vec![
            section(
                "Introduction",
                "introduction",
                (1, 2),
                &["Dense attention is quadratic in sequence length."],
            ),
            section(
                "Method",
                "methodology",
                (3, 4),
                &["We prune attention heads using a learned gate.", "The gate is trained jointly."],
            ),
            section(
                "Experiments",
                "experiments",
                (5, 6),
                &["We train on WikiText-103 for 100k steps."],
            ),
            section(
                "Results",
                "results",
                (7, 7),
                &["Our model beats the dense baseline by 1.3 perplexity points."],
            ),
            section(
                "Conclusion",
                "conclusion",
                (8, 8),
                &["Sparse attention scales to long documents."],
            ),
        ],
        figures: vec![
            Figure {
                label: "Figure 1".to_string(),
                caption: "Model overview".to_string(),
                page: Some(3),
                ocr_text: None,
            },
            Figure {
                label: "Figure 3".to_string(),
                caption: "Attention maps before and after pruning".to_string(),
                page: Some(6),
                ocr_text: Some("layer 4 head 2".to_string()),
            },
        ],
        tables: vec![
            Table {
                label: "Table 1".to_string(),
                caption: "Dataset statistics".to_string(),
                headers: vec!["Dataset".to_string(), "Tokens".to_string()],
                rows: vec![vec!["WikiText-103".to_string(), "103M".to_string()]],
                page: Some(5),
            },
            Table {
                label: "Table 2".to_string(),
                caption: "Perplexity against baselines".to_string(),
                headers: vec!["Model".to_string(), "PPL".to_string()],
                rows: vec![
                    vec!["Dense baseline".to_string(), "19.2".to_string()],
                    vec!["Ours".to_string(), "17.9".to_string()],
                ],
                page: Some(7),
            },
        ],
        equations: vec![Equation {
            label: "Equation 1".to_string(),
            latex: "g = \\sigma(W h)".to_string(),
            page: Some(3),
        }],
        references: vec![Reference {
            title: "Attention Is All You Need".to_string(),
            authors: vec!["Vaswani".to_string()],
            venue: Some("NeurIPS".to_string()),
            year: Some(2017),
            url: None,
            doi: None,
        }],
        authors: vec![
            Author {
                name: "Ada Lovelace".to_string(),
                affiliation: Some("Analytical Engines Ltd".to_string()),
                email: None,
            },
            Author {
                name: "Charles Babbage".to_string(),
                affiliation: None,
                email: None,
            },
        ],
    }
}

pub async fn memory_backend() -> Arc<dyn DatabaseBackend> {
    let config = DatabaseConfig {
        url: ":memory:".to_string(),
        auth_token: None,
        local_path: None,
    };
    let db = Database::new(&config)
        .await
        .expect("Failed to open in-memory database");
    Arc::new(LibSqlBackend::new(db))
}

pub async fn file_backend(dir: &Path) -> Arc<dyn DatabaseBackend> {
    let path = dir.join("paperchat.db");
    let config = DatabaseConfig {
        url: format!("file:{}", path.display()),
        auth_token: None,
        local_path: None,
    };
    let db = Database::new(&config)
        .await
        .expect("Failed to open file database");
    Arc::new(LibSqlBackend::new(db))
}

pub async fn register_sample(db: &Arc<dyn DatabaseBackend>) -> Paper {
    PaperService::new(db.clone())
        .register_extraction(PAPER_ID, None, sample_extraction())
        .await
        .expect("Failed to register sample paper")
}

pub fn chat_service(
    db: Arc<dyn DatabaseBackend>,
    generator: Arc<dyn GenerationService>,
    chat: ChatConfig,
) -> ChatService {
    ChatService::new(
        db,
        generator,
        RequirementsAnalyzer::disabled(),
        &chat,
        &RetrievalConfig::default(),
    )
}

/// Replies with fixed text and records every prompt it receives.
pub struct ScriptedGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log poisoned").clone()
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn generate(&self, prompt: &str, _temperature: f32, _max_tokens: u32) -> Result<String> {
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// Always fails, counting attempts.
#[derive(Default)]
pub struct FailingGenerator {
    pub calls: AtomicUsize,
}

#[async_trait]
impl GenerationService for FailingGenerator {
    async fn generate(&self, _prompt: &str, _temperature: f32, _max_tokens: u32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PaperChatError::Generation("upstream returned 500".to_string()))
    }
}

/// Sleeps longer than any test timeout before answering.
pub struct SlowGenerator {
    pub delay: Duration,
}

#[async_trait]
impl GenerationService for SlowGenerator {
    async fn generate(&self, _prompt: &str, _temperature: f32, _max_tokens: u32) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok("Too late.".to_string())
    }
}

/// Reports itself unavailable. Calling it is a test failure.
pub struct OfflineGenerator;

#[async_trait]
impl GenerationService for OfflineGenerator {
    async fn generate(&self, _prompt: &str, _temperature: f32, _max_tokens: u32) -> Result<String> {
        panic!("offline generator must not be called");
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Wraps a real backend and fails selected writes on demand.
pub struct FlakyStore {
    inner: Arc<dyn DatabaseBackend>,
    pub fail_user_messages: AtomicBool,
    pub fail_assistant_messages: AtomicBool,
    pub fail_session_creation: AtomicBool,
    pub fail_history: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn DatabaseBackend>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_user_messages: AtomicBool::new(false),
            fail_assistant_messages: AtomicBool::new(false),
            fail_session_creation: AtomicBool::new(false),
            fail_history: AtomicBool::new(false),
        })
    }

    fn injected(what: &str) -> PaperChatError {
        PaperChatError::Internal(format!("injected {what} failure"))
    }
}

#[async_trait]
impl PaperStore for FlakyStore {
    async fn upsert_paper(&self, paper: &Paper) -> Result<()> {
        self.inner.upsert_paper(paper).await
    }

    async fn get_paper(&self, id: &str) -> Result<Option<Paper>> {
        self.inner.get_paper(id).await
    }
}

#[async_trait]
impl SessionStore for FlakyStore {
    async fn create_session(&self, session: &ChatSession) -> Result<()> {
        if self.fail_session_creation.load(Ordering::SeqCst) {
            return Err(Self::injected("session"));
        }
        self.inner.create_session(session).await
    }

    async fn get_session(&self, id: &str) -> Result<Option<ChatSession>> {
        self.inner.get_session(id).await
    }

    async fn list_sessions(&self, paper_id: &str) -> Result<Vec<ChatSession>> {
        self.inner.list_sessions(paper_id).await
    }

    async fn record_message(&self, session_id: &str, at: DateTime<Utc>) -> Result<()> {
        self.inner.record_message(session_id, at).await
    }

    async fn deactivate_session(&self, id: &str) -> Result<bool> {
        self.inner.deactivate_session(id).await
    }
}

#[async_trait]
impl MessageStore for FlakyStore {
    async fn create_message(&self, message: &ChatMessage) -> Result<()> {
        let fail = match message.role {
            MessageRole::User => self.fail_user_messages.load(Ordering::SeqCst),
            MessageRole::Assistant => self.fail_assistant_messages.load(Ordering::SeqCst),
        };
        if fail {
            return Err(Self::injected("message"));
        }
        self.inner.create_message(message).await
    }

    async fn list_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        self.inner.list_messages(session_id).await
    }

    async fn recent_messages(&self, session_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(Self::injected("history"));
        }
        self.inner.recent_messages(session_id, limit).await
    }
}

#[async_trait]
impl DatabaseBackend for FlakyStore {
    async fn sync(&self) -> Result<()> {
        self.inner.sync().await
    }
}
