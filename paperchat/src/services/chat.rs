use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::{ChatConfig, RetrievalConfig};
use crate::db::DatabaseBackend;
use crate::error::{PaperChatError, Result};
use crate::llm::prompts::{fallback_answer, TURN_FAILED_MESSAGE};
use crate::llm::GenerationService;
use crate::models::{
    ChatMessage, ChatSession, ChatTurnRequest, ChatTurnResponse, ContextMetadata, Paper,
    PaperExtraction, QueryAnalysis, RankedContextBundle,
};
use crate::retrieval::{
    asks_about_title, priority_source, PreparedContext, RetrievalPipeline, Selection,
};
use crate::services::RequirementsAnalyzer;

/// Steps of one chat turn. `Failed` is reachable from every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Validating,
    SessionReady,
    ContentRetrieved,
    PromptBuilt,
    Generating,
    Persisted,
    Failed,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::SessionReady => "session_ready",
            Self::ContentRetrieved => "content_retrieved",
            Self::PromptBuilt => "prompt_built",
            Self::Generating => "generating",
            Self::Persisted => "persisted",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Classification, ranked content and the assembled prompt for a question,
/// computed without generating or persisting anything.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContextPreview {
    pub analysis: QueryAnalysis,
    pub bundle: RankedContextBundle,
    pub context_metadata: ContextMetadata,
    pub prompt: String,
    pub requirements_applied: bool,
}

/// A turn that stopped before an answer could be produced.
struct TurnFailure {
    session_id: Option<String>,
    state: TurnState,
    error: PaperChatError,
}

impl TurnFailure {
    fn at(state: TurnState, session_id: Option<&str>) -> impl FnOnce(PaperChatError) -> Self + '_ {
        move |error| Self {
            session_id: session_id.map(str::to_string),
            state,
            error,
        }
    }
}

/// Runs chat turns against stored papers and sessions.
#[derive(Clone)]
pub struct ChatService {
    db: Arc<dyn DatabaseBackend>,
    generator: Arc<dyn GenerationService>,
    requirements: RequirementsAnalyzer,
    pipeline: Arc<RetrievalPipeline>,
    config: ChatConfig,
}

impl ChatService {
    pub fn new(
        db: Arc<dyn DatabaseBackend>,
        generator: Arc<dyn GenerationService>,
        requirements: RequirementsAnalyzer,
        chat: &ChatConfig,
        retrieval: &RetrievalConfig,
    ) -> Self {
        Self {
            db,
            generator,
            requirements,
            pipeline: Arc::new(RetrievalPipeline::new(retrieval, chat.history_turns)),
            config: chat.clone(),
        }
    }

    /// Run one chat turn. Never returns an error: failures come back as a
    /// response with `success: false` and an apology.
    pub async fn chat(&self, request: ChatTurnRequest) -> ChatTurnResponse {
        match self.run_turn(&request).await {
            Ok(response) => response,
            Err(failure) => {
                tracing::warn!(
                    paper_id = %request.paper_id,
                    session_id = ?failure.session_id,
                    state = %TurnState::Failed,
                    failed_at = %failure.state,
                    error = %failure.error,
                    "Chat turn failed"
                );
                ChatTurnResponse::failed(
                    failure.session_id,
                    TURN_FAILED_MESSAGE,
                    failure.error.to_string(),
                )
            }
        }
    }

    async fn run_turn(
        &self,
        request: &ChatTurnRequest,
    ) -> std::result::Result<ChatTurnResponse, TurnFailure> {
        let paper_id = request.paper_id.as_str();
        self.trace(TurnState::Validating, paper_id, None);

        let paper = self
            .load_extracted_paper(paper_id)
            .await
            .map_err(TurnFailure::at(TurnState::Validating, None))?;
        let Some(extraction) = paper.completed_extraction() else {
            return Err(TurnFailure::at(TurnState::Validating, None)(
                PaperChatError::PaperNotExtracted(paper_id.to_string()),
            ));
        };

        let session = self
            .resolve_session(paper_id, request.session_id.as_deref())
            .await
            .map_err(TurnFailure::at(TurnState::SessionReady, None))?;
        let session_id = session.id.as_str();
        self.trace(TurnState::SessionReady, paper_id, Some(session_id));

        // History must not include the question being asked now
        let history = self.load_history(session_id).await;

        let question = ChatMessage::user(
            session_id,
            request.query.clone(),
            request.selected_text.clone(),
            request.selection_context.clone(),
        );
        self.store_message(&question)
            .await
            .map_err(TurnFailure::at(TurnState::SessionReady, Some(session_id)))?;

        let selection = Selection::new(
            request.selection_text(),
            request
                .selection_context
                .as_ref()
                .and_then(|ctx| ctx.page_number),
        );
        let context = self
            .retrieve(extraction, &request.query, selection.as_ref())
            .await;
        self.trace(TurnState::ContentRetrieved, paper_id, Some(session_id));

        let prompt = self
            .pipeline
            .build_prompt(extraction, &context, &history, selection.as_ref());
        self.trace(TurnState::PromptBuilt, paper_id, Some(session_id));

        self.trace(TurnState::Generating, paper_id, Some(session_id));
        let answer = self.generate(&paper, extraction, &context, &prompt).await;

        let metadata = context.bundle.metadata();
        let reply = ChatMessage::assistant(session_id, answer.clone(), metadata.clone());
        if let Err(e) = self.store_message(&reply).await {
            tracing::error!(
                critical = true,
                paper_id = %paper_id,
                session_id = %session_id,
                error = %e,
                "Failed to persist assistant message"
            );
        } else {
            self.trace(TurnState::Persisted, paper_id, Some(session_id));
        }

        Ok(ChatTurnResponse::ok(session_id, answer, metadata))
    }

    fn trace(&self, state: TurnState, paper_id: &str, session_id: Option<&str>) {
        tracing::debug!(%state, paper_id, session_id, "Chat turn state");
    }

    async fn load_extracted_paper(&self, paper_id: &str) -> Result<Paper> {
        self.db
            .get_paper(paper_id)
            .await?
            .ok_or_else(|| PaperChatError::PaperNotFound(paper_id.to_string()))
    }

    /// Continue the requested session when it is usable for this paper,
    /// otherwise start a new one (or refuse, when configured to).
    async fn resolve_session(
        &self,
        paper_id: &str,
        session_id: Option<&str>,
    ) -> Result<ChatSession> {
        if let Some(id) = session_id {
            match self.db.get_session(id).await? {
                Some(session) if session.accepts(paper_id) => return Ok(session),
                _ if !self.config.create_missing_sessions => {
                    return Err(PaperChatError::SessionNotFound(id.to_string()));
                }
                _ => {
                    tracing::debug!(
                        paper_id,
                        requested_session = id,
                        "Requested session is unusable, starting a new one"
                    );
                }
            }
        }

        let session = ChatSession::new(paper_id, self.config.default_session_title.clone());
        self.db
            .create_session(&session)
            .await
            .map_err(|e| PaperChatError::Persistence(format!("Failed to create session: {e}")))?;
        tracing::info!(paper_id, session_id = %session.id, "Chat session created");
        Ok(session)
    }

    async fn load_history(&self, session_id: &str) -> Vec<ChatMessage> {
        let limit = self.config.history_turns * 2;
        match self.db.recent_messages(session_id, limit).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Failed to load chat history, continuing without it");
                Vec::new()
            }
        }
    }

    /// Store a message and bump the owning session's counters.
    async fn store_message(&self, message: &ChatMessage) -> Result<()> {
        self.db
            .create_message(message)
            .await
            .map_err(|e| PaperChatError::Persistence(format!("Failed to store message: {e}")))?;
        self.db
            .record_message(&message.session_id, message.created_at)
            .await
            .map_err(|e| PaperChatError::Persistence(format!("Failed to update session: {e}")))
    }

    async fn retrieve(
        &self,
        extraction: &PaperExtraction,
        query: &str,
        selection: Option<&Selection<'_>>,
    ) -> PreparedContext {
        let analysis = self.pipeline.classify(query, selection);
        let source = priority_source(self.requirements.analyze(query).await);
        self.pipeline
            .prepare(extraction, analysis, selection, source.as_ref())
    }

    /// One bounded generation attempt. Any failure, timeout or blank answer
    /// becomes a templated answer built from the paper's title and authors.
    async fn generate(
        &self,
        paper: &Paper,
        extraction: &PaperExtraction,
        context: &PreparedContext,
        prompt: &str,
    ) -> String {
        let strategy = &context.analysis.strategy;
        let timeout_secs = self.config.generation_timeout_secs;

        let outcome = if self.generator.is_available() {
            let call = self
                .generator
                .generate(prompt, strategy.temperature, strategy.max_tokens);
            match tokio::time::timeout(Duration::from_secs(timeout_secs), call).await {
                Ok(Ok(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
                Ok(Ok(_)) => Err(PaperChatError::Generation("empty response".to_string())),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(PaperChatError::GenerationTimeout(timeout_secs)),
            }
        } else {
            Err(PaperChatError::LlmUnavailable(
                "no generation backend configured".to_string(),
            ))
        };

        match outcome {
            Ok(text) => text,
            Err(e) => {
                if e.is_generation_failure() {
                    tracing::warn!(
                        paper_id = %paper.id,
                        query_type = %context.analysis.primary_type,
                        error = %e,
                        "Generation failed, answering from paper metadata"
                    );
                } else {
                    tracing::error!(
                        paper_id = %paper.id,
                        query_type = %context.analysis.primary_type,
                        error = %e,
                        "Unexpected generation service error, answering from paper metadata"
                    );
                }
                let title = if extraction.title.trim().is_empty() {
                    paper.title.as_str()
                } else {
                    extraction.title.as_str()
                };
                let authors: Vec<String> = extraction
                    .authors
                    .iter()
                    .map(|a| a.name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect();
                fallback_answer(
                    title,
                    &authors,
                    context.analysis.include_authors,
                    asks_about_title(&context.analysis.query),
                )
            }
        }
    }

    /// Classify, retrieve and assemble the prompt for a question without
    /// calling the generation service or writing anything.
    pub async fn preview(
        &self,
        paper_id: &str,
        query: &str,
        selected_text: Option<&str>,
        page: Option<u32>,
        session_id: Option<&str>,
    ) -> Result<ContextPreview> {
        let paper = self.load_extracted_paper(paper_id).await?;
        let extraction = paper
            .completed_extraction()
            .ok_or_else(|| PaperChatError::PaperNotExtracted(paper_id.to_string()))?;

        // Only a live session of this paper contributes history
        let history = match session_id {
            Some(id) => match self.db.get_session(id).await? {
                Some(session) if session.accepts(paper_id) => self.load_history(id).await,
                _ => Vec::new(),
            },
            None => Vec::new(),
        };

        let selection = Selection::new(selected_text, page);
        let analysis = self.pipeline.classify(query, selection.as_ref());
        let requirements = self.requirements.analyze(query).await;
        let requirements_applied = requirements.is_some();
        let source = priority_source(requirements);
        let context =
            self.pipeline
                .prepare(extraction, analysis, selection.as_ref(), source.as_ref());
        let prompt = self
            .pipeline
            .build_prompt(extraction, &context, &history, selection.as_ref());

        Ok(ContextPreview {
            context_metadata: context.bundle.metadata(),
            analysis: context.analysis,
            bundle: context.bundle,
            prompt,
            requirements_applied,
        })
    }

    pub async fn list_sessions(&self, paper_id: &str) -> Result<Vec<ChatSession>> {
        self.load_extracted_paper(paper_id).await?;
        self.db.list_sessions(paper_id).await
    }

    pub async fn session_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        if self.db.get_session(session_id).await?.is_none() {
            return Err(PaperChatError::SessionNotFound(session_id.to_string()));
        }
        self.db.list_messages(session_id).await
    }

    pub async fn deactivate_session(&self, session_id: &str) -> Result<()> {
        if self.db.deactivate_session(session_id).await? {
            tracing::info!(session_id, "Chat session deactivated");
            Ok(())
        } else {
            Err(PaperChatError::SessionNotFound(session_id.to_string()))
        }
    }
}
