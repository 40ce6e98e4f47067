use std::sync::Arc;

use crate::config::Config;
use crate::db::DatabaseBackend;
use crate::llm::{GenerationService, LlmProvider};
use crate::services::{ChatService, PaperService, RequirementsAnalyzer};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn DatabaseBackend>,
    pub llm: LlmProvider,
    pub requirements: RequirementsAnalyzer,
    pub chat: ChatService,
    pub papers: PaperService,
}

impl AppState {
    /// `generator` answers chat turns. In production it is `llm` itself.
    pub fn new(
        config: Config,
        db: Arc<dyn DatabaseBackend>,
        llm: LlmProvider,
        generator: Arc<dyn GenerationService>,
    ) -> Self {
        let config = Arc::new(config);
        let requirements = RequirementsAnalyzer::new(llm.clone());
        let chat = ChatService::new(
            db.clone(),
            generator,
            requirements.clone(),
            &config.chat,
            &config.retrieval,
        );
        let papers = PaperService::new(db.clone());

        Self {
            config,
            db,
            llm,
            requirements,
            chat,
            papers,
        }
    }
}
