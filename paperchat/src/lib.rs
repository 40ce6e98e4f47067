//! Chat with a research paper.
//!
//! A question about a paper goes through one pipeline: it is classified
//! ([`retrieval::QueryClassifier`]), turned into content weights
//! ([`retrieval::PrioritySource`]), matched against the paper's structured
//! extraction ([`retrieval::ContentRetriever`]), scored, deduplicated and
//! budgeted ([`retrieval::Ranker`]), and rendered into a single prompt
//! ([`retrieval::PromptAssembler`]). [`services::ChatService`] drives one
//! chat turn through that pipeline, the generation service and the chat
//! store.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod models;
pub mod retrieval;
pub mod services;

pub use error::{PaperChatError, Result};
