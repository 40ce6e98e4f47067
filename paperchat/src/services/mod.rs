mod chat;
mod papers;
mod requirements;

pub use chat::{ChatService, ContextPreview, TurnState};
pub use papers::PaperService;
pub use requirements::RequirementsAnalyzer;
