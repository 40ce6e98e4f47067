mod chat;
mod content;
mod paper;
mod query;

pub use chat::*;
pub use content::*;
pub use paper::*;
pub use query::*;
