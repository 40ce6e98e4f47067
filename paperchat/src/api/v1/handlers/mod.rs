pub mod chat;
pub(crate) mod health;
pub mod papers;
pub mod sessions;

pub use health::health_check;
