//! v1 API Data Transfer Objects.
//!
//! These types define the wire format for the v1 REST API. Chat turn
//! responses and context previews reuse the domain types directly since
//! their camelCase shape is already the wire contract.

pub mod chat;
pub mod papers;
pub mod sessions;

pub use chat::*;
pub use papers::*;
pub use sessions::*;
