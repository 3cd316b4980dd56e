//! Travel concierge core: identify a photo, search the web, and answer with citations.

pub mod actions;
pub mod config;
pub mod conversation;
pub mod llm;
pub mod markdown;
pub mod pipeline;
pub mod planner;
pub mod search;

pub const USER_AGENT: &str = concat!("nomad/", env!("CARGO_PKG_VERSION"));

pub use config::Config;
pub use conversation::Conversation;
pub use llm::ImageInput;
pub use pipeline::{Answer, Pipeline};
