//! Chat-completions access: the wire client, landmark recognition, and cited answer generation.

pub mod answer;
pub(crate) mod client;
pub(crate) mod types;
pub mod vision;

pub use client::{ChatModel, Completion, LlmError, OpenAiClient};
pub use vision::{ImageInput, VisionError, VisionJudgment};
