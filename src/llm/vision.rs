use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::client::{ChatModel, Completion, LlmError};
use super::types::{ContentPart, ImageUrl, Message};

const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.3;
const EXCERPT_CHARS: usize = 100;

pub const UNKNOWN_LANDMARK: &str = "Unknown Location";
pub const UNKNOWN_LOCATION: &str = "Unknown";

const PROMPT: &str = r#"Analyze this image and identify any landmarks, tourist attractions, or notable locations. Please provide:
1. The name of the landmark/location (if identifiable)
2. The city and country
3. Confidence level (0.0-1.0)
4. Brief description of what you see

Respond in JSON format like this:
{
  "landmark": "landmark name or 'Unknown'",
  "location": "City, Country or 'Unknown'",
  "confidence": 0.85,
  "description": "brief description of what you see",
  "isLandmark": true/false
}"#;

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("cannot read image {path}: {reason}")]
    ImageRead { path: String, reason: String },
}

/// A photo to identify: a file on disk or bytes already in memory.
#[derive(Debug, Clone)]
pub enum ImageInput {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageInput {
    async fn read(&self) -> Result<Vec<u8>, VisionError> {
        let bytes = match self {
            ImageInput::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|e| VisionError::ImageRead {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?
            }
            ImageInput::Bytes(bytes) => bytes.clone(),
        };
        if bytes.is_empty() {
            return Err(VisionError::ImageRead {
                path: self.describe(),
                reason: "image is empty".into(),
            });
        }
        Ok(bytes)
    }

    fn describe(&self) -> String {
        match self {
            ImageInput::Path(path) => path.display().to_string(),
            ImageInput::Bytes(_) => "<in-memory image>".into(),
        }
    }
}

/// The model's guess about what a photo shows. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionJudgment {
    pub landmark: String,
    pub location: String,
    pub confidence: f64,
    pub description: String,
    pub is_landmark: bool,
}

impl VisionJudgment {
    fn degraded(landmark: &str, confidence: f64, description: String) -> Self {
        Self {
            landmark: landmark.to_string(),
            location: UNKNOWN_LOCATION.to_string(),
            confidence,
            description,
            is_landmark: false,
        }
    }

    pub fn timed_out() -> Self {
        Self::degraded(
            "Analysis Timeout",
            0.0,
            "Image analysis timed out. Please try again.".into(),
        )
    }

    pub fn failed() -> Self {
        Self::degraded(
            "Analysis Failed",
            0.0,
            "Unable to analyze the image. Please try again.".into(),
        )
    }

    fn unparsed(raw: &str) -> Self {
        Self::degraded("Unidentified Location", 0.3, excerpt(raw))
    }
}

/// Asks the vision model what the image shows.
///
/// Only an unreadable image is an error; provider failures and unparseable
/// output come back as low-confidence judgments.
pub async fn classify(
    model: &impl ChatModel,
    image: &ImageInput,
) -> Result<VisionJudgment, VisionError> {
    let bytes = image.read().await?;
    let data_url = format!("data:{};base64,{}", sniff_mime(&bytes), STANDARD.encode(&bytes));
    debug!(bytes = bytes.len(), "sending image for analysis");

    let completion = Completion {
        messages: vec![Message::user_parts(vec![
            ContentPart::Text {
                text: PROMPT.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: data_url,
                    detail: "high",
                },
            },
        ])],
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    };

    let judgment = match model.complete(completion).await {
        Ok(content) => parse_judgment(&content),
        Err(LlmError::Timeout(secs)) => {
            warn!(secs, "image analysis timed out");
            VisionJudgment::timed_out()
        }
        Err(e) => {
            warn!(error = %e, "image analysis failed");
            VisionJudgment::failed()
        }
    };
    Ok(judgment)
}

pub fn parse_judgment(content: &str) -> VisionJudgment {
    let fields = match serde_json::from_str::<Value>(strip_code_fence(content)) {
        Ok(Value::Object(fields)) => fields,
        _ => {
            debug!("vision output is not a JSON object; using excerpt");
            return VisionJudgment::unparsed(content);
        }
    };

    let text = |key: &str, default: &str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
            .to_string()
    };

    let confidence = match fields.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|c: &f64| c.is_finite())
    .unwrap_or(0.5)
    .clamp(0.0, 1.0);

    let is_landmark = match fields.get("isLandmark") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    };

    VisionJudgment {
        landmark: text("landmark", UNKNOWN_LANDMARK),
        location: text("location", UNKNOWN_LOCATION),
        confidence,
        description: text("description", "Unable to identify specific details"),
        is_landmark,
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn excerpt(raw: &str) -> String {
    match raw.char_indices().nth(EXCERPT_CHARS) {
        Some((end, _)) => format!("{}...", &raw[..end]),
        None => raw.to_string(),
    }
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/jpeg",
    }
}
