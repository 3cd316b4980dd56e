use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::types::{ApiError, ChatRequest, ChatResponse, Message};
use crate::config::{ApiKey, Config};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("model request timed out after {0}s")]
    Timeout(u64),

    #[error("API error ({code}): {message}")]
    Provider { code: u16, message: String },

    #[error("malformed model response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(reqwest::Error),
}

/// One chat-completions call; the client supplies the model name.
#[derive(Debug)]
pub struct Completion {
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Abstraction over a chat-completions endpoint.
/// Implemented by `OpenAiClient` for production; mock implementations used in tests.
pub trait ChatModel: Send + Sync {
    fn complete(
        &self,
        completion: Completion,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            api_key: config.openai_api_key.clone(),
            model: config.model.clone(),
            base_url: config.openai_base_url.clone(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            http,
            api_key: ApiKey::new("test-key"),
            model: "gpt-4o-mini".to_string(),
            base_url: base_url.to_string(),
            timeout,
        }
    }

    fn classify(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout.as_secs())
        } else {
            LlmError::Network(e)
        }
    }
}

impl ChatModel for OpenAiClient {
    async fn complete(&self, completion: Completion) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: completion.messages,
            max_tokens: completion.max_tokens,
            temperature: completion.temperature,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            if let Ok(body) = serde_json::from_str::<ChatResponse>(&text)
                && let Some(err) = &body.error
            {
                let classified = classify_api_error(status.as_u16(), err);
                warn!(error = %classified, "model API error");
                return Err(classified);
            }
            let end = text.floor_char_boundary(200);
            warn!(status = %status, "model API error (no structured body)");
            return Err(LlmError::Provider {
                code: status.as_u16(),
                message: format!("HTTP {status}: {}", &text[..end]),
            });
        }

        let body: ChatResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::Parse(e.to_string()))?;
        if let Some(err) = &body.error {
            return Err(classify_api_error(status.as_u16(), err));
        }

        let content = body
            .first_content()
            .ok_or_else(|| LlmError::Parse("response has no message content".into()))?;
        debug!(model = %self.model, chars = content.len(), "completion received");
        Ok(content.to_string())
    }
}

fn classify_api_error(status: u16, err: &ApiError) -> LlmError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());
    let message = match &err.kind {
        Some(kind) => format!("{kind}: {message}"),
        None => message,
    };
    LlmError::Provider {
        code: status,
        message,
    }
}
