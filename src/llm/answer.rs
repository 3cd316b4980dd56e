use tracing::warn;

use super::client::{ChatModel, Completion, LlmError};
use super::types::Message;
use crate::search::SearchResult;

const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;

pub const TIMEOUT_APOLOGY: &str =
    "I apologize, but the request timed out. Please try again with a shorter query.";
pub const ERROR_APOLOGY: &str =
    "I apologize, but I encountered an error generating a response. Please try again.";

const SYSTEM_PROMPT: &str = "You are NomadSensei, a multilingual mobile concierge. \
Generate travel advice based on the search results provided.
Format your response in plain text with citations (¹,²,³) that correspond to the source URLs, \
numbered in the order the search results are given.
Keep answers under 300 words for regular queries and 700 for itineraries.
Be friendly, informative, and safety-conscious.";

/// Writes a cited answer from the search results. Never fails: provider
/// errors become an apology the user can read.
pub async fn generate(model: &impl ChatModel, query: &str, results: &[SearchResult]) -> String {
    let serialized = match serde_json::to_string_pretty(results) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "failed to serialize search results");
            return ERROR_APOLOGY.to_string();
        }
    };

    let completion = Completion {
        messages: vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!(
                "User query: {query}\n\nSearch results:\n{serialized}\n\nGenerate a comprehensive answer with citations."
            )),
        ],
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    };

    match model.complete(completion).await {
        Ok(text) => text,
        Err(LlmError::Timeout(secs)) => {
            warn!(secs, "answer generation timed out");
            TIMEOUT_APOLOGY.to_string()
        }
        Err(e) => {
            warn!(error = %e, "answer generation failed");
            ERROR_APOLOGY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::OpenAiClient;
    use reqwest::Client;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::with_base_url(Client::new(), &server.uri(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn sends_query_and_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "max_tokens": 1000,
                "temperature": 0.7
            })))
            .and(body_string_contains("User query: Best ramen in Osaka"))
            .and(body_string_contains("https://ramen.example"))
            .and(body_string_contains("multilingual mobile concierge"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Try Ichiran¹."}}]
            })))
            .mount(&server)
            .await;

        let results = vec![SearchResult::new("Ramen guide", "https://ramen.example")];
        let answer = generate(&client(&server), "Best ramen in Osaka", &results).await;
        assert_eq!(answer, "Try Ichiran¹.");
    }

    #[tokio::test]
    async fn runs_with_empty_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Search results:\\n[]"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "From general knowledge..."}}]
            })))
            .mount(&server)
            .await;

        let answer = generate(&client(&server), "Lisbon tips", &[]).await;
        assert_eq!(answer, "From general knowledge...");
    }

    #[tokio::test]
    async fn timeout_returns_timeout_apology() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client =
            OpenAiClient::with_base_url(Client::new(), &server.uri(), Duration::from_millis(50));
        let answer = generate(&client, "q", &[]).await;
        assert_eq!(answer, TIMEOUT_APOLOGY);
    }

    #[tokio::test]
    async fn provider_error_returns_generic_apology() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let answer = generate(&client(&server), "q", &[]).await;
        assert_eq!(answer, ERROR_APOLOGY);
    }
}
