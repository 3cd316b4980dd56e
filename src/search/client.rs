use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::types::{ProviderErrorBody, SearchRequest, SearchResponse, SearchResult};
use crate::config::{ApiKey, Config};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RESULTS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search timed out after {0}s")]
    Timeout(u64),

    #[error("search provider error ({code}): {message}")]
    Provider { code: u16, message: String },

    #[error("malformed search response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(reqwest::Error),
}

/// Per-call search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub max_results: u32,
    /// Restrict to results published within this many days.
    pub days: Option<u32>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            days: None,
        }
    }
}

/// Web search that never fails: provider errors become an empty result list.
/// Implemented by `TavilyClient` for production; mock implementations used in tests.
pub trait SearchClient: Send + Sync + 'static {
    fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> impl Future<Output = Vec<SearchResult>> + Send;
}

#[derive(Clone)]
pub struct TavilyClient {
    http: Client,
    api_key: ApiKey,
    base_url: String,
    timeout: Duration,
}

impl TavilyClient {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            api_key: config.tavily_api_key.clone(),
            base_url: config.tavily_base_url.clone(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            http,
            api_key: ApiKey::new("test-key"),
            base_url: base_url.to_string(),
            timeout,
        }
    }

    pub async fn try_search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let url = format!("{}/search", self.base_url);
        let request = SearchRequest {
            api_key: self.api_key.expose(),
            query,
            max_results: options.max_results,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
            days: options.days,
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorBody>(&text)
                .ok()
                .and_then(|body| body.message())
                .unwrap_or_else(|| {
                    let end = text.floor_char_boundary(200);
                    format!("HTTP {status}: {}", &text[..end])
                });
            return Err(SearchError::Provider {
                code: status.as_u16(),
                message,
            });
        }

        let text = response.text().await.map_err(|e| self.classify(e))?;
        let body: SearchResponse =
            serde_json::from_str(&text).map_err(|e| SearchError::Parse(e.to_string()))?;
        let results = body.results.unwrap_or_default();
        debug!(query, results = results.len(), "search complete");
        Ok(results)
    }

    fn classify(&self, e: reqwest::Error) -> SearchError {
        if e.is_timeout() {
            SearchError::Timeout(self.timeout.as_secs())
        } else {
            SearchError::Network(e)
        }
    }
}

impl SearchClient for TavilyClient {
    async fn search(&self, query: &str, options: SearchOptions) -> Vec<SearchResult> {
        match self.try_search(query, options).await {
            Ok(results) => results,
            Err(e) => {
                warn!(query, error = %e, "search failed; continuing without these results");
                Vec::new()
            }
        }
    }
}
