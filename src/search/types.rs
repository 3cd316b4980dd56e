use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub api_key: &'a str,
    pub query: &'a str,
    pub max_results: u32,
    pub include_domains: Vec<String>,
    pub exclude_domains: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Option<Vec<SearchResult>>,
}

/// One hit from the search provider. Uniqueness key is `url`.
///
/// Provider-specific fields (`content`, `score`, `published_date`, ...) are kept
/// verbatim in `extra` so they reach the language model unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderErrorBody {
    pub detail: Option<Value>,
    pub error: Option<Value>,
}

impl ProviderErrorBody {
    pub fn message(&self) -> Option<String> {
        let value = self.detail.as_ref().or(self.error.as_ref())?;
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj
                .get("error")
                .or_else(|| obj.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }
}
